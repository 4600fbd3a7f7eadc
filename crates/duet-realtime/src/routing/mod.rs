//! Chat message validation and routing.

pub mod router;
pub mod validator;

pub use router::{MessageRouter, RouteError, RoutedMessage};
pub use validator::{ChatPayload, FieldViolation, ValidationError, validate};
