//! PostgreSQL repository implementations for Duet entities.

pub mod message;
pub mod user;

pub use message::MessageRepository;
pub use user::UserRepository;
