//! Custom Axum extractors.

pub mod current_user;

pub use current_user::CurrentUser;
