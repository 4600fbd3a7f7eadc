//! # duet-api
//!
//! HTTP API layer for Duet built on Axum.
//!
//! Provides the REST endpoints for users, conversations, and health, the
//! WebSocket upgrade that feeds the real-time engine, middleware (CORS,
//! request logging), extractors, DTOs, and error mapping.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
