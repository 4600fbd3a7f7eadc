//! # duet-database
//!
//! The durable store contract consumed by the real-time core
//! ([`ChatStore`]), with a PostgreSQL implementation backed by sqlx
//! repositories and a process-local implementation for tests and
//! single-node demos.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryChatStore;
pub use postgres::PgChatStore;
pub use store::ChatStore;
