//! # duet-entity
//!
//! Domain entity models for Duet. Every struct in this crate represents a
//! database row or a domain value object. Row types additionally derive
//! `sqlx::FromRow`.
//!
//! Entities serialize with camelCase field names since they travel
//! unchanged over the WebSocket and REST surfaces.

pub mod message;
pub mod presence;
pub mod user;
