//! Database session abstractions
//!
//! Repositories hold an `Arc<dyn DatabasePool>`; [`PostgresPool`] is the
//! sqlx-backed implementation.

pub mod core;
pub mod postgres;

pub use self::core::*;
pub use postgres::{PostgresPool, PostgresRow};
