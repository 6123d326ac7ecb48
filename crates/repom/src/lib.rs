//! # repom: Base-model conventions and a generic repository
//!
//! repom standardizes how models declare their convention columns (an
//! auto-increment `id` key, `created_at` / `updated_at` timestamps, or a
//! composite key instead of `id`) and provides a CRUD repository over any
//! model. Storage, transactions and pooling stay with the database and
//! `sqlx`.
//!
//! A model picks its flags, declares its own columns, and the schema
//! builder resolves the final column set once per process:
//!
//! ```ignore
//! impl Model for UserRole {
//!     fn table_name() -> &'static str { "user_roles" }
//!     fn flags() -> ModelFlags { ModelFlags::AUTO.composite_pk() }
//!     fn declared_columns() -> Vec<ColumnDef> {
//!         vec![
//!             ColumnDef::integer("user_id").primary_key(),
//!             ColumnDef::integer("role_id").primary_key(),
//!         ]
//!     }
//!     // from_row / to_fields ...
//! }
//! ```

pub mod backends;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod query;
pub mod relationships;
pub mod repository;
pub mod schema;
pub mod security;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[cfg(test)]
mod tests;

pub use backends::{DatabasePool, DatabaseRow, DatabaseRowExt, DatabaseValue, MemoryRow, PostgresPool, SqlDialect};
pub use config::{ConfigError, DatabaseConfig, LogFormat, LoggingConfig};
pub use error::{ModelError, ModelResult};
pub use logging::init_logging;
pub use model::{FlagOverrides, Model, ModelFlags, PrimaryKey};
pub use query::{Filter, FindOptions, OrderBy, OrderDirection, QueryOperator};
pub use relationships::{validate_back_populates, Cascade, Relationship, RelationshipKind};
pub use repository::BaseRepository;
pub use schema::{ColumnDef, ColumnType, SchemaBuilder, TableSchema};
