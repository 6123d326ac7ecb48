//! Error types for repom
//!
//! Schema construction, query building and repository calls all report
//! through [`ModelError`]. Driver errors are wrapped, never recovered.

use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Error types for model, schema and repository operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Error reported by the database driver
    #[error("Database error: {0}")]
    Database(String),

    /// Record not found in database
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Identifier or value validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// A schema without any primary-key column, or a model instance whose
    /// key value is unset
    #[error("Missing primary key: {0}")]
    MissingPrimaryKey(String),

    /// Invalid column set for a model
    #[error("Schema error: {0}")]
    Schema(String),

    /// Query building error
    #[error("Query error: {0}")]
    Query(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Connection or pool error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Primary key value does not match the model's key columns
    #[error("Invalid key error: {0}")]
    InvalidKey(String),

    /// A row returned by the database lacks a column
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// An operation referenced a column the model does not have.
    ///
    /// Raised for instance when the default `id` ordering is applied to a
    /// composite-key model.
    #[error("Model '{model}' has no attribute '{attribute}'")]
    AttributeNotFound { model: String, attribute: String },

    /// Relationship declaration is inconsistent
    #[error("Relationship error: {0}")]
    Relationship(String),
}

impl ModelError {
    /// Shorthand for [`ModelError::AttributeNotFound`]
    pub fn attribute_not_found(model: &str, attribute: &str) -> Self {
        ModelError::AttributeNotFound {
            model: model.to_string(),
            attribute: attribute.to_string(),
        }
    }

    /// Check whether this error is an attribute lookup failure
    pub fn is_attribute_not_found(&self) -> bool {
        matches!(self, ModelError::AttributeNotFound { .. })
    }
}

impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ModelError::NotFound("row not found".to_string()),
            sqlx::Error::ColumnNotFound(column) => ModelError::ColumnNotFound(column),
            other @ (sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed) => {
                ModelError::Connection(other.to_string())
            }
            other => ModelError::Database(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

impl From<ConfigError> for ModelError {
    fn from(err: ConfigError) -> Self {
        ModelError::Configuration(err.to_string())
    }
}
