//! Core Database Session Traits
//!
//! The repository talks to the database only through [`DatabasePool`].
//! Connection pooling, transactions and concurrency stay with the driver;
//! this layer only moves SQL text, bound values and rows across.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::{ModelError, ModelResult};

/// Database session used by repositories.
///
/// Implementations are expected to be cheap to share behind an `Arc`.
#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Execute a statement and return the affected row count
    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> ModelResult<u64>;

    /// Execute a query and return all result rows
    async fn fetch_all(&self, sql: &str, params: &[DatabaseValue]) -> ModelResult<Vec<Box<dyn DatabaseRow>>>;

    /// Execute a query and return the first result row, if any
    async fn fetch_optional(&self, sql: &str, params: &[DatabaseValue]) -> ModelResult<Option<Box<dyn DatabaseRow>>>;

    /// SQL dialect spoken by this session
    fn sql_dialect(&self) -> SqlDialect;

    /// Round-trip a trivial query and report its latency
    async fn health_check(&self) -> ModelResult<std::time::Duration>;

    /// Close the session
    async fn close(&self) -> ModelResult<()>;
}

/// Abstract database row
pub trait DatabaseRow: Send + Sync {
    /// Get a column value by index
    fn get_by_index(&self, index: usize) -> ModelResult<DatabaseValue>;

    /// Get a column value by name
    fn get_by_name(&self, name: &str) -> ModelResult<DatabaseValue>;

    /// Column names in result order
    fn column_names(&self) -> Vec<String>;

    fn column_count(&self) -> usize {
        self.column_names().len()
    }

    /// Convert the row to a JSON object
    fn to_json(&self) -> ModelResult<JsonValue> {
        let mut map = serde_json::Map::new();
        for name in self.column_names() {
            let value = self.get_by_name(&name)?;
            map.insert(name, value.to_json());
        }
        Ok(JsonValue::Object(map))
    }

    /// Convert the row to a column map
    fn to_map(&self) -> ModelResult<HashMap<String, DatabaseValue>> {
        let mut map = HashMap::new();
        for name in self.column_names() {
            let value = self.get_by_name(&name)?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

/// Row held in memory, columns in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryRow {
    columns: Vec<(String, DatabaseValue)>,
}

impl MemoryRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a column value
    pub fn with<T: Into<DatabaseValue>>(mut self, name: &str, value: T) -> Self {
        let value = value.into();
        match self.columns.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.columns.push((name.to_string(), value)),
        }
        self
    }

    pub fn from_fields(fields: Vec<(String, DatabaseValue)>) -> Self {
        Self { columns: fields }
    }
}

impl DatabaseRow for MemoryRow {
    fn get_by_index(&self, index: usize) -> ModelResult<DatabaseValue> {
        self.columns
            .get(index)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| ModelError::ColumnNotFound(format!("Column at index {} not found", index)))
    }

    fn get_by_name(&self, name: &str) -> ModelResult<DatabaseValue> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| ModelError::ColumnNotFound(format!("Column '{}' not found", name)))
    }

    fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|(name, _)| name.clone()).collect()
    }
}

/// Typed column access for model hydration
pub trait DatabaseRowExt {
    /// Get a typed value from a column
    fn get<T>(&self, column: &str) -> ModelResult<T>
    where
        T: for<'de> serde::Deserialize<'de>;

    /// Get a typed value, mapping NULL and missing columns to `None`
    fn try_get<T>(&self, column: &str) -> ModelResult<Option<T>>
    where
        T: for<'de> serde::Deserialize<'de>;
}

impl<R: DatabaseRow + ?Sized> DatabaseRowExt for R {
    fn get<T>(&self, column: &str) -> ModelResult<T>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let value = self.get_by_name(column)?;
        serde_json::from_value(value.to_json()).map_err(|e| {
            ModelError::Serialization(format!("Failed to deserialize column '{}': {}", column, e))
        })
    }

    fn try_get<T>(&self, column: &str) -> ModelResult<Option<T>>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        match self.get_by_name(column) {
            Ok(value) if value.is_null() => Ok(None),
            Ok(value) => serde_json::from_value(value.to_json()).map(Some).map_err(|e| {
                ModelError::Serialization(format!("Failed to deserialize column '{}': {}", column, e))
            }),
            Err(ModelError::ColumnNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Database value used for parameter binding and row access
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseValue {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    Uuid(uuid::Uuid),
    DateTime(chrono::DateTime<chrono::Utc>),
    Date(chrono::NaiveDate),
    Json(JsonValue),
}

impl DatabaseValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DatabaseValue::Null)
    }

    /// Integer view of the value, if it holds one
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DatabaseValue::Int32(i) => Some(*i as i64),
            DatabaseValue::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> JsonValue {
        match self {
            DatabaseValue::Null => JsonValue::Null,
            DatabaseValue::Bool(b) => JsonValue::Bool(*b),
            DatabaseValue::Int32(i) => JsonValue::Number((*i).into()),
            DatabaseValue::Int64(i) => JsonValue::Number((*i).into()),
            DatabaseValue::Float64(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            DatabaseValue::String(s) => JsonValue::String(s.clone()),
            DatabaseValue::Bytes(b) => JsonValue::Array(b.iter().map(|&x| JsonValue::Number(x.into())).collect()),
            DatabaseValue::Uuid(u) => JsonValue::String(u.to_string()),
            DatabaseValue::DateTime(dt) => JsonValue::String(dt.to_rfc3339()),
            DatabaseValue::Date(d) => JsonValue::String(d.to_string()),
            DatabaseValue::Json(j) => j.clone(),
        }
    }

    /// Create a value from JSON.
    ///
    /// Strings stay strings; callers that need UUID or timestamp typing
    /// should construct those variants directly.
    pub fn from_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => DatabaseValue::Null,
            JsonValue::Bool(b) => DatabaseValue::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    DatabaseValue::Int64(i)
                } else if let Some(f) = n.as_f64() {
                    DatabaseValue::Float64(f)
                } else {
                    DatabaseValue::Null
                }
            }
            JsonValue::String(s) => DatabaseValue::String(s),
            other => DatabaseValue::Json(other),
        }
    }
}

impl std::fmt::Display for DatabaseValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseValue::Null => write!(f, "NULL"),
            DatabaseValue::String(s) => write!(f, "{}", s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<bool> for DatabaseValue {
    fn from(value: bool) -> Self {
        DatabaseValue::Bool(value)
    }
}

impl From<i32> for DatabaseValue {
    fn from(value: i32) -> Self {
        DatabaseValue::Int32(value)
    }
}

impl From<i64> for DatabaseValue {
    fn from(value: i64) -> Self {
        DatabaseValue::Int64(value)
    }
}

impl From<f64> for DatabaseValue {
    fn from(value: f64) -> Self {
        DatabaseValue::Float64(value)
    }
}

impl From<String> for DatabaseValue {
    fn from(value: String) -> Self {
        DatabaseValue::String(value)
    }
}

impl From<&str> for DatabaseValue {
    fn from(value: &str) -> Self {
        DatabaseValue::String(value.to_string())
    }
}

impl From<Vec<u8>> for DatabaseValue {
    fn from(value: Vec<u8>) -> Self {
        DatabaseValue::Bytes(value)
    }
}

impl From<uuid::Uuid> for DatabaseValue {
    fn from(value: uuid::Uuid) -> Self {
        DatabaseValue::Uuid(value)
    }
}

impl From<chrono::DateTime<chrono::Utc>> for DatabaseValue {
    fn from(value: chrono::DateTime<chrono::Utc>) -> Self {
        DatabaseValue::DateTime(value)
    }
}

impl From<chrono::NaiveDate> for DatabaseValue {
    fn from(value: chrono::NaiveDate) -> Self {
        DatabaseValue::Date(value)
    }
}

impl From<JsonValue> for DatabaseValue {
    fn from(value: JsonValue) -> Self {
        DatabaseValue::Json(value)
    }
}

impl<T> From<Option<T>> for DatabaseValue
where
    T: Into<DatabaseValue>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => DatabaseValue::Null,
        }
    }
}

/// SQL dialect for generating database-specific SQL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlDialect {
    PostgreSQL,
    MySQL,
    SQLite,
}

impl SqlDialect {
    /// Parameter placeholder for the zero-based bind `index`
    pub fn parameter_placeholder(&self, index: usize) -> String {
        match self {
            SqlDialect::PostgreSQL => format!("${}", index + 1),
            SqlDialect::MySQL | SqlDialect::SQLite => "?".to_string(),
        }
    }

    /// Quote character for identifiers
    pub fn identifier_quote(&self) -> char {
        match self {
            SqlDialect::MySQL => '`',
            SqlDialect::PostgreSQL | SqlDialect::SQLite => '"',
        }
    }

    /// Quote an identifier, doubling any embedded quote characters
    pub fn quote_identifier(&self, identifier: &str) -> String {
        let quote = self.identifier_quote();
        let escaped = identifier.replace(quote, &format!("{quote}{quote}"));
        format!("{quote}{escaped}{quote}")
    }

    /// Current timestamp expression
    pub fn current_timestamp(&self) -> &'static str {
        match self {
            SqlDialect::PostgreSQL => "NOW()",
            SqlDialect::MySQL | SqlDialect::SQLite => "CURRENT_TIMESTAMP",
        }
    }

    /// LIMIT value meaning "no limit", for dialects that require a LIMIT
    /// before OFFSET
    pub fn unbounded_limit(&self) -> Option<&'static str> {
        match self {
            SqlDialect::PostgreSQL => None,
            SqlDialect::MySQL => Some("18446744073709551615"),
            SqlDialect::SQLite => Some("-1"),
        }
    }

    /// Whether `INSERT .. RETURNING *` is available
    pub fn supports_returning(&self) -> bool {
        matches!(self, SqlDialect::PostgreSQL | SqlDialect::SQLite)
    }
}

impl std::fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlDialect::PostgreSQL => write!(f, "postgresql"),
            SqlDialect::MySQL => write!(f, "mysql"),
            SqlDialect::SQLite => write!(f, "sqlite"),
        }
    }
}

impl std::str::FromStr for SqlDialect {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgresql" | "postgres" => Ok(SqlDialect::PostgreSQL),
            "mysql" => Ok(SqlDialect::MySQL),
            "sqlite" => Ok(SqlDialect::SQLite),
            _ => Err(ModelError::Configuration(format!("Unsupported database backend: {}", s))),
        }
    }
}

impl SqlDialect {
    /// Detect the dialect from a database URL scheme
    pub fn from_url(url: &str) -> ModelResult<Self> {
        if url.starts_with("postgresql://") || url.starts_with("postgres://") {
            Ok(SqlDialect::PostgreSQL)
        } else if url.starts_with("mysql://") {
            Ok(SqlDialect::MySQL)
        } else if url.starts_with("sqlite:") || url.starts_with("file:") {
            Ok(SqlDialect::SQLite)
        } else {
            Err(ModelError::Connection(format!(
                "Unable to detect database backend from URL: {}",
                url
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(SqlDialect::PostgreSQL.parameter_placeholder(0), "$1");
        assert_eq!(SqlDialect::PostgreSQL.parameter_placeholder(4), "$5");
        assert_eq!(SqlDialect::SQLite.parameter_placeholder(4), "?");
    }

    #[test]
    fn test_unbounded_limit() {
        assert_eq!(SqlDialect::PostgreSQL.unbounded_limit(), None);
        assert_eq!(SqlDialect::SQLite.unbounded_limit(), Some("-1"));
        assert_eq!(SqlDialect::MySQL.unbounded_limit(), Some("18446744073709551615"));
    }

    #[test]
    fn test_quote_identifier_escapes() {
        assert_eq!(SqlDialect::PostgreSQL.quote_identifier("users"), "\"users\"");
        assert_eq!(SqlDialect::PostgreSQL.quote_identifier("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(SqlDialect::MySQL.quote_identifier("users"), "`users`");
    }

    #[test]
    fn test_dialect_from_url() {
        assert_eq!(SqlDialect::from_url("postgres://localhost/app").unwrap(), SqlDialect::PostgreSQL);
        assert_eq!(SqlDialect::from_url("sqlite::memory:").unwrap(), SqlDialect::SQLite);
        assert!(SqlDialect::from_url("redis://localhost").is_err());
    }

    #[test]
    fn test_value_json_conversion() {
        assert_eq!(DatabaseValue::from(7i32).to_json(), serde_json::json!(7));
        assert_eq!(DatabaseValue::from(None::<i64>), DatabaseValue::Null);
        assert_eq!(DatabaseValue::from_json(serde_json::json!(42)), DatabaseValue::Int64(42));
        assert_eq!(DatabaseValue::Int32(3).as_i64(), Some(3));
        assert_eq!(DatabaseValue::String("x".into()).as_i64(), None);
    }
}
