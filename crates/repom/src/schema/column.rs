//! Column definitions

use serde::{Deserialize, Serialize};

use crate::backends::SqlDialect;

/// Name of the convention primary-key column
pub const ID_COLUMN: &str = "id";
/// Name of the convention creation-timestamp column
pub const CREATED_AT_COLUMN: &str = "created_at";
/// Name of the convention update-timestamp column
pub const UPDATED_AT_COLUMN: &str = "updated_at";

/// Column data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Integer,
    BigInteger,
    Text,
    Varchar(u32),
    Boolean,
    Float,
    Double,
    Uuid,
    Timestamp,
    Date,
    Json,
    Bytes,
}

impl ColumnType {
    /// DDL type name for `dialect`
    pub fn sql_type(&self, dialect: SqlDialect) -> String {
        match (self, dialect) {
            (ColumnType::Integer, _) => "INTEGER".to_string(),
            (ColumnType::BigInteger, _) => "BIGINT".to_string(),
            (ColumnType::Text, _) => "TEXT".to_string(),
            (ColumnType::Varchar(len), _) => format!("VARCHAR({})", len),
            (ColumnType::Boolean, _) => "BOOLEAN".to_string(),
            (ColumnType::Float, SqlDialect::PostgreSQL) => "REAL".to_string(),
            (ColumnType::Float, _) => "FLOAT".to_string(),
            (ColumnType::Double, SqlDialect::PostgreSQL) => "DOUBLE PRECISION".to_string(),
            (ColumnType::Double, _) => "DOUBLE".to_string(),
            (ColumnType::Uuid, SqlDialect::PostgreSQL) => "UUID".to_string(),
            (ColumnType::Uuid, SqlDialect::MySQL) => "CHAR(36)".to_string(),
            (ColumnType::Uuid, SqlDialect::SQLite) => "TEXT".to_string(),
            (ColumnType::Timestamp, SqlDialect::PostgreSQL) => "TIMESTAMPTZ".to_string(),
            (ColumnType::Timestamp, SqlDialect::MySQL) => "DATETIME".to_string(),
            (ColumnType::Timestamp, SqlDialect::SQLite) => "TIMESTAMP".to_string(),
            (ColumnType::Date, _) => "DATE".to_string(),
            (ColumnType::Json, SqlDialect::PostgreSQL) => "JSONB".to_string(),
            (ColumnType::Json, SqlDialect::MySQL) => "JSON".to_string(),
            (ColumnType::Json, SqlDialect::SQLite) => "TEXT".to_string(),
            (ColumnType::Bytes, SqlDialect::PostgreSQL) => "BYTEA".to_string(),
            (ColumnType::Bytes, _) => "BLOB".to_string(),
        }
    }
}

/// Default or on-update expression for a column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnDefault {
    CurrentTimestamp,
    /// SQL literal, rendered verbatim
    Literal(String),
}

impl ColumnDefault {
    pub fn to_sql(&self, dialect: SqlDialect) -> String {
        match self {
            ColumnDefault::CurrentTimestamp => dialect.current_timestamp().to_string(),
            ColumnDefault::Literal(literal) => literal.clone(),
        }
    }
}

/// Where a column came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnOrigin {
    /// Declared by the model
    Declared,
    /// Attached by the schema builder from the model's flags
    Convention,
}

/// A single column of a model's table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub nullable: bool,
    pub unique: bool,
    pub default: Option<ColumnDefault>,
    /// Value assigned on every update (`updated_at`)
    pub on_update: Option<ColumnDefault>,
    pub origin: ColumnOrigin,
}

impl ColumnDef {
    /// A declared, NOT NULL column
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            column_type,
            primary_key: false,
            auto_increment: false,
            nullable: false,
            unique: false,
            default: None,
            on_update: None,
            origin: ColumnOrigin::Declared,
        }
    }

    pub fn integer(name: &str) -> Self {
        Self::new(name, ColumnType::Integer)
    }

    pub fn big_integer(name: &str) -> Self {
        Self::new(name, ColumnType::BigInteger)
    }

    pub fn text(name: &str) -> Self {
        Self::new(name, ColumnType::Text)
    }

    pub fn varchar(name: &str, length: u32) -> Self {
        Self::new(name, ColumnType::Varchar(length))
    }

    pub fn boolean(name: &str) -> Self {
        Self::new(name, ColumnType::Boolean)
    }

    pub fn double(name: &str) -> Self {
        Self::new(name, ColumnType::Double)
    }

    pub fn uuid(name: &str) -> Self {
        Self::new(name, ColumnType::Uuid)
    }

    pub fn timestamp(name: &str) -> Self {
        Self::new(name, ColumnType::Timestamp)
    }

    pub fn json(name: &str) -> Self {
        Self::new(name, ColumnType::Json)
    }

    /// Make the column part of the primary key (implies NOT NULL)
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_value(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }

    /// The auto-increment integer primary key attached by `use_id`
    pub fn auto_id() -> Self {
        Self {
            primary_key: true,
            auto_increment: true,
            origin: ColumnOrigin::Convention,
            ..Self::integer(ID_COLUMN)
        }
    }

    /// The creation timestamp attached by `use_created_at`
    pub fn created_at() -> Self {
        Self {
            default: Some(ColumnDefault::CurrentTimestamp),
            origin: ColumnOrigin::Convention,
            ..Self::timestamp(CREATED_AT_COLUMN)
        }
    }

    /// The update timestamp attached by `use_updated_at`
    pub fn updated_at() -> Self {
        Self {
            default: Some(ColumnDefault::CurrentTimestamp),
            on_update: Some(ColumnDefault::CurrentTimestamp),
            origin: ColumnOrigin::Convention,
            ..Self::timestamp(UPDATED_AT_COLUMN)
        }
    }

    pub fn is_convention(&self) -> bool {
        self.origin == ColumnOrigin::Convention
    }
}
