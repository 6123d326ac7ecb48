//! Primary Key System - Key values addressed by repositories
//!
//! Supports integer, UUID and composite keys. A key is mapped onto a
//! schema's primary-key columns with [`PrimaryKey::bindings`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backends::DatabaseValue;
use crate::error::{ModelError, ModelResult};
use crate::schema::{ColumnDef, TableSchema};

/// Primary key values accepted by repositories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PrimaryKey {
    /// Auto-incrementing integer primary key
    Integer(i64),
    /// UUID primary key
    Uuid(Uuid),
    /// Composite primary key, one value per key column
    Composite(#[serde(with = "composite_serde")] Vec<(String, DatabaseValue)>),
}

impl std::fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrimaryKey::Integer(id) => write!(f, "{}", id),
            PrimaryKey::Uuid(id) => write!(f, "{}", id),
            PrimaryKey::Composite(fields) => {
                let pairs: Vec<String> = fields.iter().map(|(k, v)| format!("{}:{}", k, v)).collect();
                write!(f, "{}", pairs.join(","))
            }
        }
    }
}

impl From<i64> for PrimaryKey {
    fn from(id: i64) -> Self {
        PrimaryKey::Integer(id)
    }
}

impl From<Uuid> for PrimaryKey {
    fn from(id: Uuid) -> Self {
        PrimaryKey::Uuid(id)
    }
}

impl PrimaryKey {
    /// Build a composite key from `(column, value)` pairs
    pub fn composite<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<DatabaseValue>,
    {
        PrimaryKey::Composite(fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Extract as i64 if this is an Integer primary key
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PrimaryKey::Integer(id) => Some(*id),
            _ => None,
        }
    }

    /// Extract as UUID if this is a UUID primary key
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            PrimaryKey::Uuid(id) => Some(*id),
            _ => None,
        }
    }

    /// Check if this is a valid (non-default) primary key
    pub fn is_valid(&self) -> bool {
        match self {
            PrimaryKey::Integer(id) => *id > 0,
            PrimaryKey::Uuid(uuid) => !uuid.is_nil(),
            PrimaryKey::Composite(fields) => !fields.is_empty() && fields.iter().all(|(_, v)| !v.is_null()),
        }
    }

    /// Map the key onto `schema`'s primary-key columns.
    ///
    /// Single-value keys bind to the one key column. Composite keys must
    /// name every key column exactly once; they are returned in the schema's
    /// column order.
    pub fn bindings(&self, schema: &TableSchema) -> ModelResult<Vec<(String, DatabaseValue)>> {
        let key_columns = schema.primary_key_columns();

        match self {
            PrimaryKey::Integer(id) => single_binding(schema, &key_columns, DatabaseValue::Int64(*id)),
            PrimaryKey::Uuid(id) => single_binding(schema, &key_columns, DatabaseValue::Uuid(*id)),
            PrimaryKey::Composite(fields) => {
                if fields.len() != key_columns.len() {
                    return Err(ModelError::InvalidKey(format!(
                        "'{}' has {} key columns, got {} values",
                        schema.name(),
                        key_columns.len(),
                        fields.len()
                    )));
                }
                key_columns
                    .iter()
                    .map(|column| {
                        fields
                            .iter()
                            .find(|(name, _)| *name == column.name)
                            .map(|(name, value)| (name.clone(), value.clone()))
                            .ok_or_else(|| {
                                ModelError::InvalidKey(format!(
                                    "composite key for '{}' is missing '{}'",
                                    schema.name(),
                                    column.name
                                ))
                            })
                    })
                    .collect()
            }
        }
    }
}

fn single_binding(
    schema: &TableSchema,
    key_columns: &[&ColumnDef],
    value: DatabaseValue,
) -> ModelResult<Vec<(String, DatabaseValue)>> {
    match key_columns {
        [column] => Ok(vec![(column.name.clone(), value)]),
        _ => Err(ModelError::InvalidKey(format!(
            "'{}' has {} key columns, got single key {}",
            schema.name(),
            key_columns.len(),
            value
        ))),
    }
}

mod composite_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value as JsonValue;

    use crate::backends::DatabaseValue;

    pub fn serialize<S: Serializer>(fields: &[(String, DatabaseValue)], serializer: S) -> Result<S::Ok, S::Error> {
        let map: serde_json::Map<String, JsonValue> =
            fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect();
        map.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<(String, DatabaseValue)>, D::Error> {
        let map = serde_json::Map::<String, JsonValue>::deserialize(deserializer)?;
        Ok(map.into_iter().map(|(k, v)| (k, DatabaseValue::from_json(v))).collect())
    }
}
