//! Core Model Trait - Base definition for database entities
//!
//! A model states its table, its convention flags and the columns it
//! declares itself. Everything the flags add (the `id` key, timestamps) is
//! resolved by the schema builder, so `from_row` and `to_fields` should work
//! with the columns of [`Model::schema`], not only the declared ones.

use std::sync::Arc;

use super::flags::ModelFlags;
use super::primary_key::PrimaryKey;
use crate::backends::{DatabaseRow, DatabaseValue};
use crate::error::{ModelError, ModelResult};
use crate::query::OrderBy;
use crate::relationships::Relationship;
use crate::schema::{schema_for, ColumnDef, TableSchema, ID_COLUMN};

/// Core trait for database models
pub trait Model: Send + Sync + Sized + 'static {
    /// Table name for this model
    fn table_name() -> &'static str;

    /// Convention flags; plain base models get an `id` key and no timestamps
    fn flags() -> ModelFlags {
        ModelFlags::BASE
    }

    /// Columns the model declares itself, in order
    fn declared_columns() -> Vec<ColumnDef>;

    /// Ordering used by [`BaseRepository::find`](crate::repository::BaseRepository::find).
    ///
    /// Assumes an `id` column. Composite-key models without one must
    /// override this or query with an explicit ordering.
    fn default_ordering() -> Vec<OrderBy> {
        vec![OrderBy::asc(ID_COLUMN)]
    }

    /// Resolved schema, built once per process
    fn schema() -> ModelResult<Arc<TableSchema>> {
        schema_for::<Self>()
    }

    /// Declared associations
    fn relationships() -> Vec<Relationship> {
        Vec::new()
    }

    /// Create a model instance from a database row
    fn from_row(row: &dyn DatabaseRow) -> ModelResult<Self>;

    /// Column values of this instance, keyed by column name.
    ///
    /// Columns left out are not written on insert or update.
    fn to_fields(&self) -> Vec<(String, DatabaseValue)>;

    /// Primary key of this instance, read from its fields
    fn primary_key(&self) -> ModelResult<PrimaryKey> {
        let schema = Self::schema()?;
        let fields = self.to_fields();
        let key_columns = schema.primary_key_columns();

        let values = key_columns
            .iter()
            .map(|column| {
                fields
                    .iter()
                    .find(|(name, _)| *name == column.name)
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .ok_or_else(|| ModelError::MissingPrimaryKey(format!("{}.{}", schema.name(), column.name)))
            })
            .collect::<ModelResult<Vec<_>>>()?;

        if let Some((name, _)) = values.iter().find(|(_, value)| value.is_null()) {
            return Err(ModelError::MissingPrimaryKey(format!("{}.{}", schema.name(), name)));
        }

        match values.as_slice() {
            [(_, DatabaseValue::Int64(id))] => Ok(PrimaryKey::Integer(*id)),
            [(_, DatabaseValue::Int32(id))] => Ok(PrimaryKey::Integer(*id as i64)),
            [(_, DatabaseValue::Uuid(id))] => Ok(PrimaryKey::Uuid(*id)),
            _ => Ok(PrimaryKey::Composite(values)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::DatabaseRowExt;
    use crate::testing::MockDatabaseRow;

    #[derive(Debug, PartialEq)]
    struct Tag {
        id: Option<i64>,
        label: String,
    }

    impl Model for Tag {
        fn table_name() -> &'static str {
            "core_trait_tags"
        }

        fn declared_columns() -> Vec<ColumnDef> {
            vec![ColumnDef::text("label")]
        }

        fn from_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
            Ok(Tag {
                id: row.try_get("id")?,
                label: row.get("label")?,
            })
        }

        fn to_fields(&self) -> Vec<(String, DatabaseValue)> {
            vec![
                ("id".to_string(), self.id.into()),
                ("label".to_string(), self.label.clone().into()),
            ]
        }
    }

    #[derive(Debug)]
    struct Membership {
        group_id: i64,
        member_id: i64,
    }

    impl Model for Membership {
        fn table_name() -> &'static str {
            "core_trait_memberships"
        }

        fn flags() -> ModelFlags {
            ModelFlags::AUTO.composite_pk()
        }

        fn declared_columns() -> Vec<ColumnDef> {
            vec![
                ColumnDef::integer("group_id").primary_key(),
                ColumnDef::integer("member_id").primary_key(),
            ]
        }

        fn from_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
            Ok(Membership {
                group_id: row.get("group_id")?,
                member_id: row.get("member_id")?,
            })
        }

        fn to_fields(&self) -> Vec<(String, DatabaseValue)> {
            vec![
                ("group_id".to_string(), self.group_id.into()),
                ("member_id".to_string(), self.member_id.into()),
            ]
        }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Tag::flags(), ModelFlags::BASE);
        assert_eq!(Tag::default_ordering(), vec![OrderBy::asc("id")]);
        assert!(Tag::relationships().is_empty());
        assert_eq!(Tag::schema().unwrap().column_names(), vec!["id", "label"]);
    }

    #[test]
    fn test_schema_is_shared() {
        let first = Tag::schema().unwrap();
        let second = Tag::schema().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_from_row() {
        let row = MockDatabaseRow::new()
            .with("id", 4i64)
            .with("label", "rust");
        let tag = Tag::from_row(&row).unwrap();
        assert_eq!(tag, Tag { id: Some(4), label: "rust".to_string() });
    }

    #[test]
    fn test_primary_key_from_fields() {
        let tag = Tag { id: Some(4), label: "rust".to_string() };
        assert_eq!(tag.primary_key().unwrap(), PrimaryKey::Integer(4));

        let unsaved = Tag { id: None, label: "new".to_string() };
        assert!(matches!(unsaved.primary_key(), Err(ModelError::MissingPrimaryKey(_))));

        let membership = Membership { group_id: 1, member_id: 2 };
        assert_eq!(
            membership.primary_key().unwrap(),
            PrimaryKey::composite([("group_id", 1i64), ("member_id", 2i64)])
        );
    }
}
