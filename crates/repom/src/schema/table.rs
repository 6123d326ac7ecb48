//! Table Schema - Resolves a model's flags and declared columns into its
//! final column set
//!
//! [`TableSchema::build`] is the only place convention columns are attached.
//! Resolution order:
//!
//! 1. `use_composite_pk`: no `id` column may exist; one that slipped in
//!    (e.g. copied from a parent's declared columns) is removed.
//! 2. otherwise `use_id`: exactly one auto-increment integer `id` primary key.
//! 3. `use_created_at` / `use_updated_at`: timestamp columns, regardless of
//!    the key settings.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::column::{ColumnDef, CREATED_AT_COLUMN, ID_COLUMN, UPDATED_AT_COLUMN};
use crate::error::{ModelError, ModelResult};
use crate::model::ModelFlags;
use crate::security::validate_identifier;

/// Resolved table definition of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    name: String,
    flags: ModelFlags,
    columns: Vec<ColumnDef>,
}

impl TableSchema {
    /// Build the schema of `table` from its flags and declared columns
    pub fn build(table: &str, flags: ModelFlags, declared: Vec<ColumnDef>) -> ModelResult<Self> {
        validate_identifier(table)
            .map_err(|e| ModelError::Schema(format!("table '{}': {}", table, e)))?;

        let mut seen = HashSet::new();
        for column in &declared {
            validate_identifier(&column.name)
                .map_err(|e| ModelError::Schema(format!("{}.{}: {}", table, column.name, e)))?;
            if !seen.insert(column.name.as_str()) {
                return Err(ModelError::Schema(format!(
                    "column '{}' declared twice on '{}'",
                    column.name, table
                )));
            }
        }

        let mut columns = Vec::with_capacity(declared.len() + 3);

        if flags.use_composite_pk {
            for column in declared {
                if column.name == ID_COLUMN {
                    tracing::warn!(
                        table,
                        "dropping '{}' column from composite-key model",
                        ID_COLUMN
                    );
                    continue;
                }
                columns.push(column);
            }
        } else if flags.use_id {
            columns.push(ColumnDef::auto_id());
            for column in declared {
                if column.name == ID_COLUMN {
                    tracing::debug!(table, "declared '{}' replaced by auto-increment key", ID_COLUMN);
                    continue;
                }
                columns.push(column);
            }
        } else {
            columns.extend(declared);
        }

        if flags.use_created_at {
            attach_if_missing(&mut columns, ColumnDef::created_at(), table);
        }
        if flags.use_updated_at {
            attach_if_missing(&mut columns, ColumnDef::updated_at(), table);
        }

        if !columns.iter().any(|c| c.primary_key) {
            return Err(ModelError::MissingPrimaryKey(table.to_string()));
        }

        tracing::debug!(
            table,
            columns = columns.len(),
            composite = flags.use_composite_pk,
            "built table schema"
        );

        Ok(Self {
            name: table.to_string(),
            flags,
            columns,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The flags this schema was resolved from
    pub fn flags(&self) -> ModelFlags {
        self.flags
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Look up a column, failing the way attribute access on the model would
    pub fn require_column(&self, name: &str) -> ModelResult<&ColumnDef> {
        self.column(name)
            .ok_or_else(|| ModelError::attribute_not_found(&self.name, name))
    }

    /// Primary-key columns in declaration order
    pub fn primary_key_columns(&self) -> Vec<&ColumnDef> {
        self.columns.iter().filter(|c| c.primary_key).collect()
    }

    pub fn is_composite_key(&self) -> bool {
        self.primary_key_columns().len() > 1
    }

    /// The database-generated key column, if any
    pub fn auto_increment_column(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.auto_increment)
    }

    /// Whether `created_at` is managed by the timestamp convention; a
    /// declared column of that name on a model without the flag is not
    pub fn has_created_at(&self) -> bool {
        self.flags.use_created_at && self.has_column(CREATED_AT_COLUMN)
    }

    pub fn has_updated_at(&self) -> bool {
        self.flags.use_updated_at && self.has_column(UPDATED_AT_COLUMN)
    }
}

fn attach_if_missing(columns: &mut Vec<ColumnDef>, column: ColumnDef, table: &str) {
    if columns.iter().any(|c| c.name == column.name) {
        tracing::debug!(table, "keeping declared '{}' column", column.name);
        return;
    }
    columns.push(column);
}
