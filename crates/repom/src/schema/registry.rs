//! Process-wide schema cache
//!
//! A model's schema is resolved the first time it is needed and shared for
//! the rest of the process. Failed builds are not cached.

use std::any::TypeId;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

use super::table::TableSchema;
use crate::error::ModelResult;
use crate::model::Model;

static SCHEMAS: Lazy<DashMap<TypeId, Arc<TableSchema>>> = Lazy::new(DashMap::new);

/// Resolved schema of `M`, built on first use
pub fn schema_for<M: Model>() -> ModelResult<Arc<TableSchema>> {
    let key = TypeId::of::<M>();
    if let Some(schema) = SCHEMAS.get(&key) {
        return Ok(Arc::clone(schema.value()));
    }

    let built = Arc::new(TableSchema::build(
        M::table_name(),
        M::flags(),
        M::declared_columns(),
    )?);

    // Another thread may have raced us; keep whichever landed first.
    let schema = SCHEMAS.entry(key).or_insert(built);
    Ok(Arc::clone(schema.value()))
}

/// Table names of every schema built so far
pub fn registered_tables() -> Vec<String> {
    let mut tables: Vec<String> = SCHEMAS.iter().map(|entry| entry.name().to_string()).collect();
    tables.sort();
    tables
}
