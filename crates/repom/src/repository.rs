//! Base Repository - Generic CRUD over one model type
//!
//! A repository wraps a session and a model type. It renders statements
//! against the model's resolved schema and hands them to the session;
//! driver errors propagate unchanged and nothing is retried.
//!
//! [`BaseRepository::find`] orders by the model's default ordering, which is
//! `id ASC` unless the model overrides it. On a composite-key model without
//! an `id` column that ordering fails with
//! [`ModelError::AttributeNotFound`] before any SQL is sent; use
//! [`BaseRepository::find_ordered`] or override
//! [`Model::default_ordering`].

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;

use crate::backends::{DatabasePool, DatabaseValue, MemoryRow};
use crate::error::{ModelError, ModelResult};
use crate::model::{Model, PrimaryKey};
use crate::query::{Filter, FindOptions, OrderBy, Statement, StatementBuilder};
use crate::schema::{TableSchema, CREATED_AT_COLUMN, UPDATED_AT_COLUMN};

/// CRUD helper for model `M`
pub struct BaseRepository<M: Model> {
    session: Arc<dyn DatabasePool>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Clone for BaseRepository<M> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            _model: PhantomData,
        }
    }
}

impl<M: Model> std::fmt::Debug for BaseRepository<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseRepository")
            .field("table", &M::table_name())
            .field("dialect", &self.session.sql_dialect())
            .finish()
    }
}

impl<M: Model> BaseRepository<M> {
    pub fn new(session: Arc<dyn DatabasePool>) -> Self {
        Self {
            session,
            _model: PhantomData,
        }
    }

    /// The session this repository sends statements to
    pub fn session(&self) -> &Arc<dyn DatabasePool> {
        &self.session
    }

    /// Rows matching every filter, in the model's default ordering
    pub async fn find(&self, filters: &[Filter]) -> ModelResult<Vec<M>> {
        self.select(filters, &M::default_ordering(), None, None).await
    }

    /// Rows matching every filter, in the given ordering
    pub async fn find_ordered(&self, filters: &[Filter], order_by: &[OrderBy]) -> ModelResult<Vec<M>> {
        self.select(filters, order_by, None, None).await
    }

    /// Rows matching `options`; an unset ordering uses the default one
    pub async fn find_with(&self, options: FindOptions) -> ModelResult<Vec<M>> {
        let order_by = options.order_by.unwrap_or_else(M::default_ordering);
        self.select(&options.filters, &order_by, options.limit, options.offset)
            .await
    }

    /// First row matching every filter, in the default ordering
    pub async fn find_one(&self, filters: &[Filter]) -> ModelResult<Option<M>> {
        let schema = M::schema()?;
        let stmt = self
            .builder(&schema)
            .select(filters, &M::default_ordering(), Some(1), None)?;
        self.fetch_optional(&stmt).await
    }

    /// Row with primary key `key`
    pub async fn get(&self, key: &PrimaryKey) -> ModelResult<Option<M>> {
        let schema = M::schema()?;
        let filters = key_filters(key, &schema)?;
        let stmt = self.builder(&schema).select(&filters, &[], None, None)?;
        self.fetch_optional(&stmt).await
    }

    /// Row with primary key `key`, or [`ModelError::NotFound`]
    pub async fn get_or_fail(&self, key: &PrimaryKey) -> ModelResult<M> {
        self.get(key)
            .await?
            .ok_or_else(|| ModelError::NotFound(format!("{}({})", M::table_name(), key)))
    }

    pub async fn exists(&self, filters: &[Filter]) -> ModelResult<bool> {
        Ok(self.count(filters).await? > 0)
    }

    pub async fn count(&self, filters: &[Filter]) -> ModelResult<i64> {
        let schema = M::schema()?;
        let stmt = self.builder(&schema).count(filters)?;
        self.log_statement(&stmt);

        let row = self
            .session
            .fetch_optional(&stmt.sql, &stmt.params)
            .await
            .map_err(|e| self.log_failure("count", e))?;

        match row {
            Some(row) => row.get_by_index(0)?.as_i64().ok_or_else(|| {
                ModelError::Query(format!("COUNT on '{}' did not return an integer", M::table_name()))
            }),
            None => Ok(0),
        }
    }

    /// Insert `model` and return the stored row.
    ///
    /// A null or zero auto-increment key is left to the database. Timestamp
    /// columns the model left null are set to the current time. Dialects
    /// without `RETURNING` hand back the values that were written.
    pub async fn create(&self, model: &M) -> ModelResult<M> {
        let schema = M::schema()?;
        let values = insert_values(&schema, model.to_fields());
        let stmt = self.builder(&schema).insert(&values)?;
        self.log_statement(&stmt);

        if !self.session.sql_dialect().supports_returning() {
            self.session
                .execute(&stmt.sql, &stmt.params)
                .await
                .map_err(|e| self.log_failure("create", e))?;
            return M::from_row(&MemoryRow::from_fields(values));
        }

        let row = self
            .session
            .fetch_optional(&stmt.sql, &stmt.params)
            .await
            .map_err(|e| self.log_failure("create", e))?;
        match row {
            Some(row) => M::from_row(row.as_ref()),
            None => Err(ModelError::Database(format!(
                "INSERT into '{}' returned no row",
                M::table_name()
            ))),
        }
    }

    /// Write `model`'s non-key columns to its row and return the affected
    /// row count. `updated_at` is refreshed; `created_at` is never written.
    pub async fn update(&self, model: &M) -> ModelResult<u64> {
        let schema = M::schema()?;
        let key = model.primary_key()?;
        let filters = key_filters(&key, &schema)?;
        let values = update_values(&schema, model.to_fields());

        let stmt = self.builder(&schema).update(&values, &filters)?;
        self.execute(&stmt, "update").await
    }

    /// Delete the row with primary key `key`; true when a row was removed
    pub async fn delete(&self, key: &PrimaryKey) -> ModelResult<bool> {
        let schema = M::schema()?;
        let filters = key_filters(key, &schema)?;
        let stmt = self.builder(&schema).delete(&filters)?;
        Ok(self.execute(&stmt, "delete").await? > 0)
    }

    /// Delete every row matching the filters. At least one filter is
    /// required.
    pub async fn delete_where(&self, filters: &[Filter]) -> ModelResult<u64> {
        if filters.is_empty() {
            return Err(ModelError::Validation(format!(
                "refusing to delete from '{}' without a filter",
                M::table_name()
            )));
        }
        let schema = M::schema()?;
        let stmt = self.builder(&schema).delete(filters)?;
        self.execute(&stmt, "delete_where").await
    }

    fn builder<'s>(&self, schema: &'s TableSchema) -> StatementBuilder<'s> {
        StatementBuilder::new(schema, self.session.sql_dialect())
    }

    async fn select(
        &self,
        filters: &[Filter],
        order_by: &[OrderBy],
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> ModelResult<Vec<M>> {
        let schema = M::schema()?;
        let stmt = self.builder(&schema).select(filters, order_by, limit, offset)?;
        self.log_statement(&stmt);

        let rows = self
            .session
            .fetch_all(&stmt.sql, &stmt.params)
            .await
            .map_err(|e| self.log_failure("find", e))?;

        rows.iter().map(|row| M::from_row(row.as_ref())).collect()
    }

    async fn fetch_optional(&self, stmt: &Statement) -> ModelResult<Option<M>> {
        self.log_statement(stmt);
        let row = self
            .session
            .fetch_optional(&stmt.sql, &stmt.params)
            .await
            .map_err(|e| self.log_failure("get", e))?;
        row.map(|row| M::from_row(row.as_ref())).transpose()
    }

    async fn execute(&self, stmt: &Statement, operation: &str) -> ModelResult<u64> {
        self.log_statement(stmt);
        self.session
            .execute(&stmt.sql, &stmt.params)
            .await
            .map_err(|e| self.log_failure(operation, e))
    }

    fn log_statement(&self, stmt: &Statement) {
        tracing::debug!(
            target: "repom::sql",
            table = M::table_name(),
            params = stmt.params.len(),
            "{}",
            stmt.sql
        );
    }

    fn log_failure(&self, operation: &str, err: ModelError) -> ModelError {
        tracing::error!(table = M::table_name(), operation, "{}", err);
        err
    }
}

fn key_filters(key: &PrimaryKey, schema: &TableSchema) -> ModelResult<Vec<Filter>> {
    Ok(key
        .bindings(schema)?
        .into_iter()
        .map(|(column, value)| Filter::eq(&column, value))
        .collect())
}

fn insert_values(schema: &TableSchema, fields: Vec<(String, DatabaseValue)>) -> Vec<(String, DatabaseValue)> {
    let auto_key = schema.auto_increment_column().map(|c| c.name.as_str());
    let mut values: Vec<(String, DatabaseValue)> = fields
        .into_iter()
        .filter(|(name, value)| {
            let unassigned = value.is_null() || value.as_i64() == Some(0);
            !(Some(name.as_str()) == auto_key && unassigned)
        })
        .collect();

    let now = DatabaseValue::DateTime(Utc::now());
    for (present, column) in [
        (schema.has_created_at(), CREATED_AT_COLUMN),
        (schema.has_updated_at(), UPDATED_AT_COLUMN),
    ] {
        if !present {
            continue;
        }
        match values.iter_mut().find(|(name, _)| name == column) {
            Some((_, value)) if value.is_null() => *value = now.clone(),
            Some(_) => {}
            None => values.push((column.to_string(), now.clone())),
        }
    }
    values
}

fn update_values(schema: &TableSchema, fields: Vec<(String, DatabaseValue)>) -> Vec<(String, DatabaseValue)> {
    let mut values: Vec<(String, DatabaseValue)> = fields
        .into_iter()
        .filter(|(name, _)| {
            let convention_created_at = name == CREATED_AT_COLUMN && schema.has_created_at();
            !convention_created_at && !schema.column(name).map(|c| c.primary_key).unwrap_or(false)
        })
        .collect();

    if schema.has_updated_at() {
        let now = DatabaseValue::DateTime(Utc::now());
        match values.iter_mut().find(|(name, _)| name == UPDATED_AT_COLUMN) {
            Some((_, value)) => *value = now,
            None => values.push((UPDATED_AT_COLUMN.to_string(), now)),
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelFlags;
    use crate::schema::ColumnDef;

    fn posts() -> TableSchema {
        TableSchema::build(
            "posts",
            ModelFlags::BASE.with_timestamps(),
            vec![ColumnDef::text("title")],
        )
        .unwrap()
    }

    fn names(values: &[(String, DatabaseValue)]) -> Vec<&str> {
        values.iter().map(|(name, _)| name.as_str()).collect()
    }

    #[test]
    fn test_insert_values_skip_unassigned_key() {
        let schema = posts();
        for id in [DatabaseValue::Null, DatabaseValue::Int64(0), DatabaseValue::Int32(0)] {
            let values = insert_values(
                &schema,
                vec![("id".to_string(), id), ("title".to_string(), "hello".into())],
            );
            assert_eq!(names(&values), vec!["title", "created_at", "updated_at"]);
        }

        let values = insert_values(&schema, vec![("id".to_string(), DatabaseValue::Int64(12))]);
        assert_eq!(values[0], ("id".to_string(), DatabaseValue::Int64(12)));
    }

    #[test]
    fn test_insert_values_keep_explicit_timestamps() {
        let schema = posts();
        let stamp = DatabaseValue::DateTime(Utc::now() - chrono::Duration::days(3));
        let values = insert_values(
            &schema,
            vec![
                ("created_at".to_string(), stamp.clone()),
                ("updated_at".to_string(), DatabaseValue::Null),
            ],
        );
        assert_eq!(values[0].1, stamp);
        assert!(matches!(values[1].1, DatabaseValue::DateTime(_)));
    }

    #[test]
    fn test_update_values_skip_keys_and_created_at() {
        let schema = posts();
        let stale = DatabaseValue::DateTime(Utc::now() - chrono::Duration::days(3));
        let values = update_values(
            &schema,
            vec![
                ("id".to_string(), DatabaseValue::Int64(1)),
                ("title".to_string(), "edited".into()),
                ("created_at".to_string(), stale.clone()),
                ("updated_at".to_string(), stale.clone()),
            ],
        );
        assert_eq!(names(&values), vec!["title", "updated_at"]);
        assert_ne!(values[1].1, stale);
    }

    #[test]
    fn test_declared_timestamp_columns_are_plain_fields() {
        let schema = TableSchema::build(
            "imports",
            ModelFlags::BASE,
            vec![ColumnDef::timestamp("created_at"), ColumnDef::timestamp("updated_at")],
        )
        .unwrap();
        assert!(!schema.has_created_at());
        assert!(!schema.has_updated_at());

        let stamp = DatabaseValue::DateTime(Utc::now() - chrono::Duration::days(3));
        let fields = vec![
            ("id".to_string(), DatabaseValue::Int64(1)),
            ("created_at".to_string(), stamp.clone()),
            ("updated_at".to_string(), stamp.clone()),
        ];

        let updated = update_values(&schema, fields.clone());
        assert_eq!(names(&updated), vec!["created_at", "updated_at"]);
        assert_eq!(updated[0].1, stamp);
        assert_eq!(updated[1].1, stamp);

        let inserted = insert_values(&schema, fields);
        assert_eq!(inserted[2].1, stamp);
    }
}
