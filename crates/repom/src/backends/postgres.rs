//! PostgreSQL session backed by an sqlx pool

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Pool, Postgres, Row, TypeInfo, ValueRef};

use super::core::*;
use crate::config::DatabaseConfig;
use crate::error::{ModelError, ModelResult};

/// PostgreSQL session
#[derive(Clone)]
pub struct PostgresPool {
    pool: Arc<Pool<Postgres>>,
}

impl PostgresPool {
    /// Wrap an existing sqlx pool owned by the application
    pub fn new(pool: Arc<Pool<Postgres>>) -> Self {
        Self { pool }
    }

    /// Open a pool according to `config`
    pub async fn connect(config: &DatabaseConfig) -> ModelResult<Self> {
        config.validate()?;
        if SqlDialect::from_url(&config.url)? != SqlDialect::PostgreSQL {
            return Err(ModelError::Configuration(format!(
                "Not a PostgreSQL URL: {}",
                config.redacted_url()
            )));
        }

        tracing::debug!(
            "Creating database pool for {} (max={}, min={}, timeout={}s)",
            config.redacted_url(),
            config.max_connections,
            config.min_connections,
            config.acquire_timeout_secs
        );

        let mut options = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .test_before_acquire(config.test_before_acquire);

        if let Some(idle_timeout) = config.idle_timeout_secs {
            options = options.idle_timeout(Duration::from_secs(idle_timeout));
        }
        if let Some(max_lifetime) = config.max_lifetime_secs {
            options = options.max_lifetime(Duration::from_secs(max_lifetime));
        }

        let pool = options.connect(&config.url).await.map_err(|e| {
            tracing::error!("Failed to create database pool: {}", e);
            ModelError::Connection(format!("Failed to create database pool: {}", e))
        })?;

        tracing::info!("Database pool created with {} max connections", config.max_connections);
        Ok(Self::new(Arc::new(pool)))
    }

    /// The underlying sqlx pool
    pub fn inner(&self) -> &Pool<Postgres> {
        &self.pool
    }

    fn build_query<'q>(sql: &'q str, params: &[DatabaseValue]) -> Query<'q, Postgres, PgArguments> {
        params
            .iter()
            .fold(sqlx::query(sql), |query, param| bind_database_value(query, param))
    }
}

#[async_trait]
impl DatabasePool for PostgresPool {
    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> ModelResult<u64> {
        let result = Self::build_query(sql, params).execute(&*self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn fetch_all(&self, sql: &str, params: &[DatabaseValue]) -> ModelResult<Vec<Box<dyn DatabaseRow>>> {
        let rows = Self::build_query(sql, params).fetch_all(&*self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|row| Box::new(PostgresRow::new(row)) as Box<dyn DatabaseRow>)
            .collect())
    }

    async fn fetch_optional(&self, sql: &str, params: &[DatabaseValue]) -> ModelResult<Option<Box<dyn DatabaseRow>>> {
        let row = Self::build_query(sql, params).fetch_optional(&*self.pool).await?;
        Ok(row.map(|r| Box::new(PostgresRow::new(r)) as Box<dyn DatabaseRow>))
    }

    fn sql_dialect(&self) -> SqlDialect {
        SqlDialect::PostgreSQL
    }

    async fn health_check(&self) -> ModelResult<Duration> {
        let start = Instant::now();
        sqlx::query("SELECT 1")
            .execute(&*self.pool)
            .await
            .map_err(|e| ModelError::Connection(format!("Health check failed: {}", e)))?;
        let elapsed = start.elapsed();
        tracing::debug!("Database health check passed in {:?}", elapsed);
        Ok(elapsed)
    }

    async fn close(&self) -> ModelResult<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// PostgreSQL row
pub struct PostgresRow {
    row: PgRow,
}

impl PostgresRow {
    pub fn new(row: PgRow) -> Self {
        Self { row }
    }
}

impl DatabaseRow for PostgresRow {
    fn get_by_index(&self, index: usize) -> ModelResult<DatabaseValue> {
        if index >= self.row.len() {
            return Err(ModelError::ColumnNotFound(format!("index {}", index)));
        }
        postgres_value_to_database_value(&self.row, index)
    }

    fn get_by_name(&self, name: &str) -> ModelResult<DatabaseValue> {
        let index = self
            .row
            .columns()
            .iter()
            .position(|col| col.name() == name)
            .ok_or_else(|| ModelError::ColumnNotFound(name.to_string()))?;
        postgres_value_to_database_value(&self.row, index)
    }

    fn column_names(&self) -> Vec<String> {
        self.row.columns().iter().map(|col| col.name().to_string()).collect()
    }

    fn column_count(&self) -> usize {
        self.row.len()
    }
}

fn bind_database_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &DatabaseValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        // typed by the `$n::type` cast the statement builder puts on NULLs
        DatabaseValue::Null => query.bind(Option::<String>::None),
        DatabaseValue::Bool(b) => query.bind(*b),
        DatabaseValue::Int32(i) => query.bind(*i),
        DatabaseValue::Int64(i) => query.bind(*i),
        DatabaseValue::Float64(f) => query.bind(*f),
        DatabaseValue::String(s) => query.bind(s.clone()),
        DatabaseValue::Bytes(b) => query.bind(b.clone()),
        DatabaseValue::Uuid(u) => query.bind(*u),
        DatabaseValue::DateTime(dt) => query.bind(*dt),
        DatabaseValue::Date(d) => query.bind(*d),
        DatabaseValue::Json(j) => query.bind(j.clone()),
    }
}

fn postgres_value_to_database_value(row: &PgRow, index: usize) -> ModelResult<DatabaseValue> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(DatabaseValue::Null);
    }
    let type_name = row.columns()[index].type_info().name().to_string();

    let value = match type_name.as_str() {
        "BOOL" => DatabaseValue::Bool(row.try_get(index)?),
        "INT2" => DatabaseValue::Int32(row.try_get::<i16, _>(index)? as i32),
        "INT4" => DatabaseValue::Int32(row.try_get(index)?),
        "INT8" => DatabaseValue::Int64(row.try_get(index)?),
        "FLOAT4" => DatabaseValue::Float64(row.try_get::<f32, _>(index)? as f64),
        "FLOAT8" => DatabaseValue::Float64(row.try_get(index)?),
        "BYTEA" => DatabaseValue::Bytes(row.try_get(index)?),
        "UUID" => DatabaseValue::Uuid(row.try_get(index)?),
        "TIMESTAMPTZ" => DatabaseValue::DateTime(row.try_get(index)?),
        "TIMESTAMP" => {
            let naive: chrono::NaiveDateTime = row.try_get(index)?;
            DatabaseValue::DateTime(naive.and_utc())
        }
        "DATE" => DatabaseValue::Date(row.try_get(index)?),
        "JSON" | "JSONB" => DatabaseValue::Json(row.try_get::<JsonValue, _>(index)?),
        _ => DatabaseValue::String(row.try_get(index).map_err(|e| {
            ModelError::Database(format!("Unsupported column type '{}': {}", type_name, e))
        })?),
    };
    Ok(value)
}
