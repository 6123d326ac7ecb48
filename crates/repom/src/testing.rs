//! Test doubles for the database session
//!
//! [`MockPool`] records every statement it receives and answers from a queue
//! of canned results, so repository behaviour can be checked without a
//! database. Enabled for this crate's tests and behind the `testing`
//! feature for downstream crates.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::backends::{DatabasePool, DatabaseRow, DatabaseValue, MemoryRow, SqlDialect};
use crate::error::{ModelError, ModelResult};

/// Canned result row
pub type MockDatabaseRow = MemoryRow;

/// A statement received by [`MockPool`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    pub sql: String,
    pub params: Vec<DatabaseValue>,
}

#[derive(Debug)]
enum MockResult {
    Rows(Vec<MockDatabaseRow>),
    Affected(u64),
    Error(ModelError),
}

/// Recording session that replays queued results in order.
///
/// With nothing queued, queries return no rows and statements affect none.
#[derive(Debug)]
pub struct MockPool {
    dialect: SqlDialect,
    statements: Mutex<Vec<RecordedStatement>>,
    results: Mutex<VecDeque<MockResult>>,
}

impl Default for MockPool {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPool {
    pub fn new() -> Self {
        Self::with_dialect(SqlDialect::PostgreSQL)
    }

    pub fn with_dialect(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            statements: Mutex::new(Vec::new()),
            results: Mutex::new(VecDeque::new()),
        }
    }

    /// Queue a row set for the next query
    pub fn push_rows(&self, rows: Vec<MockDatabaseRow>) -> &Self {
        lock(&self.results).push_back(MockResult::Rows(rows));
        self
    }

    /// Queue an affected-row count for the next statement
    pub fn push_affected(&self, count: u64) -> &Self {
        lock(&self.results).push_back(MockResult::Affected(count));
        self
    }

    /// Queue a failure for the next call
    pub fn push_error(&self, error: ModelError) -> &Self {
        lock(&self.results).push_back(MockResult::Error(error));
        self
    }

    /// Every statement received so far
    pub fn statements(&self) -> Vec<RecordedStatement> {
        lock(&self.statements).clone()
    }

    pub fn last_statement(&self) -> Option<RecordedStatement> {
        lock(&self.statements).last().cloned()
    }

    pub fn statement_count(&self) -> usize {
        lock(&self.statements).len()
    }

    fn record(&self, sql: &str, params: &[DatabaseValue]) -> Option<MockResult> {
        lock(&self.statements).push(RecordedStatement {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        lock(&self.results).pop_front()
    }

    fn rows(&self, sql: &str, params: &[DatabaseValue]) -> ModelResult<Vec<MockDatabaseRow>> {
        match self.record(sql, params) {
            None | Some(MockResult::Affected(_)) => Ok(Vec::new()),
            Some(MockResult::Rows(rows)) => Ok(rows),
            Some(MockResult::Error(err)) => Err(err),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl DatabasePool for MockPool {
    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> ModelResult<u64> {
        match self.record(sql, params) {
            None => Ok(0),
            Some(MockResult::Affected(count)) => Ok(count),
            Some(MockResult::Rows(rows)) => Ok(rows.len() as u64),
            Some(MockResult::Error(err)) => Err(err),
        }
    }

    async fn fetch_all(&self, sql: &str, params: &[DatabaseValue]) -> ModelResult<Vec<Box<dyn DatabaseRow>>> {
        Ok(self
            .rows(sql, params)?
            .into_iter()
            .map(|row| Box::new(row) as Box<dyn DatabaseRow>)
            .collect())
    }

    async fn fetch_optional(&self, sql: &str, params: &[DatabaseValue]) -> ModelResult<Option<Box<dyn DatabaseRow>>> {
        Ok(self
            .rows(sql, params)?
            .into_iter()
            .next()
            .map(|row| Box::new(row) as Box<dyn DatabaseRow>))
    }

    fn sql_dialect(&self) -> SqlDialect {
        self.dialect
    }

    async fn health_check(&self) -> ModelResult<Duration> {
        Ok(Duration::ZERO)
    }

    async fn close(&self) -> ModelResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::DatabaseRowExt;

    #[test]
    fn test_mock_row_access() {
        let row = MockDatabaseRow::new().with("id", 1i64).with("name", "ada").with("id", 2i64);
        assert_eq!(row.column_names(), vec!["id", "name"]);
        assert_eq!(row.get_by_index(0).unwrap(), DatabaseValue::Int64(2));
        assert_eq!(row.get::<String>("name").unwrap(), "ada");
        assert_eq!(row.try_get::<String>("missing").unwrap(), None);
        assert!(matches!(row.get_by_name("missing"), Err(ModelError::ColumnNotFound(_))));
    }

    #[tokio::test]
    async fn test_mock_pool_records_and_replays() {
        let pool = MockPool::new();
        pool.push_rows(vec![MockDatabaseRow::new().with("n", 1i64)])
            .push_affected(3)
            .push_error(ModelError::Database("boom".into()));

        let rows = pool.fetch_all("SELECT 1", &[]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(pool.execute("DELETE", &[DatabaseValue::Int64(5)]).await.unwrap(), 3);
        assert!(pool.fetch_optional("SELECT 2", &[]).await.is_err());
        assert!(pool.fetch_optional("SELECT 3", &[]).await.unwrap().is_none());

        assert_eq!(pool.statement_count(), 4);
        assert_eq!(pool.statements()[1].params, vec![DatabaseValue::Int64(5)]);
        assert_eq!(pool.last_statement().unwrap().sql, "SELECT 3");
    }
}
