//! Statement Builder - Renders repository statements against a table schema
//!
//! Every column a statement mentions is looked up in the schema first, so a
//! filter or ordering on a column the model does not have fails with
//! [`ModelError::AttributeNotFound`] before any SQL reaches the database.

use super::types::*;
use crate::backends::{DatabaseValue, SqlDialect};
use crate::error::{ModelError, ModelResult};
use crate::schema::{ColumnDef, TableSchema};

/// Rendered SQL with its bound parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<DatabaseValue>,
}

/// Renders statements for one table in one dialect
#[derive(Debug, Clone, Copy)]
pub struct StatementBuilder<'s> {
    schema: &'s TableSchema,
    dialect: SqlDialect,
}

impl<'s> StatementBuilder<'s> {
    pub fn new(schema: &'s TableSchema, dialect: SqlDialect) -> Self {
        Self { schema, dialect }
    }

    /// SELECT every schema column
    pub fn select(
        &self,
        filters: &[Filter],
        order_by: &[OrderBy],
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> ModelResult<Statement> {
        let columns: Vec<String> = self
            .schema
            .columns()
            .iter()
            .map(|c| self.dialect.quote_identifier(&c.name))
            .collect();

        let mut sql = format!("SELECT {} FROM {}", columns.join(", "), self.table());
        let mut params = Vec::new();
        self.push_where(&mut sql, &mut params, filters)?;
        self.push_order_by(&mut sql, order_by)?;

        match (limit, offset) {
            (Some(limit), _) => sql.push_str(&format!(" LIMIT {}", limit)),
            // MySQL and SQLite only accept OFFSET after a LIMIT
            (None, Some(_)) => {
                if let Some(unbounded) = self.dialect.unbounded_limit() {
                    sql.push_str(&format!(" LIMIT {}", unbounded));
                }
            }
            (None, None) => {}
        }
        if let Some(offset) = offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        Ok(Statement { sql, params })
    }

    /// SELECT COUNT(*)
    pub fn count(&self, filters: &[Filter]) -> ModelResult<Statement> {
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.table());
        let mut params = Vec::new();
        self.push_where(&mut sql, &mut params, filters)?;
        Ok(Statement { sql, params })
    }

    /// INSERT the given column values, returning the stored row when the
    /// dialect supports it
    pub fn insert(&self, values: &[(String, DatabaseValue)]) -> ModelResult<Statement> {
        let returning = if self.dialect.supports_returning() { " RETURNING *" } else { "" };
        if values.is_empty() {
            let sql = match self.dialect {
                SqlDialect::MySQL => format!("INSERT INTO {} () VALUES ()", self.table()),
                SqlDialect::PostgreSQL | SqlDialect::SQLite => {
                    format!("INSERT INTO {} DEFAULT VALUES{}", self.table(), returning)
                }
            };
            return Ok(Statement { sql, params: Vec::new() });
        }

        let mut columns = Vec::with_capacity(values.len());
        let mut placeholders = Vec::with_capacity(values.len());
        let mut params = Vec::with_capacity(values.len());
        for (column, value) in values {
            let (def, quoted) = self.resolve(column)?;
            columns.push(quoted);
            placeholders.push(self.bind(def, value, &mut params));
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}){}",
            self.table(),
            columns.join(", "),
            placeholders.join(", "),
            returning
        );
        Ok(Statement { sql, params })
    }

    /// UPDATE the given column values on rows matching `filters`
    pub fn update(&self, values: &[(String, DatabaseValue)], filters: &[Filter]) -> ModelResult<Statement> {
        if values.is_empty() {
            return Err(ModelError::Query(format!(
                "UPDATE on '{}' without any column to set",
                self.schema.name()
            )));
        }

        let mut assignments = Vec::with_capacity(values.len());
        let mut params = Vec::with_capacity(values.len() + filters.len());
        for (column, value) in values {
            let (def, quoted) = self.resolve(column)?;
            let placeholder = self.bind(def, value, &mut params);
            assignments.push(format!("{} = {}", quoted, placeholder));
        }

        let mut sql = format!("UPDATE {} SET {}", self.table(), assignments.join(", "));
        self.push_where(&mut sql, &mut params, filters)?;
        Ok(Statement { sql, params })
    }

    /// DELETE rows matching `filters`
    pub fn delete(&self, filters: &[Filter]) -> ModelResult<Statement> {
        let mut sql = format!("DELETE FROM {}", self.table());
        let mut params = Vec::new();
        self.push_where(&mut sql, &mut params, filters)?;
        Ok(Statement { sql, params })
    }

    fn table(&self) -> String {
        self.dialect.quote_identifier(self.schema.name())
    }

    fn column(&self, name: &str) -> ModelResult<String> {
        self.resolve(name).map(|(_, quoted)| quoted)
    }

    fn resolve(&self, name: &str) -> ModelResult<(&'s ColumnDef, String)> {
        let column = self.schema.require_column(name)?;
        Ok((column, self.dialect.quote_identifier(&column.name)))
    }

    /// Push `value` and return its placeholder. A NULL carries no type of
    /// its own, so PostgreSQL gets an explicit cast to the column type.
    fn bind(&self, column: &ColumnDef, value: &DatabaseValue, params: &mut Vec<DatabaseValue>) -> String {
        let placeholder = self.dialect.parameter_placeholder(params.len());
        params.push(value.clone());
        if value.is_null() && self.dialect == SqlDialect::PostgreSQL {
            format!("{}::{}", placeholder, column.column_type.sql_type(self.dialect))
        } else {
            placeholder
        }
    }

    fn push_where(&self, sql: &mut String, params: &mut Vec<DatabaseValue>, filters: &[Filter]) -> ModelResult<()> {
        if filters.is_empty() {
            return Ok(());
        }

        let mut clauses = Vec::with_capacity(filters.len());
        for filter in filters {
            let (def, column) = self.resolve(&filter.column)?;
            let clause = match filter.operator {
                QueryOperator::IsNull | QueryOperator::IsNotNull => {
                    format!("{} {}", column, filter.operator)
                }
                QueryOperator::In if filter.values.is_empty() => {
                    // IN () is not valid SQL; an empty set matches nothing
                    "1 = 0".to_string()
                }
                QueryOperator::In => {
                    let placeholders: Vec<String> = filter
                        .values
                        .iter()
                        .map(|value| self.bind(def, value, params))
                        .collect();
                    format!("{} IN ({})", column, placeholders.join(", "))
                }
                operator => {
                    let value = filter.values.first().ok_or_else(|| {
                        ModelError::Query(format!("{} filter on '{}' has no value", operator, filter.column))
                    })?;
                    let placeholder = self.bind(def, value, params);
                    format!("{} {} {}", column, operator, placeholder)
                }
            };
            clauses.push(clause);
        }

        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
        Ok(())
    }

    fn push_order_by(&self, sql: &mut String, order_by: &[OrderBy]) -> ModelResult<()> {
        if order_by.is_empty() {
            return Ok(());
        }
        let clauses = order_by
            .iter()
            .map(|order| Ok(format!("{} {}", self.column(&order.column)?, order.direction)))
            .collect::<ModelResult<Vec<_>>>()?;
        sql.push_str(" ORDER BY ");
        sql.push_str(&clauses.join(", "));
        Ok(())
    }
}
