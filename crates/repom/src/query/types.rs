//! Query Types - Filters and orderings accepted by repositories

use std::fmt;

use crate::backends::DatabaseValue;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Like,
    In,
    IsNull,
    IsNotNull,
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOperator::Equal => write!(f, "="),
            QueryOperator::NotEqual => write!(f, "!="),
            QueryOperator::GreaterThan => write!(f, ">"),
            QueryOperator::GreaterThanOrEqual => write!(f, ">="),
            QueryOperator::LessThan => write!(f, "<"),
            QueryOperator::LessThanOrEqual => write!(f, "<="),
            QueryOperator::Like => write!(f, "LIKE"),
            QueryOperator::In => write!(f, "IN"),
            QueryOperator::IsNull => write!(f, "IS NULL"),
            QueryOperator::IsNotNull => write!(f, "IS NOT NULL"),
        }
    }
}

/// A single predicate on a model column; repositories AND them together
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub operator: QueryOperator,
    /// Bound values: one for comparisons, any number for `IN`, none for null checks
    pub values: Vec<DatabaseValue>,
}

impl Filter {
    fn compare(column: &str, operator: QueryOperator, value: DatabaseValue) -> Self {
        Self {
            column: column.to_string(),
            operator,
            values: vec![value],
        }
    }

    pub fn eq(column: &str, value: impl Into<DatabaseValue>) -> Self {
        Self::compare(column, QueryOperator::Equal, value.into())
    }

    pub fn ne(column: &str, value: impl Into<DatabaseValue>) -> Self {
        Self::compare(column, QueryOperator::NotEqual, value.into())
    }

    pub fn gt(column: &str, value: impl Into<DatabaseValue>) -> Self {
        Self::compare(column, QueryOperator::GreaterThan, value.into())
    }

    pub fn gte(column: &str, value: impl Into<DatabaseValue>) -> Self {
        Self::compare(column, QueryOperator::GreaterThanOrEqual, value.into())
    }

    pub fn lt(column: &str, value: impl Into<DatabaseValue>) -> Self {
        Self::compare(column, QueryOperator::LessThan, value.into())
    }

    pub fn lte(column: &str, value: impl Into<DatabaseValue>) -> Self {
        Self::compare(column, QueryOperator::LessThanOrEqual, value.into())
    }

    pub fn like(column: &str, pattern: &str) -> Self {
        Self::compare(column, QueryOperator::Like, pattern.into())
    }

    pub fn is_in<V: Into<DatabaseValue>>(column: &str, values: impl IntoIterator<Item = V>) -> Self {
        Self {
            column: column.to_string(),
            operator: QueryOperator::In,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_null(column: &str) -> Self {
        Self {
            column: column.to_string(),
            operator: QueryOperator::IsNull,
            values: Vec::new(),
        }
    }

    pub fn is_not_null(column: &str) -> Self {
        Self {
            column: column.to_string(),
            operator: QueryOperator::IsNotNull,
            values: Vec::new(),
        }
    }
}

/// Order by direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::Asc => write!(f, "ASC"),
            OrderDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// An ordering expression on a model column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: OrderDirection,
}

impl OrderBy {
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: OrderDirection::Asc,
        }
    }

    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: OrderDirection::Desc,
        }
    }
}

/// Options for [`BaseRepository::find_with`](crate::repository::BaseRepository::find_with)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub filters: Vec<Filter>,
    /// `None` falls back to the model's default ordering
    pub order_by: Option<Vec<OrderBy>>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.get_or_insert_with(Vec::new).push(order);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}
