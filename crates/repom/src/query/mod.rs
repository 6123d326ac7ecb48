//! Query - Filters, orderings and statement rendering

pub mod builder;
pub mod types;

pub use builder::{Statement, StatementBuilder};
pub use types::*;
