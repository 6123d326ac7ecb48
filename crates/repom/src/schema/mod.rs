//! Schema construction: columns, flag resolution, caching and DDL

pub mod column;
pub mod ddl;
pub mod registry;
pub mod table;

pub use column::{
    ColumnDef, ColumnDefault, ColumnOrigin, ColumnType, CREATED_AT_COLUMN, ID_COLUMN, UPDATED_AT_COLUMN,
};
pub use ddl::SchemaBuilder;
pub use registry::{registered_tables, schema_for};
pub use table::TableSchema;
