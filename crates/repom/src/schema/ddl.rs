//! DDL generation for resolved table schemas
//!
//! Renders `CREATE TABLE` statements from a [`TableSchema`] so tests and
//! bootstrap scripts can materialize models without a migration tool.

use super::column::ColumnDef;
use super::table::TableSchema;
use crate::backends::SqlDialect;

impl TableSchema {
    /// Build the CREATE TABLE SQL for `dialect`
    pub fn to_create_sql(&self, dialect: SqlDialect) -> String {
        render_create_table(self, dialect, false)
    }
}

/// Collects schema statements in order
pub struct SchemaBuilder {
    dialect: SqlDialect,
    statements: Vec<String>,
}

impl SchemaBuilder {
    pub fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            statements: Vec::new(),
        }
    }

    /// Create a table
    pub fn create_table(&mut self, schema: &TableSchema) -> &mut Self {
        self.statements.push(render_create_table(schema, self.dialect, false));
        self
    }

    /// Create a table unless it already exists
    pub fn create_table_if_not_exists(&mut self, schema: &TableSchema) -> &mut Self {
        self.statements.push(render_create_table(schema, self.dialect, true));
        self
    }

    /// Drop a table
    pub fn drop_table(&mut self, schema: &TableSchema) -> &mut Self {
        self.statements.push(format!(
            "DROP TABLE IF EXISTS {};",
            self.dialect.quote_identifier(schema.name())
        ));
        self
    }

    /// Create an index, named `idx_<table>_<columns>` unless given
    pub fn create_index(&mut self, schema: &TableSchema, columns: &[&str], index_name: Option<&str>) -> &mut Self {
        let default_name = format!("idx_{}_{}", schema.name(), columns.join("_"));
        let index_name = index_name.unwrap_or(&default_name);
        let quoted: Vec<String> = columns.iter().map(|c| self.dialect.quote_identifier(c)).collect();
        self.statements.push(format!(
            "CREATE INDEX {} ON {} ({});",
            self.dialect.quote_identifier(index_name),
            self.dialect.quote_identifier(schema.name()),
            quoted.join(", ")
        ));
        self
    }

    /// All statements
    pub fn to_sql(&self) -> Vec<String> {
        self.statements.clone()
    }

    /// All statements as one script
    pub fn build(&self) -> String {
        self.statements.join("\n")
    }
}

fn render_create_table(schema: &TableSchema, dialect: SqlDialect, if_not_exists: bool) -> String {
    let keys = schema.primary_key_columns();
    // A lone auto-increment key is declared inline; anything else gets a
    // trailing PRIMARY KEY constraint.
    let inline_key = keys.len() == 1 && keys[0].auto_increment;

    let mut parts: Vec<String> = schema
        .columns()
        .iter()
        .map(|column| render_column(column, dialect, inline_key))
        .collect();

    if !inline_key {
        let names: Vec<String> = keys.iter().map(|c| dialect.quote_identifier(&c.name)).collect();
        parts.push(format!("PRIMARY KEY ({})", names.join(", ")));
    }

    format!(
        "CREATE TABLE {}{} (\n    {}\n);",
        if if_not_exists { "IF NOT EXISTS " } else { "" },
        dialect.quote_identifier(schema.name()),
        parts.join(",\n    ")
    )
}

fn render_column(column: &ColumnDef, dialect: SqlDialect, inline_key: bool) -> String {
    let name = dialect.quote_identifier(&column.name);

    if column.auto_increment && inline_key {
        return match dialect {
            SqlDialect::PostgreSQL => format!("{} SERIAL PRIMARY KEY", name),
            SqlDialect::SQLite => format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", name),
            SqlDialect::MySQL => format!("{} INT AUTO_INCREMENT PRIMARY KEY", name),
        };
    }

    let mut sql = format!("{} {}", name, column.column_type.sql_type(dialect));
    if !column.nullable {
        sql.push_str(" NOT NULL");
    }
    if column.unique {
        sql.push_str(" UNIQUE");
    }
    if let Some(default) = &column.default {
        sql.push_str(&format!(" DEFAULT {}", default.to_sql(dialect)));
    }
    if let (Some(on_update), SqlDialect::MySQL) = (&column.on_update, dialect) {
        sql.push_str(&format!(" ON UPDATE {}", on_update.to_sql(dialect)));
    }
    sql
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelFlags;
    use crate::schema::column::ColumnDef;

    #[test]
    fn test_create_table_with_conventions() {
        let schema = TableSchema::build(
            "users",
            ModelFlags::BASE.with_timestamps(),
            vec![ColumnDef::varchar("email", 255).unique()],
        )
        .unwrap();

        let sql = schema.to_create_sql(SqlDialect::PostgreSQL);
        assert!(sql.starts_with("CREATE TABLE \"users\""));
        assert!(sql.contains("\"id\" SERIAL PRIMARY KEY"));
        assert!(sql.contains("\"email\" VARCHAR(255) NOT NULL UNIQUE"));
        assert!(sql.contains("\"created_at\" TIMESTAMPTZ NOT NULL DEFAULT NOW()"));
        assert!(sql.contains("\"updated_at\" TIMESTAMPTZ NOT NULL DEFAULT NOW()"));
        assert!(!sql.contains("PRIMARY KEY (\""));
    }

    #[test]
    fn test_create_table_composite_key() {
        let schema = TableSchema::build(
            "user_roles",
            ModelFlags::AUTO.composite_pk(),
            vec![
                ColumnDef::integer("user_id").primary_key(),
                ColumnDef::integer("role_id").primary_key(),
            ],
        )
        .unwrap();

        let sql = schema.to_create_sql(SqlDialect::SQLite);
        assert!(sql.contains("PRIMARY KEY (\"user_id\", \"role_id\")"));
        assert!(!sql.contains("\"id\""));
        assert!(!sql.contains("AUTOINCREMENT"));
    }

    #[test]
    fn test_schema_builder_statements() {
        let schema = TableSchema::build("posts", ModelFlags::BASE, vec![ColumnDef::integer("author_id")]).unwrap();

        let mut builder = SchemaBuilder::new(SqlDialect::PostgreSQL);
        builder
            .create_table_if_not_exists(&schema)
            .create_index(&schema, &["author_id"], None)
            .drop_table(&schema);

        let statements = builder.to_sql();
        assert_eq!(statements.len(), 3);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS \"posts\""));
        assert_eq!(
            statements[1],
            "CREATE INDEX \"idx_posts_author_id\" ON \"posts\" (\"author_id\");"
        );
        assert_eq!(statements[2], "DROP TABLE IF EXISTS \"posts\";");
        assert_eq!(builder.build().lines().filter(|l| l.starts_with("DROP")).count(), 1);
    }

    #[test]
    fn test_mysql_on_update() {
        let schema = TableSchema::build("posts", ModelFlags::BASE.with_updated_at(true), vec![]).unwrap();
        let sql = schema.to_create_sql(SqlDialect::MySQL);
        assert!(sql.contains("`id` INT AUTO_INCREMENT PRIMARY KEY"));
        assert!(sql.contains("`updated_at` DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP"));
    }
}
