//! Convention column resolution across model declarations

use super::*;
use crate::backends::SqlDialect;
use crate::relationships::{validate_back_populates, RelationshipKind};
use crate::schema::{registered_tables, SchemaBuilder};

#[test]
fn test_base_model_gets_single_auto_id() {
    let schema = User::schema().unwrap();
    let ids: Vec<_> = schema.columns().iter().filter(|c| c.name == "id").collect();
    assert_eq!(ids.len(), 1);
    assert!(ids[0].primary_key && ids[0].auto_increment);
    assert_eq!(schema.primary_key_columns().len(), 1);
    assert_eq!(
        schema.column_names(),
        vec!["id", "email", "name", "created_at", "updated_at"]
    );
}

#[test]
fn test_composite_model_has_no_id() {
    let schema = UserRole::schema().unwrap();
    assert!(!schema.has_column("id"));
    assert!(schema.is_composite_key());
    assert_eq!(schema.column_names(), vec!["user_id", "role_id", "granted_by", "created_at"]);
}

#[test]
fn test_inherited_id_column_is_dropped_for_composite_child() {
    let flags = NoteTag::flags();
    assert!(flags.use_id);
    assert!(flags.use_composite_pk);
    assert!(flags.use_created_at);

    let schema = NoteTag::schema().unwrap();
    assert!(!schema.has_column("id"));
    assert_eq!(schema.column_names(), vec!["note_id", "tag", "created_at"]);
}

#[test]
fn test_auto_model_attaches_nothing_by_default() {
    let schema = TeamMember::schema().unwrap();
    assert_eq!(schema.column_names(), vec!["team_id", "user_id"]);
    assert!(!schema.has_created_at());
    assert!(!schema.has_updated_at());
}

#[test]
fn test_timestamps_follow_flags_only() {
    let note = Note::schema().unwrap();
    assert_eq!(note.column_names(), vec!["id", "body", "created_at", "updated_at"]);

    let post = Post::schema().unwrap();
    assert!(!post.has_created_at());
    assert!(!post.has_updated_at());

    let role = UserRole::schema().unwrap();
    assert!(role.has_created_at());
    assert!(!role.has_updated_at());
}

#[test]
fn test_schemas_are_registered() {
    User::schema().unwrap();
    UserRole::schema().unwrap();
    let tables = registered_tables();
    assert!(tables.contains(&"users".to_string()));
    assert!(tables.contains(&"user_roles".to_string()));
}

#[test]
fn test_relationship_declarations_are_consistent() -> anyhow::Result<()> {
    let users = User::schema()?;
    let posts = Post::schema()?;

    let user_posts = &User::relationships()[0];
    let post_author = &Post::relationships()[0];
    assert_eq!(user_posts.kind, RelationshipKind::OneToMany);
    assert!(user_posts.uselist);
    assert!(!post_author.uselist);

    user_posts.validate(&users, &posts)?;
    post_author.validate(&posts, &users)?;
    validate_back_populates(user_posts, post_author)?;
    Ok(())
}

#[test]
fn test_ddl_for_declared_models() {
    let mut builder = SchemaBuilder::new(SqlDialect::PostgreSQL);
    builder
        .create_table(&User::schema().unwrap())
        .create_table(&UserRole::schema().unwrap());
    let statements = builder.to_sql();

    assert!(statements[0].contains("\"id\" SERIAL PRIMARY KEY"));
    assert!(statements[0].contains("\"email\" VARCHAR(255) NOT NULL UNIQUE"));
    assert!(statements[1].contains("PRIMARY KEY (\"user_id\", \"role_id\")"));
    assert!(statements[1].contains("\"granted_by\" TEXT,"));
    assert!(!statements[1].contains("\"id\""));
}
