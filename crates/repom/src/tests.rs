//! Scenario tests for repom
//!
//! Models here mirror typical application declarations: a plain base model
//! with timestamps, an opt-in composite-key association table, and models
//! whose flags are derived from a parent's.

use chrono::{DateTime, Utc};

use crate::backends::{DatabaseRow, DatabaseRowExt, DatabaseValue};
use crate::error::ModelResult;
use crate::model::{FlagOverrides, Model, ModelFlags};
use crate::query::OrderBy;
use crate::relationships::{Cascade, Relationship};
use crate::schema::ColumnDef;

pub mod convention_tests;

/// Base model with both timestamps
#[derive(Debug, Clone, PartialEq)]
struct User {
    id: Option<i64>,
    email: String,
    name: String,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl User {
    fn new(email: &str, name: &str) -> Self {
        Self {
            id: None,
            email: email.to_string(),
            name: name.to_string(),
            created_at: None,
            updated_at: None,
        }
    }
}

impl Model for User {
    fn table_name() -> &'static str {
        "users"
    }

    fn flags() -> ModelFlags {
        ModelFlags::BASE.with_timestamps()
    }

    fn declared_columns() -> Vec<ColumnDef> {
        vec![ColumnDef::varchar("email", 255).unique(), ColumnDef::text("name")]
    }

    fn relationships() -> Vec<Relationship> {
        vec![Relationship::one_to_many("posts", "posts", "user_id")
            .back_populates("author")
            .cascade([Cascade::All, Cascade::DeleteOrphan])]
    }

    fn from_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
        Ok(User {
            id: row.try_get("id")?,
            email: row.get("email")?,
            name: row.get("name")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn to_fields(&self) -> Vec<(String, DatabaseValue)> {
        vec![
            ("id".to_string(), self.id.into()),
            ("email".to_string(), self.email.clone().into()),
            ("name".to_string(), self.name.clone().into()),
            ("created_at".to_string(), self.created_at.into()),
            ("updated_at".to_string(), self.updated_at.into()),
        ]
    }
}

/// Child side of the user/post association
#[derive(Debug, Clone, PartialEq)]
struct Post {
    id: Option<i64>,
    user_id: i64,
    title: String,
}

impl Model for Post {
    fn table_name() -> &'static str {
        "posts"
    }

    fn declared_columns() -> Vec<ColumnDef> {
        vec![ColumnDef::integer("user_id"), ColumnDef::text("title")]
    }

    fn relationships() -> Vec<Relationship> {
        vec![Relationship::many_to_one("author", "users", "user_id").back_populates("posts")]
    }

    fn from_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
        Ok(Post {
            id: row.try_get("id")?,
            user_id: row.get("user_id")?,
            title: row.get("title")?,
        })
    }

    fn to_fields(&self) -> Vec<(String, DatabaseValue)> {
        vec![
            ("id".to_string(), self.id.into()),
            ("user_id".to_string(), self.user_id.into()),
            ("title".to_string(), self.title.clone().into()),
        ]
    }
}

/// Opt-in model with a composite key and no `id`; keeps the default
/// `id` ordering
#[derive(Debug, Clone, PartialEq)]
struct UserRole {
    user_id: i64,
    role_id: i64,
    granted_by: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl Model for UserRole {
    fn table_name() -> &'static str {
        "user_roles"
    }

    fn flags() -> ModelFlags {
        ModelFlags::AUTO.composite_pk().with_created_at(true)
    }

    fn declared_columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::integer("user_id").primary_key(),
            ColumnDef::integer("role_id").primary_key(),
            ColumnDef::text("granted_by").nullable(),
        ]
    }

    fn from_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
        Ok(UserRole {
            user_id: row.get("user_id")?,
            role_id: row.get("role_id")?,
            granted_by: row.try_get("granted_by")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn to_fields(&self) -> Vec<(String, DatabaseValue)> {
        vec![
            ("user_id".to_string(), self.user_id.into()),
            ("role_id".to_string(), self.role_id.into()),
            ("granted_by".to_string(), self.granted_by.clone().into()),
            ("created_at".to_string(), self.created_at.into()),
        ]
    }
}

/// Composite-key model that orders by its own key columns
#[derive(Debug, Clone, PartialEq)]
struct TeamMember {
    team_id: i64,
    user_id: i64,
}

impl Model for TeamMember {
    fn table_name() -> &'static str {
        "team_members"
    }

    fn flags() -> ModelFlags {
        ModelFlags::AUTO.composite_pk()
    }

    fn declared_columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::integer("team_id").primary_key(),
            ColumnDef::integer("user_id").primary_key(),
        ]
    }

    fn default_ordering() -> Vec<OrderBy> {
        vec![OrderBy::asc("team_id"), OrderBy::asc("user_id")]
    }

    fn from_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
        Ok(TeamMember {
            team_id: row.get("team_id")?,
            user_id: row.get("user_id")?,
        })
    }

    fn to_fields(&self) -> Vec<(String, DatabaseValue)> {
        vec![
            ("team_id".to_string(), self.team_id.into()),
            ("user_id".to_string(), self.user_id.into()),
        ]
    }
}

/// Parent flags shared by audited models
const AUDITED: ModelFlags = ModelFlags::BASE.with_created_at(true);

/// Derives from the audited parent and adds `updated_at`
#[derive(Debug, Clone, PartialEq)]
struct Note {
    id: Option<i64>,
    body: String,
}

impl Model for Note {
    fn table_name() -> &'static str {
        "notes"
    }

    fn flags() -> ModelFlags {
        AUDITED.inherit(FlagOverrides {
            use_updated_at: Some(true),
            ..FlagOverrides::NONE
        })
    }

    fn declared_columns() -> Vec<ColumnDef> {
        vec![ColumnDef::text("body")]
    }

    fn from_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
        Ok(Note {
            id: row.try_get("id")?,
            body: row.get("body")?,
        })
    }

    fn to_fields(&self) -> Vec<(String, DatabaseValue)> {
        vec![
            ("id".to_string(), self.id.into()),
            ("body".to_string(), self.body.clone().into()),
        ]
    }
}

/// Derives from the audited parent, switches to a composite key and still
/// carries an `id` column over from the parent's declarations
#[derive(Debug, Clone, PartialEq)]
struct NoteTag {
    note_id: i64,
    tag: String,
}

impl Model for NoteTag {
    fn table_name() -> &'static str {
        "note_tags"
    }

    fn flags() -> ModelFlags {
        AUDITED.inherit(FlagOverrides {
            use_composite_pk: Some(true),
            ..FlagOverrides::NONE
        })
    }

    fn declared_columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::integer("id"),
            ColumnDef::integer("note_id").primary_key(),
            ColumnDef::varchar("tag", 64).primary_key(),
        ]
    }

    fn from_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
        Ok(NoteTag {
            note_id: row.get("note_id")?,
            tag: row.get("tag")?,
        })
    }

    fn to_fields(&self) -> Vec<(String, DatabaseValue)> {
        vec![
            ("note_id".to_string(), self.note_id.into()),
            ("tag".to_string(), self.tag.clone().into()),
        ]
    }
}
