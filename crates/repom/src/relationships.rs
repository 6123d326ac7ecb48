//! Relationship Conventions - Declared associations between models
//!
//! Relationships are metadata only: nothing here loads related rows or
//! cascades writes. What it does is check that a declaration follows the
//! conventions:
//!
//! - the foreign key lives on the "many" side of the association;
//! - one-to-one and many-to-one sides hold a single object, not a list;
//! - two sides that back-populate each other agree on kind and key.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::schema::TableSchema;

/// Cardinality of an association, seen from the owning model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipKind {
    /// Owner has many targets; the foreign key is on the target
    OneToMany,
    /// Owner belongs to one target; the foreign key is on the owner
    ManyToOne,
    /// Owner has at most one target; the foreign key is on either side
    OneToOne,
}

impl RelationshipKind {
    /// The kind the other side of the association must declare
    pub fn inverse(self) -> Self {
        match self {
            Self::OneToMany => Self::ManyToOne,
            Self::ManyToOne => Self::OneToMany,
            Self::OneToOne => Self::OneToOne,
        }
    }

    /// Returns true if this side holds a collection
    pub fn is_collection(self) -> bool {
        matches!(self, Self::OneToMany)
    }
}

/// Write propagation declared on a relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cascade {
    SaveUpdate,
    Merge,
    Delete,
    DeleteOrphan,
    All,
}

impl fmt::Display for Cascade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Cascade::SaveUpdate => "save-update",
            Cascade::Merge => "merge",
            Cascade::Delete => "delete",
            Cascade::DeleteOrphan => "delete-orphan",
            Cascade::All => "all",
        };
        f.write_str(name)
    }
}

impl FromStr for Cascade {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "save-update" => Ok(Cascade::SaveUpdate),
            "merge" => Ok(Cascade::Merge),
            "delete" => Ok(Cascade::Delete),
            "delete-orphan" => Ok(Cascade::DeleteOrphan),
            "all" => Ok(Cascade::All),
            other => Err(ModelError::Relationship(format!("unknown cascade option '{}'", other))),
        }
    }
}

/// Parse a comma-separated cascade list such as `"all, delete-orphan"`
pub fn parse_cascade(list: &str) -> ModelResult<Vec<Cascade>> {
    list.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(str::parse::<Cascade>)
        .collect()
}

/// A named association from one model to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Attribute name on the owning model
    pub name: String,
    pub kind: RelationshipKind,
    pub target_table: String,
    /// Foreign-key column, on whichever table the kind places it
    pub foreign_key: String,
    /// Name of the matching relationship on the target
    pub back_populates: Option<String>,
    /// Whether the attribute holds a list
    pub uselist: bool,
    pub cascade: Vec<Cascade>,
}

impl Relationship {
    fn new(name: &str, kind: RelationshipKind, target_table: &str, foreign_key: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            target_table: target_table.to_string(),
            foreign_key: foreign_key.to_string(),
            back_populates: None,
            uselist: kind.is_collection(),
            cascade: Vec::new(),
        }
    }

    /// Parent side; `foreign_key` is a column of `target_table`
    pub fn one_to_many(name: &str, target_table: &str, foreign_key: &str) -> Self {
        Self::new(name, RelationshipKind::OneToMany, target_table, foreign_key)
    }

    /// Child side; `foreign_key` is a column of the owning table
    pub fn many_to_one(name: &str, target_table: &str, foreign_key: &str) -> Self {
        Self::new(name, RelationshipKind::ManyToOne, target_table, foreign_key)
    }

    pub fn one_to_one(name: &str, target_table: &str, foreign_key: &str) -> Self {
        Self::new(name, RelationshipKind::OneToOne, target_table, foreign_key)
    }

    pub fn back_populates(mut self, name: &str) -> Self {
        self.back_populates = Some(name.to_string());
        self
    }

    pub fn uselist(mut self, uselist: bool) -> Self {
        self.uselist = uselist;
        self
    }

    pub fn cascade(mut self, cascade: impl IntoIterator<Item = Cascade>) -> Self {
        self.cascade.extend(cascade);
        self
    }

    pub fn cascades(&self, option: Cascade) -> bool {
        self.cascade.contains(&option) || (option != Cascade::DeleteOrphan && self.cascade.contains(&Cascade::All))
    }

    /// Check the declaration against both tables
    pub fn validate(&self, owner: &TableSchema, target: &TableSchema) -> ModelResult<()> {
        if target.name() != self.target_table {
            return Err(ModelError::Relationship(format!(
                "{}.{} targets '{}', validated against '{}'",
                owner.name(),
                self.name,
                self.target_table,
                target.name()
            )));
        }

        let fk_on_owner = owner.has_column(&self.foreign_key);
        let fk_on_target = target.has_column(&self.foreign_key);
        let fk_ok = match self.kind {
            RelationshipKind::ManyToOne => fk_on_owner,
            RelationshipKind::OneToMany => fk_on_target,
            RelationshipKind::OneToOne => fk_on_owner || fk_on_target,
        };
        if !fk_ok {
            let side = match self.kind {
                RelationshipKind::ManyToOne => owner.name(),
                RelationshipKind::OneToMany => target.name(),
                RelationshipKind::OneToOne => "either table",
            };
            return Err(ModelError::Relationship(format!(
                "{}.{}: foreign key '{}' must be a column of {}",
                owner.name(),
                self.name,
                self.foreign_key,
                side
            )));
        }

        if self.uselist && !self.kind.is_collection() {
            return Err(ModelError::Relationship(format!(
                "{}.{}: {:?} relationship cannot use list cardinality",
                owner.name(),
                self.name,
                self.kind
            )));
        }

        if self.cascade.contains(&Cascade::DeleteOrphan) && !self.kind.is_collection() && self.kind != RelationshipKind::OneToOne {
            return Err(ModelError::Relationship(format!(
                "{}.{}: delete-orphan cascade is only valid on the parent side",
                owner.name(),
                self.name
            )));
        }

        Ok(())
    }
}

/// Check that two relationships describe the same association from both
/// ends: each names the other, the kinds are inverse and the foreign key is
/// shared.
pub fn validate_back_populates(a: &Relationship, b: &Relationship) -> ModelResult<()> {
    if a.back_populates.as_deref() != Some(b.name.as_str()) || b.back_populates.as_deref() != Some(a.name.as_str()) {
        return Err(ModelError::Relationship(format!(
            "'{}' and '{}' do not back-populate each other",
            a.name, b.name
        )));
    }
    if a.kind.inverse() != b.kind {
        return Err(ModelError::Relationship(format!(
            "'{}' is {:?} but '{}' is {:?}",
            a.name, a.kind, b.name, b.kind
        )));
    }
    if a.foreign_key != b.foreign_key {
        return Err(ModelError::Relationship(format!(
            "'{}' uses foreign key '{}' but '{}' uses '{}'",
            a.name, a.foreign_key, b.name, b.foreign_key
        )));
    }
    Ok(())
}

/// Find the relationship named `name`
pub fn find_relationship<'a>(relationships: &'a [Relationship], name: &str) -> Option<&'a Relationship> {
    relationships.iter().find(|r| r.name == name)
}
