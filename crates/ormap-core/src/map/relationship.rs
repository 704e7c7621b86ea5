//! Relationship definitions.

use serde::{Deserialize, Serialize};

/// One column pair of a relationship join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbJoin {
    /// Column on the source table.
    pub source: String,
    /// Column on the target table.
    pub target: String,
}

impl DbJoin {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// A foreign key style link between two tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbRelationship {
    pub name: String,
    pub source_entity: String,
    pub target_entity: String,
    pub joins: Vec<DbJoin>,
    #[serde(default)]
    pub to_many: bool,
    /// The target's primary key depends on the source's primary key.
    #[serde(default)]
    pub to_dependent_pk: bool,
}

impl DbRelationship {
    /// Create a to-one relationship without joins.
    pub fn to_one(
        name: impl Into<String>,
        source_entity: impl Into<String>,
        target_entity: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source_entity: source_entity.into(),
            target_entity: target_entity.into(),
            joins: Vec::new(),
            to_many: false,
            to_dependent_pk: false,
        }
    }

    /// Create a to-many relationship without joins.
    pub fn to_many(
        name: impl Into<String>,
        source_entity: impl Into<String>,
        target_entity: impl Into<String>,
    ) -> Self {
        Self {
            to_many: true,
            ..Self::to_one(name, source_entity, target_entity)
        }
    }

    /// Add a join column pair.
    pub fn with_join(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.joins.push(DbJoin::new(source, target));
        self
    }

    /// Mark the target as dependent on this side's primary key.
    pub fn with_dependent_pk(mut self) -> Self {
        self.to_dependent_pk = true;
        self
    }

    /// Relationship that points back to its own table.
    pub fn is_reflexive(&self) -> bool {
        self.source_entity == self.target_entity
    }
}

/// An object-level relationship, mapped to one or more db relationships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjRelationship {
    pub name: String,
    /// Target object entity name.
    pub target_entity: String,
    /// `rel`, or `rel1.rel2` for flattened relationships.
    pub db_path: String,
    #[serde(default)]
    pub to_many: bool,
}

impl ObjRelationship {
    /// Create a to-one relationship.
    pub fn to_one(
        name: impl Into<String>,
        target_entity: impl Into<String>,
        db_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target_entity: target_entity.into(),
            db_path: db_path.into(),
            to_many: false,
        }
    }

    /// Create a to-many relationship.
    pub fn to_many(
        name: impl Into<String>,
        target_entity: impl Into<String>,
        db_path: impl Into<String>,
    ) -> Self {
        Self {
            to_many: true,
            ..Self::to_one(name, target_entity, db_path)
        }
    }

    /// Relationship spanning more than one db relationship.
    pub fn is_flattened(&self) -> bool {
        self.db_path.contains('.')
    }
}
