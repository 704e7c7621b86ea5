//! The mapping model: tables, object entities and their relationships.

use super::{DbEntity, DbRelationship, ObjAttribute, ObjEntity, ObjRelationship};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Inheritance chains deeper than this are treated as cycles.
const MAX_INHERITANCE_DEPTH: usize = 64;

/// A named collection of table and object entities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataMap {
    pub name: String,
    /// Quote table and column names in generated SQL.
    #[serde(default)]
    pub quote_identifiers: bool,
    #[serde(default)]
    pub db_entities: Vec<DbEntity>,
    #[serde(default)]
    pub obj_entities: Vec<ObjEntity>,
}

impl DataMap {
    /// Create an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a table.
    pub fn with_db_entity(mut self, entity: DbEntity) -> Self {
        self.db_entities.push(entity);
        self
    }

    /// Add an object entity.
    pub fn with_obj_entity(mut self, entity: ObjEntity) -> Self {
        self.obj_entities.push(entity);
        self
    }

    /// Table by name.
    pub fn db_entity(&self, name: &str) -> Option<&DbEntity> {
        self.db_entities.iter().find(|e| e.name == name)
    }

    /// Mutable table by name.
    pub fn db_entity_mut(&mut self, name: &str) -> Option<&mut DbEntity> {
        self.db_entities.iter_mut().find(|e| e.name == name)
    }

    /// Object entity by name.
    pub fn obj_entity(&self, name: &str) -> Option<&ObjEntity> {
        self.obj_entities.iter().find(|e| e.name == name)
    }

    /// Table by name, or an error.
    pub fn require_db_entity(&self, name: &str) -> Result<&DbEntity> {
        self.db_entity(name)
            .ok_or_else(|| Error::UnknownEntity(name.to_string()))
    }

    /// Object entity by name, or an error.
    pub fn require_obj_entity(&self, name: &str) -> Result<&ObjEntity> {
        self.obj_entity(name)
            .ok_or_else(|| Error::UnknownEntity(name.to_string()))
    }

    /// Table an object entity maps to.
    pub fn db_entity_for(&self, entity: &ObjEntity) -> Result<&DbEntity> {
        self.require_db_entity(&entity.db_entity)
    }

    /// Object entities mapped to a table, in model order.
    pub fn obj_entities_for_table<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a ObjEntity> + 'a {
        self.obj_entities.iter().filter(move |e| e.db_entity == table)
    }

    /// The entity followed by its ancestors, nearest first.
    pub fn entity_chain<'a>(&'a self, entity: &'a ObjEntity) -> Vec<&'a ObjEntity> {
        let mut chain = vec![entity];
        let mut current = entity;
        while let Some(parent) = current.super_entity.as_deref().and_then(|n| self.obj_entity(n)) {
            if chain.len() >= MAX_INHERITANCE_DEPTH || chain.iter().any(|e| e.name == parent.name) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// Attribute lookup through the inheritance chain.
    pub fn obj_attribute<'a>(&'a self, entity: &'a ObjEntity, name: &str) -> Option<&'a ObjAttribute> {
        self.entity_chain(entity)
            .into_iter()
            .find_map(|e| e.declared_attribute(name))
    }

    /// Relationship lookup through the inheritance chain.
    pub fn obj_relationship<'a>(
        &'a self,
        entity: &'a ObjEntity,
        name: &str,
    ) -> Option<&'a ObjRelationship> {
        self.entity_chain(entity)
            .into_iter()
            .find_map(|e| e.declared_relationship(name))
    }

    /// Inherited and declared attributes, ancestors first; a redeclared name
    /// keeps the most specific definition in the ancestor's position.
    pub fn all_attributes<'a>(&'a self, entity: &'a ObjEntity) -> Vec<&'a ObjAttribute> {
        let chain = self.entity_chain(entity);
        let mut out: Vec<&ObjAttribute> = Vec::new();
        for e in chain.iter().rev() {
            for attr in &e.attributes {
                match out.iter_mut().find(|a| a.name == attr.name) {
                    Some(slot) => *slot = attr,
                    None => out.push(attr),
                }
            }
        }
        out
    }

    /// Inherited and declared relationships, ancestors first.
    pub fn all_relationships<'a>(&'a self, entity: &'a ObjEntity) -> Vec<&'a ObjRelationship> {
        let chain = self.entity_chain(entity);
        let mut out: Vec<&ObjRelationship> = Vec::new();
        for e in chain.iter().rev() {
            for rel in &e.relationships {
                match out.iter_mut().find(|r| r.name == rel.name) {
                    Some(slot) => *slot = rel,
                    None => out.push(rel),
                }
            }
        }
        out
    }

    /// Direct sub-entities, in model order.
    pub fn sub_entities<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ObjEntity> + 'a {
        self.obj_entities
            .iter()
            .filter(move |e| e.super_entity.as_deref() == Some(name))
    }

    /// To-one relationship whose joins link the source primary key to the
    /// target primary key, i.e. this side depends on the target.
    pub fn is_to_master_pk(&self, relationship: &DbRelationship) -> bool {
        if relationship.to_many || relationship.to_dependent_pk || relationship.joins.is_empty() {
            return false;
        }
        let (Some(source), Some(target)) = (
            self.db_entity(&relationship.source_entity),
            self.db_entity(&relationship.target_entity),
        ) else {
            return false;
        };
        relationship.joins.iter().all(|j| {
            source.attribute(&j.source).is_some_and(|a| a.primary_key)
                && target.attribute(&j.target).is_some_and(|a| a.primary_key)
        })
    }

    /// Check that every reference in the model resolves.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for entity in &self.db_entities {
            if !seen.insert(entity.name.as_str()) {
                return Err(Error::Configuration(format!(
                    "duplicate table '{}'",
                    entity.name
                )));
            }
            for rel in &entity.relationships {
                let target = self.db_entity(&rel.target_entity).ok_or_else(|| {
                    Error::Configuration(format!(
                        "relationship '{}.{}' targets unknown table '{}'",
                        entity.name, rel.name, rel.target_entity
                    ))
                })?;
                for join in &rel.joins {
                    if entity.attribute(&join.source).is_none()
                        || target.attribute(&join.target).is_none()
                    {
                        return Err(Error::Configuration(format!(
                            "relationship '{}.{}' joins unknown column {} -> {}",
                            entity.name, rel.name, join.source, join.target
                        )));
                    }
                }
            }
        }

        let mut seen = HashSet::new();
        for entity in &self.obj_entities {
            if !seen.insert(entity.name.as_str()) {
                return Err(Error::Configuration(format!(
                    "duplicate entity '{}'",
                    entity.name
                )));
            }
            self.db_entity_for(entity)?;
            if let Some(parent) = &entity.super_entity {
                self.require_obj_entity(parent)?;
                let chain = self.entity_chain(entity);
                let unterminated = chain
                    .last()
                    .and_then(|e| e.super_entity.as_deref())
                    .is_some_and(|n| self.obj_entity(n).is_some());
                if unterminated {
                    return Err(Error::Configuration(format!(
                        "inheritance cycle at entity '{}'",
                        entity.name
                    )));
                }
            }
            for rel in &entity.relationships {
                self.require_obj_entity(&rel.target_entity)?;
            }
        }
        Ok(())
    }

    /// Parse a model from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the model to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a model file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let map = Self::from_json(&text)?;
        map.validate()?;
        Ok(map)
    }
}
