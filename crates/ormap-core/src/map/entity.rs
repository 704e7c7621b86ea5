//! Table and object entity definitions.

use super::{DbAttribute, DbRelationship, ObjAttribute, ObjRelationship};
use crate::exp::Expression;
use crate::types::QuotingStrategy;
use serde::{Deserialize, Serialize};

/// A database table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbEntity {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default)]
    pub attributes: Vec<DbAttribute>,
    #[serde(default)]
    pub relationships: Vec<DbRelationship>,
    /// Restriction applied to every query that touches the table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<Expression>,
}

impl DbEntity {
    /// Create an empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            catalog: None,
            schema: None,
            attributes: Vec::new(),
            relationships: Vec::new(),
            qualifier: None,
        }
    }

    /// Set the schema.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Set the catalog.
    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    /// Add a column.
    pub fn with_attribute(mut self, attribute: DbAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Add a relationship. Its source entity is set to this table.
    pub fn with_relationship(mut self, mut relationship: DbRelationship) -> Self {
        relationship.source_entity = self.name.clone();
        self.relationships.push(relationship);
        self
    }

    /// Set the table qualifier.
    pub fn with_qualifier(mut self, qualifier: Expression) -> Self {
        self.qualifier = Some(qualifier);
        self
    }

    /// `catalog.schema.name` with missing parts omitted.
    pub fn full_name(&self) -> String {
        QuotingStrategy::plain().qualified(&self.name_parts())
    }

    /// Full name rendered with a quoting strategy.
    pub fn quoted_name(&self, quoting: &QuotingStrategy) -> String {
        quoting.qualified(&self.name_parts())
    }

    fn name_parts(&self) -> [Option<&str>; 3] {
        [
            self.catalog.as_deref(),
            self.schema.as_deref(),
            Some(self.name.as_str()),
        ]
    }

    /// Column by exact name.
    pub fn attribute(&self, name: &str) -> Option<&DbAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Column by case-insensitive name.
    pub fn attribute_ignore_case(&self, name: &str) -> Option<&DbAttribute> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Relationship by name.
    pub fn relationship(&self, name: &str) -> Option<&DbRelationship> {
        self.relationships.iter().find(|r| r.name == name)
    }

    /// Primary key columns in declaration order.
    pub fn primary_keys(&self) -> impl Iterator<Item = &DbAttribute> {
        self.attributes.iter().filter(|a| a.primary_key)
    }

    /// Primary key column names.
    pub fn primary_key_names(&self) -> Vec<&str> {
        self.primary_keys().map(|a| a.name.as_str()).collect()
    }
}

/// An object entity mapped to a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjEntity {
    pub name: String,
    /// Name of the mapped table.
    pub db_entity: String,
    /// Parent entity in an inheritance hierarchy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_entity: Option<String>,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    /// Discriminator qualifier selecting this entity's rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<Expression>,
    #[serde(default)]
    pub attributes: Vec<ObjAttribute>,
    #[serde(default)]
    pub relationships: Vec<ObjRelationship>,
}

impl ObjEntity {
    /// Create an entity mapped to a table.
    pub fn new(name: impl Into<String>, db_entity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            db_entity: db_entity.into(),
            super_entity: None,
            is_abstract: false,
            qualifier: None,
            attributes: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Set the super entity.
    pub fn with_super_entity(mut self, name: impl Into<String>) -> Self {
        self.super_entity = Some(name.into());
        self
    }

    /// Mark the entity abstract.
    pub fn with_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Set the discriminator qualifier.
    pub fn with_qualifier(mut self, qualifier: Expression) -> Self {
        self.qualifier = Some(qualifier);
        self
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, attribute: ObjAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Add a relationship.
    pub fn with_relationship(mut self, relationship: ObjRelationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Attribute declared directly on this entity.
    pub fn declared_attribute(&self, name: &str) -> Option<&ObjAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Relationship declared directly on this entity.
    pub fn declared_relationship(&self, name: &str) -> Option<&ObjRelationship> {
        self.relationships.iter().find(|r| r.name == name)
    }
}
