//! Inheritance hierarchy of object entities.

use super::{DataMap, ObjEntity};
use crate::error::{Error, Result};
use crate::exp::Expression;

/// An entity with its sub-entities, recursively.
#[derive(Debug, Clone)]
pub struct EntityInheritanceTree<'a> {
    pub entity: &'a ObjEntity,
    pub children: Vec<EntityInheritanceTree<'a>>,
}

impl<'a> EntityInheritanceTree<'a> {
    /// Build the tree rooted at `root`.
    pub fn build(map: &'a DataMap, root: &str) -> Result<Self> {
        let entity = map.require_obj_entity(root)?;
        let mut visiting = vec![entity.name.as_str()];
        Self::build_node(map, entity, &mut visiting)
    }

    fn build_node(
        map: &'a DataMap,
        entity: &'a ObjEntity,
        visiting: &mut Vec<&'a str>,
    ) -> Result<Self> {
        let mut children = Vec::new();
        for child in map.sub_entities(&entity.name) {
            if visiting.contains(&child.name.as_str()) {
                return Err(Error::Configuration(format!(
                    "inheritance cycle at entity '{}'",
                    child.name
                )));
            }
            visiting.push(&child.name);
            children.push(Self::build_node(map, child, visiting)?);
            visiting.pop();
        }
        Ok(Self { entity, children })
    }

    /// OR of this entity's qualifier and every descendant's. `None` when
    /// any node in the tree has no qualifier, since such a node matches
    /// every row.
    pub fn qualifier_for_entity_and_subclasses(&self) -> Option<Expression> {
        let mut qualifier = self.entity.qualifier.clone()?;
        for child in &self.children {
            qualifier = qualifier.or_exp(child.qualifier_for_entity_and_subclasses()?);
        }
        Some(qualifier)
    }

    /// All entities in the tree, parents before children.
    pub fn entities(&self) -> Vec<&'a ObjEntity> {
        let mut out = vec![self.entity];
        for child in &self.children {
            out.extend(child.entities());
        }
        out
    }

    /// True when the entity has sub-entities.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}
