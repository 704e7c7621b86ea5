//! Ashwood ordering of tables and objects for commits.

use super::graph::Digraph;
use super::object::PersistentObject;
use crate::error::{Error, Result};
use crate::map::{DataMap, DbEntity, DbRelationship, ObjEntity};
use crate::types::{ObjectId, Value};
use std::collections::HashMap;
use tracing::debug;

/// Weight of entities without an explicit override.
const DEFAULT_SORT_WEIGHT: i32 = 1;

/// Orders tables so that masters are inserted before their dependents and
/// deleted after them.
///
/// The index is computed once from a model; the sorter keeps no reference to
/// the model afterwards.
#[derive(Debug, Clone, Default)]
pub struct EntitySorter {
    /// Table name -> position of its component in the topological order,
    /// and position in the model.
    components: HashMap<String, (usize, usize)>,
    /// Object entity name -> table name.
    obj_tables: HashMap<String, String>,
    /// Self-referencing to-one relationships per table.
    reflexive: HashMap<String, Vec<DbRelationship>>,
    weights: HashMap<String, i32>,
}

impl EntitySorter {
    /// Index a model.
    pub fn new(map: &DataMap) -> Self {
        let index: HashMap<&str, usize> = map
            .db_entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.name.as_str(), i))
            .collect();

        let mut graph = Digraph::new(map.db_entities.len());
        let mut reflexive: HashMap<String, Vec<DbRelationship>> = HashMap::new();
        for (i, entity) in map.db_entities.iter().enumerate() {
            for rel in &entity.relationships {
                if rel.to_many || rel.to_dependent_pk {
                    continue;
                }
                if rel.is_reflexive() {
                    reflexive.entry(entity.name.clone()).or_default().push(rel.clone());
                    continue;
                }
                let Some(&master) = index.get(rel.target_entity.as_str()) else {
                    continue;
                };
                if targets_primary_key(map, rel) {
                    graph.add_edge(master, i);
                }
            }
        }

        let order = graph.component_order();
        let components = map
            .db_entities
            .iter()
            .zip(order)
            .enumerate()
            .map(|(i, (e, position))| (e.name.clone(), (position, i)))
            .collect();
        let obj_tables = map
            .obj_entities
            .iter()
            .map(|e| (e.name.clone(), e.db_entity.clone()))
            .collect();

        debug!(
            tables = map.db_entities.len(),
            reflexive = reflexive.len(),
            "Indexed entity dependencies"
        );

        Self {
            components,
            obj_tables,
            reflexive,
            weights: HashMap::new(),
        }
    }

    /// Override the sort weight of a table. Tables sort by weight first
    /// (default 1), then by dependency order.
    pub fn with_sort_weight(mut self, table: impl Into<String>, weight: i32) -> Self {
        self.weights.insert(table.into(), weight);
        self
    }

    /// Whether the table has self-referencing to-one relationships.
    pub fn is_reflexive(&self, table: &str) -> bool {
        self.reflexive.contains_key(table)
    }

    fn key(&self, table: &str) -> (i32, usize, usize) {
        match self.components.get(table) {
            Some(&(position, model_index)) => (
                self.weights.get(table).copied().unwrap_or(DEFAULT_SORT_WEIGHT),
                position,
                model_index,
            ),
            None => (i32::MAX, usize::MAX, usize::MAX),
        }
    }

    fn sort_by_table<T>(&self, items: &mut [T], table: impl Fn(&T) -> &str, delete_order: bool) {
        items.sort_by_key(|item| self.key(table(item)));
        if delete_order {
            items.reverse();
        }
    }

    /// Sort tables for insert (masters first) or delete order.
    pub fn sort_db_entities(&self, entities: &mut [&DbEntity], delete_order: bool) {
        self.sort_by_table(entities, |e| e.name.as_str(), delete_order);
    }

    /// Sort table names; unknown names go last in insert order.
    pub fn sort_db_entity_names(&self, names: &mut [String], delete_order: bool) {
        self.sort_by_table(names, |n| n.as_str(), delete_order);
    }

    /// All indexed table names in sorted order.
    pub fn sorted_db_entity_names(&self, delete_order: bool) -> Vec<String> {
        let mut names: Vec<String> = self.components.keys().cloned().collect();
        self.sort_db_entity_names(&mut names, delete_order);
        names
    }

    /// Sort object entities by the order of their tables.
    pub fn sort_obj_entities(&self, entities: &mut [&ObjEntity], delete_order: bool) {
        self.sort_by_table(entities, |e| e.db_entity.as_str(), delete_order);
    }

    /// Order objects of one entity so that, for self-referencing tables,
    /// a master object precedes the objects pointing at it (reversed for
    /// delete). Other entities are left untouched.
    pub fn sort_objects_for_entity(
        &self,
        entity: &ObjEntity,
        objects: &mut Vec<PersistentObject>,
        delete_order: bool,
    ) -> Result<()> {
        let table = self
            .obj_tables
            .get(&entity.name)
            .ok_or_else(|| Error::UnknownEntity(entity.name.clone()))?;
        let Some(relationships) = self.reflexive.get(table) else {
            return Ok(());
        };
        if objects.len() < 2 {
            return Ok(());
        }

        let masters: Vec<Option<usize>> = objects
            .iter()
            .map(|object| {
                relationships.iter().find_map(|rel| {
                    let master_id = master_id(object, rel)?;
                    objects.iter().position(|o| same_identity(&o.id, &master_id))
                })
            })
            .collect();

        let mut depths = Vec::with_capacity(objects.len());
        for (i, object) in objects.iter().enumerate() {
            let mut depth = 0usize;
            let mut current = masters[i];
            while let Some(parent) = current {
                depth += 1;
                if parent == i || depth > objects.len() {
                    return Err(Error::SortCycle {
                        entity: format!("{} at {}", entity.name, object.id),
                    });
                }
                current = masters[parent];
            }
            depths.push(depth);
        }

        let mut indexed: Vec<(usize, PersistentObject)> = depths.into_iter().zip(objects.drain(..)).collect();
        indexed.sort_by_key(|(depth, _)| *depth);
        objects.extend(indexed.into_iter().map(|(_, object)| object));
        if delete_order {
            objects.reverse();
        }
        Ok(())
    }
}

/// True when every join ends in a primary key column of the target.
fn targets_primary_key(map: &DataMap, rel: &DbRelationship) -> bool {
    let Some(target) = map.db_entity(&rel.target_entity) else {
        return false;
    };
    !rel.joins.is_empty()
        && rel
            .joins
            .iter()
            .all(|j| target.attribute(&j.target).is_some_and(|a| a.primary_key))
}

/// Id of the object a reflexive relationship points at, read from the
/// object's foreign key values.
fn master_id(object: &PersistentObject, rel: &DbRelationship) -> Option<ObjectId> {
    let snapshot = object.effective_snapshot()?;
    let mut id = ObjectId::new(object.id.entity.clone());
    for join in &rel.joins {
        let value = snapshot.get(&join.source)?;
        if value.is_null() {
            return None;
        }
        id = id.with_key(join.target.clone(), value.clone());
    }
    Some(id)
}

fn same_identity(a: &ObjectId, b: &ObjectId) -> bool {
    a.entity == b.entity
        && a.snapshot.len() == b.snapshot.len()
        && a.snapshot
            .iter()
            .all(|(k, v)| b.get(k).is_some_and(|other: &Value| v.loose_eq(other)))
}
