//! Mapping model: tables, columns, object entities and relationships.
//!
//! Models are built in code with the `with_*` builders or loaded from JSON,
//! where qualifiers are written as expression strings.

mod attribute;
mod data_map;
mod entity;
mod inheritance;
mod relationship;

pub use attribute::{DbAttribute, ObjAttribute};
pub use data_map::DataMap;
pub use entity::{DbEntity, ObjEntity};
pub use inheritance::EntityInheritanceTree;
pub use relationship::{DbJoin, DbRelationship, ObjRelationship};
