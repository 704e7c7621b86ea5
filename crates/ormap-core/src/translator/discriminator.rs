//! Columns and row matching for inheritance discriminators.

use super::path::{PathResolver, PathSegment};
use super::JoinType;
use crate::error::{Error, Result};
use crate::exp::Expression;
use crate::map::{DataMap, DbAttribute, EntityInheritanceTree, ObjEntity};
use crate::types::DataRow;

/// A column read to decide which entity a row belongs to.
#[derive(Debug, Clone)]
pub struct DiscriminatorColumn<'a> {
    /// Db path relative to the tree root; also the data row key.
    pub path: String,
    pub attribute: &'a DbAttribute,
    /// Relationships to join, empty for columns of the root table.
    pub segments: Vec<PathSegment<'a>>,
}

/// Ordered, deduplicated discriminator columns of an inheritance tree.
#[derive(Debug, Clone, Default)]
pub struct DiscriminatorColumns<'a> {
    columns: Vec<DiscriminatorColumn<'a>>,
}

impl<'a> DiscriminatorColumns<'a> {
    /// Collect the columns referenced by the qualifiers of concrete entities
    /// in the tree, parents before children.
    pub fn build(map: &'a DataMap, tree: &EntityInheritanceTree<'a>) -> Result<Self> {
        let resolver = PathResolver::new(map);
        let root_db = map.db_entity_for(tree.entity)?;
        let mut out = Self::default();

        for entity in tree.entities() {
            if entity.is_abstract {
                continue;
            }
            let Some(qualifier) = &entity.qualifier else {
                continue;
            };
            let db_qualifier = resolver.to_db_expression(entity, qualifier)?;
            for path in db_qualifier.paths() {
                let Expression::DbPath(path) = path else {
                    continue;
                };
                if out.columns.iter().any(|c| &c.path == path) {
                    continue;
                }
                let resolved = resolver.resolve_db_path(root_db, path, JoinType::LeftOuter)?;
                let attribute = resolved.attribute.ok_or_else(|| {
                    Error::InvalidExpression(format!(
                        "qualifier of '{}' compares relationship '{}'",
                        entity.name, path
                    ))
                })?;
                out.columns.push(DiscriminatorColumn {
                    path: path.clone(),
                    attribute,
                    segments: resolved.segments,
                });
            }
        }
        Ok(out)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiscriminatorColumn<'a>> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// The most specific concrete entity of the tree whose qualifier matches a
/// fetched row. Children are tried first; an entity without a qualifier
/// matches any row. Rows must be keyed by db path.
pub fn entity_matching_row<'a>(
    map: &'a DataMap,
    tree: &EntityInheritanceTree<'a>,
    row: &DataRow,
) -> Result<Option<&'a ObjEntity>> {
    let resolver = PathResolver::new(map);
    matching_node(&resolver, tree, row)
}

fn matching_node<'a>(
    resolver: &PathResolver<'a>,
    node: &EntityInheritanceTree<'a>,
    row: &DataRow,
) -> Result<Option<&'a ObjEntity>> {
    for child in &node.children {
        if let Some(found) = matching_node(resolver, child, row)? {
            return Ok(Some(found));
        }
    }
    if node.entity.is_abstract {
        return Ok(None);
    }
    match &node.entity.qualifier {
        None => Ok(Some(node.entity)),
        Some(qualifier) => {
            let db_qualifier = resolver.to_db_expression(node.entity, qualifier)?;
            Ok(db_qualifier.matches(row).then_some(node.entity))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::people_map;
    use super::*;
    use crate::types::Value;

    fn row(person_type: &str) -> DataRow {
        DataRow::from([
            ("PERSON_ID".to_string(), Value::Int(1)),
            ("PERSON_TYPE".to_string(), Value::from(person_type)),
        ])
    }

    #[test]
    fn test_columns_are_deduplicated() {
        let map = people_map();
        let tree = EntityInheritanceTree::build(&map, "AbstractPerson").unwrap();
        let columns = DiscriminatorColumns::build(&map, &tree).unwrap();
        let paths: Vec<_> = columns.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["PERSON_TYPE"]);
        assert!(columns.iter().all(|c| c.segments.is_empty()));
    }

    #[test]
    fn test_most_specific_entity_wins() {
        let map = people_map();
        let tree = EntityInheritanceTree::build(&map, "AbstractPerson").unwrap();
        let name = |t: &str| entity_matching_row(&map, &tree, &row(t)).unwrap().map(|e| e.name.clone());

        assert_eq!(name("EM").as_deref(), Some("Manager"));
        assert_eq!(name("EE").as_deref(), Some("Employee"));
        assert_eq!(name("C").as_deref(), Some("ClientContact"));
        assert_eq!(name("XX"), None);
    }

    #[test]
    fn test_subtree_matching() {
        let map = people_map();
        let tree = EntityInheritanceTree::build(&map, "Employee").unwrap();
        let found = entity_matching_row(&map, &tree, &row("C")).unwrap();
        assert!(found.is_none());
    }
}
