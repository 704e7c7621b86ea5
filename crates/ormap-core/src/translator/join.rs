//! Join tree assembly with table alias allocation.

use super::qualifier::QualifierTranslator;
use crate::error::{Error, Result};
use crate::map::{DataMap, DbEntity, DbRelationship};
use crate::types::{ParameterBinding, QuotingStrategy};

/// SQL join semantics of a relationship traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    Inner,
    LeftOuter,
    /// Representable in the tree but never rendered.
    RightOuter,
}

/// A node of the join tree: one aliased table.
#[derive(Debug, Clone)]
pub struct JoinNode<'a> {
    /// Relationship leading here from the parent; `None` for the root.
    pub relationship: Option<&'a DbRelationship>,
    /// Explicit path alias the node was created for.
    pub path_alias: Option<String>,
    pub join_type: JoinType,
    pub entity: &'a DbEntity,
    /// Table alias (`t0`, `t1`, ...).
    pub table_alias: String,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl JoinNode<'_> {
    fn matches(&self, relationship: &DbRelationship, path_alias: Option<&str>) -> bool {
        self.relationship.is_some_and(|r| {
            r.name == relationship.name && r.source_entity == relationship.source_entity
        }) && self.path_alias.as_deref() == path_alias
    }
}

/// Tree of joined tables rooted at the query's table.
///
/// Each path traversal starts at the root (`reset`) and pushes its
/// relationships in order; a relationship already pushed from the same parent
/// with the same path alias reuses that node.
#[derive(Debug, Clone)]
pub struct JoinStack<'a> {
    map: &'a DataMap,
    nodes: Vec<JoinNode<'a>>,
    top: usize,
    quoting: QuotingStrategy,
}

impl<'a> JoinStack<'a> {
    /// Create a stack whose root is `root`, aliased `t0`.
    pub fn new(map: &'a DataMap, root: &'a DbEntity, quoting: QuotingStrategy) -> Self {
        let root = JoinNode {
            relationship: None,
            path_alias: None,
            join_type: JoinType::Inner,
            entity: root,
            table_alias: "t0".to_string(),
            parent: None,
            children: Vec::new(),
        };
        Self {
            map,
            nodes: vec![root],
            top: 0,
            quoting,
        }
    }

    /// Move back to the root.
    pub fn reset(&mut self) {
        self.top = 0;
    }

    /// Alias of the current node.
    pub fn current_alias(&self) -> &str {
        &self.nodes[self.top].table_alias
    }

    /// Table of the current node.
    pub fn current_entity(&self) -> &'a DbEntity {
        self.nodes[self.top].entity
    }

    /// Root table alias.
    pub fn root_alias(&self) -> &str {
        &self.nodes[0].table_alias
    }

    /// Number of joined tables, not counting the root.
    pub fn join_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// All nodes in creation order; the root comes first.
    pub fn nodes(&self) -> &[JoinNode<'a>] {
        &self.nodes
    }

    /// Traverse `relationship` from the current node, creating a node on
    /// first use. A reused node keeps the join type it was created with.
    pub fn push_join(
        &mut self,
        relationship: &'a DbRelationship,
        join_type: JoinType,
        path_alias: Option<&str>,
    ) -> Result<()> {
        let existing = self.nodes[self.top]
            .children
            .iter()
            .copied()
            .find(|&i| self.nodes[i].matches(relationship, path_alias));

        self.top = match existing {
            Some(index) => index,
            None => {
                let entity = self.map.require_db_entity(&relationship.target_entity)?;
                let index = self.nodes.len();
                self.nodes.push(JoinNode {
                    relationship: Some(relationship),
                    path_alias: path_alias.map(str::to_string),
                    join_type,
                    entity,
                    table_alias: format!("t{}", index),
                    parent: Some(self.top),
                    children: Vec::new(),
                });
                self.nodes[self.top].children.push(index);
                index
            }
        };
        Ok(())
    }

    /// Append `TABLE t0`.
    pub fn append_root(&self, out: &mut String) {
        let root = &self.nodes[0];
        out.push_str(&root.entity.quoted_name(&self.quoting));
        out.push(' ');
        out.push_str(&root.table_alias);
    }

    /// Append all join clauses depth-first, collecting bindings of table
    /// qualifiers rendered in ON clauses.
    pub fn append_joins(&self, out: &mut String, bindings: &mut Vec<ParameterBinding>) -> Result<()> {
        self.append_children(0, out, bindings)
    }

    fn append_children(
        &self,
        index: usize,
        out: &mut String,
        bindings: &mut Vec<ParameterBinding>,
    ) -> Result<()> {
        for &child in &self.nodes[index].children {
            self.append_join(child, out, bindings)?;
            self.append_children(child, out, bindings)?;
        }
        Ok(())
    }

    fn append_join(
        &self,
        index: usize,
        out: &mut String,
        bindings: &mut Vec<ParameterBinding>,
    ) -> Result<()> {
        let node = &self.nodes[index];
        let (Some(relationship), Some(parent)) = (node.relationship, node.parent) else {
            return Ok(());
        };
        let parent_alias = &self.nodes[parent].table_alias;

        out.push_str(match node.join_type {
            JoinType::Inner => " JOIN ",
            JoinType::LeftOuter => " LEFT JOIN ",
            JoinType::RightOuter => return Err(Error::UnsupportedJoinType(node.join_type)),
        });
        out.push_str(&node.entity.quoted_name(&self.quoting));
        out.push(' ');
        out.push_str(&node.table_alias);
        out.push_str(" ON (");

        let conditions: Vec<String> = relationship
            .joins
            .iter()
            .map(|j| {
                format!(
                    "{} = {}",
                    self.quoting.column(Some(parent_alias), &j.source),
                    self.quoting.column(Some(&node.table_alias), &j.target)
                )
            })
            .collect();
        out.push_str(&conditions.join(" AND "));

        if let Some(qualifier) = &node.entity.qualifier {
            let (sql, qualifier_bindings) =
                QualifierTranslator::scoped(self.map, node.entity, &node.table_alias, self.quoting)
                    .translate(qualifier)?;
            if !conditions.is_empty() {
                out.push_str(" AND ");
            }
            out.push('(');
            out.push_str(&sql);
            out.push(')');
            bindings.extend(qualifier_bindings);
        }
        out.push(')');
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::art_map;
    use super::*;
    use crate::exp::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reuses_same_relationship_and_alias() {
        let map = art_map();
        let artist = map.db_entity("ARTIST").unwrap();
        let paintings = artist.relationship("paintingArray").unwrap();
        let mut stack = JoinStack::new(&map, artist, QuotingStrategy::plain());

        stack.push_join(paintings, JoinType::Inner, None).unwrap();
        assert_eq!(stack.current_alias(), "t1");
        stack.reset();
        stack.push_join(paintings, JoinType::LeftOuter, None).unwrap();
        assert_eq!(stack.current_alias(), "t1");
        stack.reset();
        stack.push_join(paintings, JoinType::Inner, Some("p2")).unwrap();
        assert_eq!(stack.current_alias(), "t2");
        assert_eq!(stack.join_count(), 2);

        // first join type wins
        assert_eq!(stack.nodes()[1].join_type, JoinType::Inner);
    }

    #[test]
    fn test_renders_nested_joins() {
        let map = art_map();
        let gallery = map.db_entity("GALLERY").unwrap();
        let painting = map.db_entity("PAINTING").unwrap();
        let mut stack = JoinStack::new(&map, gallery, QuotingStrategy::plain());
        stack
            .push_join(gallery.relationship("paintingArray").unwrap(), JoinType::Inner, None)
            .unwrap();
        stack
            .push_join(painting.relationship("toArtist").unwrap(), JoinType::LeftOuter, None)
            .unwrap();

        let mut sql = String::new();
        stack.append_root(&mut sql);
        let mut bindings = Vec::new();
        stack.append_joins(&mut sql, &mut bindings).unwrap();
        assert_eq!(
            sql,
            "GALLERY t0 JOIN PAINTING t1 ON (t0.GALLERY_ID = t1.GALLERY_ID) \
             LEFT JOIN ARTIST t2 ON (t1.ARTIST_ID = t2.ARTIST_ID)"
        );
        assert!(bindings.is_empty());
    }

    #[test]
    fn test_table_qualifier_in_on_clause() {
        let mut map = art_map();
        map.db_entity_mut("PAINTING").unwrap().qualifier =
            Some(parse("db:ESTIMATED_PRICE > 100").unwrap());
        let artist = map.db_entity("ARTIST").unwrap();
        let mut stack = JoinStack::new(&map, artist, QuotingStrategy::quoted());
        stack
            .push_join(artist.relationship("paintingArray").unwrap(), JoinType::Inner, None)
            .unwrap();

        let mut sql = String::new();
        let mut bindings = Vec::new();
        stack.append_joins(&mut sql, &mut bindings).unwrap();
        assert_eq!(
            sql,
            " JOIN \"PAINTING\" t1 ON (t0.\"ARTIST_ID\" = t1.\"ARTIST_ID\" AND (t1.\"ESTIMATED_PRICE\" > ?))"
        );
        assert_eq!(bindings.len(), 1);
    }

    #[test]
    fn test_right_outer_is_rejected() {
        let map = art_map();
        let artist = map.db_entity("ARTIST").unwrap();
        let mut stack = JoinStack::new(&map, artist, QuotingStrategy::plain());
        stack
            .push_join(artist.relationship("paintingArray").unwrap(), JoinType::RightOuter, None)
            .unwrap();
        let err = stack.append_joins(&mut String::new(), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedJoinType(JoinType::RightOuter)));
    }
}
