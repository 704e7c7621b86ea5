//! Resolution of object and db paths into relationship chains.

use super::JoinType;
use crate::error::{Error, Result};
use crate::exp::Expression;
use crate::map::{DataMap, DbAttribute, DbEntity, DbRelationship, ObjEntity};
use std::collections::BTreeMap;

/// One relationship traversal of a resolved path.
#[derive(Debug, Clone)]
pub struct PathSegment<'a> {
    pub relationship: &'a DbRelationship,
    pub join_type: JoinType,
    /// Explicit path alias; segments with different aliases never share joins.
    pub alias: Option<String>,
}

/// A path walked through the model.
#[derive(Debug, Clone)]
pub struct ResolvedPath<'a> {
    /// Relationships in traversal order.
    pub segments: Vec<PathSegment<'a>>,
    /// Terminal column, absent when the path ends in a relationship.
    pub attribute: Option<&'a DbAttribute>,
    /// Table owning the terminal column, or the last relationship's target.
    pub entity: &'a DbEntity,
    /// Equivalent db path (`rel.rel.COLUMN`), used as data row key.
    pub db_path: String,
}

impl<'a> ResolvedPath<'a> {
    /// Last relationship of the chain.
    pub fn last_relationship(&self) -> Option<&'a DbRelationship> {
        self.segments.last().map(|s| s.relationship)
    }

    /// Whether any traversed relationship is to-many.
    pub fn crosses_to_many(&self) -> bool {
        self.segments.iter().any(|s| s.relationship.to_many)
    }
}

/// Walks paths through a [`DataMap`].
#[derive(Debug, Clone)]
pub struct PathResolver<'a> {
    map: &'a DataMap,
    aliases: BTreeMap<String, String>,
}

/// Splits a trailing `+` (outer join marker) off a path segment.
fn split_outer(segment: &str) -> (&str, bool) {
    match segment.strip_suffix('+') {
        Some(name) => (name, true),
        None => (segment, false),
    }
}

impl<'a> PathResolver<'a> {
    /// Create a resolver without path aliases.
    pub fn new(map: &'a DataMap) -> Self {
        Self {
            map,
            aliases: BTreeMap::new(),
        }
    }

    /// Register path aliases: `alias -> relationship path`.
    pub fn with_aliases(mut self, aliases: BTreeMap<String, String>) -> Self {
        self.aliases = aliases;
        self
    }

    /// The model being resolved against.
    pub fn map(&self) -> &'a DataMap {
        self.map
    }

    /// Replace a leading alias with its path. Returns the expanded path,
    /// the alias name and how many segments the alias covers.
    fn expand_alias(&self, path: &str) -> (String, Option<String>, usize) {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let (name, outer) = split_outer(head);
        match self.aliases.get(name) {
            Some(target) => {
                let covered = target.split('.').count();
                // `alias+` outer-joins every segment the alias stands for
                let target = if outer {
                    target
                        .split('.')
                        .map(|segment| format!("{}+", split_outer(segment).0))
                        .collect::<Vec<_>>()
                        .join(".")
                } else {
                    target.clone()
                };
                let expanded = match rest {
                    Some(rest) => format!("{}.{}", target, rest),
                    None => target,
                };
                (expanded, Some(name.to_string()), covered)
            }
            None => (path.to_string(), None, 0),
        }
    }

    /// Resolve an object path such as `toArtist.artistName` or
    /// `paintingArray+.toGallery`.
    pub fn resolve_obj_path(&self, entity: &'a ObjEntity, path: &str) -> Result<ResolvedPath<'a>> {
        let (expanded, alias, alias_len) = self.expand_alias(path);
        let parts: Vec<&str> = expanded.split('.').collect();

        let mut current_obj = entity;
        let mut current_db = self.map.db_entity_for(entity)?;
        let mut segments = Vec::new();
        let mut db_parts: Vec<String> = Vec::new();

        for (i, raw) in parts.iter().enumerate() {
            let (name, outer) = split_outer(raw);
            let join_type = if outer { JoinType::LeftOuter } else { JoinType::Inner };
            let seg_alias = if i < alias_len { alias.clone() } else { None };
            let last = i + 1 == parts.len();

            if let Some(attr) = self.map.obj_attribute(current_obj, name) {
                if !last {
                    return Err(Error::unresolvable(
                        &entity.name,
                        path,
                        format!("attribute '{}' in the middle of a path", name),
                    ));
                }
                let tail = self.walk_db(current_db, &attr.db_path, Some(join_type), seg_alias, path)?;
                segments.extend(tail.segments);
                db_parts.push(tail.db_path);
                return Ok(ResolvedPath {
                    segments,
                    attribute: tail.attribute,
                    entity: tail.entity,
                    db_path: db_parts.join("."),
                });
            }

            let rel = self.map.obj_relationship(current_obj, name).ok_or_else(|| {
                Error::unresolvable(
                    &entity.name,
                    path,
                    format!("no attribute or relationship '{}' in '{}'", name, current_obj.name),
                )
            })?;
            for db_name in rel.db_path.split('.') {
                let db_rel = current_db.relationship(db_name).ok_or_else(|| {
                    Error::unresolvable(
                        &entity.name,
                        path,
                        format!("no db relationship '{}' in '{}'", db_name, current_db.name),
                    )
                })?;
                segments.push(PathSegment {
                    relationship: db_rel,
                    join_type,
                    alias: seg_alias.clone(),
                });
                db_parts.push(db_name.to_string());
                current_db = self.map.require_db_entity(&db_rel.target_entity)?;
            }
            current_obj = self.map.require_obj_entity(&rel.target_entity)?;
        }

        Ok(ResolvedPath {
            segments,
            attribute: None,
            entity: current_db,
            db_path: db_parts.join("."),
        })
    }

    /// Resolve a db path such as `toArtist.ARTIST_NAME`. Segments marked with
    /// `+` use outer joins, others use `default_join`.
    pub fn resolve_db_path(
        &self,
        entity: &'a DbEntity,
        path: &str,
        default_join: JoinType,
    ) -> Result<ResolvedPath<'a>> {
        let (expanded, alias, alias_len) = self.expand_alias(path);
        let mut resolved = self.walk_db(entity, &expanded, None, None, path)?;
        for (i, seg) in resolved.segments.iter_mut().enumerate() {
            if seg.join_type != JoinType::LeftOuter {
                seg.join_type = default_join;
            }
            if i < alias_len {
                seg.alias = alias.clone();
            }
        }
        Ok(resolved)
    }

    /// Walk a dotted db path. `forced_join` overrides the per-segment join
    /// type when set (flattened attributes inherit the object segment's).
    fn walk_db(
        &self,
        entity: &'a DbEntity,
        db_path: &str,
        forced_join: Option<JoinType>,
        alias: Option<String>,
        original: &str,
    ) -> Result<ResolvedPath<'a>> {
        let parts: Vec<&str> = db_path.split('.').collect();
        let mut current = entity;
        let mut segments = Vec::new();
        let mut names = Vec::new();

        for (i, raw) in parts.iter().enumerate() {
            let (name, outer) = split_outer(raw);
            let last = i + 1 == parts.len();
            names.push(name.to_string());

            if let Some(attr) = current.attribute(name) {
                if !last {
                    return Err(Error::unresolvable(
                        &entity.name,
                        original,
                        format!("column '{}' in the middle of a path", name),
                    ));
                }
                return Ok(ResolvedPath {
                    segments,
                    attribute: Some(attr),
                    entity: current,
                    db_path: names.join("."),
                });
            }

            let rel = current.relationship(name).ok_or_else(|| {
                Error::unresolvable(
                    &entity.name,
                    original,
                    format!("no column or relationship '{}' in '{}'", name, current.name),
                )
            })?;
            let join_type = match (forced_join, outer) {
                (_, true) => JoinType::LeftOuter,
                (Some(forced), false) => forced,
                (None, false) => JoinType::Inner,
            };
            segments.push(PathSegment {
                relationship: rel,
                join_type,
                alias: alias.clone(),
            });
            current = self.map.require_db_entity(&rel.target_entity)?;
        }

        Ok(ResolvedPath {
            segments,
            attribute: None,
            entity: current,
            db_path: names.join("."),
        })
    }

    /// Equivalent db path of an object path.
    pub fn to_db_path(&self, entity: &'a ObjEntity, path: &str) -> Result<String> {
        Ok(self.resolve_obj_path(entity, path)?.db_path)
    }

    /// Rewrite every object path of an expression as a db path.
    pub fn to_db_expression(&self, entity: &'a ObjEntity, exp: &Expression) -> Result<Expression> {
        let convert = |e: &Expression| self.to_db_expression(entity, e);
        let boxed = |e: &Expression| convert(e).map(Box::new);
        Ok(match exp {
            Expression::ObjPath(path) => Expression::DbPath(self.to_db_path(entity, path)?),
            Expression::DbPath(_) | Expression::Literal(_) | Expression::Param(_) => exp.clone(),
            Expression::List(items) => Expression::List(items.iter().map(convert).collect::<Result<_>>()?),
            Expression::Binary { op, left, right } => Expression::Binary {
                op: *op,
                left: boxed(left)?,
                right: boxed(right)?,
            },
            Expression::In {
                operand,
                values,
                negated,
            } => Expression::In {
                operand: boxed(operand)?,
                values: values.iter().map(convert).collect::<Result<_>>()?,
                negated: *negated,
            },
            Expression::Between {
                operand,
                lower,
                upper,
                negated,
            } => Expression::Between {
                operand: boxed(operand)?,
                lower: boxed(lower)?,
                upper: boxed(upper)?,
                negated: *negated,
            },
            Expression::And(items) => Expression::And(items.iter().map(convert).collect::<Result<_>>()?),
            Expression::Or(items) => Expression::Or(items.iter().map(convert).collect::<Result<_>>()?),
            Expression::Not(inner) => Expression::Not(boxed(inner)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::art_map;
    use super::*;
    use crate::exp::parse;

    #[test]
    fn test_resolve_attribute_through_relationship() {
        let map = art_map();
        let resolver = PathResolver::new(&map);
        let painting = map.obj_entity("Painting").unwrap();
        let path = resolver.resolve_obj_path(painting, "toArtist.artistName").unwrap();
        assert_eq!(path.segments.len(), 1);
        assert_eq!(path.segments[0].relationship.name, "toArtist");
        assert_eq!(path.segments[0].join_type, JoinType::Inner);
        assert_eq!(path.attribute.unwrap().name, "ARTIST_NAME");
        assert_eq!(path.db_path, "toArtist.ARTIST_NAME");
    }

    #[test]
    fn test_outer_marker() {
        let map = art_map();
        let resolver = PathResolver::new(&map);
        let artist = map.obj_entity("Artist").unwrap();
        let path = resolver.resolve_obj_path(artist, "paintingArray+.paintingTitle").unwrap();
        assert_eq!(path.segments[0].join_type, JoinType::LeftOuter);
        assert!(path.crosses_to_many());
    }

    #[test]
    fn test_relationship_terminal() {
        let map = art_map();
        let resolver = PathResolver::new(&map);
        let painting = map.obj_entity("Painting").unwrap();
        let path = resolver.resolve_obj_path(painting, "toGallery").unwrap();
        assert!(path.attribute.is_none());
        assert_eq!(path.entity.name, "GALLERY");
    }

    #[test]
    fn test_unresolvable_paths() {
        let map = art_map();
        let resolver = PathResolver::new(&map);
        let artist = map.obj_entity("Artist").unwrap();
        assert!(matches!(
            resolver.resolve_obj_path(artist, "nope"),
            Err(Error::UnresolvablePath { .. })
        ));
        assert!(matches!(
            resolver.resolve_obj_path(artist, "artistName.length"),
            Err(Error::UnresolvablePath { .. })
        ));
    }

    #[test]
    fn test_alias_expansion() {
        let map = art_map();
        let aliases = BTreeMap::from([("p2".to_string(), "paintingArray".to_string())]);
        let resolver = PathResolver::new(&map).with_aliases(aliases);
        let artist = map.obj_entity("Artist").unwrap();
        let path = resolver.resolve_obj_path(artist, "p2.paintingTitle").unwrap();
        assert_eq!(path.segments[0].alias.as_deref(), Some("p2"));
        assert_eq!(path.db_path, "paintingArray.PAINTING_TITLE");
        assert_eq!(path.segments[0].join_type, JoinType::Inner);
    }

    #[test]
    fn test_outer_marker_on_alias() {
        let map = art_map();
        let aliases = BTreeMap::from([("p2".to_string(), "paintingArray".to_string())]);
        let resolver = PathResolver::new(&map).with_aliases(aliases);
        let artist = map.obj_entity("Artist").unwrap();
        let path = resolver.resolve_obj_path(artist, "p2+.paintingTitle").unwrap();
        assert_eq!(path.segments[0].join_type, JoinType::LeftOuter);
        assert_eq!(path.segments[0].alias.as_deref(), Some("p2"));
        assert_eq!(path.db_path, "paintingArray.PAINTING_TITLE");
    }

    #[test]
    fn test_db_path_default_join() {
        let map = art_map();
        let resolver = PathResolver::new(&map);
        let painting = map.db_entity("PAINTING").unwrap();
        let path = resolver
            .resolve_db_path(painting, "toGallery.GALLERY_NAME", JoinType::LeftOuter)
            .unwrap();
        assert_eq!(path.segments[0].join_type, JoinType::LeftOuter);
        assert_eq!(path.attribute.unwrap().name, "GALLERY_NAME");
    }

    #[test]
    fn test_to_db_expression() {
        let map = art_map();
        let resolver = PathResolver::new(&map);
        let painting = map.obj_entity("Painting").unwrap();
        let exp = parse("toArtist.artistName = 'X' and estimatedPrice > 5").unwrap();
        assert_eq!(
            resolver.to_db_expression(painting, &exp).unwrap(),
            parse("db:toArtist.ARTIST_NAME = 'X' and db:ESTIMATED_PRICE > 5").unwrap()
        );
    }
}
