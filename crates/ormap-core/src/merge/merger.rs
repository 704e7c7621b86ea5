//! Comparison of a model with tables detected in a database.

use super::token::{MergeDirection, MergerToken, TokenKind};
use crate::map::{DataMap, DbAttribute, DbEntity, DbRelationship};
use crate::sort::EntitySorter;
use tracing::debug;

/// Produces merger tokens from a model and the tables found in a database.
///
/// Table and column names are matched case-insensitively, since databases
/// commonly report identifiers in a different case than they were created
/// with.
#[derive(Debug, Clone, Default)]
pub struct DbMerger {
    skip_relationships: bool,
    skip_primary_keys: bool,
}

impl DbMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignore relationship differences.
    pub fn with_skip_relationships(mut self, skip: bool) -> Self {
        self.skip_relationships = skip;
        self
    }

    /// Ignore primary key differences.
    pub fn with_skip_primary_keys(mut self, skip: bool) -> Self {
        self.skip_primary_keys = skip;
        self
    }

    /// Tokens turning `detected` into `model`. To-db tokens come first, in
    /// execution order; to-model tokens follow.
    pub fn create_merge_tokens(&self, model: &DataMap, detected: &[DbEntity]) -> Vec<MergerToken> {
        let mut tokens = Vec::new();

        for entity in &model.db_entities {
            match find_table(detected, &entity.name) {
                None => tokens.push(MergerToken::to_db(TokenKind::CreateTable(entity.clone()))),
                Some(db) => self.compare_table(entity, db, &mut tokens),
            }
        }
        for db in detected {
            if find_table(&model.db_entities, &db.name).is_none() {
                tokens.push(MergerToken::to_db(TokenKind::DropTable(db.clone())));
            }
        }

        let sorted = sort_tokens(model, detected, tokens);
        debug!(
            model = %model.name,
            tokens = sorted.len(),
            "Computed schema merge tokens"
        );
        sorted
    }

    fn compare_table(&self, model: &DbEntity, db: &DbEntity, tokens: &mut Vec<MergerToken>) {
        let table = model.name.clone();

        for column in &model.attributes {
            match db.attribute_ignore_case(&column.name) {
                None => {
                    tokens.push(MergerToken::to_db(TokenKind::AddColumn {
                        table: table.clone(),
                        column: column.clone(),
                    }));
                    if column.mandatory {
                        tokens.push(MergerToken::to_db(TokenKind::SetNotNull {
                            table: table.clone(),
                            column: column.clone(),
                        }));
                    }
                }
                Some(existing) => compare_column(&table, column, existing, tokens),
            }
        }
        for existing in &db.attributes {
            if model.attribute_ignore_case(&existing.name).is_none() {
                tokens.push(MergerToken::to_db(TokenKind::DropColumn {
                    table: table.clone(),
                    column: existing.clone(),
                }));
            }
        }

        if !self.skip_primary_keys {
            let wanted = normalized_keys(model);
            let found = normalized_keys(db);
            if wanted != found {
                tokens.push(MergerToken::to_db(TokenKind::SetPrimaryKey {
                    table: table.clone(),
                    from: db.primary_key_names().into_iter().map(str::to_string).collect(),
                    to: model.primary_key_names().into_iter().map(str::to_string).collect(),
                }));
            }
        }

        if !self.skip_relationships {
            for rel in model.relationships.iter().filter(|r| !r.to_many) {
                if !db.relationships.iter().any(|d| same_relationship(rel, d)) {
                    tokens.push(MergerToken::to_db(TokenKind::AddRelationship {
                        table: table.clone(),
                        relationship: rel.clone(),
                    }));
                }
            }
            for rel in &db.relationships {
                if model.relationships.iter().any(|m| same_relationship(m, rel)) {
                    continue;
                }
                let drop = MergerToken::to_db(TokenKind::DropRelationship {
                    table: table.clone(),
                    relationship: rel.clone(),
                });
                // a to-many side has no constraint to drop; offer it to the model
                tokens.push(if rel.to_many { drop.reverse() } else { drop });
            }
        }
    }
}

fn compare_column(table: &str, model: &DbAttribute, db: &DbAttribute, tokens: &mut Vec<MergerToken>) {
    if model.mandatory != db.mandatory {
        let kind = if model.mandatory {
            TokenKind::SetNotNull {
                table: table.to_string(),
                column: model.clone(),
            }
        } else {
            TokenKind::SetAllowNull {
                table: table.to_string(),
                column: model.clone(),
            }
        };
        tokens.push(MergerToken::to_db(kind));
    }

    let length_changed = model.jdbc_type.is_character()
        && db.jdbc_type.is_character()
        && model.max_length.is_some()
        && model.max_length != db.max_length;
    if length_changed {
        tokens.push(MergerToken::to_db(TokenKind::SetColumnType {
            table: table.to_string(),
            from: db.clone(),
            to: model.clone(),
        }));
    }
}

fn find_table<'e>(tables: &'e [DbEntity], name: &str) -> Option<&'e DbEntity> {
    tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
}

fn normalized_keys(entity: &DbEntity) -> Vec<String> {
    let mut keys: Vec<String> = entity.primary_keys().map(|a| a.name.to_ascii_uppercase()).collect();
    keys.sort();
    keys
}

/// Relationships are the same when they link the same tables over the same
/// column pairs; names are not compared since databases invent their own.
fn same_relationship(a: &DbRelationship, b: &DbRelationship) -> bool {
    let pairs = |r: &DbRelationship| {
        let mut joins: Vec<(String, String)> = r
            .joins
            .iter()
            .map(|j| (j.source.to_ascii_uppercase(), j.target.to_ascii_uppercase()))
            .collect();
        joins.sort();
        joins
    };
    a.to_many == b.to_many && a.target_entity.eq_ignore_ascii_case(&b.target_entity) && pairs(a) == pairs(b)
}

/// To-db tokens by group; created tables in insert order and dropped tables
/// in delete order. To-model tokens keep their order after them.
fn sort_tokens(model: &DataMap, detected: &[DbEntity], tokens: Vec<MergerToken>) -> Vec<MergerToken> {
    let create_order = EntitySorter::new(model).sorted_db_entity_names(false);
    let detected_map = DataMap {
        db_entities: detected.to_vec(),
        ..DataMap::default()
    };
    let drop_order = EntitySorter::new(&detected_map).sorted_db_entity_names(true);
    let rank = |names: &[String], table: &str| {
        names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(table))
            .unwrap_or(usize::MAX)
    };

    let (mut to_db, to_model): (Vec<_>, Vec<_>) = tokens
        .into_iter()
        .partition(|t| t.direction == MergeDirection::ToDb);
    to_db.sort_by_key(|t| {
        let table_rank = match t.kind {
            TokenKind::CreateTable(_) => rank(&create_order, t.table_name()),
            TokenKind::DropTable(_) => rank(&drop_order, t.table_name()),
            _ => 0,
        };
        (t.sort_group(), table_rank)
    });
    to_db.extend(to_model);
    to_db
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::fixtures::art_map;
    use crate::types::JdbcType;
    use pretty_assertions::assert_eq;

    fn lowercased(entity: &DbEntity) -> DbEntity {
        let mut copy = entity.clone();
        copy.name = copy.name.to_ascii_lowercase();
        for attr in &mut copy.attributes {
            attr.name = attr.name.to_ascii_lowercase();
        }
        copy
    }

    fn describe(tokens: &[MergerToken]) -> Vec<String> {
        tokens.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_identical_schema_has_no_tokens() {
        let map = art_map();
        let detected: Vec<DbEntity> = map.db_entities.iter().map(lowercased).collect();
        assert!(DbMerger::new().with_skip_relationships(true).create_merge_tokens(&map, &detected).is_empty());
    }

    #[test]
    fn test_empty_database_creates_in_dependency_order() {
        let mut map = art_map();
        map.db_entities.reverse();
        let tokens = DbMerger::new().create_merge_tokens(&map, &[]);
        assert_eq!(
            describe(&tokens),
            vec![
                "Create Table GALLERY [To DB]",
                "Create Table ARTIST [To DB]",
                "Create Table PAINTING [To DB]",
            ]
        );
    }

    #[test]
    fn test_column_differences() {
        let map = art_map();
        let mut artist = map.db_entity("ARTIST").unwrap().clone();
        artist.relationships.clear();
        artist.attributes.retain(|a| a.name != "DATE_OF_BIRTH");
        artist.attributes[1].mandatory = false;
        artist.attributes[1].max_length = Some(100);
        artist.attributes.push(DbAttribute::new("LEGACY", JdbcType::Integer));

        let tokens = DbMerger::new()
            .with_skip_relationships(true)
            .create_merge_tokens(&map, &[artist, map.db_entities[1].clone(), map.db_entities[2].clone()]);
        assert_eq!(
            describe(&tokens),
            vec![
                "Drop Column ARTIST.LEGACY [To DB]",
                "Add Column ARTIST.DATE_OF_BIRTH [To DB]",
                "Set Column Type ARTIST.ARTIST_NAME CHAR(100) -> CHAR(254) [To DB]",
                "Set Not Null ARTIST.ARTIST_NAME [To DB]",
            ]
        );
    }

    #[test]
    fn test_relationship_tokens() {
        let map = art_map();
        let mut painting = map.db_entity("PAINTING").unwrap().clone();
        painting.relationships.retain(|r| r.name != "toGallery");
        painting
            .relationships
            .push(DbRelationship::to_many("fk_children", "PAINTING", "OTHER").with_join("PAINTING_ID", "P_ID"));
        let mut artist = map.db_entity("ARTIST").unwrap().clone();
        artist
            .relationships
            .push(DbRelationship::to_one("fk_legacy", "ARTIST", "GALLERY").with_join("ARTIST_ID", "GALLERY_ID"));

        let detected = vec![artist, map.db_entities[1].clone(), painting];
        let tokens = DbMerger::new().create_merge_tokens(&map, &detected);
        assert_eq!(
            describe(&tokens),
            vec![
                "Drop Relationship ARTIST.fk_legacy -> GALLERY [To DB]",
                "Add Relationship PAINTING.toGallery -> GALLERY [To DB]",
                "Add Relationship PAINTING.fk_children -> OTHER [To Model]",
            ]
        );
    }

    #[test]
    fn test_undeclared_table_dropped_and_pk_change() {
        let map = art_map();
        let mut gallery = map.db_entity("GALLERY").unwrap().clone();
        gallery.attributes[1].primary_key = true;
        let detected = vec![
            map.db_entities[0].clone(),
            gallery,
            map.db_entities[2].clone(),
            DbEntity::new("AUDIT_LOG"),
        ];
        let tokens = DbMerger::new().create_merge_tokens(&map, &detected);
        assert_eq!(
            describe(&tokens),
            vec![
                "Drop Table AUDIT_LOG [To DB]",
                "Set Primary Key GALLERY (GALLERY_ID, GALLERY_NAME) -> (GALLERY_ID) [To DB]",
            ]
        );
    }
}
