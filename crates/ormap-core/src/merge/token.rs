//! Individual schema changes.

use crate::error::{Error, Result};
use crate::map::{DataMap, DbAttribute, DbEntity, DbRelationship};
use crate::types::QuotingStrategy;
use std::fmt;

/// Which side a token changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeDirection {
    /// Change the database to match the model.
    ToDb,
    /// Change the model to match the database.
    ToModel,
}

impl MergeDirection {
    pub fn reverse(self) -> Self {
        match self {
            MergeDirection::ToDb => MergeDirection::ToModel,
            MergeDirection::ToModel => MergeDirection::ToDb,
        }
    }
}

impl fmt::Display for MergeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MergeDirection::ToDb => "To DB",
            MergeDirection::ToModel => "To Model",
        })
    }
}

/// The change a token carries.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    CreateTable(DbEntity),
    DropTable(DbEntity),
    AddColumn {
        table: String,
        column: DbAttribute,
    },
    DropColumn {
        table: String,
        column: DbAttribute,
    },
    SetColumnType {
        table: String,
        from: DbAttribute,
        to: DbAttribute,
    },
    SetNotNull {
        table: String,
        column: DbAttribute,
    },
    SetAllowNull {
        table: String,
        column: DbAttribute,
    },
    AddRelationship {
        table: String,
        relationship: DbRelationship,
    },
    DropRelationship {
        table: String,
        relationship: DbRelationship,
    },
    SetPrimaryKey {
        table: String,
        from: Vec<String>,
        to: Vec<String>,
    },
}

/// One schema-diff operation with its direction.
#[derive(Debug, Clone, PartialEq)]
pub struct MergerToken {
    pub kind: TokenKind,
    pub direction: MergeDirection,
}

impl MergerToken {
    pub fn to_db(kind: TokenKind) -> Self {
        Self {
            kind,
            direction: MergeDirection::ToDb,
        }
    }

    pub fn to_model(kind: TokenKind) -> Self {
        Self {
            kind,
            direction: MergeDirection::ToModel,
        }
    }

    /// Human readable operation name.
    pub fn name(&self) -> &'static str {
        match &self.kind {
            TokenKind::CreateTable(_) => "Create Table",
            TokenKind::DropTable(_) => "Drop Table",
            TokenKind::AddColumn { .. } => "Add Column",
            TokenKind::DropColumn { .. } => "Drop Column",
            TokenKind::SetColumnType { .. } => "Set Column Type",
            TokenKind::SetNotNull { .. } => "Set Not Null",
            TokenKind::SetAllowNull { .. } => "Set Allow Null",
            TokenKind::AddRelationship { .. } => "Add Relationship",
            TokenKind::DropRelationship { .. } => "Drop Relationship",
            TokenKind::SetPrimaryKey { .. } => "Set Primary Key",
        }
    }

    /// Table the token applies to.
    pub fn table_name(&self) -> &str {
        match &self.kind {
            TokenKind::CreateTable(e) | TokenKind::DropTable(e) => &e.name,
            TokenKind::AddColumn { table, .. }
            | TokenKind::DropColumn { table, .. }
            | TokenKind::SetColumnType { table, .. }
            | TokenKind::SetNotNull { table, .. }
            | TokenKind::SetAllowNull { table, .. }
            | TokenKind::AddRelationship { table, .. }
            | TokenKind::DropRelationship { table, .. }
            | TokenKind::SetPrimaryKey { table, .. } => table,
        }
    }

    /// Token undoing this one, on the opposite side.
    pub fn reverse(&self) -> Self {
        let kind = match self.kind.clone() {
            TokenKind::CreateTable(e) => TokenKind::DropTable(e),
            TokenKind::DropTable(e) => TokenKind::CreateTable(e),
            TokenKind::AddColumn { table, column } => TokenKind::DropColumn { table, column },
            TokenKind::DropColumn { table, column } => TokenKind::AddColumn { table, column },
            TokenKind::SetColumnType { table, from, to } => TokenKind::SetColumnType {
                table,
                from: to,
                to: from,
            },
            TokenKind::SetNotNull { table, column } => TokenKind::SetAllowNull { table, column },
            TokenKind::SetAllowNull { table, column } => TokenKind::SetNotNull { table, column },
            TokenKind::AddRelationship {
                table,
                relationship,
            } => TokenKind::DropRelationship {
                table,
                relationship,
            },
            TokenKind::DropRelationship {
                table,
                relationship,
            } => TokenKind::AddRelationship {
                table,
                relationship,
            },
            TokenKind::SetPrimaryKey { table, from, to } => TokenKind::SetPrimaryKey {
                table,
                from: to,
                to: from,
            },
        };
        Self {
            kind,
            direction: self.direction.reverse(),
        }
    }

    /// Execution group of a to-db token. Relationship drops run first and
    /// relationship additions last.
    pub fn sort_group(&self) -> u8 {
        match &self.kind {
            TokenKind::DropRelationship { .. } => 0,
            TokenKind::DropTable(_) => 1,
            TokenKind::DropColumn { .. } => 2,
            TokenKind::CreateTable(_) => 3,
            TokenKind::AddColumn { .. } => 4,
            TokenKind::SetColumnType { .. } => 5,
            TokenKind::SetAllowNull { .. } => 6,
            TokenKind::SetNotNull { .. } => 7,
            TokenKind::SetPrimaryKey { .. } => 8,
            TokenKind::AddRelationship { .. } => 9,
        }
    }

    /// Generic DDL for a to-db token. To-model tokens produce nothing.
    pub fn create_sql(&self, quoting: &QuotingStrategy) -> Vec<String> {
        if self.direction == MergeDirection::ToModel {
            return Vec::new();
        }
        let id = |name: &str| quoting.identifier(name);
        let alter = |table: &str| format!("ALTER TABLE {}", id(table));

        match &self.kind {
            TokenKind::CreateTable(entity) => vec![create_table_sql(entity, quoting)],
            TokenKind::DropTable(entity) => vec![format!("DROP TABLE {}", entity.quoted_name(quoting))],
            TokenKind::AddColumn { table, column } => vec![format!(
                "{} ADD COLUMN {} {}",
                alter(table),
                id(&column.name),
                column.sql_type()
            )],
            TokenKind::DropColumn { table, column } => {
                vec![format!("{} DROP COLUMN {}", alter(table), id(&column.name))]
            }
            TokenKind::SetColumnType { table, to, .. } => vec![format!(
                "{} ALTER COLUMN {} SET DATA TYPE {}",
                alter(table),
                id(&to.name),
                to.sql_type()
            )],
            TokenKind::SetNotNull { table, column } => vec![format!(
                "{} ALTER COLUMN {} SET NOT NULL",
                alter(table),
                id(&column.name)
            )],
            TokenKind::SetAllowNull { table, column } => vec![format!(
                "{} ALTER COLUMN {} DROP NOT NULL",
                alter(table),
                id(&column.name)
            )],
            TokenKind::AddRelationship {
                table,
                relationship,
            } => match foreign_key_clause(relationship, quoting) {
                Some(fk) => vec![format!("{} ADD {}", alter(table), fk)],
                None => Vec::new(),
            },
            TokenKind::DropRelationship {
                table,
                relationship,
            } if !relationship.to_many => vec![format!(
                "{} DROP CONSTRAINT {}",
                alter(table),
                id(&relationship.name)
            )],
            TokenKind::DropRelationship { .. } => Vec::new(),
            TokenKind::SetPrimaryKey { table, from, to } => {
                let mut sql = Vec::new();
                if !from.is_empty() {
                    sql.push(format!("{} DROP PRIMARY KEY", alter(table)));
                }
                if !to.is_empty() {
                    let columns: Vec<String> = to.iter().map(|c| id(c)).collect();
                    sql.push(format!("{} ADD PRIMARY KEY ({})", alter(table), columns.join(", ")));
                }
                sql
            }
        }
    }

    /// Apply a to-model token to a model.
    pub fn apply_to_model(&self, map: &mut DataMap) -> Result<()> {
        if self.direction != MergeDirection::ToModel {
            return Err(Error::Configuration(format!("'{}' is not a model change", self)));
        }
        match &self.kind {
            TokenKind::CreateTable(entity) => {
                if map.db_entity(&entity.name).is_none() {
                    map.db_entities.push(entity.clone());
                }
            }
            TokenKind::DropTable(entity) => {
                map.db_entities.retain(|e| e.name != entity.name);
                for other in &mut map.db_entities {
                    other.relationships.retain(|r| r.target_entity != entity.name);
                }
                map.obj_entities.retain(|e| e.db_entity != entity.name);
            }
            TokenKind::AddColumn { table, column } => {
                let entity = table_mut(map, table)?;
                if entity.attribute(&column.name).is_none() {
                    entity.attributes.push(column.clone());
                }
            }
            TokenKind::DropColumn { table, column } => {
                table_mut(map, table)?.attributes.retain(|a| a.name != column.name);
                for obj in map.obj_entities.iter_mut().filter(|e| &e.db_entity == table) {
                    obj.attributes.retain(|a| a.db_path != column.name);
                }
            }
            TokenKind::SetColumnType { table, to, .. } => {
                let attr = column_mut(map, table, &to.name)?;
                attr.jdbc_type = to.jdbc_type;
                attr.max_length = to.max_length;
                attr.scale = to.scale;
            }
            TokenKind::SetNotNull { table, column } => column_mut(map, table, &column.name)?.mandatory = true,
            TokenKind::SetAllowNull { table, column } => {
                column_mut(map, table, &column.name)?.mandatory = false
            }
            TokenKind::AddRelationship {
                table,
                relationship,
            } => {
                let entity = table_mut(map, table)?;
                if entity.relationship(&relationship.name).is_none() {
                    entity.relationships.push(relationship.clone());
                }
            }
            TokenKind::DropRelationship {
                table,
                relationship,
            } => {
                table_mut(map, table)?
                    .relationships
                    .retain(|r| r.name != relationship.name);
            }
            TokenKind::SetPrimaryKey { table, to, .. } => {
                for attr in &mut table_mut(map, table)?.attributes {
                    attr.primary_key = to.iter().any(|c| c.eq_ignore_ascii_case(&attr.name));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for MergerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.table_name())?;
        match &self.kind {
            TokenKind::AddColumn { column, .. }
            | TokenKind::DropColumn { column, .. }
            | TokenKind::SetNotNull { column, .. }
            | TokenKind::SetAllowNull { column, .. } => write!(f, ".{}", column.name)?,
            TokenKind::SetColumnType { from, to, .. } => {
                write!(f, ".{} {} -> {}", to.name, from.sql_type(), to.sql_type())?
            }
            TokenKind::AddRelationship { relationship, .. }
            | TokenKind::DropRelationship { relationship, .. } => {
                write!(f, ".{} -> {}", relationship.name, relationship.target_entity)?
            }
            TokenKind::SetPrimaryKey { from, to, .. } => {
                write!(f, " ({}) -> ({})", from.join(", "), to.join(", "))?
            }
            TokenKind::CreateTable(_) | TokenKind::DropTable(_) => {}
        }
        write!(f, " [{}]", self.direction)
    }
}

/// `CREATE TABLE` with inline primary and foreign keys.
fn create_table_sql(entity: &DbEntity, quoting: &QuotingStrategy) -> String {
    let mut parts: Vec<String> = entity
        .attributes
        .iter()
        .map(|a| {
            let mut column = format!("{} {}", quoting.identifier(&a.name), a.sql_type());
            if a.mandatory {
                column.push_str(" NOT NULL");
            }
            column
        })
        .collect();

    let pks: Vec<String> = entity.primary_keys().map(|a| quoting.identifier(&a.name)).collect();
    if !pks.is_empty() {
        parts.push(format!("PRIMARY KEY ({})", pks.join(", ")));
    }
    parts.extend(
        entity
            .relationships
            .iter()
            .filter_map(|r| foreign_key_clause(r, quoting)),
    );

    format!("CREATE TABLE {} ({})", entity.quoted_name(quoting), parts.join(", "))
}

/// `FOREIGN KEY (..) REFERENCES T (..)` for to-one relationships.
fn foreign_key_clause(relationship: &DbRelationship, quoting: &QuotingStrategy) -> Option<String> {
    if relationship.to_many || relationship.to_dependent_pk || relationship.joins.is_empty() {
        return None;
    }
    let source: Vec<String> = relationship.joins.iter().map(|j| quoting.identifier(&j.source)).collect();
    let target: Vec<String> = relationship.joins.iter().map(|j| quoting.identifier(&j.target)).collect();
    Some(format!(
        "FOREIGN KEY ({}) REFERENCES {} ({})",
        source.join(", "),
        quoting.identifier(&relationship.target_entity),
        target.join(", ")
    ))
}

fn table_mut<'m>(map: &'m mut DataMap, table: &str) -> Result<&'m mut DbEntity> {
    map.db_entity_mut(table)
        .ok_or_else(|| Error::UnknownEntity(table.to_string()))
}

fn column_mut<'m>(map: &'m mut DataMap, table: &str, column: &str) -> Result<&'m mut DbAttribute> {
    table_mut(map, table)?
        .attributes
        .iter_mut()
        .find(|a| a.name.eq_ignore_ascii_case(column))
        .ok_or_else(|| Error::schema_mismatch(table, format!("no column '{}'", column)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::fixtures::art_map;
    use crate::types::JdbcType;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_table_sql() {
        let map = art_map();
        let token = MergerToken::to_db(TokenKind::CreateTable(map.db_entity("PAINTING").unwrap().clone()));
        assert_eq!(
            token.create_sql(&QuotingStrategy::plain()),
            vec![
                "CREATE TABLE PAINTING (PAINTING_ID INTEGER NOT NULL, PAINTING_TITLE VARCHAR(255) NOT NULL, \
                 ESTIMATED_PRICE DECIMAL(10, 2), ARTIST_ID BIGINT, GALLERY_ID INTEGER, \
                 PRIMARY KEY (PAINTING_ID), FOREIGN KEY (ARTIST_ID) REFERENCES ARTIST (ARTIST_ID), \
                 FOREIGN KEY (GALLERY_ID) REFERENCES GALLERY (GALLERY_ID))"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_reverse_round_trip() {
        let token = MergerToken::to_db(TokenKind::SetNotNull {
            table: "ARTIST".into(),
            column: DbAttribute::new("DATE_OF_BIRTH", JdbcType::Date),
        });
        let reversed = token.reverse();
        assert_eq!(reversed.direction, MergeDirection::ToModel);
        assert!(matches!(reversed.kind, TokenKind::SetAllowNull { .. }));
        assert_eq!(reversed.reverse(), token);
        assert!(reversed.create_sql(&QuotingStrategy::plain()).is_empty());
    }

    #[test]
    fn test_apply_to_model() {
        let mut map = art_map();
        MergerToken::to_model(TokenKind::AddColumn {
            table: "ARTIST".into(),
            column: DbAttribute::new("NATIONALITY", JdbcType::Varchar).with_max_length(40),
        })
        .apply_to_model(&mut map)
        .unwrap();
        assert!(map.db_entity("ARTIST").unwrap().attribute("NATIONALITY").is_some());

        MergerToken::to_model(TokenKind::DropTable(map.db_entity("GALLERY").unwrap().clone()))
            .apply_to_model(&mut map)
            .unwrap();
        assert!(map.db_entity("GALLERY").is_none());
        assert!(map.obj_entity("Gallery").is_none());
        assert!(map.db_entity("PAINTING").unwrap().relationship("toGallery").is_none());
    }

    #[test]
    fn test_to_db_token_is_not_applied_to_model() {
        let mut map = art_map();
        let token = MergerToken::to_db(TokenKind::DropTable(DbEntity::new("ARTIST")));
        assert!(token.apply_to_model(&mut map).is_err());
    }

    #[test]
    fn test_display() {
        let token = MergerToken::to_db(TokenKind::AddColumn {
            table: "ARTIST".into(),
            column: DbAttribute::new("BIO", JdbcType::Clob),
        });
        assert_eq!(token.to_string(), "Add Column ARTIST.BIO [To DB]");
    }
}
