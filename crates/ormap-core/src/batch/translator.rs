use super::query::{BatchQuery, DeleteBatchQuery, InsertBatchQuery, UpdateBatchQuery};
use crate::config::TranslatorConfig;
use crate::error::{Error, Result};
use crate::map::{DataMap, DbAttribute, DbEntity};
use crate::types::{DataRow, ParameterBinding, QuotingStrategy, Value};
use tracing::debug;

/// One DML statement with the bindings of every row it runs for.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchStatement {
    pub sql: String,
    pub rows: Vec<Vec<ParameterBinding>>,
}

/// Builds DML for batch queries against one model.
#[derive(Debug, Clone)]
pub struct BatchTranslator<'a> {
    map: &'a DataMap,
    config: &'a TranslatorConfig,
    quoting: QuotingStrategy,
}

impl<'a> BatchTranslator<'a> {
    pub fn new(map: &'a DataMap, config: &'a TranslatorConfig) -> Self {
        Self {
            map,
            config,
            quoting: config.quoting_for(map),
        }
    }

    /// Translate a batch. Consecutive rows producing the same SQL share a
    /// statement.
    pub fn translate(&self, query: &BatchQuery) -> Result<Vec<BatchStatement>> {
        if query.row_count() == 0 {
            return Err(Error::invalid_batch(query.entity(), "batch has no rows"));
        }
        let statements = match query {
            BatchQuery::Insert(q) => vec![self.insert(q)?],
            BatchQuery::Update(q) => self.update(q)?,
            BatchQuery::Delete(q) => self.delete(q)?,
        };
        for stmt in &statements {
            debug!(
                entity = %query.entity(),
                rows = stmt.rows.len(),
                sql = %stmt.sql,
                "Translated batch statement"
            );
        }
        Ok(statements)
    }

    fn insert(&self, query: &InsertBatchQuery) -> Result<BatchStatement> {
        let entity = self.map.require_db_entity(&query.entity)?;
        let columns: Vec<&DbAttribute> = entity
            .attributes
            .iter()
            .filter(|attr| {
                !(self.config.supports_generated_keys
                    && attr.generated
                    && query
                        .rows
                        .iter()
                        .all(|row| row.get(&attr.name).map_or(true, Value::is_null)))
            })
            .collect();
        if columns.is_empty() {
            return Err(Error::invalid_batch(&entity.name, "no columns to insert"));
        }

        let names: Vec<String> = columns.iter().map(|c| self.quoting.identifier(&c.name)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            entity.quoted_name(&self.quoting),
            names.join(", "),
            vec!["?"; columns.len()].join(", ")
        );

        let rows = query
            .rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|attr| bind(attr, row.get(&attr.name).cloned().unwrap_or_default()))
                    .collect()
            })
            .collect();
        Ok(BatchStatement { sql, rows })
    }

    fn update(&self, query: &UpdateBatchQuery) -> Result<Vec<BatchStatement>> {
        let entity = self.map.require_db_entity(&query.entity)?;
        if query.updated_columns.is_empty() {
            return Err(Error::invalid_batch(&entity.name, "no columns to update"));
        }
        let updated = columns_of(entity, &query.updated_columns)?;
        let qualifier = qualifier_columns(entity, &query.qualifier_columns)?;

        let set: Vec<String> = updated
            .iter()
            .map(|attr| format!("{} = ?", self.quoting.identifier(&attr.name)))
            .collect();
        let prefix = format!("UPDATE {} SET {}", entity.quoted_name(&self.quoting), set.join(", "));

        let mut statements: Vec<BatchStatement> = Vec::new();
        for row in &query.rows {
            let mut bindings: Vec<ParameterBinding> = updated
                .iter()
                .map(|attr| bind(attr, row.values.get(&attr.name).cloned().unwrap_or_default()))
                .collect();
            let where_sql = self.where_clause(entity, &qualifier, &row.qualifier, &mut bindings)?;
            push_grouped(&mut statements, format!("{}{}", prefix, where_sql), bindings);
        }
        Ok(statements)
    }

    fn delete(&self, query: &DeleteBatchQuery) -> Result<Vec<BatchStatement>> {
        let entity = self.map.require_db_entity(&query.entity)?;
        let qualifier = qualifier_columns(entity, &query.qualifier_columns)?;
        let prefix = format!("DELETE FROM {}", entity.quoted_name(&self.quoting));

        let mut statements: Vec<BatchStatement> = Vec::new();
        for row in &query.rows {
            let mut bindings = Vec::new();
            let where_sql = self.where_clause(entity, &qualifier, row, &mut bindings)?;
            push_grouped(&mut statements, format!("{}{}", prefix, where_sql), bindings);
        }
        Ok(statements)
    }

    /// ` WHERE A = ? AND B IS NULL`, binding the non-null values.
    fn where_clause(
        &self,
        entity: &DbEntity,
        columns: &[&DbAttribute],
        snapshot: &DataRow,
        bindings: &mut Vec<ParameterBinding>,
    ) -> Result<String> {
        let mut parts = Vec::with_capacity(columns.len());
        for attr in columns {
            let value = snapshot.get(&attr.name).ok_or_else(|| {
                Error::invalid_batch(&entity.name, format!("row has no value for '{}'", attr.name))
            })?;
            let column = self.quoting.identifier(&attr.name);
            if value.is_null() {
                parts.push(format!("{} IS NULL", column));
            } else {
                parts.push(format!("{} = ?", column));
                bindings.push(bind(attr, value.clone()));
            }
        }
        Ok(format!(" WHERE {}", parts.join(" AND ")))
    }
}

fn bind(attr: &DbAttribute, value: Value) -> ParameterBinding {
    ParameterBinding::new(value, attr.jdbc_type).with_scale(attr.scale)
}

fn columns_of<'e>(entity: &'e DbEntity, names: &[String]) -> Result<Vec<&'e DbAttribute>> {
    names
        .iter()
        .map(|name| {
            entity
                .attribute(name)
                .ok_or_else(|| Error::invalid_batch(&entity.name, format!("unknown column '{}'", name)))
        })
        .collect()
}

fn qualifier_columns<'e>(entity: &'e DbEntity, names: &[String]) -> Result<Vec<&'e DbAttribute>> {
    if !names.is_empty() {
        return columns_of(entity, names);
    }
    let pks: Vec<&DbAttribute> = entity.primary_keys().collect();
    if pks.is_empty() {
        return Err(Error::invalid_batch(
            &entity.name,
            "no qualifier columns and no primary key",
        ));
    }
    Ok(pks)
}

fn push_grouped(statements: &mut Vec<BatchStatement>, sql: String, bindings: Vec<ParameterBinding>) {
    match statements.last_mut() {
        Some(last) if last.sql == sql => last.rows.push(bindings),
        _ => statements.push(BatchStatement {
            sql,
            rows: vec![bindings],
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::fixtures::art_map;
    use crate::types::JdbcType;
    use pretty_assertions::assert_eq;

    fn row(pairs: &[(&str, Value)]) -> DataRow {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_insert() {
        let map = art_map();
        let config = TranslatorConfig::new();
        let query = InsertBatchQuery::new("ARTIST")
            .with_row(row(&[("ARTIST_ID", Value::Int(1)), ("ARTIST_NAME", "Dali".into())]))
            .with_row(row(&[("ARTIST_ID", Value::Int(2)), ("ARTIST_NAME", "Ernst".into())]));
        let stmts = BatchTranslator::new(&map, &config).translate(&query.into()).unwrap();

        assert_eq!(stmts.len(), 1);
        assert_eq!(
            stmts[0].sql,
            "INSERT INTO ARTIST (ARTIST_ID, ARTIST_NAME, DATE_OF_BIRTH) VALUES (?, ?, ?)"
        );
        assert_eq!(stmts[0].rows.len(), 2);
        assert_eq!(stmts[0].rows[1][1], ParameterBinding::new("Ernst", JdbcType::Char));
        assert_eq!(stmts[0].rows[1][2].value, Value::Null);
    }

    #[test]
    fn test_insert_skips_generated_keys() {
        let mut map = art_map();
        map.db_entity_mut("GALLERY").unwrap().attributes[0].generated = true;
        let config = TranslatorConfig::new().with_generated_keys(true);
        let query = InsertBatchQuery::new("GALLERY").with_row(row(&[("GALLERY_NAME", "Tate".into())]));
        let stmts = BatchTranslator::new(&map, &config).translate(&query.into()).unwrap();
        assert_eq!(stmts[0].sql, "INSERT INTO GALLERY (GALLERY_NAME) VALUES (?)");
    }

    #[test]
    fn test_update_groups_by_null_pattern() {
        let map = art_map();
        let config = TranslatorConfig::new();
        let query = UpdateBatchQuery::new("PAINTING", ["ESTIMATED_PRICE"])
            .with_qualifier_columns(["PAINTING_ID", "GALLERY_ID"])
            .with_row(
                row(&[("ESTIMATED_PRICE", Value::Decimal("10.50".into()))]),
                row(&[("PAINTING_ID", Value::Int(1)), ("GALLERY_ID", Value::Int(3))]),
            )
            .with_row(
                row(&[("ESTIMATED_PRICE", Value::Decimal("11.00".into()))]),
                row(&[("PAINTING_ID", Value::Int(2)), ("GALLERY_ID", Value::Int(3))]),
            )
            .with_row(
                row(&[("ESTIMATED_PRICE", Value::Null)]),
                row(&[("PAINTING_ID", Value::Int(3)), ("GALLERY_ID", Value::Null)]),
            );
        let stmts = BatchTranslator::new(&map, &config).translate(&query.into()).unwrap();

        assert_eq!(stmts.len(), 2);
        assert_eq!(
            stmts[0].sql,
            "UPDATE PAINTING SET ESTIMATED_PRICE = ? WHERE PAINTING_ID = ? AND GALLERY_ID = ?"
        );
        assert_eq!(stmts[0].rows.len(), 2);
        assert_eq!(stmts[0].rows[0][0].scale, Some(2));
        assert_eq!(
            stmts[1].sql,
            "UPDATE PAINTING SET ESTIMATED_PRICE = ? WHERE PAINTING_ID = ? AND GALLERY_ID IS NULL"
        );
        assert_eq!(stmts[1].rows[0].len(), 2);
    }

    #[test]
    fn test_delete_defaults_to_primary_key() {
        let map = art_map();
        let config = TranslatorConfig::new().with_quoting(true);
        let query = DeleteBatchQuery::new("ARTIST").with_row(row(&[("ARTIST_ID", Value::Int(5))]));
        let stmts = BatchTranslator::new(&map, &config).translate(&query.into()).unwrap();
        assert_eq!(stmts[0].sql, "DELETE FROM \"ARTIST\" WHERE \"ARTIST_ID\" = ?");
        assert_eq!(stmts[0].rows, vec![vec![ParameterBinding::new(5i64, JdbcType::BigInt)]]);
    }

    #[test]
    fn test_missing_qualifier_value() {
        let map = art_map();
        let config = TranslatorConfig::new();
        let query = DeleteBatchQuery::new("ARTIST").with_row(row(&[("ARTIST_NAME", "x".into())]));
        let err = BatchTranslator::new(&map, &config).translate(&query.into()).unwrap_err();
        assert!(matches!(err, Error::InvalidBatch { .. }));
    }

    #[test]
    fn test_empty_batch_rejected() {
        let map = art_map();
        let config = TranslatorConfig::new();
        let err = BatchTranslator::new(&map, &config)
            .translate(&InsertBatchQuery::new("ARTIST").into())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidBatch { .. }));
    }
}
