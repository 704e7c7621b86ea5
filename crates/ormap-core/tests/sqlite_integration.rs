//! Runs generated DDL, DML and queries against an in-memory SQLite database.

use ormap_core::exp::parse;
use ormap_core::{
    BatchQuery, BatchStatement, BatchTranslator, DataMap, DataRow, DbAttribute, DbEntity, DbMerger,
    DbRelationship, DeleteBatchQuery, InsertBatchQuery, JdbcType, ObjAttribute, ObjEntity,
    ObjRelationship, Ordering, QuotingStrategy, Result, SchemaConnector, SchemaSynchronizer,
    SchemaUpdateStrategy, SelectQuery, SelectTranslator, SqlStatement, SyncOutcome,
    TranslatorConfig, UpdateBatchQuery, Value,
};
use pretty_assertions::assert_eq;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};

fn art_map() -> DataMap {
    DataMap::new("art")
        .with_db_entity(
            DbEntity::new("ARTIST")
                .with_attribute(DbAttribute::primary_key("ARTIST_ID", JdbcType::BigInt))
                .with_attribute(DbAttribute::new("ARTIST_NAME", JdbcType::Varchar).with_max_length(100).with_mandatory())
                .with_attribute(DbAttribute::new("DATE_OF_BIRTH", JdbcType::Date))
                .with_relationship(
                    DbRelationship::to_many("paintingArray", "ARTIST", "PAINTING").with_join("ARTIST_ID", "ARTIST_ID"),
                ),
        )
        .with_db_entity(
            DbEntity::new("PAINTING")
                .with_attribute(DbAttribute::primary_key("PAINTING_ID", JdbcType::Integer))
                .with_attribute(DbAttribute::new("PAINTING_TITLE", JdbcType::Varchar).with_max_length(255).with_mandatory())
                .with_attribute(DbAttribute::new("ESTIMATED_PRICE", JdbcType::Decimal).with_precision(10, 2))
                .with_attribute(DbAttribute::new("ARTIST_ID", JdbcType::BigInt))
                .with_relationship(DbRelationship::to_one("toArtist", "PAINTING", "ARTIST").with_join("ARTIST_ID", "ARTIST_ID")),
        )
        .with_obj_entity(
            ObjEntity::new("Artist", "ARTIST")
                .with_attribute(ObjAttribute::new("artistName", "ARTIST_NAME"))
                .with_relationship(ObjRelationship::to_many("paintingArray", "Painting", "paintingArray")),
        )
        .with_obj_entity(
            ObjEntity::new("Painting", "PAINTING")
                .with_attribute(ObjAttribute::new("paintingTitle", "PAINTING_TITLE"))
                .with_attribute(ObjAttribute::new("estimatedPrice", "ESTIMATED_PRICE"))
                .with_relationship(ObjRelationship::to_one("toArtist", "Artist", "toArtist")),
        )
}

struct SqliteConnector<'c> {
    conn: &'c Connection,
}

impl SchemaConnector for SqliteConnector<'_> {
    fn load_tables(&self) -> Result<Vec<DbEntity>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .map_err(connector_error)?;
        let names: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .map_err(connector_error)?
            .collect::<std::result::Result<_, _>>()
            .map_err(connector_error)?;

        names.into_iter().map(|name| self.load_table(&name)).collect()
    }

    fn execute(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql).map_err(connector_error)
    }
}

impl SqliteConnector<'_> {
    fn load_table(&self, name: &str) -> Result<DbEntity> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", name))
            .map_err(connector_error)?;
        let columns: Vec<(String, String, bool, i64)> = stmt
            .query_map([], |row| Ok((row.get(1)?, row.get(2)?, row.get(3)?, row.get(5)?)))
            .map_err(connector_error)?
            .collect::<std::result::Result<_, _>>()
            .map_err(connector_error)?;

        let mut entity = DbEntity::new(name);
        for (column, declared, not_null, pk) in columns {
            let (base, length) = match declared.split_once('(') {
                Some((base, rest)) => (base, rest.split([',', ')']).next().and_then(|n| n.trim().parse().ok())),
                None => (declared.as_str(), None),
            };
            let mut attr = DbAttribute::new(column, JdbcType::from_name(base).unwrap_or(JdbcType::Other));
            attr.mandatory = not_null;
            attr.primary_key = pk > 0;
            attr.max_length = length;
            entity.attributes.push(attr);
        }
        Ok(entity)
    }
}

fn connector_error(err: rusqlite::Error) -> ormap_core::Error {
    ormap_core::Error::Connector(err.to_string())
}

fn sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Int(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Real(*f),
        Value::Bytes(b) => SqlValue::Blob(b.clone()),
        other => other
            .as_str()
            .map(|s| SqlValue::Text(s.to_string()))
            .unwrap_or(SqlValue::Null),
    }
}

fn run_batch(conn: &Connection, statements: &[BatchStatement]) -> usize {
    let mut changed = 0;
    for stmt in statements {
        for row in &stmt.rows {
            changed += conn
                .execute(&stmt.sql, params_from_iter(row.iter().map(|b| sql_value(&b.value))))
                .unwrap();
        }
    }
    changed
}

fn fetch_strings(conn: &Connection, stmt: &SqlStatement, column: usize) -> Vec<String> {
    let mut prepared = conn.prepare(&stmt.sql).unwrap();
    let rows = prepared
        .query_map(params_from_iter(stmt.bindings.iter().map(|b| sql_value(&b.value))), |row| {
            row.get::<_, String>(column)
        })
        .unwrap();
    rows.collect::<std::result::Result<_, _>>().unwrap()
}

fn row(values: &[(&str, Value)]) -> DataRow {
    values.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn setup(map: &DataMap) -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    let sync = SchemaSynchronizer::new(SchemaUpdateStrategy::ThrowOnPartialOrCreateSchema);
    let outcome = sync.update_schema("main", map, &SqliteConnector { conn: &conn }).unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::Created {
            tables: vec!["ARTIST".into(), "PAINTING".into()]
        }
    );

    let config = TranslatorConfig::default();
    let batch = BatchTranslator::new(map, &config);
    let artists = InsertBatchQuery::new("ARTIST")
        .with_row(row(&[("ARTIST_ID", Value::Int(1)), ("ARTIST_NAME", "Picasso".into())]))
        .with_row(row(&[
            ("ARTIST_ID", Value::Int(2)),
            ("ARTIST_NAME", "Dali".into()),
            ("DATE_OF_BIRTH", Value::Date("1904-05-11".into())),
        ]));
    let paintings = [
        (10, "Guernica", 1, "2000000.00"),
        (11, "Les Demoiselles", 1, "1500000.00"),
        (12, "The Persistence of Memory", 2, "900000.00"),
    ]
    .into_iter()
    .fold(InsertBatchQuery::new("PAINTING"), |q, (id, title, artist, price)| {
        q.with_row(row(&[
            ("PAINTING_ID", Value::Int(id)),
            ("PAINTING_TITLE", title.into()),
            ("ARTIST_ID", Value::Int(artist)),
            ("ESTIMATED_PRICE", Value::Decimal(price.into())),
        ]))
    });

    assert_eq!(run_batch(&conn, &batch.translate(&BatchQuery::from(artists)).unwrap()), 2);
    assert_eq!(run_batch(&conn, &batch.translate(&BatchQuery::from(paintings)).unwrap()), 3);
    conn
}

#[test]
fn test_select_through_to_one_join() {
    let map = art_map();
    let conn = setup(&map);
    let config = TranslatorConfig::default();

    let query = SelectQuery::new("Painting")
        .with_qualifier(parse("toArtist.artistName = 'Picasso'").unwrap())
        .with_ordering(Ordering::asc("paintingTitle"));
    let stmt = SelectTranslator::new(&map, &config).translate(&query).unwrap();
    assert_eq!(stmt.result_columns[0].name, "PAINTING_TITLE");

    assert_eq!(fetch_strings(&conn, &stmt, 0), vec!["Guernica", "Les Demoiselles"]);
}

#[test]
fn test_select_through_to_many_is_distinct() {
    let map = art_map();
    let conn = setup(&map);
    let config = TranslatorConfig::default();

    let query = SelectQuery::new("Artist")
        .with_qualifier(parse("paintingArray.estimatedPrice > 800000").unwrap())
        .with_ordering(Ordering::asc("artistName"));
    let stmt = SelectTranslator::new(&map, &config).translate(&query).unwrap();
    assert!(stmt.sql.starts_with("SELECT DISTINCT"));
    assert_eq!(stmt.result_columns[0].name, "ARTIST_NAME");

    // Picasso has two matching paintings but appears once
    assert_eq!(fetch_strings(&conn, &stmt, 0), vec!["Dali", "Picasso"]);
}

#[test]
fn test_update_and_delete_batches() {
    let map = art_map();
    let conn = setup(&map);
    let config = TranslatorConfig::default();
    let batch = BatchTranslator::new(&map, &config);

    let update = UpdateBatchQuery::new("PAINTING", ["PAINTING_TITLE"]).with_row(
        row(&[("PAINTING_TITLE", "Guernica (1937)".into())]),
        row(&[("PAINTING_ID", Value::Int(10))]),
    );
    assert_eq!(run_batch(&conn, &batch.translate(&update.into()).unwrap()), 1);

    let delete = DeleteBatchQuery::new("PAINTING")
        .with_row(row(&[("PAINTING_ID", Value::Int(11))]))
        .with_row(row(&[("PAINTING_ID", Value::Int(12))]));
    let statements = batch.translate(&delete.into()).unwrap();
    assert_eq!(statements.len(), 1);
    assert_eq!(run_batch(&conn, &statements), 2);

    let stmt = SelectTranslator::new(&map, &config)
        .translate(&SelectQuery::new("Painting"))
        .unwrap();
    assert_eq!(fetch_strings(&conn, &stmt, 0), vec!["Guernica (1937)"]);
}

#[test]
fn test_merge_tokens_apply_to_sqlite() {
    let mut map = art_map();
    let conn = setup(&map);
    let connector = SqliteConnector { conn: &conn };

    let merger = DbMerger::new().with_skip_relationships(true);
    let detected = connector.load_tables().unwrap();
    assert!(merger.create_merge_tokens(&map, &detected).is_empty());

    map.db_entity_mut("ARTIST")
        .unwrap()
        .attributes
        .push(DbAttribute::new("BIO", JdbcType::Varchar).with_max_length(200));
    let tokens = merger.create_merge_tokens(&map, &detected);
    assert_eq!(tokens.len(), 1);
    for sql in tokens[0].create_sql(&QuotingStrategy::plain()) {
        connector.execute(&sql).unwrap();
    }

    let detected = connector.load_tables().unwrap();
    assert!(merger.create_merge_tokens(&map, &detected).is_empty());
}
