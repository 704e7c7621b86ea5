//! Runtime tests against the demo model.

use ormap::{exp, DbEntity, Ordering, Runtime, SelectQuery, TemplateParams, Value};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

fn demo(file: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos")
        .join(file)
}

fn runtime() -> Runtime {
    Runtime::load(demo("art.json"), Some(demo("config.json"))).unwrap()
}

#[test]
fn test_load_demo_model() {
    let runtime = runtime();
    assert_eq!(runtime.map().name, "art");
    assert_eq!(runtime.config().template_cache_size, 128);
    assert_eq!(
        runtime.commit_order(false),
        vec!["ARTIST", "GALLERY", "PAINTING", "PERSON"]
    );
}

#[test]
fn test_select_through_relationship() {
    let runtime = runtime();
    let query = SelectQuery::new("Painting")
        .with_qualifier(exp::parse("toArtist.artistName like 'P%'").unwrap())
        .with_ordering(Ordering::asc("paintingTitle"));
    let stmt = runtime.select(&query).unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT t0.PAINTING_TITLE, t0.ESTIMATED_PRICE, t0.ARTIST_ID, t0.GALLERY_ID, t0.PAINTING_ID \
         FROM PAINTING t0 JOIN ARTIST t1 ON (t0.ARTIST_ID = t1.ARTIST_ID) \
         WHERE t1.ARTIST_NAME LIKE ? ORDER BY t0.PAINTING_TITLE"
    );
    assert_eq!(stmt.bindings[0].value, Value::from("P%"));
}

#[test]
fn test_select_inherited_entity() {
    let stmt = runtime().select(&SelectQuery::new("Manager")).unwrap();
    assert!(stmt.sql.starts_with("SELECT t0.NAME, t0.PERSON_TYPE, t0.SALARY, t0.PERSON_ID FROM PERSON t0 WHERE"));
    assert!(stmt.bindings.iter().all(|b| b.value == Value::from("EM")));
}

#[test]
fn test_diff_against_detected_schema() {
    let text = std::fs::read_to_string(demo("db_schema.json")).unwrap();
    let detected: Vec<DbEntity> = serde_json::from_str(&text).unwrap();
    let tokens: Vec<String> = runtime().diff(&detected).iter().map(|t| t.to_string()).collect();

    for expected in [
        "Create Table GALLERY [To DB]",
        "Create Table PERSON [To DB]",
        "Drop Table AUDIT_LOG [To DB]",
        "Add Column ARTIST.DATE_OF_BIRTH [To DB]",
        "Set Column Type ARTIST.ARTIST_NAME CHAR(100) -> CHAR(254) [To DB]",
    ] {
        assert!(tokens.iter().any(|t| t == expected), "missing {expected} in {tokens:?}");
    }
}

#[test]
fn test_template_from_demo_file() {
    let runtime = runtime();
    let source = std::fs::read_to_string(demo("search_artists.sql")).unwrap();
    let stmt = runtime
        .template(&source, &TemplateParams::named([("name", "P%")]))
        .unwrap();
    assert!(stmt.sql.contains("WHERE t0.ARTIST_NAME LIKE ?"));
    assert!(!stmt.sql.contains("IN ("));
    assert_eq!(stmt.result_columns.len(), 2);

    runtime.template(&source, &TemplateParams::default()).unwrap();
    assert_eq!(runtime.templates().cache().len(), 1);
    assert_eq!(runtime.templates().cache().stats().hits(), 1);
}

#[test]
fn test_load_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Runtime::load(dir.path().join("missing.json"), None::<PathBuf>).unwrap_err();
    assert!(err.to_string().contains("io error"));
}

#[test]
fn test_load_rejects_broken_model() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(
        &path,
        r#"{"name": "broken", "obj_entities": [{"name": "Ghost", "db_entity": "NOPE"}]}"#,
    )
    .unwrap();
    assert!(Runtime::load(&path, None::<PathBuf>).is_err());
}
