//! End-to-end template processing.

use ormap_core::{JdbcType, ObjectId, Value};
use ormap_template::{TemplateError, TemplateParams, TemplateProcessor};
use pretty_assertions::assert_eq;
use std::collections::HashMap;

const SEARCH: &str = "SELECT #result('t0.ARTIST_ID' 'long' 'ID'), #result('t0.ARTIST_NAME' 'String' 'NAME') \
                      FROM ARTIST t0 \
                      #chain('AND' 'WHERE') \
                      #chunk($name) t0.ARTIST_NAME LIKE #bind($name 'VARCHAR') #end \
                      #chunk($ids) t0.ARTIST_ID IN (#bind($ids 'BIGINT')) #end \
                      #chunk($gallery) #bindObjectEqual($gallery 't0.GALLERY_ID' 'GALLERY_ID') #end \
                      #end \
                      ORDER BY t0.ARTIST_NAME";

fn named(pairs: Vec<(&str, Value)>) -> TemplateParams {
    TemplateParams::Named(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect::<HashMap<_, _>>())
}

#[test]
fn test_search_with_all_criteria() {
    let processor = TemplateProcessor::new(16);
    let stmt = processor
        .process(
            SEARCH,
            &named(vec![
                ("name", "P%".into()),
                ("ids", Value::List(vec![Value::Int(1), Value::Int(2)])),
                ("gallery", ObjectId::single("Gallery", "GALLERY_ID", 9i64).into()),
            ]),
        )
        .unwrap();

    assert_eq!(
        stmt.sql,
        "SELECT t0.ARTIST_ID AS ID, t0.ARTIST_NAME AS NAME FROM ARTIST t0 \
         WHERE t0.ARTIST_NAME LIKE ? AND t0.ARTIST_ID IN (?,?) AND t0.GALLERY_ID = ? \
         ORDER BY t0.ARTIST_NAME"
    );
    let types: Vec<JdbcType> = stmt.bindings.iter().map(|b| b.jdbc_type).collect();
    assert_eq!(
        types,
        vec![JdbcType::Varchar, JdbcType::BigInt, JdbcType::BigInt, JdbcType::BigInt]
    );
    assert_eq!(stmt.result_columns.len(), 2);
    assert_eq!(stmt.result_columns[1].data_row_key, "NAME");
}

#[test]
fn test_search_without_criteria() {
    let processor = TemplateProcessor::new(16);
    let stmt = processor.process(SEARCH, &TemplateParams::default()).unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT t0.ARTIST_ID AS ID, t0.ARTIST_NAME AS NAME FROM ARTIST t0  ORDER BY t0.ARTIST_NAME"
    );
    assert!(stmt.bindings.is_empty());
}

#[test]
fn test_positional_mode_is_strict() {
    let processor = TemplateProcessor::new(16);
    let err = processor
        .process(SEARCH, &TemplateParams::positional(["P%"]))
        .unwrap_err();
    assert_eq!(
        err,
        TemplateError::ParameterCount {
            expected: 3,
            actual: 1
        }
    );
}

#[test]
fn test_parse_error_points_at_source() {
    let processor = TemplateProcessor::new(16);
    let source = "SELECT * FROM A\nWHERE #chain('AND') #chunk($a) X = #bind($a) #end";
    let err = processor.process(source, &TemplateParams::default()).unwrap_err();
    let rendered = err.format_with_source(source);
    assert!(rendered.contains("'#chain' is not closed"));
    assert!(rendered.contains("line 2:7"));
}
