//! Subcommands and their arguments.

use clap::{Args, Subcommand, ValueEnum};
use ormap::Value;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Translate an object query to SQL
    Translate(TranslateArgs),
    /// Build INSERT, UPDATE or DELETE statements for rows from a JSON file
    Batch(BatchArgs),
    /// Render a SQL template
    Template(TemplateArgs),
    /// Print tables in commit order
    Sort(SortArgs),
    /// Compare a detected database schema with the model
    Diff(DiffArgs),
}

#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// Model file (JSON)
    #[arg(short, long)]
    pub model: PathBuf,

    /// Root object entity
    #[arg(short, long)]
    pub entity: String,

    /// Qualifier expression, e.g. "toArtist.artistName like 'P%'"
    #[arg(short, long)]
    pub qualifier: Option<String>,

    /// Ordering as "path [asc|desc] [ci]"; repeatable
    #[arg(short, long = "order")]
    pub orderings: Vec<String>,

    /// Named parameter as name=value; values are read as JSON when possible
    #[arg(short, long = "param", value_parser = parse_param)]
    pub params: Vec<(String, Value)>,

    /// Path alias as alias=path; repeatable
    #[arg(long = "alias", value_parser = parse_pair)]
    pub aliases: Vec<(String, String)>,

    /// Select distinct rows
    #[arg(long)]
    pub distinct: bool,

    #[arg(long)]
    pub limit: Option<usize>,

    #[arg(long)]
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BatchOp {
    Insert,
    Update,
    Delete,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Model file (JSON)
    #[arg(short, long)]
    pub model: PathBuf,

    /// Table to write
    #[arg(short, long)]
    pub table: String,

    #[arg(long, value_enum)]
    pub op: BatchOp,

    /// JSON array of rows. Update rows are {"values": {...}, "where": {...}}
    #[arg(short, long)]
    pub rows: PathBuf,

    /// Columns of the WHERE clause for update and delete (default: primary key)
    #[arg(long = "where", value_delimiter = ',')]
    pub qualifier_columns: Vec<String>,
}

#[derive(Args, Debug)]
pub struct TemplateArgs {
    /// Template file
    #[arg(short, long, conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Template text
    #[arg(short, long)]
    pub text: Option<String>,

    /// Named parameter as name=value
    #[arg(short, long = "param", value_parser = parse_param, conflicts_with = "args")]
    pub params: Vec<(String, Value)>,

    /// Positional parameter, bound in order of first appearance
    #[arg(short, long = "arg", value_parser = parse_value)]
    pub args: Vec<Value>,
}

#[derive(Args, Debug)]
pub struct SortArgs {
    /// Model file (JSON)
    #[arg(short, long)]
    pub model: PathBuf,

    /// Print delete order instead of insert order
    #[arg(long)]
    pub delete: bool,

    /// Sort weight override as TABLE=N; repeatable
    #[arg(short, long = "weight", value_parser = parse_weight)]
    pub weights: Vec<(String, i32)>,
}

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Model file (JSON)
    #[arg(short, long)]
    pub model: PathBuf,

    /// Detected schema: JSON array of tables
    #[arg(long)]
    pub db: PathBuf,

    #[arg(long)]
    pub skip_relationships: bool,

    #[arg(long)]
    pub skip_primary_keys: bool,
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got '{}'", s)),
    }
}

/// JSON scalar, list or object; anything else is a plain string.
pub fn parse_value(s: &str) -> Result<Value, String> {
    Ok(match serde_json::from_str::<serde_json::Value>(s) {
        Ok(json) => Value::from_json(&json),
        Err(_) => Value::String(s.to_string()),
    })
}

pub fn parse_param(s: &str) -> Result<(String, Value), String> {
    let (name, value) = parse_pair(s)?;
    Ok((name, parse_value(&value)?))
}

fn parse_weight(s: &str) -> Result<(String, i32), String> {
    let (table, weight) = parse_pair(s)?;
    let weight = weight
        .trim()
        .parse()
        .map_err(|_| format!("weight for '{}' must be an integer", table))?;
    Ok((table, weight))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("name=P%").unwrap(),
            ("name".to_string(), Value::String("P%".into()))
        );
        assert_eq!(parse_param("id=5").unwrap().1, Value::Int(5));
        assert_eq!(
            parse_param("ids=[1, 2]").unwrap().1,
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
        assert_eq!(parse_param("x=null").unwrap().1, Value::Null);
        assert!(parse_param("novalue").is_err());
    }

    #[test]
    fn test_parse_weight() {
        assert_eq!(parse_weight("ARTIST=5").unwrap(), ("ARTIST".to_string(), 5));
        assert!(parse_weight("ARTIST=heavy").is_err());
    }
}
