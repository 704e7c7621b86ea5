//! Output formatters for generated SQL, table orders and schema diffs.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use ormap::{BatchStatement, MergerToken, SqlStatement};

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// SQL text followed by ASCII tables
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter: Send + Sync {
    /// Format a generated statement with its bindings and result columns.
    fn format_statement(&self, statement: &SqlStatement) -> String;

    /// Format batch statements, one per distinct SQL text.
    fn format_batch(&self, statements: &[BatchStatement]) -> String;

    /// Format table names in commit order.
    fn format_tables(&self, tables: &[String], delete_order: bool) -> String;

    /// Format schema diff tokens.
    fn format_tokens(&self, tokens: &[MergerToken]) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_statement(&self, statement: &SqlStatement) -> String {
        let mut output = statement.sql.clone();

        if !statement.bindings.is_empty() {
            let mut table = Table::new();
            table.set_header(vec!["#", "Value", "Type", "Scale"]);
            for (i, binding) in statement.bindings.iter().enumerate() {
                table.add_row(vec![
                    Cell::new(i + 1),
                    Cell::new(binding.value.to_string()),
                    Cell::new(binding.jdbc_type.sql_name()),
                    Cell::new(binding.scale.map(|s| s.to_string()).unwrap_or_default()),
                ]);
            }
            output.push_str(&format!("\n\n{}", table));
        }

        if !statement.result_columns.is_empty() {
            let mut table = Table::new();
            table.set_header(vec!["Column", "Row Key", "Type"]);
            for column in &statement.result_columns {
                table.add_row(vec![
                    Cell::new(&column.name),
                    Cell::new(&column.data_row_key),
                    Cell::new(column.jdbc_type.sql_name()),
                ]);
            }
            output.push_str(&format!("\n\n{}", table));
        }

        if statement.suppressing_distinct {
            output.push_str("\n\nDISTINCT suppressed: rows must be de-duplicated in memory");
        }
        output
    }

    fn format_batch(&self, statements: &[BatchStatement]) -> String {
        let mut sections = Vec::with_capacity(statements.len());
        for statement in statements {
            let mut table = Table::new();
            let width = statement.rows.first().map_or(0, Vec::len);
            let mut header = vec!["Row".to_string()];
            header.extend((1..=width).map(|i| format!("?{}", i)));
            table.set_header(header);
            for (i, row) in statement.rows.iter().enumerate() {
                let mut cells = vec![Cell::new(i + 1)];
                cells.extend(row.iter().map(|b| Cell::new(b.value.to_string())));
                table.add_row(cells);
            }
            sections.push(format!("{}\n{}", statement.sql, table));
        }
        if sections.is_empty() {
            "No statements".to_string()
        } else {
            sections.join("\n\n")
        }
    }

    fn format_tables(&self, tables: &[String], delete_order: bool) -> String {
        let mut table = Table::new();
        table.set_header(vec![
            "#",
            if delete_order { "Delete Order" } else { "Insert Order" },
        ]);
        for (i, name) in tables.iter().enumerate() {
            table.add_row(vec![Cell::new(i + 1), Cell::new(name)]);
        }
        table.to_string()
    }

    fn format_tokens(&self, tokens: &[MergerToken]) -> String {
        if tokens.is_empty() {
            return "Schema matches the model".to_string();
        }
        let mut table = Table::new();
        table.set_header(vec!["Direction", "Operation", "Table", "Change"]);
        for token in tokens {
            table.add_row(vec![
                Cell::new(token.direction),
                Cell::new(token.name()),
                Cell::new(token.table_name()),
                Cell::new(token),
            ]);
        }
        format!("{}\n{} change(s)", table, tokens.len())
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_statement(&self, statement: &SqlStatement) -> String {
        pretty(&statement.to_json())
    }

    fn format_batch(&self, statements: &[BatchStatement]) -> String {
        let items: Vec<serde_json::Value> = statements
            .iter()
            .map(|s| {
                serde_json::json!({
                    "sql": s.sql,
                    "rows": s
                        .rows
                        .iter()
                        .map(|row| row.iter().map(|b| b.to_json()).collect::<Vec<_>>())
                        .collect::<Vec<_>>(),
                })
            })
            .collect();
        pretty(&serde_json::Value::Array(items))
    }

    fn format_tables(&self, tables: &[String], delete_order: bool) -> String {
        pretty(&serde_json::json!({
            "order": if delete_order { "delete" } else { "insert" },
            "tables": tables,
        }))
    }

    fn format_tokens(&self, tokens: &[MergerToken]) -> String {
        let items: Vec<serde_json::Value> = tokens
            .iter()
            .map(|t| {
                serde_json::json!({
                    "direction": t.direction.to_string(),
                    "operation": t.name(),
                    "table": t.table_name(),
                    "change": t.to_string(),
                })
            })
            .collect();
        pretty(&serde_json::Value::Array(items))
    }
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ormap::{JdbcType, ParameterBinding};

    #[test]
    fn test_table_statement_lists_bindings() {
        let stmt = SqlStatement::new(
            "SELECT * FROM ARTIST WHERE ARTIST_NAME = ?",
            vec![ParameterBinding::new("Dali", JdbcType::Varchar)],
        );
        let out = TableFormatter.format_statement(&stmt);
        assert!(out.starts_with("SELECT * FROM ARTIST WHERE ARTIST_NAME = ?\n\n"));
        assert!(out.contains("Dali"));
        assert!(out.contains("VARCHAR"));
    }

    #[test]
    fn test_json_tables() {
        let out = JsonFormatter.format_tables(&["PAINTING".to_string(), "ARTIST".to_string()], true);
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["order"], "delete");
        assert_eq!(parsed["tables"][0], "PAINTING");
    }

    #[test]
    fn test_empty_diff() {
        assert_eq!(TableFormatter.format_tokens(&[]), "Schema matches the model");
        assert_eq!(JsonFormatter.format_tokens(&[]), "[]");
    }
}
