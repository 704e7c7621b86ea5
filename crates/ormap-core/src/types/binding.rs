//! Parameter bindings, result column descriptors and translated statements.

use super::{JdbcType, QuotingStrategy, Value};
use serde::Serialize;
use std::collections::BTreeMap;

/// A fetched row keyed by data row key.
pub type DataRow = BTreeMap<String, Value>;

/// A value bound to one `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterBinding {
    pub value: Value,
    pub jdbc_type: JdbcType,
    pub scale: Option<u32>,
}

impl ParameterBinding {
    /// Bind a value with an explicit type.
    pub fn new(value: impl Into<Value>, jdbc_type: JdbcType) -> Self {
        Self {
            value: value.into(),
            jdbc_type,
            scale: None,
        }
    }

    /// Bind a value with a type inferred from the value itself.
    pub fn inferred(value: impl Into<Value>) -> Self {
        let value = value.into();
        let jdbc_type = JdbcType::for_value(&value);
        Self {
            value,
            jdbc_type,
            scale: None,
        }
    }

    /// Set the numeric scale.
    pub fn with_scale(mut self, scale: Option<u32>) -> Self {
        self.scale = scale;
        self
    }

    /// JSON form for reporting.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "value": self.value.to_json(),
            "type": self.jdbc_type.sql_name(),
            "scale": self.scale,
        })
    }
}

/// Describes one column of a result set, in projection order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    /// Column name or SQL expression.
    pub name: String,
    /// Table alias the column is read from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_alias: Option<String>,
    pub jdbc_type: JdbcType,
    /// Value type name requested for the column, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    /// Key under which the value is stored in a fetched data row.
    pub data_row_key: String,
    /// True for computed expressions rather than plain columns.
    pub is_expression: bool,
}

impl ColumnDescriptor {
    /// A plain table column.
    pub fn column(alias: Option<&str>, name: impl Into<String>, jdbc_type: JdbcType) -> Self {
        let name = name.into();
        Self {
            data_row_key: name.clone(),
            name,
            table_alias: alias.map(str::to_string),
            jdbc_type,
            value_type: None,
            is_expression: false,
        }
    }

    /// A computed expression.
    pub fn expression(expression: impl Into<String>, jdbc_type: JdbcType) -> Self {
        let name = expression.into();
        Self {
            data_row_key: name.clone(),
            name,
            table_alias: None,
            jdbc_type,
            value_type: None,
            is_expression: true,
        }
    }

    /// Set the data row key.
    pub fn with_data_row_key(mut self, key: impl Into<String>) -> Self {
        self.data_row_key = key.into();
        self
    }

    /// Set the value type name.
    pub fn with_value_type(mut self, value_type: Option<String>) -> Self {
        self.value_type = value_type;
        self
    }

    /// The column as it appears in the select list.
    pub fn render(&self, quoting: &QuotingStrategy) -> String {
        if self.is_expression {
            self.name.clone()
        } else {
            quoting.column(self.table_alias.as_deref(), &self.name)
        }
    }
}

/// Output of a translation: SQL text, bindings in placeholder order and the
/// result columns in projection order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlStatement {
    pub sql: String,
    pub bindings: Vec<ParameterBinding>,
    pub result_columns: Vec<ColumnDescriptor>,
    /// Set when DISTINCT was requested but dropped because of LOB columns.
    pub suppressing_distinct: bool,
}

impl SqlStatement {
    /// Create a statement without result columns.
    pub fn new(sql: impl Into<String>, bindings: Vec<ParameterBinding>) -> Self {
        Self {
            sql: sql.into(),
            bindings,
            result_columns: Vec::new(),
            suppressing_distinct: false,
        }
    }

    /// Count of `?` placeholders the statement expects.
    pub fn placeholder_count(&self) -> usize {
        self.bindings.len()
    }

    /// JSON form for reporting.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "sql": self.sql,
            "bindings": self.bindings.iter().map(ParameterBinding::to_json).collect::<Vec<_>>(),
            "result_columns": self.result_columns,
            "suppressing_distinct": self.suppressing_distinct,
        })
    }
}
