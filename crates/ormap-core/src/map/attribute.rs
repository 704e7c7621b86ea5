//! Column and object attribute definitions.

use crate::types::JdbcType;
use serde::{Deserialize, Serialize};

/// A table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbAttribute {
    /// Column name.
    pub name: String,
    /// Column type.
    #[serde(rename = "type")]
    pub jdbc_type: JdbcType,
    /// Part of the primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// NOT NULL column.
    #[serde(default)]
    pub mandatory: bool,
    /// Value assigned by the database (identity/auto-increment).
    #[serde(default)]
    pub generated: bool,
    /// Length for character/binary types, precision for decimals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    /// Scale for decimal types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
}

impl DbAttribute {
    /// Create a nullable column.
    pub fn new(name: impl Into<String>, jdbc_type: JdbcType) -> Self {
        Self {
            name: name.into(),
            jdbc_type,
            primary_key: false,
            mandatory: false,
            generated: false,
            max_length: None,
            scale: None,
        }
    }

    /// Create a primary key column (always mandatory).
    pub fn primary_key(name: impl Into<String>, jdbc_type: JdbcType) -> Self {
        Self {
            primary_key: true,
            mandatory: true,
            ..Self::new(name, jdbc_type)
        }
    }

    /// Mark the column NOT NULL.
    pub fn with_mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// Mark the column as database-generated.
    pub fn with_generated(mut self) -> Self {
        self.generated = true;
        self
    }

    /// Set the maximum length.
    pub fn with_max_length(mut self, length: u32) -> Self {
        self.max_length = Some(length);
        self
    }

    /// Set precision and scale.
    pub fn with_precision(mut self, precision: u32, scale: u32) -> Self {
        self.max_length = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// Column type as rendered in DDL, e.g. `VARCHAR(255)` or `DECIMAL(10, 2)`.
    pub fn sql_type(&self) -> String {
        let name = self.jdbc_type.sql_name();
        match (self.max_length, self.scale) {
            (Some(len), Some(scale)) if self.jdbc_type.is_decimal() => {
                format!("{}({}, {})", name, len, scale)
            }
            (Some(len), _) if self.jdbc_type.is_sized() || self.jdbc_type.is_decimal() => {
                format!("{}({})", name, len)
            }
            _ => name.to_string(),
        }
    }
}

/// An object property mapped to a column, possibly through relationships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjAttribute {
    /// Property name.
    pub name: String,
    /// Value type name (`String`, `java.lang.Long`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    /// `COLUMN`, or `rel.rel.COLUMN` for flattened attributes.
    pub db_path: String,
}

impl ObjAttribute {
    /// Create an attribute mapped to a column path.
    pub fn new(name: impl Into<String>, db_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_type: None,
            db_path: db_path.into(),
        }
    }

    /// Set the value type name.
    pub fn with_value_type(mut self, value_type: impl Into<String>) -> Self {
        self.value_type = Some(value_type.into());
        self
    }

    /// Attribute reached through one or more relationships.
    pub fn is_flattened(&self) -> bool {
        self.db_path.contains('.')
    }
}
