//! JDBC type codes used for bindings and column descriptors.

use super::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// SQL type of a column or binding, named after `java.sql.Types`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JdbcType {
    Bit,
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Float,
    Double,
    Decimal,
    Numeric,
    Char,
    Varchar,
    LongVarchar,
    Clob,
    NClob,
    Binary,
    VarBinary,
    LongVarBinary,
    Blob,
    Date,
    Time,
    Timestamp,
    Null,
    Other,
}

const ALL: [JdbcType; 25] = [
    JdbcType::Bit,
    JdbcType::Boolean,
    JdbcType::TinyInt,
    JdbcType::SmallInt,
    JdbcType::Integer,
    JdbcType::BigInt,
    JdbcType::Real,
    JdbcType::Float,
    JdbcType::Double,
    JdbcType::Decimal,
    JdbcType::Numeric,
    JdbcType::Char,
    JdbcType::Varchar,
    JdbcType::LongVarchar,
    JdbcType::Clob,
    JdbcType::NClob,
    JdbcType::Binary,
    JdbcType::VarBinary,
    JdbcType::LongVarBinary,
    JdbcType::Blob,
    JdbcType::Date,
    JdbcType::Time,
    JdbcType::Timestamp,
    JdbcType::Null,
    JdbcType::Other,
];

impl JdbcType {
    /// SQL type name.
    pub fn sql_name(&self) -> &'static str {
        match self {
            JdbcType::Bit => "BIT",
            JdbcType::Boolean => "BOOLEAN",
            JdbcType::TinyInt => "TINYINT",
            JdbcType::SmallInt => "SMALLINT",
            JdbcType::Integer => "INTEGER",
            JdbcType::BigInt => "BIGINT",
            JdbcType::Real => "REAL",
            JdbcType::Float => "FLOAT",
            JdbcType::Double => "DOUBLE",
            JdbcType::Decimal => "DECIMAL",
            JdbcType::Numeric => "NUMERIC",
            JdbcType::Char => "CHAR",
            JdbcType::Varchar => "VARCHAR",
            JdbcType::LongVarchar => "LONGVARCHAR",
            JdbcType::Clob => "CLOB",
            JdbcType::NClob => "NCLOB",
            JdbcType::Binary => "BINARY",
            JdbcType::VarBinary => "VARBINARY",
            JdbcType::LongVarBinary => "LONGVARBINARY",
            JdbcType::Blob => "BLOB",
            JdbcType::Date => "DATE",
            JdbcType::Time => "TIME",
            JdbcType::Timestamp => "TIMESTAMP",
            JdbcType::Null => "NULL",
            JdbcType::Other => "OTHER",
        }
    }

    /// Numeric code from `java.sql.Types`.
    pub fn code(&self) -> i32 {
        match self {
            JdbcType::Bit => -7,
            JdbcType::Boolean => 16,
            JdbcType::TinyInt => -6,
            JdbcType::SmallInt => 5,
            JdbcType::Integer => 4,
            JdbcType::BigInt => -5,
            JdbcType::Real => 7,
            JdbcType::Float => 6,
            JdbcType::Double => 8,
            JdbcType::Decimal => 3,
            JdbcType::Numeric => 2,
            JdbcType::Char => 1,
            JdbcType::Varchar => 12,
            JdbcType::LongVarchar => -1,
            JdbcType::Clob => 2005,
            JdbcType::NClob => 2011,
            JdbcType::Binary => -2,
            JdbcType::VarBinary => -3,
            JdbcType::LongVarBinary => -4,
            JdbcType::Blob => 2004,
            JdbcType::Date => 91,
            JdbcType::Time => 92,
            JdbcType::Timestamp => 93,
            JdbcType::Null => 0,
            JdbcType::Other => 1111,
        }
    }

    /// Look up a type by SQL name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        ALL.iter()
            .copied()
            .find(|t| t.sql_name().eq_ignore_ascii_case(name))
    }

    /// Large object types. They can't take part in DISTINCT comparisons.
    pub fn is_lob(&self) -> bool {
        matches!(
            self,
            JdbcType::Clob
                | JdbcType::NClob
                | JdbcType::Blob
                | JdbcType::LongVarchar
                | JdbcType::LongVarBinary
        )
    }

    /// Whether a column of this type may appear in a `SELECT DISTINCT`.
    pub fn supports_distinct(&self) -> bool {
        !self.is_lob()
    }

    /// Fixed or variable length character types.
    pub fn is_character(&self) -> bool {
        matches!(self, JdbcType::Char | JdbcType::Varchar)
    }

    /// Types whose DDL carries a length.
    pub fn is_sized(&self) -> bool {
        matches!(
            self,
            JdbcType::Char | JdbcType::Varchar | JdbcType::Binary | JdbcType::VarBinary
        )
    }

    /// Types whose DDL carries precision and scale.
    pub fn is_decimal(&self) -> bool {
        matches!(self, JdbcType::Decimal | JdbcType::Numeric)
    }

    /// Infer a binding type from a value.
    pub fn for_value(value: &Value) -> Self {
        match value {
            Value::Null => JdbcType::Null,
            Value::Bool(_) => JdbcType::Boolean,
            Value::Int(_) => JdbcType::BigInt,
            Value::Float(_) => JdbcType::Double,
            Value::Decimal(_) => JdbcType::Decimal,
            Value::String(_) => JdbcType::Varchar,
            Value::Bytes(_) => JdbcType::VarBinary,
            Value::Date(_) => JdbcType::Date,
            Value::Time(_) => JdbcType::Time,
            Value::Timestamp(_) => JdbcType::Timestamp,
            Value::ObjectId(_) | Value::List(_) => JdbcType::Other,
        }
    }

    /// Map a value type name (`long`, `java.lang.String`, `BigDecimal`, ...)
    /// to the JDBC type normally used to store it.
    pub fn for_type_name(type_name: &str) -> Self {
        let lower = type_name.trim().to_ascii_lowercase();
        if lower == "java.sql.date" {
            return JdbcType::Date;
        }
        let short = lower.rsplit('.').next().unwrap_or(&lower);
        match short {
            "string" => JdbcType::Varchar,
            "char" | "character" => JdbcType::Char,
            "long" | "biginteger" => JdbcType::BigInt,
            "int" | "integer" => JdbcType::Integer,
            "short" => JdbcType::SmallInt,
            "byte" => JdbcType::TinyInt,
            "boolean" | "bool" => JdbcType::Boolean,
            "double" => JdbcType::Double,
            "float" => JdbcType::Float,
            "bigdecimal" => JdbcType::Decimal,
            "localdate" => JdbcType::Date,
            "time" | "localtime" => JdbcType::Time,
            "date" | "timestamp" | "localdatetime" => JdbcType::Timestamp,
            "byte[]" => JdbcType::VarBinary,
            _ => JdbcType::Other,
        }
    }
}

impl fmt::Display for JdbcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_lookup() {
        assert_eq!(JdbcType::from_name("integer"), Some(JdbcType::Integer));
        assert_eq!(JdbcType::from_name("LONGVARBINARY"), Some(JdbcType::LongVarBinary));
        assert_eq!(JdbcType::from_name("VARCHAR2"), None);
    }

    #[test]
    fn test_lob_types_suppress_distinct() {
        for t in [JdbcType::Blob, JdbcType::Clob, JdbcType::NClob, JdbcType::LongVarchar] {
            assert!(!t.supports_distinct(), "{t}");
        }
        assert!(JdbcType::Varchar.supports_distinct());
    }

    #[test]
    fn test_type_names() {
        assert_eq!(JdbcType::for_type_name("long"), JdbcType::BigInt);
        assert_eq!(JdbcType::for_type_name("java.lang.String"), JdbcType::Varchar);
        assert_eq!(JdbcType::for_type_name("java.util.Date"), JdbcType::Timestamp);
        assert_eq!(JdbcType::for_type_name("java.sql.Date"), JdbcType::Date);
        assert_eq!(JdbcType::for_type_name("java.math.BigDecimal"), JdbcType::Decimal);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&JdbcType::LongVarBinary).unwrap();
        assert_eq!(json, "\"LONGVARBINARY\"");
        let parsed: JdbcType = serde_json::from_str("\"TINYINT\"").unwrap();
        assert_eq!(parsed, JdbcType::TinyInt);
    }
}
