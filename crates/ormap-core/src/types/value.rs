//! Runtime values bound into SQL and read back from rows.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Persistent identity of an object: entity name plus primary key snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectId {
    /// Object entity name (may be empty for anonymous rows).
    pub entity: String,
    /// Column name to value.
    pub snapshot: BTreeMap<String, Value>,
}

impl ObjectId {
    /// Create an id with an empty snapshot.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            snapshot: BTreeMap::new(),
        }
    }

    /// Create a single-column id.
    pub fn single(entity: impl Into<String>, column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(entity).with_key(column, value)
    }

    /// Add a key column.
    pub fn with_key(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.snapshot.insert(column.into(), value.into());
        self
    }

    /// Value of one key column.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.snapshot.get(column)
    }

    /// A temporary id has no key values yet.
    pub fn is_temporary(&self) -> bool {
        self.snapshot.is_empty()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<ObjectId:{}", self.entity)?;
        for (key, value) in &self.snapshot {
            write!(f, ", {}={}", key, value)?;
        }
        write!(f, ">")
    }
}

/// A value flowing through translation: literal, parameter or row cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Arbitrary precision number kept in its textual form.
    Decimal(String),
    String(String),
    Bytes(Vec<u8>),
    /// ISO-8601 date.
    Date(String),
    /// ISO-8601 time.
    Time(String),
    /// ISO-8601 timestamp.
    Timestamp(String),
    ObjectId(ObjectId),
    List(Vec<Value>),
}

impl Value {
    /// Check for SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Timestamp(_) => "timestamp",
            Value::ObjectId(_) => "object id",
            Value::List(_) => "list",
        }
    }

    /// Borrow the text of string-like values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s)
            | Value::Decimal(s)
            | Value::Date(s)
            | Value::Time(s)
            | Value::Timestamp(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view of the value, if it has one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(*b as i64),
            Value::Decimal(s) => s.parse().ok(),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Decimal(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Compare two values the way an in-memory qualifier does. Numbers compare
    /// across representations; other values only compare within their kind.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b))
            | (Value::Date(a), Value::Date(b))
            | (Value::Time(a), Value::Time(b))
            | (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::Bytes(a), Value::Bytes(b)) => Some(a.cmp(b)),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => None,
            },
        }
    }

    /// Equality that treats numerically equal numbers as equal.
    pub fn loose_eq(&self, other: &Value) -> bool {
        self == other || self.compare(other) == Some(Ordering::Equal)
    }

    /// Convert a JSON value. Objects with `entity` and `id` members become
    /// object ids; other objects become anonymous id snapshots.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(members) => {
                let (entity, keys) = match (members.get("entity"), members.get("id")) {
                    (Some(serde_json::Value::String(entity)), Some(serde_json::Value::Object(id))) => {
                        (entity.clone(), id)
                    }
                    _ => (String::new(), members),
                };
                Value::ObjectId(ObjectId {
                    entity,
                    snapshot: keys
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::from_json(v)))
                        .collect(),
                })
            }
        }
    }

    /// Convert to JSON for reporting.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => json!(b),
            Value::Int(i) => json!(i),
            Value::Float(f) => json!(f),
            Value::Decimal(s)
            | Value::String(s)
            | Value::Date(s)
            | Value::Time(s)
            | Value::Timestamp(s) => json!(s),
            Value::Bytes(bytes) => json!(bytes),
            Value::ObjectId(id) => json!({
                "entity": id.entity,
                "id": id.snapshot.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<serde_json::Map<_, _>>(),
            }),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Decimal(s)
            | Value::String(s)
            | Value::Date(s)
            | Value::Time(s)
            | Value::Timestamp(s) => write!(f, "{}", s),
            Value::Bytes(bytes) => {
                for b in bytes {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
            Value::ObjectId(id) => write!(f, "{}", id),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Self {
        Value::ObjectId(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_compare_across_kinds() {
        assert_eq!(Value::Int(2).compare(&Value::Float(2.5)), Some(Ordering::Less));
        assert!(Value::Int(3).loose_eq(&Value::Decimal("3".into())));
        assert_eq!(Value::String("a".into()).compare(&Value::Int(1)), None);
    }

    #[test]
    fn test_from_json_object_id() {
        let json = serde_json::json!({"entity": "Artist", "id": {"ARTIST_ID": 5}});
        let value = Value::from_json(&json);
        assert_eq!(
            value,
            Value::ObjectId(ObjectId::single("Artist", "ARTIST_ID", 5i64))
        );
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn test_from_json_anonymous_row() {
        let value = Value::from_json(&serde_json::json!({"A": 1, "B": "x"}));
        match value {
            Value::ObjectId(id) => {
                assert!(id.entity.is_empty());
                assert_eq!(id.get("B"), Some(&Value::String("x".into())));
            }
            other => panic!("expected object id, got {:?}", other),
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::List(vec![1i64.into(), "b".into()]).to_string(), "1,b");
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(
            ObjectId::single("Artist", "ARTIST_ID", 1i64).to_string(),
            "<ObjectId:Artist, ARTIST_ID=1>"
        );
    }
}
