//! Expression tree for qualifiers and orderings.

use crate::types::Value;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Binary comparison and pattern operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    Like,
    NotLike,
    LikeIgnoreCase,
    NotLikeIgnoreCase,
}

impl BinaryOp {
    /// Operator as written in the expression language.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Equal => "=",
            BinaryOp::NotEqual => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterOrEqual => ">=",
            BinaryOp::Like => "like",
            BinaryOp::NotLike => "not like",
            BinaryOp::LikeIgnoreCase => "likeIgnoreCase",
            BinaryOp::NotLikeIgnoreCase => "not likeIgnoreCase",
        }
    }

    /// Operator as rendered in SQL.
    pub fn sql(&self) -> &'static str {
        match self {
            BinaryOp::Equal => "=",
            BinaryOp::NotEqual => "<>",
            BinaryOp::LessThan => "<",
            BinaryOp::LessOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterOrEqual => ">=",
            BinaryOp::Like | BinaryOp::LikeIgnoreCase => "LIKE",
            BinaryOp::NotLike | BinaryOp::NotLikeIgnoreCase => "NOT LIKE",
        }
    }

    /// Pattern operators.
    pub fn is_pattern(&self) -> bool {
        matches!(
            self,
            BinaryOp::Like | BinaryOp::NotLike | BinaryOp::LikeIgnoreCase | BinaryOp::NotLikeIgnoreCase
        )
    }

    /// Pattern operators that compare case-insensitively.
    pub fn ignores_case(&self) -> bool {
        matches!(self, BinaryOp::LikeIgnoreCase | BinaryOp::NotLikeIgnoreCase)
    }
}

/// A qualifier expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Object path, e.g. `toArtist.artistName`.
    ObjPath(String),
    /// Database path, e.g. `toArtist.ARTIST_NAME` (written `db:...`).
    DbPath(String),
    Literal(Value),
    /// Named parameter, written `$name`.
    Param(String),
    List(Vec<Expression>),
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    In {
        operand: Box<Expression>,
        values: Vec<Expression>,
        negated: bool,
    },
    Between {
        operand: Box<Expression>,
        lower: Box<Expression>,
        upper: Box<Expression>,
        negated: bool,
    },
    And(Vec<Expression>),
    Or(Vec<Expression>),
    Not(Box<Expression>),
}

impl Expression {
    /// Object path node.
    pub fn obj_path(path: impl Into<String>) -> Self {
        Expression::ObjPath(path.into())
    }

    /// Database path node.
    pub fn db_path(path: impl Into<String>) -> Self {
        Expression::DbPath(path.into())
    }

    /// Literal node.
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    /// Parameter node.
    pub fn param(name: impl Into<String>) -> Self {
        Expression::Param(name.into())
    }

    /// Binary node.
    pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// `path = value`.
    pub fn match_exp(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::binary(BinaryOp::Equal, Self::obj_path(path), Self::literal(value))
    }

    /// `db:path = value`.
    pub fn match_db_exp(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::binary(BinaryOp::Equal, Self::db_path(path), Self::literal(value))
    }

    /// `path != value`.
    pub fn no_match_exp(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::binary(BinaryOp::NotEqual, Self::obj_path(path), Self::literal(value))
    }

    /// `path like pattern`.
    pub fn like_exp(path: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::binary(
            BinaryOp::Like,
            Self::obj_path(path),
            Self::literal(pattern.into()),
        )
    }

    /// `path likeIgnoreCase pattern`.
    pub fn like_ignore_case_exp(path: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::binary(
            BinaryOp::LikeIgnoreCase,
            Self::obj_path(path),
            Self::literal(pattern.into()),
        )
    }

    /// `path > value`.
    pub fn greater_exp(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::binary(BinaryOp::GreaterThan, Self::obj_path(path), Self::literal(value))
    }

    /// `path < value`.
    pub fn less_exp(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::binary(BinaryOp::LessThan, Self::obj_path(path), Self::literal(value))
    }

    /// `path in (values)`.
    pub fn in_exp<V: Into<Value>>(path: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Expression::In {
            operand: Box::new(Self::obj_path(path)),
            values: values.into_iter().map(Self::literal).collect(),
            negated: false,
        }
    }

    /// `path between lower and upper`.
    pub fn between_exp(
        path: impl Into<String>,
        lower: impl Into<Value>,
        upper: impl Into<Value>,
    ) -> Self {
        Expression::Between {
            operand: Box::new(Self::obj_path(path)),
            lower: Box::new(Self::literal(lower)),
            upper: Box::new(Self::literal(upper)),
            negated: false,
        }
    }

    /// Conjunction, flattening nested `and` nodes.
    pub fn and_exp(self, other: Expression) -> Self {
        let mut parts = match self {
            Expression::And(parts) => parts,
            single => vec![single],
        };
        match other {
            Expression::And(more) => parts.extend(more),
            single => parts.push(single),
        }
        Expression::And(parts)
    }

    /// Disjunction, flattening nested `or` nodes.
    pub fn or_exp(self, other: Expression) -> Self {
        let mut parts = match self {
            Expression::Or(parts) => parts,
            single => vec![single],
        };
        match other {
            Expression::Or(more) => parts.extend(more),
            single => parts.push(single),
        }
        Expression::Or(parts)
    }

    /// Negation.
    pub fn not_exp(self) -> Self {
        Expression::Not(Box::new(self))
    }

    /// Combine optional qualifiers with `and`.
    pub fn and_all(parts: impl IntoIterator<Item = Option<Expression>>) -> Option<Expression> {
        parts
            .into_iter()
            .flatten()
            .reduce(|acc, next| acc.and_exp(next))
    }

    /// True for path nodes.
    pub fn is_path(&self) -> bool {
        matches!(self, Expression::ObjPath(_) | Expression::DbPath(_))
    }

    /// Visit this node and all descendants, parents first.
    pub fn walk<'e>(&'e self, visit: &mut impl FnMut(&'e Expression)) {
        visit(self);
        match self {
            Expression::List(items) | Expression::And(items) | Expression::Or(items) => {
                items.iter().for_each(|e| e.walk(visit));
            }
            Expression::Binary { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            Expression::In { operand, values, .. } => {
                operand.walk(visit);
                values.iter().for_each(|e| e.walk(visit));
            }
            Expression::Between {
                operand,
                lower,
                upper,
                ..
            } => {
                operand.walk(visit);
                lower.walk(visit);
                upper.walk(visit);
            }
            Expression::Not(inner) => inner.walk(visit),
            Expression::ObjPath(_)
            | Expression::DbPath(_)
            | Expression::Literal(_)
            | Expression::Param(_) => {}
        }
    }

    /// Path nodes in traversal order.
    pub fn paths(&self) -> Vec<&Expression> {
        let mut out = Vec::new();
        self.walk(&mut |e| {
            if e.is_path() {
                out.push(e);
            }
        });
        out
    }

    /// Names of all parameters, in order of first appearance.
    pub fn param_names(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        self.walk(&mut |e| {
            if let Expression::Param(name) = e {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
        });
        out
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::And(_) | Expression::Or(_) => write!(f, "({})", self),
            _ => write!(f, "{}", self),
        }
    }
}

fn fmt_literal(value: &Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        Value::Null => write!(f, "null"),
        Value::Bool(b) => write!(f, "{}", b),
        Value::Int(i) => write!(f, "{}", i),
        Value::Float(x) => write!(f, "{:?}", x),
        Value::List(items) => {
            write!(f, "(")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                fmt_literal(item, f)?;
            }
            write!(f, ")")
        }
        other => write!(
            f,
            "'{}'",
            other.to_string().replace('\\', "\\\\").replace('\'', "\\'")
        ),
    }
}

fn fmt_joined(items: &[Expression], sep: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        item.fmt_operand(f)?;
    }
    Ok(())
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::ObjPath(path) => write!(f, "{}", path),
            Expression::DbPath(path) => write!(f, "db:{}", path),
            Expression::Literal(value) => fmt_literal(value, f),
            Expression::Param(name) => write!(f, "${}", name),
            Expression::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Expression::Binary { op, left, right } => {
                left.fmt_operand(f)?;
                write!(f, " {} ", op.as_str())?;
                right.fmt_operand(f)
            }
            Expression::In {
                operand,
                values,
                negated,
            } => {
                operand.fmt_operand(f)?;
                write!(f, "{} in (", if *negated { " not" } else { "" })?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, ")")
            }
            Expression::Between {
                operand,
                lower,
                upper,
                negated,
            } => {
                operand.fmt_operand(f)?;
                let not = if *negated { " not" } else { "" };
                write!(f, "{} between {} and {}", not, lower, upper)
            }
            Expression::And(items) => fmt_joined(items, " and ", f),
            Expression::Or(items) => fmt_joined(items, " or ", f),
            Expression::Not(inner) => write!(f, "not ({})", inner),
        }
    }
}

impl std::str::FromStr for Expression {
    type Err = super::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        super::parse(s)
    }
}

impl Serialize for Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse(&text).map_err(serde::de::Error::custom)
    }
}
