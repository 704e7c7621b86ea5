//! In-memory evaluation of qualifiers against fetched rows.

use super::ast::{BinaryOp, Expression};
use crate::types::{DataRow, Value};
use std::cmp::Ordering;

impl Expression {
    /// Evaluate a boolean expression against a data row. Paths are looked up
    /// by their text (`db:` prefix stripped), so object paths must be turned
    /// into db paths first when rows are keyed by column. Non-boolean nodes
    /// evaluate to false.
    pub fn matches(&self, row: &DataRow) -> bool {
        match self {
            Expression::Binary { op, left, right } => {
                let (l, r) = (left.value_in(row), right.value_in(row));
                compare(*op, &l, &r)
            }
            Expression::In {
                operand,
                values,
                negated,
            } => {
                let value = operand.value_in(row);
                let found = !value.is_null()
                    && values
                        .iter()
                        .flat_map(|v| match v.value_in(row) {
                            Value::List(items) => items,
                            single => vec![single],
                        })
                        .any(|candidate| value.loose_eq(&candidate));
                found != *negated
            }
            Expression::Between {
                operand,
                lower,
                upper,
                negated,
            } => {
                let value = operand.value_in(row);
                let inside = matches!(
                    value.compare(&lower.value_in(row)),
                    Some(Ordering::Greater | Ordering::Equal)
                ) && matches!(
                    value.compare(&upper.value_in(row)),
                    Some(Ordering::Less | Ordering::Equal)
                );
                inside != *negated
            }
            Expression::And(items) => items.iter().all(|e| e.matches(row)),
            Expression::Or(items) => items.iter().any(|e| e.matches(row)),
            Expression::Not(inner) => !inner.matches(row),
            Expression::Literal(Value::Bool(b)) => *b,
            _ => false,
        }
    }

    /// Value of an operand node for a row.
    fn value_in(&self, row: &DataRow) -> Value {
        match self {
            Expression::ObjPath(path) | Expression::DbPath(path) => {
                row.get(path.as_str()).cloned().unwrap_or(Value::Null)
            }
            Expression::Literal(value) => value.clone(),
            Expression::List(items) => Value::List(items.iter().map(|e| e.value_in(row)).collect()),
            _ => Value::Null,
        }
    }
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> bool {
    match op {
        BinaryOp::Equal => left.loose_eq(right),
        BinaryOp::NotEqual => !left.loose_eq(right),
        BinaryOp::LessThan => left.compare(right) == Some(Ordering::Less),
        BinaryOp::LessOrEqual => matches!(left.compare(right), Some(Ordering::Less | Ordering::Equal)),
        BinaryOp::GreaterThan => left.compare(right) == Some(Ordering::Greater),
        BinaryOp::GreaterOrEqual => {
            matches!(left.compare(right), Some(Ordering::Greater | Ordering::Equal))
        }
        BinaryOp::Like
        | BinaryOp::NotLike
        | BinaryOp::LikeIgnoreCase
        | BinaryOp::NotLikeIgnoreCase => {
            let negated = matches!(op, BinaryOp::NotLike | BinaryOp::NotLikeIgnoreCase);
            let hit = match (left.as_str(), right.as_str()) {
                (Some(text), Some(pattern)) if op.ignores_case() => like(
                    &text.to_lowercase().chars().collect::<Vec<_>>(),
                    &pattern.to_lowercase().chars().collect::<Vec<_>>(),
                ),
                (Some(text), Some(pattern)) => like(
                    &text.chars().collect::<Vec<_>>(),
                    &pattern.chars().collect::<Vec<_>>(),
                ),
                _ => return false,
            };
            hit != negated
        }
    }
}

/// SQL LIKE matching: `%` is any run, `_` any single character.
fn like(text: &[char], pattern: &[char]) -> bool {
    let (mut t, mut p) = (0, 0);
    // Pattern position after the last `%` and the text position it resumed at
    let mut resume: Option<(usize, usize)> = None;
    while t < text.len() {
        match pattern.get(p) {
            Some('%') => {
                p += 1;
                resume = Some((p, t));
            }
            Some('_') => {
                t += 1;
                p += 1;
            }
            Some(c) if *c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match resume {
                Some((after, from)) => {
                    p = after;
                    t = from + 1;
                    resume = Some((after, t));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|c| *c == '%')
}

#[cfg(test)]
mod tests {
    use crate::exp::parse;
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> DataRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_discriminator_match() {
        let exp = parse("db:PERSON_TYPE = 'E' or db:PERSON_TYPE = 'M'").unwrap();
        assert!(exp.matches(&row(&[("PERSON_TYPE", "M".into())])));
        assert!(!exp.matches(&row(&[("PERSON_TYPE", "C".into())])));
        assert!(!exp.matches(&row(&[])));
    }

    #[test]
    fn test_null_checks() {
        let exp = parse("NAME = null").unwrap();
        assert!(exp.matches(&row(&[])));
        assert!(!exp.matches(&row(&[("NAME", "x".into())])));
        assert!(parse("NAME != null").unwrap().matches(&row(&[("NAME", "x".into())])));
    }

    #[test]
    fn test_like_patterns() {
        let r = row(&[("NAME", "Picasso".into())]);
        assert!(parse("NAME like 'Pic%'").unwrap().matches(&r));
        assert!(parse("NAME like '_icass_'").unwrap().matches(&r));
        assert!(!parse("NAME like 'pic%'").unwrap().matches(&r));
        assert!(parse("NAME likeIgnoreCase 'pic%'").unwrap().matches(&r));
        assert!(parse("NAME not like '%x%'").unwrap().matches(&r));
    }

    #[test]
    fn test_like_backtracking() {
        let chars = |s: &str| s.chars().collect::<Vec<_>>();
        assert!(like(&chars("abcbd"), &chars("a%b%d")));
        assert!(like(&chars("aXbYc"), &chars("%b_c")));
        assert!(like(&chars(""), &chars("%%")));
        assert!(!like(&chars("abc"), &chars("%b")));
        assert!(!like(&chars("ab"), &chars("a_b")));

        let text = chars(&"a".repeat(200));
        let pattern = chars(&format!("{}b", "%a".repeat(30)));
        assert!(!like(&text, &pattern));
    }

    #[test]
    fn test_in_and_between() {
        let r = row(&[("PRICE", Value::Int(15))]);
        assert!(parse("PRICE in (10, 15)").unwrap().matches(&r));
        assert!(parse("PRICE not in (10, 20)").unwrap().matches(&r));
        assert!(parse("PRICE between 10 and 15.0").unwrap().matches(&r));
        assert!(!parse("PRICE between 16 and 20").unwrap().matches(&r));
    }
}
