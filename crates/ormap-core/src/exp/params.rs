//! Named parameter substitution.

use super::ast::Expression;
use crate::error::{Error, Result};
use crate::types::Value;
use std::collections::HashMap;

impl Expression {
    /// Replace `$name` parameters with literal values.
    ///
    /// With `prune_missing`, a comparison that references a missing parameter
    /// is removed, `and`/`or` nodes left with one child collapse to it, and
    /// nodes left empty disappear; `Ok(None)` means nothing remained. Without
    /// it, a missing parameter is an error.
    pub fn with_params(
        &self,
        params: &HashMap<String, Value>,
        prune_missing: bool,
    ) -> Result<Option<Expression>> {
        let mut missing = None;
        let out = substitute(self, params, &mut missing);
        match missing {
            Some(name) if !prune_missing => Err(Error::MissingParameter(name)),
            _ => Ok(out),
        }
    }
}

fn substitute(
    exp: &Expression,
    params: &HashMap<String, Value>,
    missing: &mut Option<String>,
) -> Option<Expression> {
    let sub = |e: &Expression, missing: &mut Option<String>| {
        substitute(e, params, missing).map(Box::new)
    };

    match exp {
        Expression::Param(name) => match params.get(name) {
            Some(value) => Some(Expression::Literal(value.clone())),
            None => {
                missing.get_or_insert_with(|| name.clone());
                None
            }
        },
        Expression::ObjPath(_) | Expression::DbPath(_) | Expression::Literal(_) => Some(exp.clone()),
        Expression::Binary { op, left, right } => {
            let left = sub(left, missing)?;
            let right = sub(right, missing)?;
            Some(Expression::Binary { op: *op, left, right })
        }
        Expression::Between {
            operand,
            lower,
            upper,
            negated,
        } => {
            let operand = sub(operand, missing)?;
            let lower = sub(lower, missing)?;
            let upper = sub(upper, missing)?;
            Some(Expression::Between {
                operand,
                lower,
                upper,
                negated: *negated,
            })
        }
        Expression::In {
            operand,
            values,
            negated,
        } => {
            let operand = sub(operand, missing)?;
            let values = values
                .iter()
                .map(|v| sub(v, missing).map(|b| *b))
                .collect::<Option<Vec<_>>>()?;
            Some(Expression::In {
                operand,
                values,
                negated: *negated,
            })
        }
        Expression::List(items) => items
            .iter()
            .map(|v| sub(v, missing).map(|b| *b))
            .collect::<Option<Vec<_>>>()
            .map(Expression::List),
        Expression::Not(inner) => sub(inner, missing).map(Expression::Not),
        Expression::And(items) => collapse(
            items.iter().filter_map(|e| substitute(e, params, missing)).collect(),
            Expression::And,
        ),
        Expression::Or(items) => collapse(
            items.iter().filter_map(|e| substitute(e, params, missing)).collect(),
            Expression::Or,
        ),
    }
}

fn collapse(
    mut items: Vec<Expression>,
    wrap: fn(Vec<Expression>) -> Expression,
) -> Option<Expression> {
    match items.len() {
        0 => None,
        1 => items.pop(),
        _ => Some(wrap(items)),
    }
}

#[cfg(test)]
mod tests {
    use crate::exp::parse;
    use super::*;

    fn params(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_substitutes_values() {
        let exp = parse("artistName = $name and paintingArray.estimatedPrice > $price").unwrap();
        let bound = exp
            .with_params(&params(&[("name", "Dali".into()), ("price", Value::Int(100))]), false)
            .unwrap()
            .unwrap();
        assert_eq!(
            bound,
            parse("artistName = 'Dali' and paintingArray.estimatedPrice > 100").unwrap()
        );
    }

    #[test]
    fn test_prunes_missing_and_collapses() {
        let exp = parse("artistName = $name and (a = $a or b = $b)").unwrap();
        let bound = exp
            .with_params(&params(&[("b", Value::Int(2))]), true)
            .unwrap()
            .unwrap();
        assert_eq!(bound, parse("b = 2").unwrap());
    }

    #[test]
    fn test_prunes_everything() {
        let exp = parse("a = $a and b in ($b, 2)").unwrap();
        assert_eq!(exp.with_params(&HashMap::new(), true).unwrap(), None);
    }

    #[test]
    fn test_missing_without_pruning_is_error() {
        let exp = parse("a = $a").unwrap();
        let err = exp.with_params(&HashMap::new(), false).unwrap_err();
        assert!(matches!(err, Error::MissingParameter(name) if name == "a"));
    }

    #[test]
    fn test_null_parameter_is_kept() {
        let exp = parse("a = $a").unwrap();
        let bound = exp.with_params(&params(&[("a", Value::Null)]), false).unwrap();
        assert_eq!(bound, Some(parse("a = null").unwrap()));
    }
}
