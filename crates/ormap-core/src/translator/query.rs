//! Select query description.

use crate::error::{Error, Result};
use crate::exp::Expression;
use crate::types::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    /// Object path, or db path when written with the `db:` prefix.
    pub path: Expression,
    pub descending: bool,
    pub case_insensitive: bool,
}

impl Ordering {
    fn with_direction(path: &str, descending: bool) -> Self {
        let path = match path.strip_prefix("db:") {
            Some(db) => Expression::db_path(db),
            None => Expression::obj_path(path),
        };
        Self {
            path,
            descending,
            case_insensitive: false,
        }
    }

    /// Ascending ordering on `path`.
    pub fn asc(path: &str) -> Self {
        Self::with_direction(path, false)
    }

    /// Descending ordering on `path`.
    pub fn desc(path: &str) -> Self {
        Self::with_direction(path, true)
    }

    /// Compare case-insensitively.
    pub fn ignore_case(mut self) -> Self {
        self.case_insensitive = true;
        self
    }
}

impl FromStr for Ordering {
    type Err = Error;

    /// Parse `path [asc|desc] [ci]`.
    fn from_str(s: &str) -> Result<Self> {
        let mut words = s.split_whitespace();
        let path = words
            .next()
            .ok_or_else(|| Error::InvalidExpression("empty ordering".to_string()))?;
        let mut ordering = Self::asc(path);
        for word in words {
            match word.to_ascii_lowercase().as_str() {
                "asc" => ordering.descending = false,
                "desc" => ordering.descending = true,
                "ci" => ordering.case_insensitive = true,
                other => {
                    return Err(Error::InvalidExpression(format!(
                        "unknown ordering option '{}' in '{}'",
                        other, s
                    )))
                }
            }
        }
        Ok(ordering)
    }
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)?;
        if self.descending {
            f.write_str(" desc")?;
        }
        if self.case_insensitive {
            f.write_str(" ci")?;
        }
        Ok(())
    }
}

/// A query fetching rows of one object entity and its sub-entities.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectQuery {
    /// Root object entity name.
    pub root: String,
    pub qualifier: Option<Expression>,
    pub orderings: Vec<Ordering>,
    pub distinct: bool,
    pub fetch_limit: Option<usize>,
    pub fetch_offset: Option<usize>,
    /// Path aliases: alias name -> relationship path.
    pub path_aliases: BTreeMap<String, String>,
}

impl SelectQuery {
    /// Query all rows of `root`.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Restrict rows; combined with any existing qualifier using `and`.
    pub fn with_qualifier(mut self, qualifier: Expression) -> Self {
        self.qualifier = Some(match self.qualifier.take() {
            Some(existing) => existing.and_exp(qualifier),
            None => qualifier,
        });
        self
    }

    pub fn with_ordering(mut self, ordering: Ordering) -> Self {
        self.orderings.push(ordering);
        self
    }

    pub fn with_distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.fetch_limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.fetch_offset = Some(offset);
        self
    }

    /// Register a path alias, so that `alias.x` joins separately from
    /// the same relationship path used without the alias.
    pub fn with_path_alias(mut self, alias: impl Into<String>, path: impl Into<String>) -> Self {
        self.path_aliases.insert(alias.into(), path.into());
        self
    }

    /// Substitute named parameters in the qualifier.
    pub fn with_params(mut self, params: &HashMap<String, Value>, prune_missing: bool) -> Result<Self> {
        self.qualifier = match self.qualifier.take() {
            Some(q) => q.with_params(params, prune_missing)?,
            None => None,
        };
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exp::parse;

    #[test]
    fn test_parse_ordering() {
        let o: Ordering = "toArtist.artistName desc ci".parse().unwrap();
        assert_eq!(o.path, Expression::obj_path("toArtist.artistName"));
        assert!(o.descending && o.case_insensitive);

        let o: Ordering = "db:ARTIST_NAME".parse().unwrap();
        assert_eq!(o.path, Expression::db_path("ARTIST_NAME"));
        assert!(!o.descending);

        assert!("name sideways".parse::<Ordering>().is_err());
    }

    #[test]
    fn test_qualifiers_are_combined() {
        let q = SelectQuery::new("Artist")
            .with_qualifier(parse("artistName = 'a'").unwrap())
            .with_qualifier(parse("dateOfBirth = null").unwrap());
        assert_eq!(
            q.qualifier.unwrap(),
            parse("artistName = 'a' and dateOfBirth = null").unwrap()
        );
    }

    #[test]
    fn test_params_prune_qualifier() {
        let q = SelectQuery::new("Artist")
            .with_qualifier(parse("artistName = $name").unwrap())
            .with_params(&HashMap::new(), true)
            .unwrap();
        assert!(q.qualifier.is_none());
    }
}
