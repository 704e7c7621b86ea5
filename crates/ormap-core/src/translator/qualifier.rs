//! Lowering of qualifier expressions to SQL predicates.

use super::join::JoinStack;
use super::path::{PathResolver, PathSegment, ResolvedPath};
use super::JoinType;
use crate::error::{Error, Result};
use crate::exp::{BinaryOp, Expression};
use crate::map::{DataMap, DbAttribute, DbEntity, ObjEntity};
use crate::types::{ParameterBinding, QuotingStrategy, Value};

/// Where path columns come from.
enum Scope<'t, 'a> {
    /// Paths may traverse relationships; joins go to the stack.
    Joined(&'t mut JoinStack<'a>),
    /// Only plain columns of one aliased table.
    Fixed(String),
}

/// A lowered operand.
enum Operand<'a> {
    Column {
        sql: String,
        attribute: &'a DbAttribute,
    },
    /// Relationship path compared by its key columns: rendered column,
    /// column definition and the id snapshot key supplying its value.
    Relationship(Vec<(String, &'a DbAttribute, String)>),
    Value(Value),
}

/// Translates expressions into SQL, registering joins and bindings.
pub struct QualifierTranslator<'t, 'a> {
    resolver: PathResolver<'a>,
    root_obj: Option<&'a ObjEntity>,
    root_db: &'a DbEntity,
    scope: Scope<'t, 'a>,
    quoting: QuotingStrategy,
    bindings: Vec<ParameterBinding>,
    forcing_distinct: bool,
}

impl<'t, 'a> QualifierTranslator<'t, 'a> {
    /// Translator for a query rooted at an object entity.
    pub fn new(
        resolver: PathResolver<'a>,
        root: &'a ObjEntity,
        joins: &'t mut JoinStack<'a>,
        quoting: QuotingStrategy,
    ) -> Result<Self> {
        let root_db = resolver.map().db_entity_for(root)?;
        Ok(Self {
            resolver,
            root_obj: Some(root),
            root_db,
            scope: Scope::Joined(joins),
            quoting,
            bindings: Vec::new(),
            forcing_distinct: false,
        })
    }

    /// Translator for a table with a fixed alias; only column paths of that
    /// table are accepted. Used for table qualifiers in ON and WHERE clauses.
    pub fn scoped(map: &'a DataMap, entity: &'a DbEntity, alias: &str, quoting: QuotingStrategy) -> Self {
        Self {
            resolver: PathResolver::new(map),
            root_obj: None,
            root_db: entity,
            scope: Scope::Fixed(alias.to_string()),
            quoting,
            bindings: Vec::new(),
            forcing_distinct: false,
        }
    }

    /// Translate a complete expression, consuming the translator.
    pub fn translate(mut self, exp: &Expression) -> Result<(String, Vec<ParameterBinding>)> {
        let sql = self.translate_part(exp)?;
        Ok((sql, self.bindings))
    }

    /// Translate an expression, appending its bindings to those collected so far.
    pub fn translate_part(&mut self, exp: &Expression) -> Result<String> {
        match exp {
            Expression::And(items) => self.translate_junction(items, " AND "),
            Expression::Or(items) => self.translate_junction(items, " OR "),
            Expression::Not(inner) => Ok(format!("NOT ({})", self.translate_part(inner)?)),
            Expression::Binary { op, left, right } => self.translate_binary(*op, left, right),
            Expression::In {
                operand,
                values,
                negated,
            } => self.translate_in(operand, values, *negated),
            Expression::Between {
                operand,
                lower,
                upper,
                negated,
            } => self.translate_between(operand, lower, upper, *negated),
            Expression::Param(name) => Err(Error::MissingParameter(name.clone())),
            other => Err(Error::InvalidExpression(format!(
                "'{}' is not a condition",
                other
            ))),
        }
    }

    /// Render a path as a single column, registering its joins.
    pub fn column_for_path(&mut self, path: &Expression) -> Result<(String, &'a DbAttribute)> {
        match self.operand(path)? {
            Operand::Column { sql, attribute } => Ok((sql, attribute)),
            _ => Err(Error::InvalidExpression(format!(
                "'{}' does not end in an attribute",
                path
            ))),
        }
    }

    /// Whether a to-many relationship was traversed.
    pub fn is_forcing_distinct(&self) -> bool {
        self.forcing_distinct
    }

    /// Bindings collected so far, in placeholder order.
    pub fn into_bindings(self) -> Vec<ParameterBinding> {
        self.bindings
    }

    fn translate_junction(&mut self, items: &[Expression], sep: &str) -> Result<String> {
        if items.len() == 1 {
            return self.translate_part(&items[0]);
        }
        let parts = items
            .iter()
            .map(|e| self.translate_part(e).map(|sql| format!("({})", sql)))
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(sep))
    }

    fn translate_binary(&mut self, op: BinaryOp, left: &Expression, right: &Expression) -> Result<String> {
        let lhs = self.operand(left)?;
        let rhs = self.operand(right)?;

        match (lhs, rhs) {
            (Operand::Column { sql, .. }, Operand::Value(Value::Null))
            | (Operand::Value(Value::Null), Operand::Column { sql, .. })
                if matches!(op, BinaryOp::Equal | BinaryOp::NotEqual) =>
            {
                Ok(null_check(&sql, op == BinaryOp::NotEqual))
            }
            (Operand::Relationship(columns), Operand::Value(value))
            | (Operand::Value(value), Operand::Relationship(columns)) => {
                self.relationship_match(op, &columns, value)
            }
            (Operand::Column { sql, attribute }, Operand::Value(value)) => {
                self.bind(value, Some(attribute));
                Ok(render_comparison(op, &sql, "?"))
            }
            (Operand::Value(value), Operand::Column { sql, attribute }) => {
                self.bind(value, Some(attribute));
                Ok(render_comparison(op, "?", &sql))
            }
            (Operand::Column { sql: l, .. }, Operand::Column { sql: r, .. }) => {
                Ok(render_comparison(op, &l, &r))
            }
            (Operand::Value(l), Operand::Value(r)) => {
                self.bind(l, None);
                self.bind(r, None);
                Ok(render_comparison(op, "?", "?"))
            }
            _ => Err(Error::InvalidExpression(format!(
                "can't compare '{}' with '{}'",
                left, right
            ))),
        }
    }

    fn relationship_match(
        &mut self,
        op: BinaryOp,
        columns: &[(String, &'a DbAttribute, String)],
        value: Value,
    ) -> Result<String> {
        let negated = match op {
            BinaryOp::Equal => false,
            BinaryOp::NotEqual => true,
            other => {
                return Err(Error::InvalidExpression(format!(
                    "relationships only support '=' and '!=', not '{}'",
                    other.as_str()
                )))
            }
        };

        let parts: Vec<String> = match value {
            Value::Null => columns.iter().map(|(sql, _, _)| null_check(sql, negated)).collect(),
            Value::ObjectId(id) => {
                let mut parts = Vec::with_capacity(columns.len());
                for (sql, attribute, key) in columns {
                    let value = id.get(key).cloned().ok_or_else(|| {
                        Error::InvalidExpression(format!("{} has no value for key '{}'", id, key))
                    })?;
                    self.bind(value, Some(*attribute));
                    parts.push(format!("{} {} ?", sql, if negated { "<>" } else { "=" }));
                }
                parts
            }
            scalar if columns.len() == 1 => {
                let (sql, attribute, _) = &columns[0];
                self.bind(scalar, Some(*attribute));
                vec![format!("{} {} ?", sql, if negated { "<>" } else { "=" })]
            }
            other => {
                return Err(Error::InvalidExpression(format!(
                    "can't match a compound key against {} value",
                    other.type_name()
                )))
            }
        };

        Ok(match (parts.len(), negated) {
            (1, _) => parts.concat(),
            (_, false) => parts.join(" AND "),
            (_, true) => format!("({})", parts.join(" OR ")),
        })
    }

    fn translate_in(&mut self, operand: &Expression, values: &[Expression], negated: bool) -> Result<String> {
        let (sql, attribute) = self.column_for_path(operand)?;

        let mut flat = Vec::new();
        for value in values {
            match value {
                Expression::Literal(Value::List(items)) => flat.extend(items.iter().cloned()),
                Expression::Literal(v) => flat.push(v.clone()),
                Expression::Param(name) => return Err(Error::MissingParameter(name.clone())),
                other => {
                    return Err(Error::InvalidExpression(format!(
                        "'{}' is not allowed in an IN list",
                        other
                    )))
                }
            }
        }

        if flat.is_empty() {
            return Ok(if negated { "1 = 1" } else { "1 = 0" }.to_string());
        }
        let placeholders = vec!["?"; flat.len()].join(", ");
        for value in flat {
            self.bind(value, Some(attribute));
        }
        Ok(format!(
            "{} {}IN ({})",
            sql,
            if negated { "NOT " } else { "" },
            placeholders
        ))
    }

    fn translate_between(
        &mut self,
        operand: &Expression,
        lower: &Expression,
        upper: &Expression,
        negated: bool,
    ) -> Result<String> {
        let (sql, attribute) = self.column_for_path(operand)?;
        for bound in [lower, upper] {
            match self.operand(bound)? {
                Operand::Value(v) => self.bind(v, Some(attribute)),
                _ => {
                    return Err(Error::InvalidExpression(format!(
                        "between bounds must be values, found '{}'",
                        bound
                    )))
                }
            }
        }
        Ok(format!(
            "{} {}BETWEEN ? AND ?",
            sql,
            if negated { "NOT " } else { "" }
        ))
    }

    fn bind(&mut self, value: Value, attribute: Option<&DbAttribute>) {
        let binding = match attribute {
            Some(attr) => ParameterBinding::new(value, attr.jdbc_type).with_scale(attr.scale),
            None => ParameterBinding::inferred(value),
        };
        self.bindings.push(binding);
    }

    fn operand(&mut self, exp: &Expression) -> Result<Operand<'a>> {
        let resolved = match exp {
            Expression::Literal(value) => return Ok(Operand::Value(value.clone())),
            Expression::Param(name) => return Err(Error::MissingParameter(name.clone())),
            Expression::ObjPath(path) => match self.root_obj {
                Some(root) => self.resolver.resolve_obj_path(root, path)?,
                None => {
                    return Err(Error::InvalidExpression(format!(
                        "object path '{}' used in a table qualifier",
                        path
                    )))
                }
            },
            Expression::DbPath(path) => {
                self.resolver
                    .resolve_db_path(self.root_db, path, JoinType::Inner)?
            }
            other => {
                return Err(Error::InvalidExpression(format!(
                    "'{}' is not a value or path",
                    other
                )))
            }
        };
        self.path_operand(resolved)
    }

    fn path_operand(&mut self, resolved: ResolvedPath<'a>) -> Result<Operand<'a>> {
        if let Some(attribute) = resolved.attribute {
            let alias = self.push_segments(&resolved.segments)?;
            return Ok(Operand::Column {
                sql: self.quoting.column(Some(&alias), &attribute.name),
                attribute,
            });
        }

        let Some((last, init)) = resolved.segments.split_last() else {
            return Err(Error::InvalidExpression(format!(
                "empty path '{}'",
                resolved.db_path
            )));
        };
        let map = self.resolver.map();

        if last.relationship.to_many {
            let alias = self.push_segments(&resolved.segments)?;
            let target = map.require_db_entity(&last.relationship.target_entity)?;
            Ok(Operand::Relationship(
                target
                    .primary_keys()
                    .map(|pk| (self.quoting.column(Some(&alias), &pk.name), pk, pk.name.clone()))
                    .collect(),
            ))
        } else {
            let alias = self.push_segments(init)?;
            let source = map.require_db_entity(&last.relationship.source_entity)?;
            let mut columns = Vec::new();
            for join in &last.relationship.joins {
                let attribute = source.attribute(&join.source).ok_or_else(|| {
                    Error::unresolvable(&source.name, &resolved.db_path, format!("no column '{}'", join.source))
                })?;
                columns.push((
                    self.quoting.column(Some(&alias), &join.source),
                    attribute,
                    join.target.clone(),
                ));
            }
            Ok(Operand::Relationship(columns))
        }
    }

    /// Push a relationship chain from the root; returns the final alias.
    fn push_segments(&mut self, segments: &[PathSegment<'a>]) -> Result<String> {
        match &mut self.scope {
            Scope::Fixed(alias) => {
                if segments.is_empty() {
                    Ok(alias.clone())
                } else {
                    Err(Error::InvalidExpression(
                        "table qualifiers can't traverse relationships".to_string(),
                    ))
                }
            }
            Scope::Joined(stack) => {
                stack.reset();
                for segment in segments {
                    stack.push_join(segment.relationship, segment.join_type, segment.alias.as_deref())?;
                    if segment.relationship.to_many {
                        self.forcing_distinct = true;
                    }
                }
                Ok(stack.current_alias().to_string())
            }
        }
    }
}

fn null_check(column: &str, negated: bool) -> String {
    format!("{} IS {}NULL", column, if negated { "NOT " } else { "" })
}

fn render_comparison(op: BinaryOp, left: &str, right: &str) -> String {
    if op.ignores_case() {
        format!("UPPER({}) {} UPPER({})", left, op.sql(), right)
    } else {
        format!("{} {} {}", left, op.sql(), right)
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::art_map;
    use super::*;
    use crate::exp::parse;
    use crate::types::{JdbcType, ObjectId};
    use pretty_assertions::assert_eq;

    fn translate(entity: &str, qualifier: &str) -> Result<(String, Vec<ParameterBinding>, usize, bool)> {
        let map = art_map();
        let obj = map.obj_entity(entity).unwrap();
        let db = map.db_entity_for(obj).unwrap();
        let mut stack = JoinStack::new(&map, db, QuotingStrategy::plain());
        let mut translator =
            QualifierTranslator::new(PathResolver::new(&map), obj, &mut stack, QuotingStrategy::plain())?;
        let sql = translator.translate_part(&parse(qualifier).unwrap())?;
        let distinct = translator.is_forcing_distinct();
        let bindings = translator.into_bindings();
        Ok((sql, bindings, stack.join_count(), distinct))
    }

    #[test]
    fn test_simple_comparison_takes_column_type() {
        let (sql, bindings, joins, distinct) = translate("Artist", "artistName = 'Dali'").unwrap();
        assert_eq!(sql, "t0.ARTIST_NAME = ?");
        assert_eq!(bindings, vec![ParameterBinding::new("Dali", JdbcType::Char)]);
        assert_eq!(joins, 0);
        assert!(!distinct);
    }

    #[test]
    fn test_null_comparisons() {
        let (sql, bindings, _, _) =
            translate("Artist", "dateOfBirth = null or null != artistName").unwrap();
        assert_eq!(sql, "(t0.DATE_OF_BIRTH IS NULL) OR (t0.ARTIST_NAME IS NOT NULL)");
        assert!(bindings.is_empty());
    }

    #[test]
    fn test_to_many_forces_distinct_and_reuses_join() {
        let (sql, bindings, joins, distinct) = translate(
            "Artist",
            "paintingArray.paintingTitle like 'A%' and paintingArray.estimatedPrice > 10",
        )
        .unwrap();
        assert_eq!(sql, "(t1.PAINTING_TITLE LIKE ?) AND (t1.ESTIMATED_PRICE > ?)");
        assert_eq!(bindings[1].jdbc_type, JdbcType::Decimal);
        assert_eq!(bindings[1].scale, Some(2));
        assert_eq!(joins, 1);
        assert!(distinct);
    }

    #[test]
    fn test_ignore_case_like() {
        let (sql, _, _, _) = translate("Painting", "toArtist.artistName likeIgnoreCase 'd%'").unwrap();
        assert_eq!(sql, "UPPER(t1.ARTIST_NAME) LIKE UPPER(?)");
    }

    #[test]
    fn test_to_one_relationship_against_object_id() {
        let map = art_map();
        let painting = map.obj_entity("Painting").unwrap();
        let db = map.db_entity("PAINTING").unwrap();
        let mut stack = JoinStack::new(&map, db, QuotingStrategy::plain());
        let exp = Expression::binary(
            BinaryOp::Equal,
            Expression::obj_path("toArtist"),
            Expression::literal(ObjectId::single("Artist", "ARTIST_ID", 7i64)),
        );
        let (sql, bindings) =
            QualifierTranslator::new(PathResolver::new(&map), painting, &mut stack, QuotingStrategy::plain())
                .unwrap()
                .translate(&exp)
                .unwrap();
        assert_eq!(sql, "t0.ARTIST_ID = ?");
        assert_eq!(bindings, vec![ParameterBinding::new(7i64, JdbcType::BigInt)]);
        assert_eq!(stack.join_count(), 0);
    }

    #[test]
    fn test_to_many_relationship_against_scalar_id() {
        let (sql, bindings, joins, _) = translate("Artist", "paintingArray = 33").unwrap();
        assert_eq!(sql, "t1.PAINTING_ID = ?");
        assert_eq!(bindings[0].jdbc_type, JdbcType::Integer);
        assert_eq!(joins, 1);
    }

    #[test]
    fn test_in_and_between() {
        let (sql, bindings, _, _) =
            translate("Painting", "estimatedPrice between 1 and 2 and paintingTitle not in ('a', 'b')").unwrap();
        assert_eq!(
            sql,
            "(t0.ESTIMATED_PRICE BETWEEN ? AND ?) AND (t0.PAINTING_TITLE NOT IN (?, ?))"
        );
        assert_eq!(bindings.len(), 4);
    }

    #[test]
    fn test_unbound_parameter_is_error() {
        let err = translate("Artist", "artistName = $name").unwrap_err();
        assert!(matches!(err, Error::MissingParameter(name) if name == "name"));
    }

    #[test]
    fn test_outer_join_marker() {
        let map = art_map();
        let artist = map.obj_entity("Artist").unwrap();
        let db = map.db_entity("ARTIST").unwrap();
        let mut stack = JoinStack::new(&map, db, QuotingStrategy::plain());
        QualifierTranslator::new(PathResolver::new(&map), artist, &mut stack, QuotingStrategy::plain())
            .unwrap()
            .translate(&parse("paintingArray+.paintingTitle = null").unwrap())
            .unwrap();
        assert_eq!(stack.nodes()[1].join_type, JoinType::LeftOuter);
    }
}
