//! Rendering a parsed template with parameter values.

use crate::ast::{Arg, Directive, DirectiveKind, Node, Template, VarRef};
use crate::error::{Result, TemplateError};
use ormap_core::{ColumnDescriptor, JdbcType, ParameterBinding, SqlStatement, Value};
use std::collections::HashMap;

/// Render `template` to SQL, bindings and result columns.
pub fn evaluate(template: &Template, params: &HashMap<String, Value>) -> Result<SqlStatement> {
    let mut evaluator = Evaluator {
        params,
        bindings: Vec::new(),
        columns: Vec::new(),
    };
    let mut sql = String::with_capacity(template.source.len());
    evaluator.render_nodes(&template.nodes, &mut sql)?;

    let mut statement = SqlStatement::new(sql, evaluator.bindings);
    statement.result_columns = evaluator.columns;
    Ok(statement)
}

struct Evaluator<'p> {
    params: &'p HashMap<String, Value>,
    bindings: Vec<ParameterBinding>,
    columns: Vec<ColumnDescriptor>,
}

impl Evaluator<'_> {
    fn render_nodes(&mut self, nodes: &[Node], out: &mut String) -> Result<()> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Variable(var) => {
                    let value = self.lookup(var)?;
                    if !value.is_null() {
                        out.push_str(&value.to_string());
                    }
                }
                Node::Directive(directive) => self.render_directive(directive, out)?,
            }
        }
        Ok(())
    }

    fn render_directive(&mut self, directive: &Directive, out: &mut String) -> Result<()> {
        match directive.kind {
            DirectiveKind::Bind => {
                let value = self.arg_value(&directive.args[0])?;
                self.bind(directive, value, out)
            }
            DirectiveKind::BindEqual | DirectiveKind::BindNotEqual => {
                let equal = directive.kind == DirectiveKind::BindEqual;
                let value = self.arg_value(&directive.args[0])?;
                if value.is_null() {
                    out.push_str(if equal { "IS NULL" } else { "IS NOT NULL" });
                    return Ok(());
                }
                out.push_str(if equal { "= " } else { "<> " });
                self.bind(directive, value, out)
            }
            DirectiveKind::BindObjectEqual => self.bind_object(directive, true, out),
            DirectiveKind::BindObjectNotEqual => self.bind_object(directive, false, out),
            DirectiveKind::Result => self.result(directive, out),
            DirectiveKind::Chain => self.chain(directive, out),
            DirectiveKind::Chunk => {
                if self.chunk_included(directive)? {
                    self.render_nodes(&directive.body, out)?;
                }
                Ok(())
            }
        }
    }

    /// `?` per value, with an optional explicit JDBC type and scale.
    fn bind(&mut self, directive: &Directive, value: Value, out: &mut String) -> Result<()> {
        let jdbc_type = match directive.args.get(1) {
            None | Some(Arg::Null) => None,
            Some(Arg::String(name)) => Some(JdbcType::from_name(name).ok_or_else(|| {
                TemplateError::invalid_argument(directive.kind.name(), format!("unknown JDBC type '{}'", name))
            })?),
            Some(other) => {
                return Err(TemplateError::invalid_argument(
                    directive.kind.name(),
                    format!("JDBC type must be a string, got {:?}", other),
                ))
            }
        };
        let scale = match directive.args.get(2) {
            None | Some(Arg::Null) => None,
            Some(Arg::Int(scale)) => Some(u32::try_from(*scale).map_err(|_| {
                TemplateError::invalid_argument(directive.kind.name(), format!("scale {} is out of range", scale))
            })?),
            Some(other) => {
                return Err(TemplateError::invalid_argument(
                    directive.kind.name(),
                    format!("scale must be a non-negative integer, got {:?}", other),
                ))
            }
        };

        let values = match value {
            Value::List(items) => items,
            single => vec![single],
        };
        if values.is_empty() {
            return Err(TemplateError::invalid_argument(
                directive.kind.name(),
                "can't bind an empty list",
            ));
        }
        out.push_str(&vec!["?"; values.len()].join(","));
        for value in values {
            let binding = match jdbc_type {
                Some(t) => ParameterBinding::new(value, t),
                None => ParameterBinding::inferred(value),
            };
            self.bindings.push(binding.with_scale(scale));
        }
        Ok(())
    }

    /// Compare columns against the key values of an object id.
    fn bind_object(&mut self, directive: &Directive, equal: bool, out: &mut String) -> Result<()> {
        let name = directive.kind.name();
        let value = self.arg_value(&directive.args[0])?;
        let columns = directive.args.get(1).map(|a| string_list(name, a)).transpose()?;
        let id_columns = directive.args.get(2).map(|a| string_list(name, a)).transpose()?;

        let pairs: Vec<(String, Value)> = match (&value, columns, id_columns) {
            (Value::ObjectId(id), None, None) => id.snapshot.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            (Value::ObjectId(id), Some(columns), Some(id_columns)) if columns.len() == id_columns.len() => columns
                .into_iter()
                .zip(id_columns)
                .map(|(column, key)| {
                    let v = id.get(&key).cloned().ok_or_else(|| {
                        TemplateError::Evaluation(format!("{} has no value for '{}'", id, key))
                    })?;
                    Ok((column, v))
                })
                .collect::<Result<_>>()?,
            // Key values are taken in key column order
            (Value::ObjectId(id), Some(columns), None) if columns.len() == id.snapshot.len() => {
                columns.into_iter().zip(id.snapshot.values().cloned()).collect()
            }
            (Value::ObjectId(id), Some(columns), id_columns) => {
                return Err(TemplateError::invalid_argument(
                    name,
                    format!(
                        "{} column(s) don't match the {} key column(s) of {}",
                        columns.len(),
                        id_columns.map_or(id.snapshot.len(), |c| c.len()),
                        id
                    ),
                ))
            }
            (Value::Null, Some(columns), _) => columns.into_iter().map(|c| (c, Value::Null)).collect(),
            (scalar, Some(columns), _) if columns.len() == 1 && !matches!(scalar, Value::List(_)) => {
                columns.into_iter().map(|c| (c, scalar.clone())).collect()
            }
            (Value::Null, None, _) => {
                return Err(TemplateError::invalid_argument(
                    name,
                    "column names are required when the value may be null",
                ))
            }
            _ => {
                return Err(TemplateError::invalid_argument(
                    name,
                    format!("can't compare a {} with the given columns", value.type_name()),
                ))
            }
        };
        if pairs.is_empty() {
            return Err(TemplateError::Evaluation(format!("{} has no key columns", value)));
        }

        let mut parts = Vec::with_capacity(pairs.len());
        for (column, v) in pairs {
            if v.is_null() {
                parts.push(format!("{} {}", column, if equal { "IS NULL" } else { "IS NOT NULL" }));
            } else {
                parts.push(format!("{} {} ?", column, if equal { "=" } else { "<>" }));
                self.bindings.push(ParameterBinding::inferred(v));
            }
        }
        if equal || parts.len() == 1 {
            out.push_str(&parts.join(" AND "));
        } else {
            out.push('(');
            out.push_str(&parts.join(" OR "));
            out.push(')');
        }
        Ok(())
    }

    /// `#result('column' ['type' ['alias' ['dataRowKey' ['jdbcType']]]])`.
    fn result(&mut self, directive: &Directive, out: &mut String) -> Result<()> {
        let name = directive.kind.name();
        let text = |index: usize| -> Result<Option<String>> {
            match directive.args.get(index) {
                None | Some(Arg::Null) => Ok(None),
                Some(Arg::String(s)) if s.is_empty() => Ok(None),
                Some(Arg::String(s)) => Ok(Some(s.clone())),
                Some(other) => Err(TemplateError::invalid_argument(
                    name,
                    format!("argument {} must be a string, got {:?}", index + 1, other),
                )),
            }
        };
        let column = text(0)?.ok_or_else(|| TemplateError::invalid_argument(name, "column name is empty"))?;
        let value_type = text(1)?;
        let alias = text(2)?;
        let row_key = text(3)?;
        let jdbc_type = match text(4)? {
            Some(t) => JdbcType::from_name(&t)
                .ok_or_else(|| TemplateError::invalid_argument(name, format!("unknown JDBC type '{}'", t)))?,
            None => value_type.as_deref().map(JdbcType::for_type_name).unwrap_or(JdbcType::Other),
        };

        out.push_str(&column);
        if let Some(alias) = &alias {
            out.push_str(" AS ");
            out.push_str(alias);
        }

        let key = row_key
            .or(alias)
            .unwrap_or_else(|| unqualified(&column).to_string());
        self.columns.push(
            ColumnDescriptor::expression(column, jdbc_type)
                .with_value_type(value_type)
                .with_data_row_key(key),
        );
        Ok(())
    }

    /// Included chunks joined by the operator, after the prefix.
    fn chain(&mut self, directive: &Directive, out: &mut String) -> Result<()> {
        let name = directive.kind.name();
        let operator = directive.args[0]
            .as_str()
            .ok_or_else(|| TemplateError::invalid_argument(name, "operator must be a string"))?;
        let prefix = match directive.args.get(1) {
            None => None,
            Some(arg) => Some(
                arg.as_str()
                    .ok_or_else(|| TemplateError::invalid_argument(name, "prefix must be a string"))?,
            ),
        };

        let mut parts: Vec<String> = Vec::new();
        for node in &directive.body {
            let mut part = String::new();
            match node {
                Node::Text(text) if text.trim().is_empty() => continue,
                Node::Directive(chunk) if chunk.kind == DirectiveKind::Chunk => {
                    if !self.chunk_included(chunk)? {
                        continue;
                    }
                    self.render_nodes(&chunk.body, &mut part)?;
                }
                other => self.render_nodes(std::slice::from_ref(other), &mut part)?,
            }
            let part = part.trim();
            if !part.is_empty() {
                parts.push(part.to_string());
            }
        }

        if parts.is_empty() {
            return Ok(());
        }
        if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
            out.push_str(prefix);
            out.push(' ');
        }
        out.push_str(&parts.join(&format!(" {} ", operator)));
        Ok(())
    }

    /// A chunk renders unless its parameter is null or an empty list.
    fn chunk_included(&self, chunk: &Directive) -> Result<bool> {
        Ok(match chunk.args.first() {
            None => true,
            Some(arg) => match self.arg_value(arg)? {
                Value::Null => false,
                Value::List(items) => !items.is_empty(),
                _ => true,
            },
        })
    }

    fn arg_value(&self, arg: &Arg) -> Result<Value> {
        Ok(match arg {
            Arg::Null => Value::Null,
            Arg::Bool(b) => Value::Bool(*b),
            Arg::Int(i) => Value::Int(*i),
            Arg::String(s) => Value::String(s.clone()),
            Arg::Variable(var) => self.lookup(var)?,
            Arg::List(items) => Value::List(items.iter().map(|a| self.arg_value(a)).collect::<Result<_>>()?),
        })
    }

    /// Parameter value, following `.key` into object id snapshots.
    fn lookup(&self, var: &VarRef) -> Result<Value> {
        let mut value = self.params.get(&var.name).cloned().unwrap_or_default();
        for key in &var.path {
            value = match value {
                Value::Null => Value::Null,
                Value::ObjectId(id) => id.get(key).cloned().unwrap_or_default(),
                other => {
                    return Err(TemplateError::Evaluation(format!(
                        "can't read '{}' of {} (a {})",
                        key,
                        var,
                        other.type_name()
                    )))
                }
            };
        }
        Ok(value)
    }
}

fn string_list(directive: &str, arg: &Arg) -> Result<Vec<String>> {
    match arg {
        Arg::String(s) => Ok(vec![s.clone()]),
        Arg::List(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    TemplateError::invalid_argument(directive, "column lists may only hold strings")
                })
            })
            .collect(),
        other => Err(TemplateError::invalid_argument(
            directive,
            format!("expected a column name or list, got {:?}", other),
        )),
    }
}

/// `t0.ARTIST_ID` -> `ARTIST_ID`; expressions are left alone.
fn unqualified(column: &str) -> &str {
    let simple = column.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    match column.rsplit_once('.') {
        Some((_, name)) if simple && !name.is_empty() => name,
        _ => column,
    }
}
