//! SELECT statement assembly.

use super::discriminator::DiscriminatorColumns;
use super::join::JoinStack;
use super::path::{PathResolver, PathSegment};
use super::qualifier::QualifierTranslator;
use super::query::SelectQuery;
use super::JoinType;
use crate::config::TranslatorConfig;
use crate::error::{Error, Result};
use crate::exp::Expression;
use crate::map::{DataMap, DbAttribute, DbEntity, EntityInheritanceTree};
use crate::types::{ColumnDescriptor, JdbcType, ParameterBinding, SqlStatement};
use tracing::{debug, warn};

/// Translates [`SelectQuery`] values into SQL for one model.
#[derive(Debug, Clone)]
pub struct SelectTranslator<'a> {
    map: &'a DataMap,
    config: &'a TranslatorConfig,
}

/// An ORDER BY term after path resolution.
struct OrderTerm {
    sql: String,
    jdbc_type: JdbcType,
    descending: bool,
}

/// Result columns under construction.
struct Projection {
    columns: Vec<ColumnDescriptor>,
}

impl Projection {
    fn add(&mut self, alias: &str, attribute: &DbAttribute, key: &str, value_type: Option<String>) {
        let exists = self
            .columns
            .iter()
            .any(|c| c.table_alias.as_deref() == Some(alias) && c.name == attribute.name);
        if !exists {
            self.columns.push(
                ColumnDescriptor::column(Some(alias), &attribute.name, attribute.jdbc_type)
                    .with_data_row_key(key)
                    .with_value_type(value_type),
            );
        }
    }
}

impl<'a> SelectTranslator<'a> {
    pub fn new(map: &'a DataMap, config: &'a TranslatorConfig) -> Self {
        Self { map, config }
    }

    /// Build the statement for `query`.
    pub fn translate(&self, query: &SelectQuery) -> Result<SqlStatement> {
        let map = self.map;
        let quoting = self.config.quoting_for(map);
        let root = map.require_obj_entity(&query.root)?;
        let root_db = map.db_entity_for(root)?;
        let tree = EntityInheritanceTree::build(map, &root.name)?;
        let resolver = PathResolver::new(map).with_aliases(query.path_aliases.clone());
        let mut stack = JoinStack::new(map, root_db, quoting);

        let projection = self.build_columns(&tree, root_db, &resolver, &mut stack)?;

        let where_exp = Expression::and_all([
            query.qualifier.clone(),
            tree.qualifier_for_entity_and_subclasses(),
        ]);

        let mut translator = QualifierTranslator::new(resolver, root, &mut stack, quoting)?;
        let where_sql = match &where_exp {
            Some(exp) => Some(translator.translate_part(exp)?),
            None => None,
        };
        let mut order_terms = Vec::with_capacity(query.orderings.len());
        for ordering in &query.orderings {
            let (column, attribute) = translator.column_for_path(&ordering.path)?;
            let sql = if ordering.case_insensitive && self.config.case_insensitive_orderings_use_upper {
                format!("UPPER({})", column)
            } else {
                column
            };
            order_terms.push(OrderTerm {
                sql,
                jdbc_type: attribute.jdbc_type,
                descending: ordering.descending,
            });
        }
        let forcing_distinct = translator.is_forcing_distinct();
        let where_bindings = translator.into_bindings();

        let root_qualifier = match &root_db.qualifier {
            Some(q) => Some(
                QualifierTranslator::scoped(map, root_db, stack.root_alias(), quoting).translate(q)?,
            ),
            None => None,
        };

        let mut columns = projection.columns;
        let mut distinct = query.distinct || forcing_distinct;
        let suppressing_distinct = distinct && columns.iter().any(|c| !c.jdbc_type.supports_distinct());
        if suppressing_distinct {
            warn!(
                entity = %root.name,
                "DISTINCT suppressed, result contains LOB columns"
            );
            distinct = false;
        }
        if distinct {
            for term in &order_terms {
                if !columns.iter().any(|c| c.render(&quoting) == term.sql) {
                    columns.push(ColumnDescriptor::expression(&term.sql, term.jdbc_type));
                }
            }
        }

        let mut sql = String::from("SELECT ");
        if distinct {
            sql.push_str("DISTINCT ");
        }
        let rendered: Vec<String> = columns.iter().map(|c| c.render(&quoting)).collect();
        sql.push_str(&rendered.join(", "));
        sql.push_str(" FROM ");
        stack.append_root(&mut sql);
        let mut bindings: Vec<ParameterBinding> = Vec::new();
        stack.append_joins(&mut sql, &mut bindings)?;

        let mut conditions = Vec::new();
        conditions.extend(where_sql);
        bindings.extend(where_bindings);
        if let Some((q, root_bindings)) = root_qualifier {
            conditions.push(q);
            bindings.extend(root_bindings);
        }
        match conditions.len() {
            0 => {}
            1 => {
                sql.push_str(" WHERE ");
                sql.push_str(&conditions[0]);
            }
            _ => {
                let wrapped: Vec<String> = conditions.iter().map(|c| format!("({})", c)).collect();
                sql.push_str(" WHERE ");
                sql.push_str(&wrapped.join(" AND "));
            }
        }

        if !order_terms.is_empty() {
            let terms: Vec<String> = order_terms
                .iter()
                .map(|t| {
                    if t.descending {
                        format!("{} DESC", t.sql)
                    } else {
                        t.sql.clone()
                    }
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }
        if let Some(limit) = query.fetch_limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = query.fetch_offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        debug!(
            entity = %root.name,
            joins = stack.join_count(),
            bindings = bindings.len(),
            sql = %sql,
            "Translated select query"
        );

        Ok(SqlStatement {
            sql,
            bindings,
            result_columns: columns,
            suppressing_distinct,
        })
    }

    /// Result columns: attributes of the tree's entities, to-one foreign
    /// keys, primary keys, then discriminator columns.
    fn build_columns(
        &self,
        tree: &EntityInheritanceTree<'a>,
        root_db: &'a DbEntity,
        resolver: &PathResolver<'a>,
        stack: &mut JoinStack<'a>,
    ) -> Result<Projection> {
        let map = self.map;
        let root_alias = stack.root_alias().to_string();
        let mut projection = Projection { columns: Vec::new() };
        let entities = tree.entities();

        for &entity in &entities {
            let table = map.db_entity_for(entity)?;
            if table.name != root_db.name {
                return Err(Error::Configuration(format!(
                    "entity '{}' maps to '{}', but its hierarchy is stored in '{}'",
                    entity.name, table.name, root_db.name
                )));
            }
            for attr in map.all_attributes(entity) {
                let resolved = resolver.resolve_obj_path(entity, &attr.name)?;
                let attribute = resolved.attribute.ok_or_else(|| {
                    Error::unresolvable(&entity.name, &attr.name, "attribute maps to a relationship")
                })?;
                let alias = push_outer(stack, &resolved.segments)?;
                projection.add(&alias, attribute, &resolved.db_path, attr.value_type.clone());
            }
        }

        for &entity in &entities {
            for rel in map.all_relationships(entity) {
                if rel.to_many || rel.is_flattened() {
                    continue;
                }
                let db_rel = root_db.relationship(&rel.db_path).ok_or_else(|| {
                    Error::unresolvable(&entity.name, &rel.name, format!("no db relationship '{}'", rel.db_path))
                })?;
                if db_rel.to_many {
                    continue;
                }
                for join in &db_rel.joins {
                    if let Some(fk) = root_db.attribute(&join.source) {
                        projection.add(&root_alias, fk, &fk.name, None);
                    }
                }
            }
        }

        for pk in root_db.primary_keys() {
            projection.add(&root_alias, pk, &pk.name, None);
        }

        for column in DiscriminatorColumns::build(map, tree)?.iter() {
            let alias = push_outer(stack, &column.segments)?;
            projection.add(&alias, column.attribute, &column.path, None);
        }

        Ok(projection)
    }
}

/// Join a column path with outer joins, so missing related rows keep the
/// root row. Returns the alias of the table holding the column.
fn push_outer<'a>(stack: &mut JoinStack<'a>, segments: &[PathSegment<'a>]) -> Result<String> {
    stack.reset();
    for segment in segments {
        stack.push_join(segment.relationship, JoinType::LeftOuter, segment.alias.as_deref())?;
    }
    Ok(stack.current_alias().to_string())
}
