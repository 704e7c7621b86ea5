//! Command execution.

use crate::commands::{BatchArgs, BatchOp, Command, DiffArgs, SortArgs, TemplateArgs, TranslateArgs};
use crate::formatter::Formatter;
use ormap::{
    exp, BatchQuery, DataMap, DataRow, DbEntity, DbMerger, DeleteBatchQuery, InsertBatchQuery,
    Ordering, Runtime, SelectQuery, TemplateError, TemplateParams, TranslatorConfig,
    UpdateBatchQuery, Value,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Execution errors.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// Expression or template text that failed to parse, rendered with
    /// its source.
    #[error("{0}")]
    Language(String),

    /// Model, translation or template error.
    #[error(transparent)]
    Ormap(#[from] ormap::Error),

    /// Malformed input file.
    #[error("invalid input in {}: {message}", path.display())]
    Input { path: PathBuf, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Arguments that parse but don't make sense together.
    #[error("{0}")]
    Usage(String),
}

/// Run a command and return formatted output.
pub fn execute(
    command: Command,
    config: Option<&Path>,
    formatter: &dyn Formatter,
) -> Result<String, ExecuteError> {
    match command {
        Command::Translate(args) => translate(args, config, formatter),
        Command::Batch(args) => batch(args, config, formatter),
        Command::Template(args) => template(args, config, formatter),
        Command::Sort(args) => sort(args, config, formatter),
        Command::Diff(args) => diff(args, config, formatter),
    }
}

fn load(model: &Path, config: Option<&Path>) -> Result<Runtime, ExecuteError> {
    debug!(model = %model.display(), "Loading model");
    Ok(Runtime::load(model, config)?)
}

fn translate(
    args: TranslateArgs,
    config: Option<&Path>,
    formatter: &dyn Formatter,
) -> Result<String, ExecuteError> {
    let runtime = load(&args.model, config)?;

    let mut query = SelectQuery::new(&args.entity);
    if let Some(text) = &args.qualifier {
        let qualifier = exp::parse(text).map_err(|e| ExecuteError::Language(e.format_with_source(text)))?;
        query = query.with_qualifier(qualifier);
    }
    for text in &args.orderings {
        let ordering = text.parse::<Ordering>().map_err(ormap::Error::from)?;
        query = query.with_ordering(ordering);
    }
    for (alias, path) in args.aliases {
        query = query.with_path_alias(alias, path);
    }
    if args.distinct {
        query = query.with_distinct();
    }
    if let Some(limit) = args.limit {
        query = query.with_limit(limit);
    }
    if let Some(offset) = args.offset {
        query = query.with_offset(offset);
    }

    let statement = if args.params.is_empty() {
        runtime.select(&query)?
    } else {
        let params: HashMap<String, Value> = args.params.into_iter().collect();
        runtime.select_with_params(query, &params)?
    };
    Ok(formatter.format_statement(&statement))
}

fn batch(args: BatchArgs, config: Option<&Path>, formatter: &dyn Formatter) -> Result<String, ExecuteError> {
    let runtime = load(&args.model, config)?;
    let text = std::fs::read_to_string(&args.rows)?;
    let invalid = |message: String| ExecuteError::Input {
        path: args.rows.clone(),
        message,
    };
    let json: serde_json::Value = serde_json::from_str(&text).map_err(|e| invalid(e.to_string()))?;
    let items = json
        .as_array()
        .ok_or_else(|| invalid("expected a JSON array of rows".to_string()))?;

    let query: BatchQuery = match args.op {
        BatchOp::Insert => {
            let mut query = InsertBatchQuery::new(&args.table);
            for item in items {
                query = query.with_row(data_row(item).map_err(invalid)?);
            }
            query.into()
        }
        BatchOp::Delete => {
            let mut query = DeleteBatchQuery::new(&args.table).with_qualifier_columns(args.qualifier_columns);
            for item in items {
                query = query.with_row(data_row(item).map_err(invalid)?);
            }
            query.into()
        }
        BatchOp::Update => {
            let mut rows = Vec::with_capacity(items.len());
            for item in items {
                let values = data_row(&item["values"]).map_err(invalid)?;
                let qualifier = data_row(&item["where"]).map_err(invalid)?;
                rows.push((values, qualifier));
            }
            let columns: Vec<String> = rows
                .first()
                .map(|(values, _)| values.keys().cloned().collect())
                .unwrap_or_default();
            let mut query = UpdateBatchQuery::new(&args.table, columns).with_qualifier_columns(args.qualifier_columns);
            for (values, qualifier) in rows {
                query = query.with_row(values, qualifier);
            }
            query.into()
        }
    };

    Ok(formatter.format_batch(&runtime.batch(&query)?))
}

fn data_row(json: &serde_json::Value) -> Result<DataRow, String> {
    let members = json
        .as_object()
        .ok_or_else(|| format!("expected an object of column values, got {}", json))?;
    Ok(members
        .iter()
        .map(|(column, value)| (column.clone(), Value::from_json(value)))
        .collect())
}

fn template(
    args: TemplateArgs,
    config: Option<&Path>,
    formatter: &dyn Formatter,
) -> Result<String, ExecuteError> {
    let source = match (&args.file, &args.text) {
        (Some(path), _) => std::fs::read_to_string(path)?,
        (None, Some(text)) => text.clone(),
        (None, None) => return Err(ExecuteError::Usage("either --file or --text is required".to_string())),
    };
    let params = if args.args.is_empty() {
        TemplateParams::named(args.params)
    } else {
        TemplateParams::positional(args.args)
    };

    let config = match config {
        Some(path) => TranslatorConfig::load(path).map_err(ormap::Error::from)?,
        None => TranslatorConfig::default(),
    };
    let runtime = Runtime::with_config(DataMap::new("templates"), config)?;

    match runtime.template(&source, &params) {
        Ok(statement) => Ok(formatter.format_statement(&statement)),
        Err(ormap::Error::Template(err @ (TemplateError::Parse { .. } | TemplateError::UnknownDirective { .. }))) => {
            Err(ExecuteError::Language(err.format_with_source(&source)))
        }
        Err(err) => Err(err.into()),
    }
}

fn sort(args: SortArgs, config: Option<&Path>, formatter: &dyn Formatter) -> Result<String, ExecuteError> {
    let mut runtime = load(&args.model, config)?;
    for (table, weight) in args.weights {
        runtime = runtime.with_sort_weight(table, weight);
    }
    Ok(formatter.format_tables(&runtime.commit_order(args.delete), args.delete))
}

fn diff(args: DiffArgs, config: Option<&Path>, formatter: &dyn Formatter) -> Result<String, ExecuteError> {
    let runtime = load(&args.model, config)?.with_merger(
        DbMerger::new()
            .with_skip_relationships(args.skip_relationships)
            .with_skip_primary_keys(args.skip_primary_keys),
    );
    let text = std::fs::read_to_string(&args.db)?;
    let detected: Vec<DbEntity> = serde_json::from_str(&text).map_err(|e| ExecuteError::Input {
        path: args.db.clone(),
        message: e.to_string(),
    })?;
    Ok(formatter.format_tokens(&runtime.diff(&detected)))
}
