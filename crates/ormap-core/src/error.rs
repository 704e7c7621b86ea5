//! Core error types.

use crate::exp::ParseError;
use crate::translator::JoinType;
use thiserror::Error;

/// Errors raised while translating queries, building batches, sorting or
/// merging schemas.
#[derive(Debug, Error)]
pub enum Error {
    /// Entity not present in the model.
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),

    /// A path that cannot be walked through the model.
    #[error("can't resolve path '{path}' for entity '{entity}': {reason}")]
    UnresolvablePath {
        entity: String,
        path: String,
        reason: String,
    },

    /// Join type the SQL generator can't render.
    #[error("unsupported join type: {0:?}")]
    UnsupportedJoinType(JoinType),

    /// Expression that can't be lowered to SQL or evaluated.
    #[error("invalid expression: {0}")]
    InvalidExpression(String),

    /// Expression text that failed to parse.
    #[error("expression parse error: {0}")]
    Parse(#[from] ParseError),

    /// Named parameter without a value.
    #[error("missing value for parameter '${0}'")]
    MissingParameter(String),

    /// Malformed batch query.
    #[error("invalid batch for '{entity}': {reason}")]
    InvalidBatch { entity: String, reason: String },

    /// Reflexive object graph that contains a cycle.
    #[error("sorting objects for '{entity}' failed: cycles found")]
    SortCycle { entity: String },

    /// Database schema that does not match the model.
    #[error("schema mismatch on node '{node}': {reason}")]
    SchemaMismatch { node: String, reason: String },

    /// Inconsistent model or configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Failure reported by a schema connector.
    #[error("schema connector error: {0}")]
    Connector(String),

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error while loading a model or config file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an unresolvable path error.
    pub fn unresolvable(
        entity: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::UnresolvablePath {
            entity: entity.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid batch error.
    pub fn invalid_batch(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidBatch {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    /// Create a schema mismatch error.
    pub fn schema_mismatch(node: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::SchemaMismatch {
            node: node.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
