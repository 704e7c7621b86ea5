//! ORMAP - object-relational query translation.
//!
//! Lowers object-graph queries over a mapping model to parameterized SQL,
//! builds batch DML, orders tables and objects for commit, diffs schemas and
//! renders hand-written SQL templates.
//!
//! # Quick Start
//!
//! ```ignore
//! use ormap::{exp, Ordering, Runtime, SelectQuery};
//!
//! let runtime = Runtime::load("demos/art.json", None::<&str>)?;
//!
//! let query = SelectQuery::new("Painting")
//!     .with_qualifier(exp::parse("toArtist.artistName like 'P%'")?)
//!     .with_ordering(Ordering::asc("paintingTitle"));
//! let stmt = runtime.select(&query)?;
//!
//! println!("{} ({} bindings)", stmt.sql, stmt.bindings.len());
//! ```
//!
//! # Features
//!
//! - `template` (default): SQL template processor, [`Runtime::template`].

pub mod error;
pub mod runtime;

pub use error::{Error, Result};
pub use runtime::Runtime;

pub use ormap_core::{
    exp, BatchQuery, BatchStatement, ColumnDescriptor, DataMap, DataRow, DbAttribute, DbEntity,
    DbJoin, DbMerger, DbRelationship, DeleteBatchQuery, EntitySorter, Expression, InsertBatchQuery,
    JdbcType, MergeDirection, MergerToken, ObjAttribute, ObjEntity, ObjRelationship, ObjectId,
    Ordering, ParameterBinding, PersistenceState, PersistentObject, SchemaConnector,
    SchemaUpdateStrategy, SelectQuery, SqlStatement, SyncOutcome, TokenKind, TranslatorConfig,
    UpdateBatchQuery, Value,
};

#[cfg(feature = "template")]
pub use ormap_template::{TemplateError, TemplateParams, TemplateProcessor};

/// Re-export the template crate.
#[cfg(feature = "template")]
pub use ormap_template as template;
