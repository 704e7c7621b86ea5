//! Schema comparison and synchronization.
//!
//! [`DbMerger`] compares a model with tables read from a database and
//! produces [`MergerToken`]s, each one a single schema change with a
//! direction. [`SchemaSynchronizer`] applies a [`SchemaUpdateStrategy`] to a
//! data node the first time it is used.

mod merger;
mod sync;
mod token;

pub use merger::DbMerger;
pub use sync::{SchemaConnector, SchemaSynchronizer, SchemaUpdateStrategy, SyncOutcome};
pub use token::{MergeDirection, MergerToken, TokenKind};
