//! Batch INSERT, UPDATE and DELETE statements.
//!
//! A batch query carries per-row snapshots for one table. The translator
//! turns it into one or more parameterized statements, each with a list of
//! binding rows to execute it with.

mod query;
mod translator;

pub use query::{BatchQuery, DeleteBatchQuery, InsertBatchQuery, UpdateBatchQuery, UpdateRow};
pub use translator::{BatchStatement, BatchTranslator};
