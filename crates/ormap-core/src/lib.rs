//! ORMAP Core - entity model, qualifier translation and SQL assembly.
//!
//! This crate lowers object-graph queries to parameterized SQL. It holds the
//! mapping model, the expression language, the join-tree builder, batch DML
//! builders, the Ashwood dependency sorter and the schema merger.

pub mod batch;
pub mod config;
pub mod error;
pub mod exp;
pub mod map;
pub mod merge;
pub mod sort;
pub mod translator;
pub mod types;

pub use batch::{
    BatchQuery, BatchStatement, BatchTranslator, DeleteBatchQuery, InsertBatchQuery,
    UpdateBatchQuery, UpdateRow,
};
pub use config::TranslatorConfig;
pub use error::{Error, Result};
pub use exp::{BinaryOp, Expression, ParseError, Span};
pub use map::{
    DataMap, DbAttribute, DbEntity, DbJoin, DbRelationship, EntityInheritanceTree, ObjAttribute,
    ObjEntity, ObjRelationship,
};
pub use merge::{
    DbMerger, MergeDirection, MergerToken, SchemaConnector, SchemaSynchronizer,
    SchemaUpdateStrategy, SyncOutcome, TokenKind,
};
pub use sort::{EntitySorter, PersistenceState, PersistentObject};
pub use translator::{
    DiscriminatorColumns, JoinStack, JoinType, Ordering, PathResolver, SelectQuery,
    SelectTranslator,
};
pub use types::{
    ColumnDescriptor, DataRow, JdbcType, ObjectId, ParameterBinding, QuotingStrategy,
    SqlStatement, Value,
};
