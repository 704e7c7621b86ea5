//! Lowering of object queries to SQL.
//!
//! The pipeline for a select query:
//! 1. [`PathResolver`] walks object/db paths into relationship chains.
//! 2. [`JoinStack`] turns those chains into a join tree with table aliases.
//! 3. [`QualifierTranslator`] renders the predicate and collects bindings.
//! 4. [`SelectTranslator`] assembles columns, joins, WHERE and ORDER BY.

mod discriminator;
mod join;
mod path;
mod qualifier;
mod query;
mod select;

pub use discriminator::{entity_matching_row, DiscriminatorColumn, DiscriminatorColumns};
pub use join::{JoinNode, JoinStack, JoinType};
pub use path::{PathResolver, PathSegment, ResolvedPath};
pub use qualifier::QualifierTranslator;
pub use query::{Ordering, SelectQuery};
pub use select::SelectTranslator;
