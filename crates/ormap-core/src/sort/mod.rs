//! Dependency ordering of tables and objects (Ashwood sorter).
//!
//! Tables are ordered by foreign key dependencies: a table referenced by a
//! to-one relationship onto its primary key sorts before the referencing
//! table. Mutually dependent tables share one position. Objects of
//! self-referencing tables are ordered by their runtime master links.

mod graph;
mod object;
mod sorter;

pub use object::{PersistenceState, PersistentObject};
pub use sorter::EntitySorter;
