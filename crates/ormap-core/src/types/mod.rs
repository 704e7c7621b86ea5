//! Values, JDBC types, parameter bindings and result column descriptors.

mod binding;
mod jdbc;
mod quoting;
mod value;

pub use binding::{ColumnDescriptor, DataRow, ParameterBinding, SqlStatement};
pub use jdbc::JdbcType;
pub use quoting::QuotingStrategy;
pub use value::{ObjectId, Value};
