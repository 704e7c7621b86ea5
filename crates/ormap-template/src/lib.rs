//! ORMAP Template - hand-written SQL with bindings.
//!
//! Templates are plain SQL with directives:
//!
//! ```text
//! SELECT #result('ARTIST_ID' 'long'), #result('ARTIST_NAME' 'String')
//! FROM ARTIST
//! #chain('AND' 'WHERE')
//!     #chunk($name) ARTIST_NAME #bindEqual($name) #end
//!     #chunk($ids) ARTIST_ID IN (#bind($ids 'BIGINT')) #end
//! #end
//! ```
//!
//! # Example
//!
//! ```
//! use ormap_template::{TemplateParams, TemplateProcessor};
//!
//! let processor = TemplateProcessor::new(64);
//! let stmt = processor
//!     .process(
//!         "SELECT * FROM ARTIST WHERE ARTIST_NAME = #bind($name)",
//!         &TemplateParams::named([("name", "Picasso")]),
//!     )
//!     .unwrap();
//! assert_eq!(stmt.sql, "SELECT * FROM ARTIST WHERE ARTIST_NAME = ?");
//! ```

pub mod ast;
pub mod cache;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod params;
pub mod parser;
pub mod processor;

pub use ast::{Arg, Directive, DirectiveKind, Node, Template, VarRef};
pub use cache::{CacheStats, TemplateCache};
pub use error::{Result, TemplateError};
pub use evaluator::evaluate;
pub use params::TemplateParams;
pub use parser::parse;
pub use processor::TemplateProcessor;
