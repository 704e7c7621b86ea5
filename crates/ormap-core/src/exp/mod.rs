//! Qualifier expressions: tree, parser, parameter binding and evaluation.
//!
//! # Example
//!
//! ```
//! use ormap_core::exp::{parse, Expression};
//!
//! let exp = parse("artistName like 'A%' and paintingArray+.estimatedPrice > 1000").unwrap();
//! assert!(matches!(exp, Expression::And(_)));
//! ```

mod ast;
mod error;
mod eval;
mod lexer;
mod params;
mod parser;
mod span;

pub use ast::{BinaryOp, Expression};
pub use error::ParseError;
pub use lexer::{unescape_string, Lexer, SpannedToken, Token};
pub use parser::Parser;
pub use span::{offset_to_line_col, render_diagnostic, Span};

/// Parse expression text.
pub fn parse(source: &str) -> Result<Expression, ParseError> {
    Parser::new(source).parse_expression()
}
