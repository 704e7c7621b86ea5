//! Recursive descent parser for qualifier expressions.
//!
//! ```text
//! expr       := or
//! or         := and ( "or" and )*
//! and        := unary ( "and" unary )*
//! unary      := "not" unary | "(" expr ")" | comparison
//! comparison := operand op operand
//!             | operand ["not"] ("like" | "likeIgnoreCase") operand
//!             | operand ["not"] "in" ( "(" operand ("," operand)* ")" | param )
//!             | operand ["not"] "between" operand "and" operand
//! ```

use super::ast::{BinaryOp, Expression};
use super::error::ParseError;
use super::lexer::{Lexer, SpannedToken, Token};
use super::span::Span;
use crate::types::Value;

/// Parser for the qualifier language.
pub struct Parser<'source> {
    lexer: Lexer<'source>,
    source: &'source str,
}

impl<'source> Parser<'source> {
    /// Create a new parser for the given source.
    pub fn new(source: &'source str) -> Self {
        Self {
            lexer: Lexer::new(source),
            source,
        }
    }

    /// Parse a complete expression, rejecting trailing input.
    pub fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        let expression = self.parse_or()?;
        match self.lexer.next_token() {
            None => Ok(expression),
            Some(Ok(tok)) => Err(ParseError::new(
                format!("unexpected {:?} after expression", tok.token),
                tok.span,
            )
            .with_hint("combine conditions with 'and' or 'or'")),
            Some(Err(span)) => Err(self.invalid_input(span)),
        }
    }

    fn parse_or(&mut self) -> Result<Expression, ParseError> {
        let mut parts = vec![self.parse_and()?];
        while self.peek_is(&Token::Or)? {
            self.next_token()?;
            parts.push(self.parse_and()?);
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            Expression::Or(parts)
        })
    }

    fn parse_and(&mut self) -> Result<Expression, ParseError> {
        let mut parts = vec![self.parse_unary()?];
        while self.peek_is(&Token::And)? {
            self.next_token()?;
            parts.push(self.parse_unary()?);
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            Expression::And(parts)
        })
    }

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        if self.peek_is(&Token::Not)? {
            self.next_token()?;
            return Ok(self.parse_unary()?.not_exp());
        }
        if self.peek_is(&Token::LParen)? {
            self.next_token()?;
            let inner = self.parse_or()?;
            self.expect_token(Token::RParen)?;
            return Ok(inner);
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expression, ParseError> {
        let left = self.parse_operand()?;
        let tok = self.next_token()?;

        let (negated, tok) = if tok.token == Token::Not {
            (true, self.next_token()?)
        } else {
            (false, tok)
        };

        let op = match (&tok.token, negated) {
            (Token::Like, false) => BinaryOp::Like,
            (Token::Like, true) => BinaryOp::NotLike,
            (Token::LikeIgnoreCase, false) => BinaryOp::LikeIgnoreCase,
            (Token::LikeIgnoreCase, true) => BinaryOp::NotLikeIgnoreCase,
            (Token::In, _) => return self.parse_in(left, negated),
            (Token::Between, _) => return self.parse_between(left, negated),
            (Token::Eq, false) => BinaryOp::Equal,
            (Token::Ne, false) => BinaryOp::NotEqual,
            (Token::Lt, false) => BinaryOp::LessThan,
            (Token::Le, false) => BinaryOp::LessOrEqual,
            (Token::Gt, false) => BinaryOp::GreaterThan,
            (Token::Ge, false) => BinaryOp::GreaterOrEqual,
            (other, _) => {
                return Err(ParseError::new(
                    format!("expected comparison operator, found {:?}", other),
                    tok.span,
                ))
            }
        };

        let right = self.parse_operand()?;
        Ok(Expression::binary(op, left, right))
    }

    fn parse_in(&mut self, operand: Expression, negated: bool) -> Result<Expression, ParseError> {
        let tok = self.next_token()?;
        let values = match tok.token {
            Token::Param(name) => vec![Expression::Param(name)],
            Token::LParen => {
                let mut values = vec![self.parse_operand()?];
                loop {
                    let tok = self.next_token()?;
                    match tok.token {
                        Token::Comma => values.push(self.parse_operand()?),
                        Token::RParen => break,
                        other => {
                            return Err(ParseError::new(
                                format!("expected ',' or ')' in list, found {:?}", other),
                                tok.span,
                            ))
                        }
                    }
                }
                values
            }
            other => {
                return Err(ParseError::new(
                    format!("expected '(' or parameter after 'in', found {:?}", other),
                    tok.span,
                ))
            }
        };
        Ok(Expression::In {
            operand: Box::new(operand),
            values,
            negated,
        })
    }

    fn parse_between(
        &mut self,
        operand: Expression,
        negated: bool,
    ) -> Result<Expression, ParseError> {
        let lower = self.parse_operand()?;
        self.expect_token(Token::And)?;
        let upper = self.parse_operand()?;
        Ok(Expression::Between {
            operand: Box::new(operand),
            lower: Box::new(lower),
            upper: Box::new(upper),
            negated,
        })
    }

    fn parse_operand(&mut self) -> Result<Expression, ParseError> {
        let tok = self.next_token()?;
        Ok(match tok.token {
            Token::Path(path) => Expression::ObjPath(path),
            Token::DbPath(path) => Expression::DbPath(path),
            Token::Param(name) => Expression::Param(name),
            Token::String(s) => Expression::Literal(Value::String(s)),
            Token::Int(i) => Expression::Literal(Value::Int(i)),
            Token::Float(x) => Expression::Literal(Value::Float(x)),
            Token::True => Expression::Literal(Value::Bool(true)),
            Token::False => Expression::Literal(Value::Bool(false)),
            Token::Null => Expression::Literal(Value::Null),
            other => {
                return Err(ParseError::new(
                    format!("expected path, parameter or literal, found {:?}", other),
                    tok.span,
                ))
            }
        })
    }

    fn peek_is(&mut self, expected: &Token) -> Result<bool, ParseError> {
        let span = match self.lexer.peek() {
            None => return Ok(false),
            Some(Ok(tok)) => return Ok(&tok.token == expected),
            Some(Err(span)) => *span,
        };
        Err(self.invalid_input(span))
    }

    fn expect_token(&mut self, expected: Token) -> Result<SpannedToken, ParseError> {
        let tok = self.next_token()?;
        if std::mem::discriminant(&tok.token) == std::mem::discriminant(&expected) {
            Ok(tok)
        } else {
            Err(ParseError::new(
                format!("expected {:?}, found {:?}", expected, tok.token),
                tok.span,
            ))
        }
    }

    fn next_token(&mut self) -> Result<SpannedToken, ParseError> {
        match self.lexer.next_token() {
            Some(Ok(tok)) => Ok(tok),
            Some(Err(span)) => Err(self.invalid_input(span)),
            None => Err(ParseError::new("unexpected end of input", Span::eof(self.source))),
        }
    }

    fn invalid_input(&self, span: Span) -> ParseError {
        let text = span.slice(self.source).unwrap_or_default();
        ParseError::new(format!("unrecognized input '{}'", text), span)
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_simple_match() {
        assert_eq!(
            parse("artistName = 'Picasso'").unwrap(),
            Expression::match_exp("artistName", "Picasso")
        );
    }

    #[test]
    fn test_precedence() {
        let exp = parse("a = 1 or b = 2 and c = 3").unwrap();
        assert_eq!(
            exp,
            Expression::Or(vec![
                Expression::match_exp("a", 1i64),
                Expression::And(vec![
                    Expression::match_exp("b", 2i64),
                    Expression::match_exp("c", 3i64),
                ]),
            ])
        );
    }

    #[test]
    fn test_not_like_and_in() {
        let exp = parse("name not like 'A%' and db:ID not in (1, 2, $x)").unwrap();
        assert_eq!(
            exp,
            Expression::And(vec![
                Expression::binary(
                    BinaryOp::NotLike,
                    Expression::obj_path("name"),
                    Expression::literal("A%")
                ),
                Expression::In {
                    operand: Box::new(Expression::db_path("ID")),
                    values: vec![
                        Expression::literal(1i64),
                        Expression::literal(2i64),
                        Expression::param("x")
                    ],
                    negated: true,
                },
            ])
        );
    }

    #[test]
    fn test_between_consumes_its_and() {
        let exp = parse("price between 1 and 10 and name = null").unwrap();
        match exp {
            Expression::And(parts) => {
                assert_eq!(parts.len(), 2);
                assert!(matches!(parts[0], Expression::Between { negated: false, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_round_trip_through_display() {
        for source in [
            "artistName = 'Pic\\'asso'",
            "paintingArray+.paintingTitle likeIgnoreCase $title",
            "a = 1 and (b = 2 or not (c != null))",
            "db:toArtist.ARTIST_ID in (1, 2, 3)",
            "estimatedPrice not between 1.5 and 20.0",
        ] {
            let parsed = parse(source).unwrap();
            let reparsed = parse(&parsed.to_string()).unwrap();
            assert_eq!(parsed, reparsed, "{source}");
        }
    }

    #[test]
    fn test_errors_carry_spans() {
        let err = parse("name = = 1").unwrap_err();
        assert_eq!(err.span, Span::new(7, 8));

        let err = parse("name =").unwrap_err();
        assert_eq!(err.message, "unexpected end of input");

        let err = parse("a = 1 b = 2").unwrap_err();
        assert!(err.hint.is_some());
        assert!(err.format_with_source("a = 1 b = 2").contains("line 1:7"));
    }

    #[test]
    fn test_unrecognized_input_at_lookahead() {
        let err = parse("~ a = 1").unwrap_err();
        assert_eq!(err.span, Span::new(0, 1));
        assert_eq!(err.message, "unrecognized input '~'");

        let err = parse("a = 1 and ~").unwrap_err();
        assert_eq!(err.span, Span::new(10, 11));
    }
}
