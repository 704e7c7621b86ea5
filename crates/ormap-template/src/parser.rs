//! Template parser.
//!
//! ```text
//! template  := node*
//! node      := text | variable | directive
//! directive := "#" name "(" arg* ")" [ node* "#end" ]   -- body for chain/chunk
//! arg       := string | int | true | false | null | variable | "[" arg* "]"
//! ```

use crate::ast::{Arg, Directive, DirectiveKind, Node, Template, VarRef};
use crate::error::{Result, TemplateError};
use crate::lexer::{tokenize, tokenize_args, ArgToken, DirectiveCall, Token};
use ormap_core::Span;
use std::iter::Peekable;
use std::vec::IntoIter;

/// Parse template text into a [`Template`].
pub fn parse(source: &str) -> Result<Template> {
    let mut parser = TemplateParser {
        source,
        tokens: tokenize(source).into_iter(),
    };
    let nodes = parser.parse_nodes(None)?;
    Ok(Template {
        source: source.to_string(),
        nodes,
    })
}

struct TemplateParser<'s> {
    source: &'s str,
    tokens: IntoIter<std::result::Result<(Token, Span), Span>>,
}

impl TemplateParser<'_> {
    /// Nodes up to the end of input, or up to the `#end` closing `open`.
    fn parse_nodes(&mut self, open: Option<(DirectiveKind, Span)>) -> Result<Vec<Node>> {
        let mut nodes: Vec<Node> = Vec::new();
        loop {
            let (token, span) = match self.tokens.next() {
                None => {
                    return match open {
                        Some((kind, span)) => Err(TemplateError::parse(
                            format!("'#{}' is not closed", kind.name()),
                            span,
                        )
                        .with_hint("add a matching #end")),
                        None => Ok(nodes),
                    };
                }
                Some(Err(span)) => return Err(self.invalid_input(span)),
                Some(Ok(token)) => token,
            };

            match token {
                Token::Text(text) => match nodes.last_mut() {
                    Some(Node::Text(last)) => last.push_str(&text),
                    _ => nodes.push(Node::Text(text)),
                },
                Token::Variable(text) => nodes.push(Node::Variable(VarRef::parse(&text, span))),
                Token::End => {
                    return match open {
                        Some(_) => Ok(nodes),
                        None => Err(TemplateError::parse("'#end' without an open block", span)
                            .with_hint("only #chain and #chunk take a body")),
                    };
                }
                Token::Directive(call) => nodes.push(Node::Directive(self.parse_directive(call, span)?)),
            }
        }
    }

    fn parse_directive(&mut self, call: DirectiveCall, span: Span) -> Result<Directive> {
        let name_span = Span::new(span.start, span.start + 1 + call.name.len());
        let kind = DirectiveKind::from_name(&call.name).ok_or_else(|| TemplateError::UnknownDirective {
            name: call.name.clone(),
            span: name_span,
        })?;

        let mut tokens = tokenize_args(&call.args, call.args_offset).into_iter().peekable();
        let mut args = Vec::new();
        while tokens.peek().is_some() {
            args.push(parse_arg(&mut tokens, span)?);
        }

        let (min, max) = kind.arity();
        if args.len() < min || args.len() > max {
            let expected = if min == max {
                min.to_string()
            } else {
                format!("{} to {}", min, max)
            };
            return Err(TemplateError::invalid_argument(
                kind.name(),
                format!("expected {} argument(s), got {}", expected, args.len()),
            ));
        }

        let body = if kind.has_body() {
            self.parse_nodes(Some((kind, name_span)))?
        } else {
            Vec::new()
        };

        Ok(Directive {
            kind,
            args,
            body,
            span,
        })
    }

    fn invalid_input(&self, span: Span) -> TemplateError {
        let text = span.slice(self.source).unwrap_or_default();
        if text.starts_with('#') {
            TemplateError::parse("directive call is missing its closing ')'", span)
        } else {
            TemplateError::parse(format!("unexpected input '{}'", text), span)
        }
    }
}

type ArgTokens = Peekable<IntoIter<std::result::Result<(ArgToken, Span), Span>>>;

fn parse_arg(tokens: &mut ArgTokens, directive_span: Span) -> Result<Arg> {
    let (token, span) = match tokens.next() {
        Some(Ok(token)) => token,
        Some(Err(span)) => return Err(TemplateError::parse("invalid directive argument", span)),
        None => return Err(TemplateError::parse("missing directive argument", directive_span)),
    };
    Ok(match token {
        ArgToken::Null => Arg::Null,
        ArgToken::True => Arg::Bool(true),
        ArgToken::False => Arg::Bool(false),
        ArgToken::Int(i) => Arg::Int(i),
        ArgToken::String(s) => Arg::String(s),
        ArgToken::Variable(text) => Arg::Variable(VarRef::parse(&text, span)),
        ArgToken::LBracket => {
            let mut items = Vec::new();
            loop {
                match tokens.peek() {
                    Some(Ok((ArgToken::RBracket, _))) => {
                        tokens.next();
                        break;
                    }
                    Some(_) => items.push(parse_arg(tokens, directive_span)?),
                    None => {
                        return Err(TemplateError::parse("unclosed '['", span).with_hint("add a matching ']'"));
                    }
                }
            }
            Arg::List(items)
        }
        ArgToken::RBracket => return Err(TemplateError::parse("unexpected ']'", span)),
    })
}
