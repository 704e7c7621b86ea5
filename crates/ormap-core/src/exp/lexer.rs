//! Lexer for qualifier expressions using logos.

use super::span::Span;
use logos::Logos;

/// Tokens of the qualifier language.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    // Boolean connectives
    #[token("and", ignore(ascii_case))]
    #[token("&&")]
    And,
    #[token("or", ignore(ascii_case))]
    #[token("||")]
    Or,
    #[token("not", ignore(ascii_case))]
    #[token("!")]
    Not,

    // Pattern, set and range operators
    #[token("like", ignore(ascii_case))]
    Like,
    #[token("likeIgnoreCase", ignore(ascii_case))]
    LikeIgnoreCase,
    #[token("in", ignore(ascii_case))]
    In,
    #[token("between", ignore(ascii_case))]
    Between,

    // Literals
    #[token("null", ignore(ascii_case))]
    Null,
    #[token("true", ignore(ascii_case))]
    True,
    #[token("false", ignore(ascii_case))]
    False,

    // Comparison operators
    #[token("=")]
    #[token("==")]
    Eq,
    #[token("!=")]
    #[token("<>")]
    Ne,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,

    /// `db:` prefixed path, stored without the prefix.
    #[regex(r"db:[A-Za-z_][A-Za-z0-9_]*\+?(\.[A-Za-z_][A-Za-z0-9_]*\+?)*", |lex| lex.slice()[3..].to_string())]
    DbPath(String),

    /// Object path; a `+` after a segment requests an outer join.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*\+?(\.[A-Za-z_][A-Za-z0-9_]*\+?)*", |lex| lex.slice().to_string())]
    Path(String),

    /// `$name` parameter.
    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice()[1..].to_string())]
    Param(String),

    #[regex(r"'([^'\\]|\\.)*'", |lex| unescape_string(&lex.slice()[1..lex.slice().len() - 1]))]
    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape_string(&lex.slice()[1..lex.slice().len() - 1]))]
    String(String),

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r"-?[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),
}

/// Unescape a quoted literal.
pub fn unescape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }
    result
}

/// A token with its span in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Lexer that produces spanned tokens with one token of lookahead.
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Token>,
    peeked: Option<Option<Result<SpannedToken, Span>>>,
}

impl<'source> Lexer<'source> {
    /// Create a new lexer for the given source.
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: Token::lexer(source),
            peeked: None,
        }
    }

    /// Peek at the next token without consuming it. Unrecognized input is
    /// reported as `Err(span)`.
    pub fn peek(&mut self) -> Option<&Result<SpannedToken, Span>> {
        if self.peeked.is_none() {
            self.peeked = Some(self.next_inner());
        }
        self.peeked.as_ref().and_then(|o| o.as_ref())
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Option<Result<SpannedToken, Span>> {
        match self.peeked.take() {
            Some(peeked) => peeked,
            None => self.next_inner(),
        }
    }

    fn next_inner(&mut self) -> Option<Result<SpannedToken, Span>> {
        let token = self.inner.next()?;
        let span: Span = self.inner.span().into();
        Some(token.map(|token| SpannedToken { token, span }).map_err(|_| span))
    }

    /// Get the source string.
    pub fn source(&self) -> &'source str {
        self.inner.source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        while let Some(Ok(t)) = lexer.next_token() {
            out.push(t.token);
        }
        out
    }

    #[test]
    fn test_comparison() {
        assert_eq!(
            tokens("artistName = 'Picasso'"),
            vec![
                Token::Path("artistName".into()),
                Token::Eq,
                Token::String("Picasso".into())
            ]
        );
    }

    #[test]
    fn test_paths_and_keywords() {
        assert_eq!(
            tokens("paintingArray+.paintingTitle LIKE $t AND db:ARTIST_ID <> 5"),
            vec![
                Token::Path("paintingArray+.paintingTitle".into()),
                Token::Like,
                Token::Param("t".into()),
                Token::And,
                Token::DbPath("ARTIST_ID".into()),
                Token::Ne,
                Token::Int(5),
            ]
        );
    }

    #[test]
    fn test_keyword_prefix_is_a_path() {
        assert_eq!(tokens("order"), vec![Token::Path("order".into())]);
        assert_eq!(tokens("notes"), vec![Token::Path("notes".into())]);
        assert_eq!(tokens("likeIgnoreCase"), vec![Token::LikeIgnoreCase]);
    }

    #[test]
    fn test_numbers_and_escapes() {
        assert_eq!(
            tokens(r"-3 2.5 'it\'s'"),
            vec![Token::Int(-3), Token::Float(2.5), Token::String("it's".into())]
        );
    }

    #[test]
    fn test_invalid_input_reports_span() {
        let mut lexer = Lexer::new("a = #");
        lexer.next_token();
        lexer.next_token();
        assert_eq!(lexer.next_token(), Some(Err(Span::new(4, 5))));
    }
}
