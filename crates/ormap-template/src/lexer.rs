//! Lexers for template text and directive arguments using logos.
//!
//! Template text is split into plain text runs, `$variables`, directive
//! calls and `#end`. A directive call token carries its raw argument text,
//! which is lexed separately by [`ArgToken`].

use logos::Logos;
use ormap_core::exp::unescape_string;
use ormap_core::Span;

/// `#name(args)` as it appears in the template.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveCall {
    pub name: String,
    /// Text between the parentheses.
    pub args: String,
    /// Byte offset of `args` in the template.
    pub args_offset: usize,
}

/// Top-level template tokens.
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    /// `#end`. Every `#name` word is matched here first and resolved by
    /// [`hash_word`], so `#ending` stays text.
    #[regex(r"#[A-Za-z][A-Za-z0-9_]*", hash_word)]
    End,

    Directive(DirectiveCall),

    /// `$name`, `$name.key` or `${name}`.
    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*", |lex| lex.slice()[1..].to_string())]
    #[regex(r"\$\{[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*\}", |lex| {
        let s = lex.slice();
        s[2..s.len() - 1].to_string()
    })]
    Variable(String),

    #[regex(r"[^#$]+", |lex| lex.slice().to_string())]
    #[token("#", |lex| lex.slice().to_string())]
    #[token("$", |lex| lex.slice().to_string())]
    Text(String),
}

/// Resolve a `#name` word: `#end`, a directive call when `(` follows
/// (optionally after spaces or tabs), plain text otherwise. An unclosed call
/// is a lexer error at the directive name.
fn hash_word(lex: &mut logos::Lexer<Token>) -> Result<Token, ()> {
    let name = &lex.slice()[1..];
    if name == "end" {
        return Ok(Token::End);
    }
    let rest = lex.remainder();
    let open = rest.len() - rest.trim_start_matches([' ', '\t']).len();
    if !rest[open..].starts_with('(') {
        return Ok(Token::Text(lex.slice().to_string()));
    }

    let name = name.to_string();
    let args_offset = lex.span().end + open + 1;
    let close = closing_paren(&rest[open + 1..]).ok_or(())?;
    let args = rest[open + 1..open + 1 + close].to_string();
    lex.bump(open + close + 2);
    Ok(Token::Directive(DirectiveCall {
        name,
        args,
        args_offset,
    }))
}

/// Byte index of the `)` closing an already opened parenthesis. Quoted
/// text is skipped, so `'count(*)'` doesn't confuse the nesting.
fn closing_paren(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, ch) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '(' => depth += 1,
            ')' if depth == 0 => return Some(i),
            ')' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Tokens of a directive argument list. Arguments are separated by
/// whitespace or commas.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n,]+")]
pub enum ArgToken {
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*", |lex| lex.slice()[1..].to_string())]
    #[regex(r"\$\{[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*\}", |lex| {
        let s = lex.slice();
        s[2..s.len() - 1].to_string()
    })]
    Variable(String),

    #[regex(r"'([^'\\]|\\.)*'", |lex| unescape_string(&lex.slice()[1..lex.slice().len() - 1]))]
    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape_string(&lex.slice()[1..lex.slice().len() - 1]))]
    String(String),

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
}

/// Split template text into spanned tokens. Unrecognized input is reported
/// as `Err(span)`.
pub fn tokenize(source: &str) -> Vec<Result<(Token, Span), Span>> {
    let mut lexer = Token::lexer(source);
    let mut out = Vec::new();
    while let Some(token) = lexer.next() {
        let span: Span = lexer.span().into();
        out.push(token.map(|t| (t, span)).map_err(|_| span));
    }
    out
}

/// Split directive arguments into tokens with spans relative to the whole
/// template.
pub fn tokenize_args(args: &str, offset: usize) -> Vec<Result<(ArgToken, Span), Span>> {
    let mut lexer = ArgToken::lexer(args);
    let mut out = Vec::new();
    while let Some(token) = lexer.next() {
        let range = lexer.span();
        let span = Span::new(range.start + offset, range.end + offset);
        out.push(token.map(|t| (t, span)).map_err(|_| span));
    }
    out
}
