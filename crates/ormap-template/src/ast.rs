//! Parsed template tree.

use ormap_core::Span;
use std::fmt;

/// A parsed template: source text plus its node tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub source: String,
    pub nodes: Vec<Node>,
}

impl Template {
    /// Variable names in order of first appearance, each listed once.
    pub fn parameter_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        collect_names(&self.nodes, &mut names);
        names
    }
}

fn collect_names(nodes: &[Node], names: &mut Vec<String>) {
    fn push(var: &VarRef, names: &mut Vec<String>) {
        if !names.iter().any(|n| n == &var.name) {
            names.push(var.name.clone());
        }
    }
    for node in nodes {
        match node {
            Node::Text(_) => {}
            Node::Variable(var) => push(var, names),
            Node::Directive(directive) => {
                for arg in &directive.args {
                    arg.visit_variables(&mut |var| push(var, names));
                }
                collect_names(&directive.body, names);
            }
        }
    }
}

/// `$name.key.key`: a parameter name plus property path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarRef {
    pub name: String,
    pub path: Vec<String>,
    pub span: Span,
}

impl VarRef {
    /// Split `name.key` source text.
    pub fn parse(text: &str, span: Span) -> Self {
        let mut parts = text.split('.').map(str::to_string);
        let name = parts.next().unwrap_or_default();
        Self {
            name,
            path: parts.collect(),
            span,
        }
    }
}

impl fmt::Display for VarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.name)?;
        for key in &self.path {
            write!(f, ".{}", key)?;
        }
        Ok(())
    }
}

/// A directive argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Null,
    Bool(bool),
    Int(i64),
    String(String),
    Variable(VarRef),
    List(Vec<Arg>),
}

impl Arg {
    fn visit_variables<'a>(&'a self, visit: &mut impl FnMut(&'a VarRef)) {
        match self {
            Arg::Variable(var) => visit(var),
            Arg::List(items) => items.iter().for_each(|item| item.visit_variables(visit)),
            _ => {}
        }
    }

    /// Literal string value, if the argument is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Supported directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    Bind,
    BindEqual,
    BindNotEqual,
    BindObjectEqual,
    BindObjectNotEqual,
    Result,
    Chain,
    Chunk,
}

impl DirectiveKind {
    /// Look a directive up by its template name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "bind" => DirectiveKind::Bind,
            "bindEqual" => DirectiveKind::BindEqual,
            "bindNotEqual" => DirectiveKind::BindNotEqual,
            "bindObjectEqual" => DirectiveKind::BindObjectEqual,
            "bindObjectNotEqual" => DirectiveKind::BindObjectNotEqual,
            "result" => DirectiveKind::Result,
            "chain" => DirectiveKind::Chain,
            "chunk" => DirectiveKind::Chunk,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            DirectiveKind::Bind => "bind",
            DirectiveKind::BindEqual => "bindEqual",
            DirectiveKind::BindNotEqual => "bindNotEqual",
            DirectiveKind::BindObjectEqual => "bindObjectEqual",
            DirectiveKind::BindObjectNotEqual => "bindObjectNotEqual",
            DirectiveKind::Result => "result",
            DirectiveKind::Chain => "chain",
            DirectiveKind::Chunk => "chunk",
        }
    }

    /// Directives closed by `#end`.
    pub fn has_body(&self) -> bool {
        matches!(self, DirectiveKind::Chain | DirectiveKind::Chunk)
    }

    /// Allowed argument counts.
    pub fn arity(&self) -> (usize, usize) {
        match self {
            DirectiveKind::Bind | DirectiveKind::BindEqual | DirectiveKind::BindNotEqual => (1, 3),
            DirectiveKind::BindObjectEqual | DirectiveKind::BindObjectNotEqual => (1, 3),
            DirectiveKind::Result => (1, 5),
            DirectiveKind::Chain => (1, 2),
            DirectiveKind::Chunk => (0, 1),
        }
    }
}

/// A directive call, with its body for `#chain` and `#chunk`.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub kind: DirectiveKind,
    pub args: Vec<Arg>,
    pub body: Vec<Node>,
    pub span: Span,
}

/// A template node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Variable(VarRef),
    Directive(Directive),
}
