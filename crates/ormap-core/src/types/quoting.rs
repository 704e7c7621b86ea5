//! Identifier quoting.

/// Decides whether table and column names are wrapped in quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuotingStrategy {
    quote: bool,
}

impl QuotingStrategy {
    /// Create a strategy.
    pub fn new(quote: bool) -> Self {
        Self { quote }
    }

    /// Strategy that leaves identifiers untouched.
    pub fn plain() -> Self {
        Self::new(false)
    }

    /// Strategy that double-quotes every identifier.
    pub fn quoted() -> Self {
        Self::new(true)
    }

    /// Whether identifiers are quoted.
    pub fn is_quoting(&self) -> bool {
        self.quote
    }

    /// Render one identifier.
    pub fn identifier(&self, name: &str) -> String {
        if self.quote {
            format!("\"{}\"", name.replace('"', "\"\""))
        } else {
            name.to_string()
        }
    }

    /// Render `alias.column`; the alias itself is never quoted.
    pub fn column(&self, alias: Option<&str>, name: &str) -> String {
        match alias {
            Some(alias) => format!("{}.{}", alias, self.identifier(name)),
            None => self.identifier(name),
        }
    }

    /// Render a dotted name (`catalog.schema.table`), skipping empty parts.
    pub fn qualified(&self, parts: &[Option<&str>]) -> String {
        parts
            .iter()
            .flatten()
            .filter(|p| !p.is_empty())
            .map(|p| self.identifier(p))
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_and_quoted() {
        assert_eq!(QuotingStrategy::plain().column(Some("t0"), "NAME"), "t0.NAME");
        assert_eq!(QuotingStrategy::quoted().column(Some("t0"), "NAME"), "t0.\"NAME\"");
        assert_eq!(
            QuotingStrategy::quoted().qualified(&[None, Some("app"), Some("ARTIST")]),
            "\"app\".\"ARTIST\""
        );
    }
}
