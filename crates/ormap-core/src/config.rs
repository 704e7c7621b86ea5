//! Translator configuration.

use crate::error::Result;
use crate::map::DataMap;
use crate::types::QuotingStrategy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of parsed SQL templates kept in memory.
pub const DEFAULT_TEMPLATE_CACHE_SIZE: usize = 256;

/// Settings shared by the select, batch and template translators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Force identifier quoting on or off. `None` follows the data map.
    pub quote_identifiers: Option<bool>,
    /// Whether the driver returns generated keys, so generated columns
    /// can be left out of INSERT statements.
    pub supports_generated_keys: bool,
    /// Maximum number of cached template ASTs. Zero disables caching.
    pub template_cache_size: usize,
    /// Render case-insensitive orderings as `UPPER(column)`.
    pub case_insensitive_orderings_use_upper: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            quote_identifiers: None,
            supports_generated_keys: false,
            template_cache_size: DEFAULT_TEMPLATE_CACHE_SIZE,
            case_insensitive_orderings_use_upper: true,
        }
    }
}

impl TranslatorConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force identifier quoting on or off.
    pub fn with_quoting(mut self, quote: bool) -> Self {
        self.quote_identifiers = Some(quote);
        self
    }

    /// Declare generated key support.
    pub fn with_generated_keys(mut self, supported: bool) -> Self {
        self.supports_generated_keys = supported;
        self
    }

    /// Set the template cache capacity.
    pub fn with_template_cache_size(mut self, size: usize) -> Self {
        self.template_cache_size = size;
        self
    }

    /// Choose how case-insensitive orderings are rendered.
    pub fn with_upper_orderings(mut self, enabled: bool) -> Self {
        self.case_insensitive_orderings_use_upper = enabled;
        self
    }

    /// Quoting strategy for a model.
    pub fn quoting_for(&self, map: &DataMap) -> QuotingStrategy {
        QuotingStrategy::new(self.quote_identifiers.unwrap_or(map.quote_identifiers))
    }

    /// Parse a configuration from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TranslatorConfig::new();
        assert_eq!(config.template_cache_size, DEFAULT_TEMPLATE_CACHE_SIZE);
        assert!(!config.supports_generated_keys);
        assert!(config.case_insensitive_orderings_use_upper);
    }

    #[test]
    fn test_quoting_override() {
        let mut map = DataMap::new("test");
        map.quote_identifiers = true;
        assert!(TranslatorConfig::new().quoting_for(&map).is_quoting());
        assert!(!TranslatorConfig::new().with_quoting(false).quoting_for(&map).is_quoting());
    }

    #[test]
    fn test_partial_json() {
        let config = TranslatorConfig::from_json(r#"{"supports_generated_keys": true}"#).unwrap();
        assert!(config.supports_generated_keys);
        assert_eq!(config.template_cache_size, DEFAULT_TEMPLATE_CACHE_SIZE);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ormap.json");
        std::fs::write(&path, r#"{"quote_identifiers": true, "template_cache_size": 8}"#).unwrap();
        let config = TranslatorConfig::load(&path).unwrap();
        assert_eq!(config.quote_identifiers, Some(true));
        assert_eq!(config.template_cache_size, 8);
    }
}
