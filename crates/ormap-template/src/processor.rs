//! Template processing entry point.

use crate::ast::Template;
use crate::cache::TemplateCache;
use crate::error::Result;
use crate::evaluator::evaluate;
use crate::params::TemplateParams;
use ormap_core::{SqlStatement, TranslatorConfig};
use std::sync::Arc;
use tracing::debug;

/// Turns SQL templates plus parameters into executable statements.
///
/// Each distinct template text is parsed once and cached; evaluation runs on
/// every call.
#[derive(Debug)]
pub struct TemplateProcessor {
    cache: TemplateCache,
}

impl Default for TemplateProcessor {
    fn default() -> Self {
        Self::from_config(&TranslatorConfig::default())
    }
}

impl TemplateProcessor {
    /// Create a processor caching up to `cache_size` templates.
    pub fn new(cache_size: usize) -> Self {
        Self {
            cache: TemplateCache::new(cache_size),
        }
    }

    /// Create a processor sized from a translator configuration.
    pub fn from_config(config: &TranslatorConfig) -> Self {
        Self::new(config.template_cache_size)
    }

    /// Parsed form of a template, from the cache when possible.
    pub fn template(&self, source: &str) -> Result<Arc<Template>> {
        self.cache.get_or_parse(source)
    }

    /// Render a template with parameters.
    pub fn process(&self, source: &str, params: &TemplateParams) -> Result<SqlStatement> {
        let template = self.template(source)?;
        let values = params.resolve(&template)?;
        let statement = evaluate(&template, &values)?;

        debug!(
            sql = %statement.sql,
            bindings = statement.bindings.len(),
            result_columns = statement.result_columns.len(),
            "Processed SQL template"
        );
        Ok(statement)
    }

    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }
}
