//! A model plus everything needed to generate SQL for it.

use crate::error::Result;
use ormap_core::{
    BatchQuery, BatchStatement, BatchTranslator, DataMap, DbEntity, DbMerger, EntitySorter,
    MergerToken, PersistentObject, SchemaConnector, SchemaSynchronizer, SchemaUpdateStrategy,
    SelectQuery, SelectTranslator, SqlStatement, SyncOutcome, TranslatorConfig, Value,
};
#[cfg(feature = "template")]
use ormap_template::{TemplateParams, TemplateProcessor};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Shared, read-only translation context for one model.
///
/// Everything except the template cache and the synchronizer's bookkeeping
/// is immutable after construction, so a `Runtime` can be shared across
/// threads behind an `Arc`.
#[derive(Debug)]
pub struct Runtime {
    map: DataMap,
    config: TranslatorConfig,
    sorter: EntitySorter,
    merger: DbMerger,
    synchronizer: SchemaSynchronizer,
    #[cfg(feature = "template")]
    templates: TemplateProcessor,
}

impl Runtime {
    /// Create a runtime with default settings.
    pub fn new(map: DataMap) -> Result<Self> {
        Self::with_config(map, TranslatorConfig::default())
    }

    /// Create a runtime. The model is validated first.
    pub fn with_config(map: DataMap, config: TranslatorConfig) -> Result<Self> {
        map.validate()?;
        let sorter = EntitySorter::new(&map);

        info!(
            model = %map.name,
            tables = map.db_entities.len(),
            entities = map.obj_entities.len(),
            "Loaded model"
        );

        Ok(Self {
            #[cfg(feature = "template")]
            templates: TemplateProcessor::from_config(&config),
            map,
            config,
            sorter,
            merger: DbMerger::new(),
            synchronizer: SchemaSynchronizer::default(),
        })
    }

    /// Load a model file and an optional config file.
    pub fn load(model: impl AsRef<Path>, config: Option<impl AsRef<Path>>) -> Result<Self> {
        let map = DataMap::load(model)?;
        let config = match config {
            Some(path) => TranslatorConfig::load(path)?,
            None => TranslatorConfig::default(),
        };
        Self::with_config(map, config)
    }

    /// Set the strategy used by [`Runtime::sync_schema`].
    pub fn with_schema_strategy(mut self, strategy: SchemaUpdateStrategy) -> Self {
        self.synchronizer = SchemaSynchronizer::new(strategy);
        self
    }

    /// Override the commit position of a table.
    pub fn with_sort_weight(mut self, table: impl Into<String>, weight: i32) -> Self {
        self.sorter = std::mem::take(&mut self.sorter).with_sort_weight(table, weight);
        self
    }

    /// Set the merger used by [`Runtime::diff`].
    pub fn with_merger(mut self, merger: DbMerger) -> Self {
        self.merger = merger;
        self
    }

    pub fn map(&self) -> &DataMap {
        &self.map
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    pub fn sorter(&self) -> &EntitySorter {
        &self.sorter
    }

    /// Translate a select query.
    pub fn select(&self, query: &SelectQuery) -> Result<SqlStatement> {
        Ok(SelectTranslator::new(&self.map, &self.config).translate(query)?)
    }

    /// Substitute named parameters, dropping qualifier parts whose
    /// parameter is missing, then translate.
    pub fn select_with_params(
        &self,
        query: SelectQuery,
        params: &HashMap<String, Value>,
    ) -> Result<SqlStatement> {
        let query = query.with_params(params, true)?;
        self.select(&query)
    }

    /// Build the statements for one batch.
    pub fn batch(&self, query: &BatchQuery) -> Result<Vec<BatchStatement>> {
        Ok(BatchTranslator::new(&self.map, &self.config).translate(query)?)
    }

    /// Table names in insert order, or delete order.
    pub fn commit_order(&self, delete_order: bool) -> Vec<String> {
        self.sorter.sorted_db_entity_names(delete_order)
    }

    /// Order objects of a self-referencing entity for commit.
    pub fn sort_objects(
        &self,
        entity: &str,
        objects: &mut Vec<PersistentObject>,
        delete_order: bool,
    ) -> Result<()> {
        let entity = self.map.require_obj_entity(entity)?;
        Ok(self
            .sorter
            .sort_objects_for_entity(entity, objects, delete_order)?)
    }

    /// Tokens that would bring `detected` in line with the model.
    pub fn diff(&self, detected: &[DbEntity]) -> Vec<MergerToken> {
        self.merger.create_merge_tokens(&self.map, detected)
    }

    /// Run schema synchronization for `node` once.
    pub fn sync_schema(&self, node: &str, connector: &dyn SchemaConnector) -> Result<SyncOutcome> {
        Ok(self.synchronizer.update_schema(node, &self.map, connector)?)
    }

    /// Render a SQL template.
    #[cfg(feature = "template")]
    pub fn template(&self, source: &str, params: &TemplateParams) -> Result<SqlStatement> {
        Ok(self.templates.process(source, params)?)
    }

    #[cfg(feature = "template")]
    pub fn templates(&self) -> &TemplateProcessor {
        &self.templates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use ormap_core::{DbAttribute, JdbcType, ObjAttribute, ObjEntity};

    fn map() -> DataMap {
        DataMap::new("small")
            .with_db_entity(
                DbEntity::new("ARTIST")
                    .with_attribute(DbAttribute::primary_key("ARTIST_ID", JdbcType::BigInt))
                    .with_attribute(DbAttribute::new("ARTIST_NAME", JdbcType::Varchar).with_max_length(254)),
            )
            .with_obj_entity(
                ObjEntity::new("Artist", "ARTIST").with_attribute(ObjAttribute::new("artistName", "ARTIST_NAME")),
            )
    }

    #[test]
    fn test_invalid_model_is_rejected() {
        let broken = map().with_obj_entity(ObjEntity::new("Ghost", "NO_SUCH_TABLE"));
        let err = Runtime::new(broken).unwrap_err();
        assert!(matches!(err, Error::Core(_)));
    }

    #[test]
    fn test_select_with_missing_params_drops_condition() {
        let runtime = Runtime::new(map()).unwrap();
        let query = SelectQuery::new("Artist")
            .with_qualifier(ormap_core::exp::parse("artistName = $name").unwrap());
        let stmt = runtime.select_with_params(query, &HashMap::new()).unwrap();
        assert!(!stmt.sql.contains("WHERE"));
        assert!(stmt.bindings.is_empty());
    }

    #[test]
    fn test_sort_weight_override() {
        let runtime = Runtime::new(map()).unwrap().with_sort_weight("ARTIST", 5);
        assert_eq!(runtime.commit_order(false), vec!["ARTIST".to_string()]);
    }
}
