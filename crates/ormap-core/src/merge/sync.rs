//! Schema synchronization at data node startup.

use super::token::{MergerToken, TokenKind};
use crate::error::{Error, Result};
use crate::map::{DataMap, DbEntity};
use crate::sort::EntitySorter;
use crate::types::QuotingStrategy;
use dashmap::{DashMap, DashSet};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Access to a live database schema.
pub trait SchemaConnector {
    /// Tables currently present, with their columns and foreign keys.
    fn load_tables(&self) -> Result<Vec<DbEntity>>;

    /// Run one DDL statement.
    fn execute(&self, sql: &str) -> Result<()>;
}

/// What to do with a data node's schema on first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaUpdateStrategy {
    /// Leave the database alone.
    #[default]
    Skip,
    /// Create all tables when none of the model's tables exist.
    CreateIfNoSchema,
    /// Fail unless every table of the model exists.
    ThrowOnPartialSchema,
    /// Create all tables when none exist; fail when only some exist.
    ThrowOnPartialOrCreateSchema,
}

/// Result of a synchronization attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing was checked or changed.
    Skipped,
    /// The node was synchronized by an earlier call.
    AlreadySynchronized,
    /// Called again from inside a running synchronization of the node.
    Reentrant,
    /// All model tables are present.
    Verified,
    /// Tables created, in creation order.
    Created { tables: Vec<String> },
}

thread_local! {
    static IN_PROGRESS: RefCell<HashSet<String>> = RefCell::new(HashSet::new());
}

/// Marks a node as being synchronized on the current thread.
struct ReentrancyGuard {
    node: String,
}

impl ReentrancyGuard {
    fn enter(node: &str) -> Option<Self> {
        IN_PROGRESS
            .with(|set| set.borrow_mut().insert(node.to_string()))
            .then(|| Self {
                node: node.to_string(),
            })
    }
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        IN_PROGRESS.with(|set| {
            set.borrow_mut().remove(&self.node);
        });
    }
}

/// Runs a schema update strategy once per data node.
///
/// Calls for the same node are serialized; calls for different nodes run
/// independently. A mismatch between model and database is reported as an
/// error and never repaired.
#[derive(Debug, Default)]
pub struct SchemaSynchronizer {
    strategy: SchemaUpdateStrategy,
    locks: DashMap<String, Arc<Mutex<()>>>,
    completed: DashSet<String>,
}

impl SchemaSynchronizer {
    pub fn new(strategy: SchemaUpdateStrategy) -> Self {
        Self {
            strategy,
            locks: DashMap::new(),
            completed: DashSet::new(),
        }
    }

    pub fn strategy(&self) -> SchemaUpdateStrategy {
        self.strategy
    }

    /// Whether the node finished synchronizing.
    pub fn is_synchronized(&self, node: &str) -> bool {
        self.completed.contains(node)
    }

    /// Apply the strategy to `node` unless already done.
    pub fn update_schema(
        &self,
        node: &str,
        map: &DataMap,
        connector: &dyn SchemaConnector,
    ) -> Result<SyncOutcome> {
        if self.strategy == SchemaUpdateStrategy::Skip {
            return Ok(SyncOutcome::Skipped);
        }
        if self.completed.contains(node) {
            return Ok(SyncOutcome::AlreadySynchronized);
        }
        let Some(_guard) = ReentrancyGuard::enter(node) else {
            debug!(node = %node, "Schema synchronization already running on this thread");
            return Ok(SyncOutcome::Reentrant);
        };

        // clone the lock out so the map shard isn't held while we wait
        let lock = self.locks.entry(node.to_string()).or_default().clone();
        let _serialized = lock.lock();
        if self.completed.contains(node) {
            return Ok(SyncOutcome::AlreadySynchronized);
        }

        let outcome = self.apply(node, map, connector)?;
        self.completed.insert(node.to_string());
        Ok(outcome)
    }

    fn apply(&self, node: &str, map: &DataMap, connector: &dyn SchemaConnector) -> Result<SyncOutcome> {
        let detected = connector.load_tables()?;
        let missing: Vec<&str> = map
            .db_entities
            .iter()
            .filter(|e| !detected.iter().any(|d| d.name.eq_ignore_ascii_case(&e.name)))
            .map(|e| e.name.as_str())
            .collect();
        let present = map.db_entities.len() - missing.len();

        info!(
            node = %node,
            strategy = ?self.strategy,
            expected = map.db_entities.len(),
            present,
            "Checking data node schema"
        );

        if missing.is_empty() {
            return Ok(SyncOutcome::Verified);
        }

        match self.strategy {
            SchemaUpdateStrategy::Skip => Ok(SyncOutcome::Skipped),
            SchemaUpdateStrategy::CreateIfNoSchema if present > 0 => {
                info!(node = %node, "Full or partial schema detected, skipping table creation");
                Ok(SyncOutcome::Skipped)
            }
            SchemaUpdateStrategy::ThrowOnPartialSchema if present == 0 => {
                Err(Error::schema_mismatch(node, "no schema found"))
            }
            SchemaUpdateStrategy::ThrowOnPartialSchema | SchemaUpdateStrategy::ThrowOnPartialOrCreateSchema
                if present > 0 =>
            {
                Err(Error::schema_mismatch(
                    node,
                    format!("partial schema, missing tables: {}", missing.join(", ")),
                ))
            }
            SchemaUpdateStrategy::CreateIfNoSchema
            | SchemaUpdateStrategy::ThrowOnPartialSchema
            | SchemaUpdateStrategy::ThrowOnPartialOrCreateSchema => create_schema(node, map, connector),
        }
    }
}

/// Create every table of the model, masters first.
fn create_schema(node: &str, map: &DataMap, connector: &dyn SchemaConnector) -> Result<SyncOutcome> {
    let quoting = QuotingStrategy::new(map.quote_identifiers);
    let sorter = EntitySorter::new(map);
    let mut entities: Vec<&DbEntity> = map.db_entities.iter().collect();
    sorter.sort_db_entities(&mut entities, false);

    let mut tables = Vec::with_capacity(entities.len());
    for entity in entities {
        let token = MergerToken::to_db(TokenKind::CreateTable(entity.clone()));
        for sql in token.create_sql(&quoting) {
            debug!(node = %node, sql = %sql, "Executing DDL");
            connector.execute(&sql)?;
        }
        tables.push(entity.name.clone());
    }

    info!(node = %node, tables = tables.len(), "Created schema");
    Ok(SyncOutcome::Created { tables })
}
