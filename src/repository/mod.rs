//! Repository layer for storage operations

pub mod memory;
pub mod settings;
pub mod visitors;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::visitor::{VisitOutcome, VisitRecord, Visitor, VisitorStats},
};

/// Persistent visitor ledger
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisitorStore: Send + Sync {
    /// Insert the visitor or bump its visit count, in one atomic step
    async fn upsert_visit(&self, visit: &VisitRecord) -> AppResult<VisitOutcome>;

    /// Aggregate totals over every visitor record
    async fn stats(&self) -> AppResult<VisitorStats>;

    /// Visitors ordered by most recent visit
    async fn list(&self, limit: i64, offset: i64) -> AppResult<Vec<Visitor>>;

    /// Check that the store is reachable
    async fn ping(&self) -> AppResult<()>;
}

/// Key/value site settings
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<serde_json::Value>>;

    async fn put(&self, key: &str, value: serde_json::Value) -> AppResult<()>;

    async fn delete(&self, key: &str) -> AppResult<()>;
}

/// Main repository struct holding the stores
#[derive(Clone)]
pub struct Repository {
    pub visitors: Arc<dyn VisitorStore>,
    pub settings: Arc<dyn SettingsStore>,
}

impl Repository {
    /// Create a repository backed by the given Postgres pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            visitors: Arc::new(visitors::VisitorsRepository::new(pool.clone())),
            settings: Arc::new(settings::SettingsRepository::new(pool)),
        }
    }

    /// Create a repository that keeps everything in process memory
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::new());
        Self {
            visitors: store.clone(),
            settings: store,
        }
    }
}
