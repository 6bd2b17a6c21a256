//! In-memory store
//!
//! Keeps visitors and settings in process memory. Used by the `memory`
//! storage backend and by tests. Every visit is applied under a single write
//! lock, so lookup and insert cannot interleave.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use super::{SettingsStore, VisitorStore};
use crate::{
    error::{AppError, AppResult},
    models::visitor::{VisitOutcome, VisitRecord, Visitor, VisitorKey, VisitorStats},
};

#[derive(Debug, Default)]
struct Ledger {
    visitors: Vec<Visitor>,
    /// Position in `visitors` by lookup key
    index: HashMap<VisitorKey, usize>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    ledger: RwLock<Ledger>,
    settings: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> AppError {
    AppError::StorageUnavailable("memory store lock poisoned".to_string())
}

#[async_trait]
impl VisitorStore for MemoryStore {
    async fn upsert_visit(&self, visit: &VisitRecord) -> AppResult<VisitOutcome> {
        let mut ledger = self.ledger.write().map_err(|_| poisoned())?;

        if let Some(&pos) = ledger.index.get(&visit.key) {
            let visitor = &mut ledger.visitors[pos];
            visitor.visit_count += 1;
            visitor.last_visit_at = visitor.last_visit_at.max(visit.at);
            visitor.ip_address = visit.ip_address.clone();
            visitor.user_agent = visit.user_agent.clone();
            return Ok(VisitOutcome {
                visitor: visitor.clone(),
                inserted: false,
            });
        }

        let visitor = Visitor {
            id: Uuid::new_v4(),
            email: visit.email().map(str::to_string),
            ip_address: visit.ip_address.clone(),
            user_agent: visit.user_agent.clone(),
            visit_count: 1,
            first_visit_at: visit.at,
            last_visit_at: visit.at,
        };
        let pos = ledger.visitors.len();
        ledger.visitors.push(visitor.clone());
        ledger.index.insert(visit.key.clone(), pos);

        Ok(VisitOutcome {
            visitor,
            inserted: true,
        })
    }

    async fn stats(&self) -> AppResult<VisitorStats> {
        let ledger = self.ledger.read().map_err(|_| poisoned())?;
        Ok(VisitorStats {
            total_visitors: ledger.visitors.iter().map(|v| i64::from(v.visit_count)).sum(),
            unique_visitors: ledger.visitors.len() as i64,
        })
    }

    async fn list(&self, limit: i64, offset: i64) -> AppResult<Vec<Visitor>> {
        let ledger = self.ledger.read().map_err(|_| poisoned())?;
        let mut visitors = ledger.visitors.clone();
        visitors.sort_by(|a, b| b.last_visit_at.cmp(&a.last_visit_at));
        Ok(visitors
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<serde_json::Value>> {
        let settings = self.settings.read().map_err(|_| poisoned())?;
        Ok(settings.get(key).cloned())
    }

    async fn put(&self, key: &str, value: serde_json::Value) -> AppResult<()> {
        let mut settings = self.settings.write().map_err(|_| poisoned())?;
        settings.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut settings = self.settings.write().map_err(|_| poisoned())?;
        settings.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::sync::Arc;
    use tokio_test::assert_ok;

    fn visit(email: Option<&str>, ip: &str, ua: &str) -> VisitRecord {
        VisitRecord::new(email, ip, Some(ua), Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn test_same_email_counts_every_visit() {
        let store = MemoryStore::new();
        for i in 0..5 {
            let outcome = assert_ok!(
                store
                    .upsert_visit(&visit(Some("a@b.com"), &format!("10.0.0.{i}"), "UA"))
                    .await
            );
            assert_eq!(outcome.inserted, i == 0);
            assert_eq!(outcome.visitor.visit_count, i + 1);
            assert_eq!(outcome.visitor.ip_address, format!("10.0.0.{i}"));
        }
        let stats = store.stats().await.unwrap();
        assert_eq!(stats, VisitorStats { total_visitors: 5, unique_visitors: 1 });
    }

    #[tokio::test]
    async fn test_email_and_anonymous_records_are_separate() {
        let store = MemoryStore::new();
        let anon = store.upsert_visit(&visit(None, "1.2.3.4", "UA1")).await.unwrap();
        let known = store
            .upsert_visit(&visit(Some("a@b.com"), "1.2.3.4", "UA2"))
            .await
            .unwrap();
        assert!(anon.inserted);
        assert!(known.inserted);
        assert_ne!(anon.visitor.id, known.visitor.id);

        let again = store.upsert_visit(&visit(None, "1.2.3.4", "UA3")).await.unwrap();
        assert!(!again.inserted);
        assert_eq!(again.visitor.id, anon.visitor.id);
        assert_eq!(again.visitor.email, None);
        assert_eq!(again.visitor.visit_count, 2);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats, VisitorStats { total_visitors: 3, unique_visitors: 2 });
    }

    #[tokio::test]
    async fn test_last_visit_never_moves_backwards() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let first = VisitRecord::new(None, "1.2.3.4", None, now).unwrap();
        let stale = VisitRecord::new(None, "1.2.3.4", None, now - Duration::seconds(30)).unwrap();

        store.upsert_visit(&first).await.unwrap();
        let outcome = store.upsert_visit(&stale).await.unwrap();
        assert_eq!(outcome.visitor.last_visit_at, now);
        assert!(outcome.visitor.last_visit_at >= outcome.visitor.first_visit_at);
    }

    #[tokio::test]
    async fn test_concurrent_visits_create_one_record() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.upsert_visit(&visit(None, "5.6.7.8", "tab")).await
            }));
        }

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().inserted {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 1);
        let stats = store.stats().await.unwrap();
        assert_eq!(stats, VisitorStats { total_visitors: 32, unique_visitors: 1 });
    }

    #[tokio::test]
    async fn test_list_orders_by_last_visit() {
        let store = MemoryStore::new();
        let now = Utc::now();
        for (i, ip) in ["1.1.1.1", "2.2.2.2", "3.3.3.3"].iter().enumerate() {
            let at = now + Duration::seconds(i as i64);
            store
                .upsert_visit(&VisitRecord::new(None, ip, None, at).unwrap())
                .await
                .unwrap();
        }
        let visitors = store.list(2, 0).await.unwrap();
        let ips: Vec<_> = visitors.iter().map(|v| v.ip_address.as_str()).collect();
        assert_eq!(ips, ["3.3.3.3", "2.2.2.2"]);
        assert_eq!(store.list(10, 2).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let store = MemoryStore::new();
        assert!(store.get("theme_colors").await.unwrap().is_none());
        store
            .put("theme_colors", serde_json::json!({"primary": "0 0% 0%"}))
            .await
            .unwrap();
        assert_eq!(
            store.get("theme_colors").await.unwrap().unwrap()["primary"],
            "0 0% 0%"
        );
        store.delete("theme_colors").await.unwrap();
        assert!(store.get("theme_colors").await.unwrap().is_none());
    }
}
