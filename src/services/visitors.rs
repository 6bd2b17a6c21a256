//! Visitor ledger service
//!
//! Records visits keyed by email (when known) or by client IP, classifies them
//! as new or returning and reports aggregate totals.

use chrono::Utc;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::visitor::{VisitRecord, Visitor, VisitorStats},
    repository::VisitorStore,
};

use super::email::VisitorNotifier;

/// Outcome of a tracked visit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitResult {
    pub is_new_visitor: bool,
    pub total_visitors: i64,
    pub unique_visitors: i64,
}

#[derive(Clone)]
pub struct VisitorLedger {
    store: Arc<dyn VisitorStore>,
    notifier: Option<Arc<dyn VisitorNotifier>>,
}

impl VisitorLedger {
    pub fn new(store: Arc<dyn VisitorStore>, notifier: Option<Arc<dyn VisitorNotifier>>) -> Self {
        Self { store, notifier }
    }

    /// Record one visit and return the updated totals.
    ///
    /// A `DuplicateKey` from the store means a concurrent request inserted the
    /// same identity first; the upsert is retried once and then takes the
    /// update path.
    pub async fn record_visit(
        &self,
        email: Option<&str>,
        ip_address: &str,
        user_agent: Option<&str>,
    ) -> AppResult<VisitResult> {
        let visit = VisitRecord::new(email, ip_address, user_agent, Utc::now())?;

        let outcome = match self.store.upsert_visit(&visit).await {
            Err(AppError::DuplicateKey(detail)) => {
                tracing::warn!(key = ?visit.key, "Concurrent visitor insert ({}), retrying", detail);
                self.store.upsert_visit(&visit).await?
            }
            other => other?,
        };

        tracing::debug!(
            visitor_id = %outcome.visitor.id,
            visit_count = outcome.visitor.visit_count,
            new = outcome.inserted,
            "Visit recorded"
        );

        if outcome.inserted {
            if let (Some(notifier), Some(_)) = (&self.notifier, visit.email()) {
                notifier.notify_new_visitor(&outcome.visitor);
            }
        }

        // The visit is already stored; a failing aggregate only degrades the counters.
        let stats = match self.store.stats().await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::error!("Failed to compute visitor stats: {}", e);
                VisitorStats::default()
            }
        };

        Ok(VisitResult {
            is_new_visitor: outcome.inserted,
            total_visitors: stats.total_visitors,
            unique_visitors: stats.unique_visitors,
        })
    }

    /// Aggregate totals across all visitors
    pub async fn stats(&self) -> AppResult<VisitorStats> {
        self.store.stats().await
    }

    /// Most recently seen visitors first
    pub async fn list(&self, limit: i64, offset: i64) -> AppResult<Vec<Visitor>> {
        self.store.list(limit, offset).await
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::visitor::{VisitOutcome, VisitorKey},
        repository::{memory::MemoryStore, MockVisitorStore},
        services::email::MockVisitorNotifier,
    };

    fn visitor_for(visit: &VisitRecord, visit_count: i32) -> Visitor {
        Visitor {
            id: uuid::Uuid::new_v4(),
            email: visit.email().map(str::to_string),
            ip_address: visit.ip_address.clone(),
            user_agent: visit.user_agent.clone(),
            visit_count,
            first_visit_at: visit.at,
            last_visit_at: visit.at,
        }
    }

    fn ledger() -> VisitorLedger {
        VisitorLedger::new(Arc::new(MemoryStore::new()), None)
    }

    #[tokio::test]
    async fn test_anonymous_new_then_returning() {
        let ledger = ledger();

        let first = ledger.record_visit(None, "1.2.3.4", Some("UA1")).await.unwrap();
        assert_eq!(
            first,
            VisitResult { is_new_visitor: true, total_visitors: 1, unique_visitors: 1 }
        );

        let second = ledger.record_visit(None, "1.2.3.4", Some("UA1")).await.unwrap();
        assert_eq!(
            second,
            VisitResult { is_new_visitor: false, total_visitors: 2, unique_visitors: 1 }
        );
    }

    #[tokio::test]
    async fn test_new_visitor_flag_is_set_once_per_identity() {
        let ledger = ledger();
        let identities = [Some("a@b.com"), None, Some("c@d.org")];

        for round in 0..3 {
            for email in identities {
                let result = ledger.record_visit(email, "9.9.9.9", None).await.unwrap();
                assert_eq!(result.is_new_visitor, round == 0);
                assert!(result.total_visitors >= result.unique_visitors);
            }
        }

        let stats = ledger.stats().await.unwrap();
        assert_eq!(stats, VisitorStats { total_visitors: 9, unique_visitors: 3 });
    }

    #[tokio::test]
    async fn test_missing_ip_is_rejected_before_storage() {
        let mut store = MockVisitorStore::new();
        store.expect_upsert_visit().never();
        let ledger = VisitorLedger::new(Arc::new(store), None);

        let err = ledger.record_visit(Some("a@b.com"), "  ", None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_storage_unavailable_is_propagated() {
        let mut store = MockVisitorStore::new();
        store
            .expect_upsert_visit()
            .returning(|_| Err(AppError::StorageUnavailable("connection refused".into())));
        store.expect_stats().never();
        let ledger = VisitorLedger::new(Arc::new(store), None);

        let err = ledger.record_visit(None, "1.2.3.4", None).await.unwrap_err();
        assert!(matches!(err, AppError::StorageUnavailable(_)));
    }

    #[tokio::test]
    async fn test_duplicate_key_is_retried_once() {
        let mut store = MockVisitorStore::new();
        let mut seq = mockall::Sequence::new();
        store
            .expect_upsert_visit()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::DuplicateKey("visitors_email_key".into())));
        store
            .expect_upsert_visit()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|visit| {
                assert_eq!(visit.key, VisitorKey::Email("a@b.com".to_string()));
                Ok(VisitOutcome { visitor: visitor_for(visit, 2), inserted: false })
            });
        store
            .expect_stats()
            .returning(|| Ok(VisitorStats { total_visitors: 2, unique_visitors: 1 }));
        let ledger = VisitorLedger::new(Arc::new(store), None);

        let result = ledger.record_visit(Some("a@b.com"), "1.2.3.4", None).await.unwrap();
        assert!(!result.is_new_visitor);
        assert_eq!(result.total_visitors, 2);
    }

    #[tokio::test]
    async fn test_second_duplicate_key_is_reported() {
        let mut store = MockVisitorStore::new();
        store
            .expect_upsert_visit()
            .times(2)
            .returning(|_| Err(AppError::DuplicateKey("visitors_anonymous_ip_key".into())));
        let ledger = VisitorLedger::new(Arc::new(store), None);

        let err = ledger.record_visit(None, "1.2.3.4", None).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateKey(_)));
    }

    #[tokio::test]
    async fn test_stats_failure_degrades_to_zero() {
        let mut store = MockVisitorStore::new();
        store
            .expect_upsert_visit()
            .returning(|visit| Ok(VisitOutcome { visitor: visitor_for(visit, 1), inserted: true }));
        store
            .expect_stats()
            .returning(|| Err(AppError::StorageUnavailable("timeout".into())));
        let ledger = VisitorLedger::new(Arc::new(store), None);

        let result = ledger.record_visit(None, "1.2.3.4", None).await.unwrap();
        assert_eq!(
            result,
            VisitResult { is_new_visitor: true, total_visitors: 0, unique_visitors: 0 }
        );
    }

    fn notified_ledger(notifier: MockVisitorNotifier) -> VisitorLedger {
        VisitorLedger::new(Arc::new(MemoryStore::new()), Some(Arc::new(notifier)))
    }

    #[tokio::test]
    async fn test_new_email_visitor_is_notified_once() {
        let mut notifier = MockVisitorNotifier::new();
        notifier
            .expect_notify_new_visitor()
            .withf(|visitor| visitor.email.as_deref() == Some("a@b.com") && visitor.visit_count == 1)
            .times(1)
            .return_const(());
        let ledger = notified_ledger(notifier);

        let first = ledger.record_visit(Some("a@b.com"), "1.2.3.4", None).await.unwrap();
        assert!(first.is_new_visitor);

        // Returning visit by the same email must not notify again
        let second = ledger.record_visit(Some("a@b.com"), "5.6.7.8", None).await.unwrap();
        assert!(!second.is_new_visitor);
    }

    #[tokio::test]
    async fn test_anonymous_visitor_is_not_notified() {
        let mut notifier = MockVisitorNotifier::new();
        notifier.expect_notify_new_visitor().never();
        let ledger = notified_ledger(notifier);

        let result = ledger.record_visit(None, "1.2.3.4", Some("UA")).await.unwrap();
        assert!(result.is_new_visitor);
    }
}
