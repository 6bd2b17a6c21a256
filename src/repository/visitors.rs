//! Visitors repository (Postgres)

use async_trait::async_trait;
use sqlx::{FromRow, Pool, Postgres};
use uuid::Uuid;

use super::VisitorStore;
use crate::{
    error::AppResult,
    models::visitor::{VisitOutcome, VisitRecord, Visitor, VisitorKey, VisitorStats},
};

/// Row returned by the upsert: the visitor plus whether it was inserted
#[derive(FromRow)]
struct UpsertedVisitor {
    #[sqlx(flatten)]
    visitor: Visitor,
    inserted: bool,
}

// `xmax = 0` holds only for a tuple created by this statement, so it tells an
// insert apart from the ON CONFLICT update.
const UPSERT_BY_EMAIL: &str = r#"
    INSERT INTO visitors (id, email, ip_address, user_agent, visit_count, first_visit_at, last_visit_at)
    VALUES ($1, $2, $3, $4, 1, $5, $5)
    ON CONFLICT (email) WHERE email IS NOT NULL
    DO UPDATE SET
        visit_count = visitors.visit_count + 1,
        last_visit_at = GREATEST(visitors.last_visit_at, EXCLUDED.last_visit_at),
        ip_address = EXCLUDED.ip_address,
        user_agent = EXCLUDED.user_agent
    RETURNING id, email, ip_address, user_agent, visit_count, first_visit_at, last_visit_at,
              (xmax = 0) AS inserted
"#;

const UPSERT_BY_IP: &str = r#"
    INSERT INTO visitors (id, email, ip_address, user_agent, visit_count, first_visit_at, last_visit_at)
    VALUES ($1, $2, $3, $4, 1, $5, $5)
    ON CONFLICT (ip_address) WHERE email IS NULL
    DO UPDATE SET
        visit_count = visitors.visit_count + 1,
        last_visit_at = GREATEST(visitors.last_visit_at, EXCLUDED.last_visit_at),
        ip_address = EXCLUDED.ip_address,
        user_agent = EXCLUDED.user_agent
    RETURNING id, email, ip_address, user_agent, visit_count, first_visit_at, last_visit_at,
              (xmax = 0) AS inserted
"#;

#[derive(Clone)]
pub struct VisitorsRepository {
    pool: Pool<Postgres>,
}

impl VisitorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VisitorStore for VisitorsRepository {
    async fn upsert_visit(&self, visit: &VisitRecord) -> AppResult<VisitOutcome> {
        let query = match visit.key {
            VisitorKey::Email(_) => UPSERT_BY_EMAIL,
            VisitorKey::Ip(_) => UPSERT_BY_IP,
        };

        let row = sqlx::query_as::<_, UpsertedVisitor>(query)
            .bind(Uuid::new_v4())
            .bind(visit.email())
            .bind(&visit.ip_address)
            .bind(&visit.user_agent)
            .bind(visit.at)
            .fetch_one(&self.pool)
            .await?;

        Ok(VisitOutcome {
            visitor: row.visitor,
            inserted: row.inserted,
        })
    }

    async fn stats(&self) -> AppResult<VisitorStats> {
        let stats = sqlx::query_as::<_, VisitorStats>(
            r#"
            SELECT COALESCE(SUM(visit_count), 0)::bigint AS total_visitors,
                   COUNT(*)::bigint AS unique_visitors
            FROM visitors
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    async fn list(&self, limit: i64, offset: i64) -> AppResult<Vec<Visitor>> {
        let rows = sqlx::query_as::<_, Visitor>(
            r#"
            SELECT id, email, ip_address, user_agent, visit_count, first_visit_at, last_visit_at
            FROM visitors
            ORDER BY last_visit_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
