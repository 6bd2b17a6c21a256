//! Visitor model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Longest user agent kept on a visitor record
pub const MAX_USER_AGENT_LEN: usize = 512;

/// Visitor record, one per email or per anonymous IP address
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Visitor {
    pub id: Uuid,
    /// Identity of the visitor, absent for anonymous visitors
    pub email: Option<String>,
    /// Last known network address
    pub ip_address: String,
    /// Last known client descriptor
    pub user_agent: Option<String>,
    /// Number of recorded visits, at least 1
    pub visit_count: i32,
    pub first_visit_at: DateTime<Utc>,
    pub last_visit_at: DateTime<Utc>,
}

/// Lookup key of a visit
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VisitorKey {
    Email(String),
    /// Anonymous visitor, matched only against records without an email
    Ip(String),
}

/// A single visit to record
#[derive(Debug, Clone)]
pub struct VisitRecord {
    pub key: VisitorKey,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub at: DateTime<Utc>,
}

impl VisitRecord {
    /// Build a visit from raw request data.
    ///
    /// An empty or whitespace-only email counts as no email. The IP address is
    /// mandatory since it is the fallback identity.
    pub fn new(
        email: Option<&str>,
        ip_address: &str,
        user_agent: Option<&str>,
        at: DateTime<Utc>,
    ) -> AppResult<Self> {
        let ip_address = ip_address.trim();
        if ip_address.is_empty() {
            return Err(AppError::InvalidInput(
                "Client address is required".to_string(),
            ));
        }

        let key = match email.map(str::trim).filter(|e| !e.is_empty()) {
            Some(email) => VisitorKey::Email(email.to_string()),
            None => VisitorKey::Ip(ip_address.to_string()),
        };

        let user_agent = user_agent
            .map(str::trim)
            .filter(|ua| !ua.is_empty())
            .map(|ua| ua.chars().take(MAX_USER_AGENT_LEN).collect());

        Ok(Self {
            key,
            ip_address: ip_address.to_string(),
            user_agent,
            at,
        })
    }

    pub fn email(&self) -> Option<&str> {
        match &self.key {
            VisitorKey::Email(email) => Some(email),
            VisitorKey::Ip(_) => None,
        }
    }
}

/// Result of recording a visit at the store level
#[derive(Debug, Clone)]
pub struct VisitOutcome {
    pub visitor: Visitor,
    /// True when the visit created the record
    pub inserted: bool,
}

/// Aggregate visitor statistics, computed on read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitorStats {
    /// Sum of visit counts across all records
    pub total_visitors: i64,
    /// Number of distinct visitor records
    pub unique_visitors: i64,
}

/// Visit tracking request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackVisitorRequest {
    /// Email of the visitor, when known (e.g. from the contact form)
    #[validate(email, length(max = 254))]
    pub email: Option<String>,
    /// Client user agent; the User-Agent header is used when absent
    pub user_agent: Option<String>,
}

impl TrackVisitorRequest {
    /// Trim fields and drop empty values
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }
        Self {
            email: clean(self.email),
            user_agent: clean(self.user_agent),
        }
    }
}

/// Visit tracking response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackVisitorResponse {
    pub success: bool,
    pub is_new_visitor: bool,
    pub total_visitors: i64,
    pub unique_visitors: i64,
}

/// Query parameters for visitor listing
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct VisitorQuery {
    /// Maximum number of visitors to return (default 50, max 500)
    pub limit: Option<i64>,
    /// Number of visitors to skip
    pub offset: Option<i64>,
}

impl VisitorQuery {
    pub fn bounds(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(50).clamp(1, 500);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}
