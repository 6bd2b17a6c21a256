//! Visitor tracking API endpoints

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header::USER_AGENT, HeaderMap},
    Json,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::visitor::{
        TrackVisitorRequest, TrackVisitorResponse, Visitor, VisitorQuery, VisitorStats,
    },
};

use super::{AdminUser, ClientIp};

/// Record a visit and return the updated visitor totals
#[utoipa::path(
    post,
    path = "/visitors/track",
    tag = "visitors",
    request_body = TrackVisitorRequest,
    responses(
        (status = 200, description = "Visit recorded", body = TrackVisitorResponse),
        (status = 400, description = "Invalid email or missing client address", body = crate::error::ErrorResponse),
        (status = 503, description = "Storage unavailable", body = crate::error::ErrorResponse)
    )
)]
pub async fn track_visitor(
    State(state): State<crate::AppState>,
    ClientIp(ip_address): ClientIp,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<TrackVisitorResponse>> {
    // Page-load beacons may send no body at all
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        TrackVisitorRequest::default()
    } else {
        serde_json::from_slice::<TrackVisitorRequest>(&body)
            .map_err(|e| AppError::InvalidInput(format!("Invalid request body: {}", e)))?
    }
    .normalized();
    request.validate()?;

    let user_agent = request
        .user_agent
        .as_deref()
        .or_else(|| headers.get(USER_AGENT).and_then(|v| v.to_str().ok()));

    tracing::info!(
        ip = %ip_address,
        identified = request.email.is_some(),
        "Tracking visitor"
    );

    let result = state
        .services
        .visitors
        .record_visit(request.email.as_deref(), &ip_address, user_agent)
        .await
        .inspect_err(|e| {
            if e.is_storage() {
                tracing::warn!(ip = %ip_address, "Visit not tracked: {}", e);
            }
        })?;

    Ok(Json(TrackVisitorResponse {
        success: true,
        is_new_visitor: result.is_new_visitor,
        total_visitors: result.total_visitors,
        unique_visitors: result.unique_visitors,
    }))
}

/// Aggregate visitor counts
#[utoipa::path(
    get,
    path = "/visitors/stats",
    tag = "visitors",
    responses(
        (status = 200, description = "Visitor totals", body = VisitorStats)
    )
)]
pub async fn get_visitor_stats(
    State(state): State<crate::AppState>,
) -> AppResult<Json<VisitorStats>> {
    let stats = state.services.visitors.stats().await?;
    Ok(Json(stats))
}

/// List visitors, most recent first
#[utoipa::path(
    get,
    path = "/visitors",
    tag = "visitors",
    security(("bearer_auth" = [])),
    params(VisitorQuery),
    responses(
        (status = 200, description = "Visitor list", body = Vec<Visitor>),
        (status = 401, description = "Missing or invalid API key", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_visitors(
    State(state): State<crate::AppState>,
    _admin: AdminUser,
    Query(query): Query<VisitorQuery>,
) -> AppResult<Json<Vec<Visitor>>> {
    let (limit, offset) = query.bounds();
    let visitors = state.services.visitors.list(limit, offset).await?;
    Ok(Json(visitors))
}
