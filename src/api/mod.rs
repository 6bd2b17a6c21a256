//! API handlers for the portfolio REST endpoints

pub mod health;
pub mod openapi;
pub mod theme;
pub mod visitors;

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    routing::{get, post},
    Router,
};
use std::net::{IpAddr, SocketAddr};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, AppState};

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Visitors
        .route("/visitors", get(visitors::list_visitors))
        .route("/visitors/track", post(visitors::track_visitor))
        .route("/visitors/stats", get(visitors::get_visitor_stats))
        // Theme
        .route("/theme", get(theme::get_theme).put(theme::update_theme))
        .route("/theme/reset", post(theme::reset_theme))
        .route("/theme/convert", get(theme::convert_color))
        .fallback(not_found)
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn not_found() -> AppError {
    AppError::NotFound("No such endpoint".to_string())
}

/// Network address of the client, as seen through proxies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl ClientIp {
    /// First `X-Forwarded-For` entry, then `X-Real-IP`.
    /// Values that are not IP addresses are skipped.
    fn from_headers(headers: &HeaderMap) -> Option<String> {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next());
        let real_ip = headers.get("x-real-ip").and_then(|v| v.to_str().ok());

        forwarded
            .into_iter()
            .chain(real_ip)
            .find_map(|ip| ip.trim().parse::<IpAddr>().ok())
            .map(|ip| ip.to_string())
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers)
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .map(ClientIp)
            .ok_or_else(|| AppError::InvalidInput("Unable to determine client address".to_string()))
    }
}

/// Extractor guarding admin routes with the configured API key
pub struct AdminUser;

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let expected = state
            .config
            .admin
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AppError::Authentication("Admin access is disabled".to_string()))?;

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        if !constant_time_eq(token.as_bytes(), expected.as_bytes()) {
            return Err(AppError::Authentication("Invalid API key".to_string()));
        }

        Ok(AdminUser)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_for_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(ClientIp::from_headers(&headers).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_real_ip_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" "));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.4"));
        assert_eq!(ClientIp::from_headers(&headers).as_deref(), Some("198.51.100.4"));
        assert_eq!(ClientIp::from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn test_non_ip_header_values_are_skipped() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("<script>, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("2001:db8::1"));
        assert_eq!(ClientIp::from_headers(&headers).as_deref(), Some("2001:db8::1"));

        headers.insert("x-real-ip", HeaderValue::from_static("unknown"));
        assert_eq!(ClientIp::from_headers(&headers), None);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secrets"));
    }
}
