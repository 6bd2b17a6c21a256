//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{health, theme, visitors};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Portfolio API",
        version = "0.3.0",
        description = "Visitor ledger and theme settings for the portfolio site",
        license(name = "MIT")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Visitors
        visitors::track_visitor,
        visitors::get_visitor_stats,
        visitors::list_visitors,
        // Theme
        theme::get_theme,
        theme::update_theme,
        theme::reset_theme,
        theme::convert_color,
    ),
    components(
        schemas(
            // Visitors
            crate::models::visitor::Visitor,
            crate::models::visitor::VisitorStats,
            crate::models::visitor::VisitorQuery,
            crate::models::visitor::TrackVisitorRequest,
            crate::models::visitor::TrackVisitorResponse,
            // Theme
            crate::models::theme::ThemeColors,
            crate::models::theme::ThemeResponse,
            crate::models::theme::ConvertColorQuery,
            crate::models::theme::ConvertColorResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "visitors", description = "Visitor tracking"),
        (name = "theme", description = "Site theme colors")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
