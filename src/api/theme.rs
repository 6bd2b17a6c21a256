//! Theme endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::theme::{ConvertColorQuery, ConvertColorResponse, ThemeColors, ThemeResponse},
    services::theme::ThemeService,
};

use super::AdminUser;

/// Get the site palette
#[utoipa::path(
    get,
    path = "/theme",
    tag = "theme",
    responses(
        (status = 200, description = "Current palette", body = ThemeResponse)
    )
)]
pub async fn get_theme(State(state): State<crate::AppState>) -> AppResult<Json<ThemeResponse>> {
    let theme = state.services.theme.get().await?;
    Ok(Json(theme))
}

/// Save the site palette
#[utoipa::path(
    put,
    path = "/theme",
    tag = "theme",
    security(("bearer_auth" = [])),
    request_body = ThemeColors,
    responses(
        (status = 200, description = "Palette saved", body = ThemeResponse),
        (status = 400, description = "Invalid color", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid API key", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_theme(
    State(state): State<crate::AppState>,
    _admin: AdminUser,
    Json(colors): Json<ThemeColors>,
) -> AppResult<Json<ThemeResponse>> {
    let theme = state.services.theme.save(&colors).await?;
    Ok(Json(theme))
}

/// Restore the default palette
#[utoipa::path(
    post,
    path = "/theme/reset",
    tag = "theme",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Palette reset", body = ThemeResponse),
        (status = 401, description = "Missing or invalid API key", body = crate::error::ErrorResponse)
    )
)]
pub async fn reset_theme(
    State(state): State<crate::AppState>,
    _admin: AdminUser,
) -> AppResult<Json<ThemeResponse>> {
    let theme = state.services.theme.reset().await?;
    Ok(Json(theme))
}

/// Convert a color between HSL and hex
#[utoipa::path(
    get,
    path = "/theme/convert",
    tag = "theme",
    params(ConvertColorQuery),
    responses(
        (status = 200, description = "Both color forms", body = ConvertColorResponse),
        (status = 400, description = "Invalid color", body = crate::error::ErrorResponse)
    )
)]
pub async fn convert_color(
    Query(query): Query<ConvertColorQuery>,
) -> AppResult<Json<ConvertColorResponse>> {
    let converted = ThemeService::convert(query.hsl.as_deref(), query.hex.as_deref())?;
    Ok(Json(converted))
}
