//! Theme settings service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::theme::{ConvertColorResponse, ThemeColors, ThemeResponse},
    repository::SettingsStore,
    theme,
};

const THEME_KEY: &str = "theme_colors";

#[derive(Clone)]
pub struct ThemeService {
    store: Arc<dyn SettingsStore>,
}

impl ThemeService {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// Stored palette, or the defaults when nothing usable is stored
    pub async fn get(&self) -> AppResult<ThemeResponse> {
        let colors = match self.store.get(THEME_KEY).await? {
            Some(value) => serde_json::from_value::<ThemeColors>(value)
                .ok()
                .and_then(|colors| colors.normalized().ok())
                .unwrap_or_else(|| {
                    tracing::warn!("Stored theme is invalid, using defaults");
                    ThemeColors::default()
                }),
            None => ThemeColors::default(),
        };
        Self::response(colors)
    }

    /// Validate and persist a palette
    pub async fn save(&self, colors: &ThemeColors) -> AppResult<ThemeResponse> {
        let colors = colors.normalized()?;
        let value = serde_json::to_value(&colors)
            .map_err(|e| AppError::Internal(format!("Failed to encode theme: {}", e)))?;
        self.store.put(THEME_KEY, value).await?;
        tracing::info!("Theme saved");
        Self::response(colors)
    }

    /// Drop the stored palette so the defaults apply again
    pub async fn reset(&self) -> AppResult<ThemeResponse> {
        self.store.delete(THEME_KEY).await?;
        tracing::info!("Theme reset to defaults");
        Self::response(ThemeColors::default())
    }

    /// Convert a single color given either as HSL or as hex
    pub fn convert(hsl: Option<&str>, hex: Option<&str>) -> AppResult<ConvertColorResponse> {
        match (hsl, hex) {
            (Some(hsl), None) => {
                let parsed: theme::Hsl = hsl.parse()?;
                Ok(ConvertColorResponse {
                    hsl: parsed.to_string(),
                    hex: parsed.to_hex(),
                })
            }
            (None, Some(hex)) => {
                let rgb = theme::Rgb::from_hex(hex)?;
                Ok(ConvertColorResponse {
                    hsl: rgb.to_hsl().to_string(),
                    hex: rgb.to_hex(),
                })
            }
            _ => Err(AppError::InvalidInput(
                "Exactly one of 'hsl' or 'hex' is required".to_string(),
            )),
        }
    }

    fn response(colors: ThemeColors) -> AppResult<ThemeResponse> {
        let hex = colors.to_hex()?;
        Ok(ThemeResponse { colors, hex })
    }
}
