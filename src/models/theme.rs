//! Theme palette model

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::theme::{ColorError, Hsl};

/// Site palette, every color as CSS HSL components (`"200 100% 50%"`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThemeColors {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub neon_blue: String,
    pub neon_cyan: String,
    pub neon_purple: String,
    pub neon_pink: String,
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            primary: "200 100% 50%".to_string(),
            secondary: "240 5% 26%".to_string(),
            accent: "180 100% 50%".to_string(),
            neon_blue: "200 100% 50%".to_string(),
            neon_cyan: "180 100% 50%".to_string(),
            neon_purple: "280 100% 70%".to_string(),
            neon_pink: "330 100% 70%".to_string(),
        }
    }
}

impl ThemeColors {
    /// Apply `f` to every color, failing on the first error
    pub fn try_map<F>(&self, mut f: F) -> Result<Self, ColorError>
    where
        F: FnMut(&str) -> Result<String, ColorError>,
    {
        Ok(Self {
            primary: f(&self.primary)?,
            secondary: f(&self.secondary)?,
            accent: f(&self.accent)?,
            neon_blue: f(&self.neon_blue)?,
            neon_cyan: f(&self.neon_cyan)?,
            neon_purple: f(&self.neon_purple)?,
            neon_pink: f(&self.neon_pink)?,
        })
    }

    /// Parse every color and rewrite it in canonical `h s% l%` form
    pub fn normalized(&self) -> Result<Self, ColorError> {
        self.try_map(|c| Ok(c.parse::<Hsl>()?.to_string()))
    }

    /// Same palette as `#rrggbb` strings, for color pickers
    pub fn to_hex(&self) -> Result<Self, ColorError> {
        self.try_map(crate::theme::hsl_to_hex)
    }
}

/// Theme response: stored palette plus its hex rendering
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ThemeResponse {
    pub colors: ThemeColors,
    pub hex: ThemeColors,
}

/// Query for a single color conversion, exactly one of `hsl` / `hex`
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ConvertColorQuery {
    /// HSL components, e.g. `200 100% 50%`
    pub hsl: Option<String>,
    /// Hex color, e.g. `#00aaff`
    pub hex: Option<String>,
}

/// Both renderings of a color
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConvertColorResponse {
    pub hsl: String,
    pub hex: String,
}
