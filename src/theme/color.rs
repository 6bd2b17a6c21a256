//! HSL <-> RGB hex conversion

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#?([a-fA-F0-9]{2})([a-fA-F0-9]{2})([a-fA-F0-9]{2})$")
        .expect("hex color regex is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("invalid HSL value '{0}', expected \"<hue> <saturation>% <lightness>%\"")]
    InvalidHsl(String),

    #[error("HSL component out of range in '{0}'")]
    OutOfRange(String),

    #[error("invalid hex color '{0}', expected #rrggbb")]
    InvalidHex(String),
}

/// Color in HSL space: hue in degrees, saturation and lightness in percent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl FromStr for Hsl {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f64> = s
            .split_whitespace()
            .map(|part| part.trim_end_matches('%').parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| ColorError::InvalidHsl(s.to_string()))?;

        let &[h, sat, l] = parts.as_slice() else {
            return Err(ColorError::InvalidHsl(s.to_string()));
        };

        let in_range = |v: f64, max: f64| v.is_finite() && (0.0..=max).contains(&v);
        if !in_range(h, 360.0) || !in_range(sat, 100.0) || !in_range(l, 100.0) {
            return Err(ColorError::OutOfRange(s.to_string()));
        }

        Ok(Hsl { h, s: sat, l })
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}% {}%", self.h.round(), self.s.round(), self.l.round())
    }
}

impl Hsl {
    pub fn to_rgb(&self) -> Rgb {
        let h = self.h / 360.0;
        let s = self.s / 100.0;
        let l = self.l / 100.0;

        let (r, g, b) = if s == 0.0 {
            (l, l, l)
        } else {
            let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
            let p = 2.0 * l - q;
            (
                hue_to_channel(p, q, h + 1.0 / 3.0),
                hue_to_channel(p, q, h),
                hue_to_channel(p, q, h - 1.0 / 3.0),
            )
        };

        Rgb {
            r: to_byte(r),
            g: to_byte(g),
            b: to_byte(b),
        }
    }

    pub fn to_hex(&self) -> String {
        self.to_rgb().to_hex()
    }
}

impl Rgb {
    pub fn from_hex(hex: &str) -> Result<Self, ColorError> {
        let caps = HEX_COLOR
            .captures(hex.trim())
            .ok_or_else(|| ColorError::InvalidHex(hex.to_string()))?;
        let channel = |i: usize| {
            u8::from_str_radix(&caps[i], 16).map_err(|_| ColorError::InvalidHex(hex.to_string()))
        };
        Ok(Rgb {
            r: channel(1)?,
            g: channel(2)?,
            b: channel(3)?,
        })
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Convert to HSL with every component rounded to an integer
    pub fn to_hsl(&self) -> Hsl {
        let r = f64::from(self.r) / 255.0;
        let g = f64::from(self.g) / 255.0;
        let b = f64::from(self.b) / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;

        let (h, s) = if max == min {
            (0.0, 0.0)
        } else {
            let d = max - min;
            let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
            let h = if max == r {
                (g - b) / d + if g < b { 6.0 } else { 0.0 }
            } else if max == g {
                (b - r) / d + 2.0
            } else {
                (r - g) / d + 4.0
            };
            (h / 6.0, s)
        };

        Hsl {
            h: (h * 360.0).round(),
            s: (s * 100.0).round(),
            l: (l * 100.0).round(),
        }
    }
}

fn hue_to_channel(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

fn to_byte(x: f64) -> u8 {
    (x * 255.0).round().clamp(0.0, 255.0) as u8
}

/// `"200 100% 50%"` -> `"#00aaff"`
pub fn hsl_to_hex(hsl: &str) -> Result<String, ColorError> {
    Ok(hsl.parse::<Hsl>()?.to_hex())
}

/// `"#00aaff"` -> `"200 100% 50%"`
pub fn hex_to_hsl(hex: &str) -> Result<String, ColorError> {
    Ok(Rgb::from_hex(hex)?.to_hsl().to_string())
}
