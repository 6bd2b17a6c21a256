//! Theme color handling
//!
//! The site stores its palette as CSS HSL component strings (`"200 100% 50%"`)
//! while color pickers speak `#rrggbb`. Conversions are lossy: every channel is
//! rounded to an integer on the way out.

pub mod color;

pub use color::{hex_to_hsl, hsl_to_hex, ColorError, Hsl, Rgb};
