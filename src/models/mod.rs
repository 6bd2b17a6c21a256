//! Data models for the portfolio server

pub mod theme;
pub mod visitor;

pub use theme::{ThemeColors, ThemeResponse};
pub use visitor::{Visitor, VisitorKey, VisitorStats, VisitRecord, VisitOutcome};
