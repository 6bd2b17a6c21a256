//! Portfolio server
//!
//! REST backend for a personal portfolio site: a deduplicated visitor ledger
//! (by email when known, otherwise by client IP) and the site's theme palette.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod theme;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

impl AppState {
    pub fn new(config: AppConfig, repository: repository::Repository) -> Self {
        let services = services::Services::new(
            repository,
            &config.notifications,
            config.email.clone(),
        );
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }
}
