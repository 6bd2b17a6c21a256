//! Business logic services

pub mod email;
pub mod theme;
pub mod visitors;

use std::sync::Arc;

use crate::{
    config::{EmailConfig, NotificationConfig},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub visitors: visitors::VisitorLedger,
    pub theme: theme::ThemeService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        notifications: &NotificationConfig,
        email_config: EmailConfig,
    ) -> Self {
        let notifier = notifications.enabled.then(|| {
            Arc::new(email::EmailService::new(email_config, notifications.notify_to.clone()))
                as Arc<dyn email::VisitorNotifier>
        });

        Self {
            visitors: visitors::VisitorLedger::new(repository.visitors.clone(), notifier),
            theme: theme::ThemeService::new(repository.settings),
        }
    }
}
