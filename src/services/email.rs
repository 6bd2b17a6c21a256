//! Email service for operator notifications

use lettre::{
    message::{header::ContentType, Mailbox, Message, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use std::str::FromStr;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
    models::visitor::Visitor,
};

/// Receives first-visit events for visitors who left an email
#[cfg_attr(test, mockall::automock)]
pub trait VisitorNotifier: Send + Sync {
    fn notify_new_visitor(&self, visitor: &Visitor);
}

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
    notify_to: String,
}

impl EmailService {
    pub fn new(config: EmailConfig, notify_to: String) -> Self {
        Self { config, notify_to }
    }

    /// Generic email sending function
    fn send_email(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        let from_name = self.config.smtp_from_name.as_deref().unwrap_or("Portfolio");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to)
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(format!(
                                r#"<html><body><pre>{}</pre></body></html>"#,
                                escape_html(body)
                            )),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        let mailer_builder = if self.config.smtp_use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let mailer_builder = if let (Some(username), Some(password)) =
            (&self.config.smtp_username, &self.config.smtp_password)
        {
            mailer_builder.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            mailer_builder
        };

        mailer_builder
            .build()
            .send(&email)
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

impl VisitorNotifier for EmailService {
    /// Tell the site owner a visitor left an email for the first time.
    ///
    /// Runs on a blocking task and only logs failures: the visit is already
    /// recorded and the response must not wait on SMTP.
    fn notify_new_visitor(&self, visitor: &Visitor) {
        let service = self.clone();
        let subject = "New visitor on your portfolio".to_string();
        let body = new_visitor_body(visitor);

        tokio::task::spawn_blocking(move || {
            match service.send_email(&service.notify_to, &subject, &body) {
                Ok(()) => tracing::info!("New visitor notification sent"),
                Err(e) => tracing::error!("Failed to send new visitor notification: {}", e),
            }
        });
    }
}

fn new_visitor_body(visitor: &Visitor) -> String {
    format!(
        r#"A new visitor has accessed your portfolio website:

Email: {email}
IP address: {ip}
User agent: {ua}
Visit time: {at}
"#,
        email = visitor.email.as_deref().unwrap_or("-"),
        ip = visitor.ip_address,
        ua = visitor.user_agent.as_deref().unwrap_or("-"),
        at = visitor.first_visit_at.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

// Visitor-supplied values end up in the HTML part.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
