use std::sync::Arc;

use async_trait::async_trait;
use knowa_config::MailSettings;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivery backend. Implementations must not block the caller for long;
/// the service already runs them off the request path.
#[async_trait]
pub trait MailTransport: Send + Sync {
    fn name(&self) -> &str;
    async fn deliver(&self, mail: &OutgoingMail) -> Result<(), String>;
}

/// Writes the envelope to the log instead of talking to an SMTP relay.
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, mail: &OutgoingMail) -> Result<(), String> {
        info!(from = %mail.from, to = %mail.to, subject = %mail.subject, "Outgoing mail");
        Ok(())
    }
}

#[derive(Clone)]
pub struct MailService {
    settings: MailSettings,
    transport: Arc<dyn MailTransport>,
}

impl MailService {
    pub fn new(settings: MailSettings, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            settings,
            transport,
        }
    }

    pub fn with_log_transport(settings: MailSettings) -> Self {
        Self::new(settings, Arc::new(LogTransport))
    }

    pub fn site_url(&self) -> &str {
        &self.settings.site_url
    }

    /// Fire-and-forget: delivery runs on its own task and failures are only logged.
    pub fn send(&self, to: &str, subject: &str, body: String) {
        if !self.settings.enabled || to.trim().is_empty() {
            return;
        }
        let mail = OutgoingMail {
            from: self.settings.from.clone(),
            to: to.to_string(),
            subject: subject.to_string(),
            body,
        };
        let transport = self.transport.clone();
        tokio::spawn(async move {
            if let Err(e) = transport.deliver(&mail).await {
                warn!(to = %mail.to, transport = transport.name(), error = %e, "Mail delivery failed");
            }
        });
    }

    pub fn send_tac(&self, to: &str, display_name: &str, code: &str, purpose: &str) {
        let body = format!(
            "Hi {},\n\nYour KNOWA {} code is {}. It expires in 5 minutes.\n\nIf you did not request it, you can ignore this email.",
            display_name, purpose, code
        );
        self.send(to, &format!("Your KNOWA {} code", purpose), body);
    }

    pub fn send_welcome(&self, to: &str, display_name: &str) {
        let body = format!(
            "Hi {},\n\nWelcome to KNOWA. You can sign in at {} and apply for membership from your profile.",
            display_name, self.settings.site_url
        );
        self.send(to, "Welcome to KNOWA", body);
    }
}
