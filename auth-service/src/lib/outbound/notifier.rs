use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header;
use lettre::message::Mailbox;
use lettre::message::Message;
use lettre::transport::smtp::authentication::Credentials;
use lettre::AsyncSmtpTransport;
use lettre::AsyncTransport;
use lettre::Tokio1Executor;

use crate::config::MailConfig;
use crate::domain::authentication::errors::NotifierError;
use crate::domain::authentication::ports::Notifier;

/// Email notifier over async SMTP.
///
/// Without an SMTP host it only logs, which keeps local runs free of mail
/// infrastructure.
#[derive(Clone)]
pub struct SmtpNotifier {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
}

impl SmtpNotifier {
    pub fn new(config: &MailConfig) -> Result<Self, NotifierError> {
        if config.smtp_host.trim().is_empty() {
            tracing::warn!("SMTP host not configured; notifier runs in log-only mode");
            return Ok(Self::log_only());
        }

        let builder = if config.use_starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        }
        .map_err(|e| NotifierError::DeliveryFailed(format!("Invalid SMTP relay: {}", e)))?
        .port(config.smtp_port);

        let builder = if config.smtp_username.is_empty() {
            builder
        } else {
            builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
        };

        tracing::info!(
            smtp_host = %config.smtp_host,
            smtp_port = config.smtp_port,
            starttls = config.use_starttls,
            "SMTP notifier configured"
        );

        Ok(Self {
            transport: Some(Arc::new(builder.build())),
        })
    }

    pub fn log_only() -> Self {
        Self { transport: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }
}

fn mailbox(address: &str) -> Result<Mailbox, NotifierError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| NotifierError::InvalidAddress(format!("{}: {}", address, e)))
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotifierError> {
        let message = Message::builder()
            .from(mailbox(from)?)
            .to(mailbox(to)?)
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| NotifierError::MessageBuild(e.to_string()))?;

        let Some(transport) = &self.transport else {
            // Body carries the code, so it stays out of the log.
            tracing::info!(subject, recipient = to, "Notifier in log-only mode; skipping send");
            return Ok(());
        };

        transport
            .send(message)
            .await
            .map_err(|e| NotifierError::DeliveryFailed(e.to_string()))?;
        tracing::info!(subject, recipient = to, "Email sent");

        Ok(())
    }
}
