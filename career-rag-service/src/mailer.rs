//! Outgoing email over SMTP.
//!
//! Bodies are plain text with newlines. [`render_html`] wraps them in a
//! right-to-left HTML document so Arabic text lines up correctly in mail clients.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

pub const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum MailError {
    #[error("email credentials not configured")]
    NotConfigured,

    #[error("invalid email address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("failed to build email: {0}")]
    Build(String),

    #[error("failed to send email: {0}")]
    Smtp(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    /// Plain text; converted with [`render_html`] before sending
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

/// Sender account and relay.
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub sender: String,
    pub password: String,
    pub server: String,
    pub port: u16,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("sender", &self.sender)
            .field("password", &"<redacted>")
            .field("server", &self.server)
            .field("port", &self.port)
            .finish()
    }
}

impl SmtpSettings {
    /// `None` unless both the sender address and the password are non-empty.
    pub fn from_parts(
        sender: Option<String>,
        password: Option<String>,
        server: impl Into<String>,
        port: u16,
    ) -> Option<Self> {
        let sender = sender.filter(|s| !s.trim().is_empty())?;
        let password = password.filter(|s| !s.is_empty())?;
        Some(Self {
            sender,
            password,
            server: server.into(),
            port,
        })
    }
}

/// STARTTLS SMTP mailer. Without settings every send fails with
/// [`MailError::NotConfigured`].
pub struct SmtpMailer {
    settings: Option<SmtpSettings>,
}

impl SmtpMailer {
    pub fn new(settings: Option<SmtpSettings>) -> Self {
        Self { settings }
    }

    pub fn is_configured(&self) -> bool {
        self.settings.is_some()
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let settings = self.settings.as_ref().ok_or(MailError::NotConfigured)?;
        let email = build_message(&settings.sender, message)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.server)
            .map_err(|e| MailError::Smtp(e.to_string()))?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.sender.clone(),
                settings.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        transport
            .send(email)
            .await
            .map_err(|e| MailError::Smtp(e.to_string()))?;
        info!("Email sent to {}", message.to);
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .trim()
        .parse()
        .map_err(|e: lettre::address::AddressError| MailError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

fn build_message(sender: &str, message: &EmailMessage) -> Result<Message, MailError> {
    Message::builder()
        .from(parse_mailbox(sender)?)
        .to(parse_mailbox(&message.to)?)
        .subject(message.subject.clone())
        .header(ContentType::TEXT_HTML)
        .body(render_html(&message.body))
        .map_err(|e| MailError::Build(e.to_string()))
}

/// Wrap a plain-text body in the right-to-left HTML layout, newlines as `<br>`.
pub fn render_html(body: &str) -> String {
    format!(
        "<html>\n    <body style=\"font-family: Arial, sans-serif; direction: rtl; text-align: right;\">\n        \
         <div style=\"max-width: 600px; margin: 0 auto; padding: 20px;\">\n            {}\n        </div>\n    \
         </body>\n</html>\n",
        body.replace('\n', "<br>")
    )
}
