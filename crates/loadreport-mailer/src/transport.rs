// Mail-transport collaborator
//
// A transport opens one session per send. The dispatcher owns the session
// for exactly one message and closes it afterwards, whatever the outcome.

use std::fmt;

use async_trait::async_trait;

use crate::config::SmtpConfig;
use crate::error::TransportError;

/// A single HTML email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    /// Comma-separated recipient list
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// What the server said when it accepted a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub code: String,
    pub message: String,
}

impl TransportResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{} {}", self.code, self.message)
        }
    }
}

/// Opens mail sessions from SMTP settings
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Open a session scoped to `config`
    async fn open(&self, config: &SmtpConfig) -> Result<Box<dyn MailSession>, TransportError>;
}

/// A live handle to the mail service
#[async_trait]
pub trait MailSession: Send {
    /// Send one message
    async fn send(&mut self, message: &MailMessage) -> Result<TransportResponse, TransportError>;

    /// Release the session
    ///
    /// Called exactly once, after `send` has returned.
    async fn close(&mut self);
}

/// Open a session, run `send` on it and close it on every exit path
pub async fn send_with_session(
    transport: &dyn MailTransport,
    config: &SmtpConfig,
    message: &MailMessage,
) -> Result<TransportResponse, TransportError> {
    let mut session = transport.open(config).await?;
    let result = session.send(message).await;
    session.close().await;
    result
}
