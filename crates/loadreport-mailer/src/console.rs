// Console transport for local development
//
// Logs each message instead of delivering it. Useful when no SMTP server is
// reachable but the rest of the pipeline should run end to end.

use async_trait::async_trait;

use crate::config::SmtpConfig;
use crate::error::TransportError;
use crate::transport::{MailMessage, MailSession, MailTransport, TransportResponse};

/// Transport that writes messages to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleTransport {
    /// Also log the HTML body
    pub include_body: bool,
}

impl ConsoleTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self) -> Self {
        self.include_body = true;
        self
    }
}

#[async_trait]
impl MailTransport for ConsoleTransport {
    async fn open(&self, config: &SmtpConfig) -> Result<Box<dyn MailSession>, TransportError> {
        Ok(Box::new(ConsoleSession {
            host: config.host.clone(),
            include_body: self.include_body,
        }))
    }
}

struct ConsoleSession {
    host: String,
    include_body: bool,
}

#[async_trait]
impl MailSession for ConsoleSession {
    async fn send(&mut self, message: &MailMessage) -> Result<TransportResponse, TransportError> {
        tracing::info!(
            host = %self.host,
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            bytes = message.html.len(),
            "Email (console transport)"
        );
        if self.include_body {
            tracing::info!(body = %message.html, "Email body");
        }
        Ok(TransportResponse::new("250", "logged to console"))
    }

    async fn close(&mut self) {}
}
