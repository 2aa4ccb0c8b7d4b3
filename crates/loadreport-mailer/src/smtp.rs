//! SMTP transport backed by lettre.
//!
//! `secure = true` maps to implicit TLS (usually port 465); otherwise the
//! connection upgrades with STARTTLS when the server offers it. Setting
//! `rejectUnauthCerts = false` accepts self-signed or expired certificates.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Mailboxes};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::error::TransportError;
use crate::transport::{MailMessage, MailSession, MailTransport, TransportResponse};

/// Opens lettre SMTP sessions
#[derive(Debug, Clone, Copy, Default)]
pub struct SmtpTransport;

impl SmtpTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn open(&self, config: &SmtpConfig) -> Result<Box<dyn MailSession>, TransportError> {
        let transport = build_transport(config)?;
        tracing::debug!(host = %config.host, port = config.port, secure = config.secure, "Opened SMTP session");
        Ok(Box::new(SmtpSession {
            transport: Some(transport),
        }))
    }
}

fn build_transport(config: &SmtpConfig) -> Result<AsyncSmtpTransport<Tokio1Executor>, TransportError> {
    let tls_parameters = TlsParameters::builder(config.host.clone())
        .dangerous_accept_invalid_certs(!config.reject_unauth_certs)
        .build()
        .map_err(|e| TransportError::connect(e.to_string()))?;

    let tls = if config.secure {
        Tls::Wrapper(tls_parameters)
    } else {
        Tls::Opportunistic(tls_parameters)
    };

    let (username, password) = config.credentials();

    Ok(
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(config.host.as_str())
            .port(config.port)
            .tls(tls)
            .timeout(Some(config.connection_timeout()))
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build(),
    )
}

/// Convert a transport-agnostic message into a lettre message
pub(crate) fn build_message(message: &MailMessage) -> Result<Message, TransportError> {
    let from: Mailbox = message
        .from
        .parse()
        .map_err(|e| TransportError::InvalidAddress(format!("{}: {}", message.from, e)))?;
    let recipients: Mailboxes = message
        .to
        .parse()
        .map_err(|e| TransportError::InvalidAddress(format!("{}: {}", message.to, e)))?;

    let mut builder = Message::builder()
        .from(from)
        .subject(message.subject.as_str())
        .header(ContentType::TEXT_HTML);
    for mailbox in recipients {
        builder = builder.to(mailbox);
    }

    builder
        .body(message.html.clone())
        .map_err(|e| TransportError::Message(e.to_string()))
}

struct SmtpSession {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

#[async_trait]
impl MailSession for SmtpSession {
    async fn send(&mut self, message: &MailMessage) -> Result<TransportResponse, TransportError> {
        let transport = self
            .transport
            .as_ref()
            .ok_or_else(|| TransportError::send("session already closed"))?;
        let email = build_message(message)?;

        let response = transport
            .send(email)
            .await
            .map_err(|e| TransportError::send(e.to_string()))?;

        Ok(TransportResponse::new(
            response.code().to_string(),
            response.message().collect::<Vec<_>>().join(" "),
        ))
    }

    async fn close(&mut self) {
        if self.transport.take().is_some() {
            tracing::debug!("Closed SMTP session");
        }
    }
}
