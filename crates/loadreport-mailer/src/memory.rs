// In-memory implementations for examples and testing
//
// InMemoryConfigProvider stands in for the configuration store and
// RecordingTransport for the mail service. Both can be cloned and inspected
// after the pipeline has run.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::{ConfigProvider, SmtpConfig, SMTP_SERVER_KEY};
use crate::error::{ConfigError, TransportError};
use crate::transport::{MailMessage, MailSession, MailTransport, TransportResponse};

// ============================================================================
// InMemoryConfigProvider
// ============================================================================

/// Configuration store kept in a HashMap
#[derive(Debug, Default, Clone)]
pub struct InMemoryConfigProvider {
    values: Arc<RwLock<HashMap<String, serde_json::Value>>>,
}

impl InMemoryConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider pre-populated with SMTP settings
    pub fn with_smtp_config(config: &SmtpConfig) -> Self {
        let mut values = HashMap::new();
        values.insert(
            SMTP_SERVER_KEY.to_string(),
            serde_json::to_value(config).unwrap_or_default(),
        );
        Self {
            values: Arc::new(RwLock::new(values)),
        }
    }

    /// Store a raw value
    pub async fn set(&self, key: impl Into<String>, value: serde_json::Value) {
        self.values.write().await.insert(key.into(), value);
    }

    /// Replace the SMTP settings
    pub async fn set_smtp_config(&self, config: &SmtpConfig) {
        self.set(SMTP_SERVER_KEY, serde_json::to_value(config).unwrap_or_default())
            .await;
    }

    pub async fn remove(&self, key: &str) {
        self.values.write().await.remove(key);
    }
}

#[async_trait]
impl ConfigProvider for InMemoryConfigProvider {
    async fn get_config_value(&self, key: &str) -> Result<serde_json::Value, ConfigError> {
        self.values
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::NotFound(key.to_string()))
    }
}

// ============================================================================
// RecordingTransport
// ============================================================================

#[derive(Debug, Default)]
struct RecordingState {
    opened: Vec<SmtpConfig>,
    sent: Vec<MailMessage>,
    closed: usize,
}

/// Transport that records sessions and messages instead of sending them
///
/// Can be told to fail when a session is opened or when a message is sent.
#[derive(Debug, Default, Clone)]
pub struct RecordingTransport {
    state: Arc<RwLock<RecordingState>>,
    fail_open: Option<String>,
    fail_send: Option<String>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every `open` with a connect error
    pub fn failing_on_open(mut self, reason: impl Into<String>) -> Self {
        self.fail_open = Some(reason.into());
        self
    }

    /// Open sessions normally but reject every `send`
    pub fn failing_on_send(mut self, reason: impl Into<String>) -> Self {
        self.fail_send = Some(reason.into());
        self
    }

    /// Messages accepted or attempted so far
    pub async fn sent_messages(&self) -> Vec<MailMessage> {
        self.state.read().await.sent.clone()
    }

    /// Configurations sessions were opened with
    pub async fn opened_configs(&self) -> Vec<SmtpConfig> {
        self.state.read().await.opened.clone()
    }

    pub async fn opened_sessions(&self) -> usize {
        self.state.read().await.opened.len()
    }

    pub async fn closed_sessions(&self) -> usize {
        self.state.read().await.closed
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn open(&self, config: &SmtpConfig) -> Result<Box<dyn MailSession>, TransportError> {
        if let Some(reason) = &self.fail_open {
            return Err(TransportError::connect(reason.clone()));
        }
        self.state.write().await.opened.push(config.clone());
        Ok(Box::new(RecordingSession {
            state: Arc::clone(&self.state),
            fail_send: self.fail_send.clone(),
        }))
    }
}

struct RecordingSession {
    state: Arc<RwLock<RecordingState>>,
    fail_send: Option<String>,
}

#[async_trait]
impl MailSession for RecordingSession {
    async fn send(&mut self, message: &MailMessage) -> Result<TransportResponse, TransportError> {
        let mut state = self.state.write().await;
        state.sent.push(message.clone());
        match &self.fail_send {
            Some(reason) => Err(TransportError::send(reason.clone())),
            None => Ok(TransportResponse::new(
                "250",
                format!("Ok: queued as {}", state.sent.len()),
            )),
        }
    }

    async fn close(&mut self) {
        self.state.write().await.closed += 1;
    }
}
