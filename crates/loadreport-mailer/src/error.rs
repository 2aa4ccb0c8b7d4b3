// Error types for report delivery
//
// None of these escape ReportMailer::send_aggregate_report; they are
// carried to the logging step and dropped there.

use thiserror::Error;

/// Errors from the configuration collaborator
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No value stored under the requested key
    #[error("configuration not found: {0}")]
    NotFound(String),

    /// A required setting is unset
    #[error("missing required setting: {0}")]
    Missing(String),

    /// A value exists but has the wrong shape
    #[error("invalid configuration for {key}: {message}")]
    Invalid { key: String, message: String },

    /// The provider itself failed
    #[error("configuration provider error: {0}")]
    Provider(String),
}

impl ConfigError {
    /// Create an invalid value error
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        ConfigError::Provider(msg.into())
    }
}

/// Errors from the mail-transport collaborator
#[derive(Debug, Error)]
pub enum TransportError {
    /// Sender or recipient address could not be parsed
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The message could not be assembled
    #[error("failed to build message: {0}")]
    Message(String),

    /// The session could not be opened
    #[error("failed to open mail session: {0}")]
    Connect(String),

    /// The server rejected or never acknowledged the message
    #[error("failed to send message: {0}")]
    Send(String),
}

impl TransportError {
    /// Create a connect error
    pub fn connect(msg: impl Into<String>) -> Self {
        TransportError::Connect(msg.into())
    }

    /// Create a send error
    pub fn send(msg: impl Into<String>) -> Self {
        TransportError::Send(msg.into())
    }
}

/// Anything that can stop a report from being delivered
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
