// SMTP configuration and the configuration collaborator
//
// The SMTP settings are looked up under a single well-known key on every
// send, so edits to the store apply to the next report without a restart.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Key under which the SMTP settings are stored
pub const SMTP_SERVER_KEY: &str = "smtp_server";

/// Credentials used when the store leaves username or password unset
pub const PLACEHOLDER_USERNAME: &str = "test";
pub const PLACEHOLDER_PASSWORD: &str = "test";

/// SMTP settings for one send
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmtpConfig {
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Implicit TLS from the first byte; otherwise STARTTLS when offered
    #[serde(default)]
    pub secure: bool,

    /// Connection timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Reject servers presenting invalid certificates
    #[serde(default = "default_reject_unauth_certs")]
    pub reject_unauth_certs: bool,

    /// Sender address
    pub from: String,
}

fn default_port() -> u16 {
    587
}

fn default_timeout_ms() -> u64 {
    120_000
}

fn default_reject_unauth_certs() -> bool {
    true
}

impl SmtpConfig {
    /// Create a configuration with defaults for everything but host and sender
    pub fn new(host: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            secure: false,
            timeout: default_timeout_ms(),
            username: None,
            password: None,
            reject_unauth_certs: default_reject_unauth_certs(),
            from: from.into(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.as_millis() as u64;
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_reject_unauth_certs(mut self, reject: bool) -> Self {
        self.reject_unauth_certs = reject;
        self
    }

    /// Username and password, falling back to the placeholder pair for
    /// unset or empty values
    pub fn credentials(&self) -> (&str, &str) {
        let username = self
            .username
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(PLACEHOLDER_USERNAME);
        let password = self
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(PLACEHOLDER_PASSWORD);
        (username, password)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("timeout", &self.timeout)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("reject_unauth_certs", &self.reject_unauth_certs)
            .field("from", &self.from)
            .finish()
    }
}

/// Read-only configuration store
///
/// Implementations can:
/// - Read environment variables
/// - Query a remote configuration service
/// - Keep values in memory for tests
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Look up the raw value stored under `key`
    async fn get_config_value(&self, key: &str) -> Result<serde_json::Value, ConfigError>;
}

/// Fetch and parse the current SMTP settings
pub async fn fetch_smtp_config(provider: &dyn ConfigProvider) -> Result<SmtpConfig, ConfigError> {
    let value = provider.get_config_value(SMTP_SERVER_KEY).await?;
    serde_json::from_value(value).map_err(|e| ConfigError::invalid(SMTP_SERVER_KEY, e.to_string()))
}

/// SMTP settings from environment variables
///
/// Variables are read on every lookup:
/// - `SMTP_HOST` (required)
/// - `SMTP_FROM` (required)
/// - `SMTP_PORT` (default: 587)
/// - `SMTP_SECURE` (default: false)
/// - `SMTP_TIMEOUT_MS` (default: 120000)
/// - `SMTP_USERNAME`, `SMTP_PASSWORD` (default: placeholder credentials)
/// - `SMTP_REJECT_UNAUTH_CERTS` (default: true)
#[derive(Debug, Clone)]
pub struct EnvConfigProvider {
    prefix: String,
}

impl Default for EnvConfigProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvConfigProvider {
    pub fn new() -> Self {
        Self::with_prefix("SMTP")
    }

    /// Read `<prefix>_HOST`, `<prefix>_PORT`, ... instead of `SMTP_*`
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn var_name(&self, suffix: &str) -> String {
        format!("{}_{}", self.prefix, suffix)
    }

    fn string_var(&self, suffix: &str) -> Option<String> {
        env::var(self.var_name(suffix)).ok().filter(|v| !v.is_empty())
    }

    fn required_var(&self, suffix: &str) -> Result<String, ConfigError> {
        self.string_var(suffix)
            .ok_or_else(|| ConfigError::Missing(self.var_name(suffix)))
    }

    fn parsed_var<T>(&self, suffix: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.string_var(suffix)
            .map(|v| {
                v.parse()
                    .map_err(|e: T::Err| ConfigError::invalid(self.var_name(suffix), e.to_string()))
            })
            .transpose()
    }

    /// Accepts `true`/`false`/`1`/`0`; anything else is rejected rather than
    /// read as `false`
    fn bool_var(&self, suffix: &str) -> Result<Option<bool>, ConfigError> {
        self.string_var(suffix)
            .map(|v| match v.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(ConfigError::invalid(
                    self.var_name(suffix),
                    format!("expected true, false, 1 or 0, got {:?}", v),
                )),
            })
            .transpose()
    }

    /// Assemble the SMTP settings from the current environment
    pub fn smtp_config(&self) -> Result<SmtpConfig, ConfigError> {
        let mut config = SmtpConfig::new(self.required_var("HOST")?, self.required_var("FROM")?);

        if let Some(port) = self.parsed_var("PORT")? {
            config.port = port;
        }
        if let Some(timeout) = self.parsed_var("TIMEOUT_MS")? {
            config.timeout = timeout;
        }
        if let Some(secure) = self.bool_var("SECURE")? {
            config.secure = secure;
        }
        if let Some(reject) = self.bool_var("REJECT_UNAUTH_CERTS")? {
            config.reject_unauth_certs = reject;
        }
        config.username = self.string_var("USERNAME");
        config.password = self.string_var("PASSWORD");

        Ok(config)
    }
}

#[async_trait]
impl ConfigProvider for EnvConfigProvider {
    async fn get_config_value(&self, key: &str) -> Result<serde_json::Value, ConfigError> {
        if key != SMTP_SERVER_KEY {
            return Err(ConfigError::NotFound(key.to_string()));
        }
        let config = self.smtp_config()?;
        serde_json::to_value(config).map_err(|e| ConfigError::provider(e.to_string()))
    }
}
