// Report delivery for finished load-test runs
//
// Key design decisions:
// - ConfigProvider and MailTransport are traits so the pipeline runs against
//   in-memory doubles in tests and against lettre in production
// - SMTP settings are fetched per send; nothing is cached
// - Each send opens a fresh session and closes it on every exit path
// - Delivery is best-effort: failures are logged with test/report ids and
//   never returned to the caller

pub mod config;
pub mod console;
pub mod dispatcher;
pub mod error;
pub mod mailer;
pub mod memory;
pub mod smtp;
pub mod transport;

// Re-exports
pub use config::{
    fetch_smtp_config, ConfigProvider, EnvConfigProvider, SmtpConfig, SMTP_SERVER_KEY,
};
pub use console::ConsoleTransport;
pub use dispatcher::{join_recipients, report_subject, MailDispatcher, SendOutcome};
pub use error::{ConfigError, DispatchError, TransportError};
pub use mailer::ReportMailer;
pub use memory::{InMemoryConfigProvider, RecordingTransport};
pub use smtp::SmtpTransport;
pub use transport::{send_with_session, MailMessage, MailSession, MailTransport, TransportResponse};

// Callers usually need the input types as well
pub use loadreport_core::{
    AggregatedResults, JobContext, RenderedReport, ReportBenchmark, ReportComposer, ReportError,
};
