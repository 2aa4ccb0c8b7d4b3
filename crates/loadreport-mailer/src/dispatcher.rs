//! Best-effort delivery of a rendered report.
//!
//! The dispatcher fetches the current SMTP settings, opens a session, sends
//! one message and closes the session. Every failure on that path is turned
//! into a [`SendOutcome::Failed`], logged, and dropped.

use std::sync::Arc;

use loadreport_core::{AggregatedResults, RenderedReport};

use crate::config::{fetch_smtp_config, ConfigProvider};
use crate::error::DispatchError;
use crate::transport::{send_with_session, MailMessage, MailTransport, TransportResponse};

/// Terminal result of one delivery attempt
#[derive(Debug)]
pub enum SendOutcome {
    Sent(TransportResponse),
    Failed(DispatchError),
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent(_))
    }
}

/// Subject line for a report email
///
/// The score is shown with two decimals, ties rounded away from zero.
pub fn report_subject(test_name: &str, score: Option<f64>) -> String {
    match score {
        Some(score) => format!(
            "Your test results: {} with score: {:.2}",
            test_name,
            round_hundredths(score)
        ),
        None => format!("Your test results: {}", test_name),
    }
}

// `{:.2}` alone rounds exact ties to even
fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Join recipients into a single address field
pub fn join_recipients<S: AsRef<str>>(recipients: &[S]) -> String {
    recipients
        .iter()
        .map(|r| r.as_ref())
        .collect::<Vec<_>>()
        .join(",")
}

/// Sends rendered reports through an injected transport
#[derive(Clone)]
pub struct MailDispatcher {
    config: Arc<dyn ConfigProvider>,
    transport: Arc<dyn MailTransport>,
}

impl MailDispatcher {
    pub fn new(config: Arc<dyn ConfigProvider>, transport: Arc<dyn MailTransport>) -> Self {
        Self { config, transport }
    }

    /// Deliver a report and log the outcome
    ///
    /// Never fails: configuration, session and send errors are logged with
    /// the test and report ids, then dropped.
    pub async fn send(
        &self,
        results: &AggregatedResults,
        recipients: &[String],
        report: &RenderedReport,
        score: Option<f64>,
    ) {
        let outcome = self.dispatch(results, recipients, report, score).await;
        log_outcome(results, &outcome);
    }

    /// Run one delivery attempt and report how it ended
    pub async fn dispatch(
        &self,
        results: &AggregatedResults,
        recipients: &[String],
        report: &RenderedReport,
        score: Option<f64>,
    ) -> SendOutcome {
        match self.try_dispatch(results, recipients, report, score).await {
            Ok(response) => SendOutcome::Sent(response),
            Err(error) => SendOutcome::Failed(error),
        }
    }

    async fn try_dispatch(
        &self,
        results: &AggregatedResults,
        recipients: &[String],
        report: &RenderedReport,
        score: Option<f64>,
    ) -> Result<TransportResponse, DispatchError> {
        let smtp = fetch_smtp_config(self.config.as_ref()).await?;

        let message = MailMessage {
            from: smtp.from.clone(),
            to: join_recipients(recipients),
            subject: report_subject(&results.test_name, score),
            html: report.html().to_string(),
        };

        let response = send_with_session(self.transport.as_ref(), &smtp, &message).await?;
        Ok(response)
    }
}

fn log_outcome(results: &AggregatedResults, outcome: &SendOutcome) {
    match outcome {
        SendOutcome::Sent(response) => tracing::info!(
            test_id = %results.test_id,
            report_id = %results.report_id,
            response = %response,
            "Sent email successfully"
        ),
        SendOutcome::Failed(error) => tracing::error!(
            test_id = %results.test_id,
            report_id = %results.report_id,
            error = %error,
            "Failed to send email"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SmtpConfig;
    use crate::error::{ConfigError, TransportError};
    use crate::memory::{InMemoryConfigProvider, RecordingTransport};
    use loadreport_core::{Aggregate, ReportBenchmark, ReportComposer, Tally};

    fn results() -> AggregatedResults {
        AggregatedResults {
            test_name: "smoke".to_string(),
            start_time: 1000,
            end_time: 61000,
            test_id: "t1".to_string(),
            revision_id: String::new(),
            report_id: "r1".to_string(),
            parallelism: 4,
            grafana_url: None,
            aggregate: Aggregate {
                codes: Tally::new().with("200", 10),
                errors: Tally::new(),
            },
        }
    }

    fn report() -> RenderedReport {
        ReportComposer::new()
            .compose(&results(), &ReportBenchmark::default())
            .unwrap()
    }

    fn dispatcher(
        config: &InMemoryConfigProvider,
        transport: &RecordingTransport,
    ) -> MailDispatcher {
        MailDispatcher::new(Arc::new(config.clone()), Arc::new(transport.clone()))
    }

    fn recipients() -> Vec<String> {
        vec!["a@example.com".to_string(), "b@example.com".to_string()]
    }

    #[test]
    fn test_subject_without_score() {
        assert_eq!(report_subject("smoke", None), "Your test results: smoke");
    }

    #[test]
    fn test_subject_rounds_score() {
        assert_eq!(
            report_subject("smoke", Some(87.456)),
            "Your test results: smoke with score: 87.46"
        );
        assert_eq!(
            report_subject("smoke", Some(0.0)),
            "Your test results: smoke with score: 0.00"
        );
    }

    #[test]
    fn test_subject_rounds_ties_away_from_zero() {
        assert_eq!(
            report_subject("smoke", Some(87.125)),
            "Your test results: smoke with score: 87.13"
        );
        assert_eq!(
            report_subject("smoke", Some(0.125)),
            "Your test results: smoke with score: 0.13"
        );
        assert_eq!(
            report_subject("smoke", Some(-2.125)),
            "Your test results: smoke with score: -2.13"
        );
    }

    #[test]
    fn test_join_recipients() {
        assert_eq!(join_recipients(&recipients()), "a@example.com,b@example.com");
        assert_eq!(join_recipients::<String>(&[]), "");
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let config = InMemoryConfigProvider::with_smtp_config(
            &SmtpConfig::new("smtp.example.com", "perf@example.com"),
        );
        let transport = RecordingTransport::new();

        let outcome = dispatcher(&config, &transport)
            .dispatch(&results(), &recipients(), &report(), None)
            .await;
        assert!(outcome.is_sent());

        let sent = transport.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].from, "perf@example.com");
        assert_eq!(sent[0].to, "a@example.com,b@example.com");
        assert_eq!(sent[0].subject, "Your test results: smoke");
        assert_eq!(sent[0].html, report().html());
        assert_eq!(transport.closed_sessions().await, 1);
    }

    #[tokio::test]
    async fn test_dispatch_missing_config() {
        let transport = RecordingTransport::new();
        let outcome = dispatcher(&InMemoryConfigProvider::new(), &transport)
            .dispatch(&results(), &recipients(), &report(), None)
            .await;

        assert!(matches!(
            outcome,
            SendOutcome::Failed(DispatchError::Config(ConfigError::NotFound(_)))
        ));
        assert_eq!(transport.opened_sessions().await, 0);
    }

    #[tokio::test]
    async fn test_dispatch_send_failure_closes_session() {
        let config = InMemoryConfigProvider::with_smtp_config(
            &SmtpConfig::new("smtp.example.com", "perf@example.com"),
        );
        let transport = RecordingTransport::new().failing_on_send("421 service not available");

        let outcome = dispatcher(&config, &transport)
            .dispatch(&results(), &recipients(), &report(), Some(50.0))
            .await;

        assert!(matches!(
            outcome,
            SendOutcome::Failed(DispatchError::Transport(TransportError::Send(_)))
        ));
        assert_eq!(transport.opened_sessions().await, 1);
        assert_eq!(transport.closed_sessions().await, 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_send_swallows_open_failure() {
        let config = InMemoryConfigProvider::with_smtp_config(
            &SmtpConfig::new("unreachable.invalid", "perf@example.com"),
        );
        let transport = RecordingTransport::new().failing_on_open("connection refused");

        // Completes normally; the failure only shows up in the log
        dispatcher(&config, &transport)
            .send(&results(), &recipients(), &report(), None)
            .await;

        assert!(transport.sent_messages().await.is_empty());
    }

    #[tokio::test]
    async fn test_config_change_applies_to_next_send() {
        let config = InMemoryConfigProvider::with_smtp_config(
            &SmtpConfig::new("old.example.com", "perf@example.com"),
        );
        let transport = RecordingTransport::new();
        let dispatcher = dispatcher(&config, &transport);

        dispatcher
            .send(&results(), &recipients(), &report(), None)
            .await;
        config
            .set_smtp_config(&SmtpConfig::new("new.example.com", "reports@example.com"))
            .await;
        dispatcher
            .send(&results(), &recipients(), &report(), None)
            .await;

        let hosts: Vec<String> = transport
            .opened_configs()
            .await
            .into_iter()
            .map(|c| c.host)
            .collect();
        assert_eq!(hosts, vec!["old.example.com", "new.example.com"]);
        assert_eq!(transport.sent_messages().await[1].from, "reports@example.com");
    }
}
