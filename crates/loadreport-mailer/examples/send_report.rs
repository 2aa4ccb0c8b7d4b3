// Send Report Example
//
// Renders a report for a made-up run and mails it.
// Run with: cargo run -p loadreport-mailer --example send_report -- you@example.com
//
// SMTP settings come from SMTP_HOST, SMTP_FROM, SMTP_PORT, ... (see
// EnvConfigProvider). Without SMTP_HOST the message is logged to the console
// instead of being delivered. LOADREPORT_TEMPLATE_PATH selects another
// email template.

use std::sync::Arc;

use anyhow::Result;
use loadreport_core::{Aggregate, Tally};
use loadreport_mailer::{
    AggregatedResults, ConsoleTransport, EnvConfigProvider, InMemoryConfigProvider, JobContext,
    MailTransport, ReportBenchmark, ReportMailer, SmtpConfig, SmtpTransport,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,loadreport_mailer=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let recipients: Vec<String> = std::env::args().skip(1).collect();
    if recipients.is_empty() {
        anyhow::bail!("usage: send_report <email> [<email> ...]");
    }

    let mailer = if std::env::var("SMTP_HOST").is_ok() {
        tracing::info!("Delivering through SMTP");
        let transport: Arc<dyn MailTransport> = Arc::new(SmtpTransport::new());
        ReportMailer::new(Arc::new(EnvConfigProvider::new()), transport)
    } else {
        tracing::info!("SMTP_HOST not set, logging the email instead");
        let config = InMemoryConfigProvider::with_smtp_config(&SmtpConfig::new(
            "localhost",
            "loadreport@localhost",
        ));
        ReportMailer::new(Arc::new(config), Arc::new(ConsoleTransport::new()))
    };

    let results = AggregatedResults {
        test_name: "checkout flow".to_string(),
        start_time: 1_700_000_000_000,
        end_time: 1_700_000_754_000,
        test_id: "demo-test".to_string(),
        revision_id: "rev-1".to_string(),
        report_id: "demo-report".to_string(),
        parallelism: 3,
        grafana_url: Some("https://grafana.example.com/d/loadreport".to_string()),
        aggregate: Aggregate {
            codes: Tally::new().with("200", 11_872).with("502", 41),
            errors: Tally::new().with("ECONNRESET", 6),
        },
    };
    let benchmark = ReportBenchmark::new()
        .with_score(92.375)
        .with_data(serde_json::json!({ "p95": { "benchmark": 310, "report": 287 } }));

    mailer
        .send_aggregate_report(
            &results,
            &JobContext::new().with_job_id("demo-job"),
            &recipients,
            Some(&benchmark),
        )
        .await?;

    Ok(())
}
