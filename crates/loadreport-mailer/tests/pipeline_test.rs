// End-to-end tests for the report pipeline
//
// Runs compose + dispatch against in-memory config and a recording transport.

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use loadreport_core::{build_test_info, Aggregate, Tally};
use loadreport_mailer::{
    AggregatedResults, InMemoryConfigProvider, JobContext, RecordingTransport, ReportBenchmark,
    ReportComposer, ReportError, ReportMailer, SmtpConfig,
};

fn smoke_results() -> AggregatedResults {
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

fn config() -> Arc<InMemoryConfigProvider> {
    Arc::new(InMemoryConfigProvider::with_smtp_config(&SmtpConfig::new(
        "smtp.example.com",
        "perf@example.com",
    )))
}

fn recipients() -> Vec<String> {
    vec!["qa@example.com".to_string()]
}

fn write_template(name: &str, body: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("loadreport-pipeline-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

/// Collects formatted log output in memory
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_smoke_model() {
    let info = build_test_info(&smoke_results(), &ReportBenchmark::default());

    assert_eq!(info.run_time, "1.0 Min");
    assert_eq!(info.parallelism, 4);
    assert_eq!(info.score, None);
    assert_eq!(info.benchmark, None);
}

#[tokio::test]
async fn test_smoke_summaries_reach_template() {
    let template = write_template(
        "summaries.html",
        "{{ testInfo.runTime }}|{{ codesSummary }}|{{ errorsSummary }}|{{ testInfo.reportId }}",
    );
    let transport = RecordingTransport::new();
    let mailer = ReportMailer::new(config(), Arc::new(transport.clone()))
        .with_composer(ReportComposer::with_template_path(&template));

    mailer
        .send_aggregate_report(&smoke_results(), &JobContext::new(), &recipients(), None)
        .await
        .unwrap();

    let sent = transport.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].html, "1.0 Min|200: 10||r1");
}

#[tokio::test]
async fn test_smoke_end_to_end_with_logs() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let transport = RecordingTransport::new();
    let mailer = ReportMailer::new(config(), Arc::new(transport.clone()));

    mailer
        .send_aggregate_report(
            &smoke_results(),
            &JobContext::new().with_job_id("job-7"),
            &recipients(),
            Some(&ReportBenchmark::default()),
        )
        .await
        .unwrap();

    let sent = transport.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].from, "perf@example.com");
    assert_eq!(sent[0].to, "qa@example.com");
    assert_eq!(sent[0].subject, "Your test results: smoke");
    assert!(sent[0].html.contains("1.0 Min"));
    assert!(sent[0].html.contains("200: 10"));
    assert_eq!(transport.closed_sessions().await, 1);

    let output = logs.contents();
    assert!(output.contains("Sent email successfully"), "{output}");
    assert!(output.contains("test_id=t1"), "{output}");
    assert!(output.contains("report_id=r1"), "{output}");
}

#[tokio::test]
async fn test_rejecting_transport_still_resolves() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let transport = RecordingTransport::new().failing_on_open("connection refused");
    let mailer = ReportMailer::new(config(), Arc::new(transport.clone()));

    let result = mailer
        .send_aggregate_report(&smoke_results(), &JobContext::new(), &recipients(), None)
        .await;

    assert!(result.is_ok());
    assert!(transport.sent_messages().await.is_empty());

    let output = logs.contents();
    assert!(output.contains("Failed to send email"), "{output}");
    assert!(output.contains("connection refused"), "{output}");
    assert!(output.contains("test_id=t1"), "{output}");
}

#[tokio::test]
async fn test_missing_config_still_resolves() {
    let transport = RecordingTransport::new();
    let mailer = ReportMailer::new(
        Arc::new(InMemoryConfigProvider::new()),
        Arc::new(transport.clone()),
    );

    let result = mailer
        .send_aggregate_report(&smoke_results(), &JobContext::new(), &recipients(), None)
        .await;

    assert!(result.is_ok());
    assert_eq!(transport.opened_sessions().await, 0);
}

#[tokio::test]
async fn test_broken_template_is_returned() {
    let template = write_template("broken.html", "{% for x in %}");
    let transport = RecordingTransport::new();
    let mailer = ReportMailer::new(config(), Arc::new(transport.clone()))
        .with_composer(ReportComposer::with_template_path(&template));

    let err = mailer
        .send_aggregate_report(&smoke_results(), &JobContext::new(), &recipients(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, ReportError::TemplateRender(_)));
    assert!(transport.sent_messages().await.is_empty());
}

#[tokio::test]
async fn test_score_formats_subject() {
    let transport = RecordingTransport::new();
    let mailer = ReportMailer::new(config(), Arc::new(transport.clone()));
    let benchmark = ReportBenchmark::new().with_score(87.456);

    mailer
        .send_aggregate_report(&smoke_results(), &JobContext::new(), &recipients(), Some(&benchmark))
        .await
        .unwrap();

    assert_eq!(
        transport.sent_messages().await[0].subject,
        "Your test results: smoke with score: 87.46"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_sends_are_independent() {
    let transport = RecordingTransport::new();
    let mailer = ReportMailer::new(config(), Arc::new(transport.clone()));

    let mut first = smoke_results();
    first.test_name = "first".to_string();
    let mut second = smoke_results();
    second.test_name = "second".to_string();
    second.report_id = "r2".to_string();

    let a = {
        let mailer = mailer.clone();
        tokio::spawn(async move {
            mailer
                .send_aggregate_report(&first, &JobContext::new(), &recipients(), None)
                .await
        })
    };
    let b = {
        let mailer = mailer.clone();
        tokio::spawn(async move {
            mailer
                .send_aggregate_report(&second, &JobContext::new(), &recipients(), None)
                .await
        })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    let mut subjects: Vec<String> = transport
        .sent_messages()
        .await
        .into_iter()
        .map(|m| m.subject)
        .collect();
    subjects.sort();
    assert_eq!(
        subjects,
        vec!["Your test results: first", "Your test results: second"]
    );
    assert_eq!(transport.opened_sessions().await, 2);
    assert_eq!(transport.closed_sessions().await, 2);
}
