// Public entry point: compose a report and mail it
//
// Only template defects are returned to the caller. Delivery problems are
// logged by the dispatcher and never interrupt the test run that asked for
// the report.

use std::sync::Arc;

use loadreport_core::{AggregatedResults, JobContext, ReportBenchmark, ReportComposer, Result};

use crate::config::ConfigProvider;
use crate::dispatcher::MailDispatcher;
use crate::transport::MailTransport;

/// Composes and delivers aggregate reports
#[derive(Clone)]
pub struct ReportMailer {
    composer: ReportComposer,
    dispatcher: MailDispatcher,
}

impl ReportMailer {
    /// Create a mailer rendering the template named by
    /// `LOADREPORT_TEMPLATE_PATH`, or the bundled one when unset
    pub fn new(config: Arc<dyn ConfigProvider>, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            composer: ReportComposer::from_env(),
            dispatcher: MailDispatcher::new(config, transport),
        }
    }

    /// Use a different composer (e.g. another template location)
    pub fn with_composer(mut self, composer: ReportComposer) -> Self {
        self.composer = composer;
        self
    }

    pub fn composer(&self) -> &ReportComposer {
        &self.composer
    }

    /// Render the report for `results` and send it to `emails`
    ///
    /// Returns an error only when the report cannot be rendered. Configuration
    /// lookup, session and send failures are logged and the call still
    /// resolves with `Ok(())`.
    #[tracing::instrument(
        name = "send_aggregate_report",
        skip_all,
        fields(
            test_id = %results.test_id,
            report_id = %results.report_id,
            job_id = ?job.job_id,
            recipients = emails.len(),
        )
    )]
    pub async fn send_aggregate_report(
        &self,
        results: &AggregatedResults,
        job: &JobContext,
        emails: &[String],
        benchmark: Option<&ReportBenchmark>,
    ) -> Result<()> {
        let default_benchmark = ReportBenchmark::default();
        let benchmark = benchmark.unwrap_or(&default_benchmark);

        let report = self.composer.compose(results, benchmark)?;

        self.dispatcher
            .send(results, emails, &report, benchmark.score)
            .await;
        Ok(())
    }
}
