//! HTML report composition
//!
//! Builds the presentation model for a finished run and renders it against
//! the email template. Rendering is a pure function of the results, the
//! benchmark annotation and the template file.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use minijinja::{context, AutoEscape, Environment};
use serde::Serialize;

use crate::duration::format_duration;
use crate::error::{ReportError, Result};
use crate::model::{Aggregate, AggregatedResults, ReportBenchmark};
use crate::tally::summarize_tally;

/// Template bundled with this crate
///
/// This is an absolute path into the source tree at build time. Deployed
/// binaries should ship the template and point [`TEMPLATE_PATH_ENV`] at it.
pub const DEFAULT_TEMPLATE_PATH: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/templates/email_report.html");

/// Environment variable overriding the template location
pub const TEMPLATE_PATH_ENV: &str = "LOADREPORT_TEMPLATE_PATH";

/// Presentation model for the "test info" section of the report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestInfo {
    pub run_time: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub test_id: String,
    pub revision_id: String,
    pub report_id: String,
    pub parallelism: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<serde_json::Value>,
}

/// Build the test info model from a run and its benchmark annotation
pub fn build_test_info(results: &AggregatedResults, benchmark: &ReportBenchmark) -> TestInfo {
    TestInfo {
        run_time: format_duration(results.duration_ms()),
        start_time: results.started_at(),
        end_time: results.ended_at(),
        test_id: results.test_id.clone(),
        revision_id: results.revision_id.clone(),
        report_id: results.report_id.clone(),
        parallelism: results.parallelism,
        score: benchmark.score,
        benchmark: benchmark.data.clone(),
    }
}

/// A rendered report, alive only for the duration of one send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    html: String,
}

impl RenderedReport {
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn into_html(self) -> String {
        self.html
    }
}

fn resolve_template_path(configured: Option<PathBuf>) -> PathBuf {
    configured
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_PATH))
}

/// Renders aggregated results into the HTML email body
#[derive(Debug, Clone)]
pub struct ReportComposer {
    template_path: PathBuf,
}

impl Default for ReportComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportComposer {
    /// Composer using the bundled template
    pub fn new() -> Self {
        Self {
            template_path: PathBuf::from(DEFAULT_TEMPLATE_PATH),
        }
    }

    /// Composer using `LOADREPORT_TEMPLATE_PATH` when set, the bundled
    /// template otherwise
    pub fn from_env() -> Self {
        Self::with_template_path(resolve_template_path(
            std::env::var_os(TEMPLATE_PATH_ENV).map(PathBuf::from),
        ))
    }

    /// Composer using a template at another location
    pub fn with_template_path(path: impl Into<PathBuf>) -> Self {
        Self {
            template_path: path.into(),
        }
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    /// Build the model for a run and render it
    pub fn compose(
        &self,
        results: &AggregatedResults,
        benchmark: &ReportBenchmark,
    ) -> Result<RenderedReport> {
        let test_info = build_test_info(results, benchmark);
        self.render(
            &results.test_name,
            &test_info,
            results.grafana_url.as_deref(),
            &results.aggregate,
        )
    }

    /// Render a prepared model against the template
    ///
    /// The template is read from disk on every call; a missing or unreadable
    /// file is returned as [`ReportError::TemplateLoad`].
    pub fn render(
        &self,
        test_name: &str,
        test_info: &TestInfo,
        grafana_url: Option<&str>,
        aggregate: &Aggregate,
    ) -> Result<RenderedReport> {
        let source = fs::read_to_string(&self.template_path)
            .map_err(|e| ReportError::template_load(&self.template_path, e))?;

        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        let template = env.template_from_str(&source)?;

        let html = template.render(context! {
            testName => test_name,
            testInfo => test_info,
            grafanaUrl => grafana_url,
            aggregatedResults => aggregate,
            codesSummary => summarize_tally(&aggregate.codes),
            errorsSummary => summarize_tally(&aggregate.errors),
        })?;

        tracing::debug!(
            test_id = %test_info.test_id,
            report_id = %test_info.report_id,
            bytes = html.len(),
            "Rendered report"
        );

        Ok(RenderedReport { html })
    }
}
