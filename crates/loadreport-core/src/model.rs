// Inputs to the report pipeline
//
// AggregatedResults mirrors the summary a load-test run produces once all
// runners have reported. Field names follow the producer's snake_case JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tally::Tally;

/// Summarized output of a completed load-test run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedResults {
    /// Human name of the test
    pub test_name: String,

    /// Run start, epoch milliseconds
    pub start_time: i64,

    /// Run end, epoch milliseconds (never before `start_time`)
    pub end_time: i64,

    pub test_id: String,

    #[serde(default)]
    pub revision_id: String,

    pub report_id: String,

    /// Number of runners that executed the test
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,

    /// Dashboard link for the run, if one exists
    #[serde(default)]
    pub grafana_url: Option<String>,

    /// Status-code and error tallies
    #[serde(default)]
    pub aggregate: Aggregate,
}

fn default_parallelism() -> u32 {
    1
}

impl AggregatedResults {
    /// Elapsed run time in milliseconds
    ///
    /// Clamped at zero if the producer sent an end time before the start.
    pub fn duration_ms(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time).max(0) as u64
    }

    /// Run start as an absolute timestamp
    pub fn started_at(&self) -> DateTime<Utc> {
        self.timestamp("start_time", self.start_time)
    }

    /// Run end as an absolute timestamp
    pub fn ended_at(&self) -> DateTime<Utc> {
        self.timestamp("end_time", self.end_time)
    }

    // Out-of-range epochs fall back to 1970-01-01
    fn timestamp(&self, field: &'static str, millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap_or_else(|| {
            tracing::warn!(
                test_id = %self.test_id,
                report_id = %self.report_id,
                field,
                millis,
                "Timestamp out of range, using Unix epoch"
            );
            DateTime::<Utc>::default()
        })
    }
}

/// Occurrence tallies collected over a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    /// Status-code label -> count
    #[serde(default)]
    pub codes: Tally,

    /// Error label -> count
    #[serde(default)]
    pub errors: Tally,
}

/// Optional benchmark annotation attached to a report
///
/// Each field independently controls whether it shows up in the report. A
/// score of `0.0` is a real score and is included.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportBenchmark {
    /// Score against the benchmark baseline
    #[serde(default)]
    pub score: Option<f64>,

    /// Opaque benchmark payload, rendered as-is
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl ReportBenchmark {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the score
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Set the benchmark payload
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Context of the job that triggered the report
///
/// Only used to correlate log lines; it never reaches the rendered document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobContext {
    #[serde(default)]
    pub job_id: Option<String>,

    /// Anything else the scheduler attached to the job
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl JobContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }
}
