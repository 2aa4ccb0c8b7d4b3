//! # Load-test report composition
//!
//! Turns the aggregated results of a finished load-test run into the HTML
//! body of a results email.
//!
//! ## Pipeline
//!
//! ```text
//! AggregatedResults + ReportBenchmark
//!          │
//!          ▼
//!   build_test_info        (run time, timestamps, ids, optional score/benchmark)
//!          │
//!          ▼
//!   ReportComposer::render (status-code / error summaries, template on disk)
//!          │
//!          ▼
//!   RenderedReport         (handed to loadreport-mailer)
//! ```
//!
//! ## Template location
//!
//! [`ReportComposer::new`] uses the template bundled in this crate, located
//! by an absolute path fixed at build time. A binary running away from its
//! build tree should ship `templates/email_report.html` and either set
//! `LOADREPORT_TEMPLATE_PATH` (read by [`ReportComposer::from_env`]) or pass
//! the location to [`ReportComposer::with_template_path`].
//!
//! ## Example
//!
//! ```no_run
//! use loadreport_core::{AggregatedResults, ReportBenchmark, ReportComposer};
//!
//! # fn example(results: AggregatedResults) -> loadreport_core::Result<()> {
//! let report = ReportComposer::new().compose(&results, &ReportBenchmark::default())?;
//! println!("{}", report.html());
//! # Ok(())
//! # }
//! ```

pub mod composer;
pub mod duration;
pub mod error;
pub mod model;
pub mod tally;

pub use composer::{
    build_test_info, RenderedReport, ReportComposer, TestInfo, DEFAULT_TEMPLATE_PATH,
    TEMPLATE_PATH_ENV,
};
pub use duration::format_duration;
pub use error::{ReportError, Result};
pub use model::{Aggregate, AggregatedResults, JobContext, ReportBenchmark};
pub use tally::{summarize_tally, Tally};
