//! Runs report definitions one after another.
//!
//! Every report opens its own session, runs its query, releases the session
//! and emits the result. A failing report is logged and recorded; the run
//! moves on to the next one unless fail-fast is set.

use crate::db::{Connector, QueryResult};
use crate::emit;
use crate::error::{CatalogError, Result};
use crate::report::{Emission, ReportDefinition};
use std::io::Write;
use tracing::{debug, error, info, warn};

/// What happened to one report.
#[derive(Debug)]
pub struct ReportOutcome {
    /// Report name.
    pub name: String,
    /// Rows emitted, or the error that stopped the report.
    pub result: Result<usize>,
}

impl ReportOutcome {
    /// Returns true if the report was emitted.
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcome of a whole run, in execution order.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// One entry per report that was attempted.
    pub outcomes: Vec<ReportOutcome>,
    /// Reports never attempted because the run stopped early.
    pub skipped: Vec<String>,
}

impl RunSummary {
    /// Returns true if every report ran and succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.skipped.is_empty() && self.outcomes.iter().all(ReportOutcome::succeeded)
    }

    /// Names of the reports that failed.
    pub fn failed(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.succeeded())
            .map(|o| o.name.as_str())
            .collect()
    }

    /// Process exit status: zero only if every report succeeded.
    pub fn exit_code(&self) -> i32 {
        if self.all_succeeded() {
            0
        } else {
            1
        }
    }

    /// Closing line printed after the run.
    pub fn closing_line(&self) -> String {
        if self.all_succeeded() {
            return "Data export complete.".to_string();
        }

        let failed = self.failed();
        let mut line = format!(
            "Completed with {} failed report(s): {}",
            failed.len(),
            failed.join(", ")
        );
        if !self.skipped.is_empty() {
            line.push_str(&format!("; skipped: {}", self.skipped.join(", ")));
        }
        line
    }
}

/// Sequential report runner.
pub struct Driver<C: Connector> {
    connector: C,
    reports: Vec<ReportDefinition>,
    fail_fast: bool,
}

impl<C: Connector> Driver<C> {
    /// Creates a driver for the given reports.
    pub fn new(connector: C, reports: Vec<ReportDefinition>) -> Self {
        Self {
            connector,
            reports,
            fail_fast: false,
        }
    }

    /// Stop at the first failing report instead of continuing.
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Runs every report in order, writing console reports to `out`.
    pub async fn run<W: Write>(&self, out: &mut W) -> RunSummary {
        info!(
            "Running {} report(s) against {}",
            self.reports.len(),
            self.connector.describe()
        );

        let mut summary = RunSummary::default();

        for (index, report) in self.reports.iter().enumerate() {
            let result = self.run_report(report, out).await;

            match &result {
                Ok(rows) => info!("Report '{}' emitted {} row(s)", report.name, rows),
                Err(e) => error!("{}", failure_message(&report.name, e)),
            }

            let failed = result.is_err();
            summary.outcomes.push(ReportOutcome {
                name: report.name.clone(),
                result,
            });

            if failed && self.fail_fast {
                summary.skipped = self.reports[index + 1..]
                    .iter()
                    .map(|r| r.name.clone())
                    .collect();
                if !summary.skipped.is_empty() {
                    warn!(
                        "Stopping after '{}'; {} report(s) skipped",
                        report.name,
                        summary.skipped.len()
                    );
                }
                break;
            }
        }

        summary
    }

    /// One report inside its own error boundary.
    async fn run_report<W: Write>(&self, report: &ReportDefinition, out: &mut W) -> Result<usize> {
        debug!("Starting report '{}'", report.name);

        let result = self.fetch(report).await?;
        debug!(
            "Report '{}' fetched {} row(s) in {:?}",
            report.name,
            result.row_count(),
            result.execution_time
        );

        match &report.emission {
            Emission::Console => emit::write_line(out, &report.label, &result)?,
            Emission::File(path) => emit::write_csv(path, &result).await?,
        }

        Ok(result.row_count())
    }

    /// Opens a session, runs the report query and always closes the session.
    async fn fetch(&self, report: &ReportDefinition) -> Result<QueryResult> {
        let mut client = self.connector.connect().await?;

        let result = client.execute_query(&report.query).await;
        let closed = client.close().await;

        match (result, closed) {
            (Ok(result), Ok(())) => Ok(result),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    warn!("Closing session after failed query: {}", close_err);
                }
                Err(e)
            }
        }
    }
}

fn failure_message(report: &str, err: &CatalogError) -> String {
    format!("Report '{report}' failed: {err}")
}

/// Writes a listing of the given reports without connecting.
pub fn list_reports<W: Write>(out: &mut W, reports: &[ReportDefinition]) -> Result<()> {
    for report in reports {
        writeln!(out, "{:<22} {:<30} {}", report.name, report.label, report.emission)
            .map_err(|e| CatalogError::io("<stdout>", e))?;
    }
    Ok(())
}
