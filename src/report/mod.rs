//! Report definitions.
//!
//! A report is plain data: a name, a label, one fixed query and where its
//! result goes. The driver iterates a list of these in order.

mod catalog;
mod sql;

pub use catalog::builtin_reports;
pub use sql::{quote_identifier_path, quote_literal};

use std::fmt;
use std::path::PathBuf;

/// Where a report's result is emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    /// One readable line on standard output.
    Console,
    /// A CSV file at the given path.
    File(PathBuf),
}

impl fmt::Display for Emission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Console => write!(f, "console"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A single diagnostic report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDefinition {
    /// Stable identifier used by `--only`.
    pub name: String,
    /// Human-readable prefix for console output.
    pub label: String,
    /// The parameterless query to run.
    pub query: String,
    /// Emission target.
    pub emission: Emission,
}

impl ReportDefinition {
    /// A report printed to the console.
    pub fn console(
        name: impl Into<String>,
        label: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            query: query.into(),
            emission: Emission::Console,
        }
    }

    /// A report written to a CSV file.
    pub fn file(
        name: impl Into<String>,
        label: impl Into<String>,
        query: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            query: query.into(),
            emission: Emission::File(path.into()),
        }
    }
}

/// Keeps only the named reports, preserving their original order.
///
/// Returns the unknown names if any were requested.
pub fn select(
    reports: Vec<ReportDefinition>,
    names: &[String],
) -> std::result::Result<Vec<ReportDefinition>, Vec<String>> {
    if names.is_empty() {
        return Ok(reports);
    }

    let unknown: Vec<String> = names
        .iter()
        .filter(|name| !reports.iter().any(|r| &r.name == *name))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(unknown);
    }

    Ok(reports
        .into_iter()
        .filter(|r| names.contains(&r.name))
        .collect())
}
