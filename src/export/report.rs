//! Export report types for best-effort batch writes.
//!
//! An export never stops at the first problem. Everything that went wrong is
//! collected here so the caller can show the user a single summary.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Summary of one `export_all` run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ExportReport {
    /// Files that were written successfully, class list first.
    pub written: Vec<PathBuf>,
    /// Counts of exported elements.
    pub counts: ExportCounts,
    /// Problems encountered along the way.
    pub issues: Vec<ExportIssue>,
}

impl ExportReport {
    /// Create a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an issue to the report.
    pub fn add(&mut self, issue: ExportIssue) {
        self.issues.push(issue);
    }

    /// Number of files that could not be written.
    pub fn failure_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ExportSeverity::Failure)
            .count()
    }

    /// Number of skipped items.
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ExportSeverity::Warning)
            .count()
    }

    /// Returns true if every file was written.
    pub fn is_ok(&self) -> bool {
        self.failure_count() == 0
    }

    /// Returns true if nothing at all was skipped or failed.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Exported {} label(s), {} annotation(s) across {} image file(s)",
            self.counts.labels, self.counts.annotations, self.counts.images
        )?;

        let failures = self.failure_count();
        if failures > 0 {
            writeln!(f)?;
            writeln!(f, "Failures ({}):", failures)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == ExportSeverity::Failure)
            {
                writeln!(f, "  - {}", issue)?;
            }
        }

        let warnings = self.warning_count();
        if warnings > 0 {
            writeln!(f)?;
            writeln!(f, "Warnings ({}):", warnings)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == ExportSeverity::Warning)
            {
                writeln!(f, "  - {}", issue)?;
            }
        }

        Ok(())
    }
}

/// Counts of exported elements.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExportCounts {
    /// Per-image annotation files written.
    pub images: usize,
    /// Labels in the class list.
    pub labels: usize,
    /// Annotation lines written.
    pub annotations: usize,
}

/// A single problem met during export.
#[derive(Clone, Debug, Serialize)]
pub struct ExportIssue {
    pub severity: ExportSeverity,
    pub code: ExportIssueCode,
    /// File the issue relates to.
    pub path: PathBuf,
    pub message: String,
}

impl ExportIssue {
    /// Create a warning (something was skipped).
    pub fn warning(code: ExportIssueCode, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            severity: ExportSeverity::Warning,
            code,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a failure (a file was not written).
    pub fn failure(code: ExportIssueCode, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            severity: ExportSeverity::Failure,
            code,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ExportIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Severity level for export issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportSeverity {
    /// Something was skipped but the file was still written (or deliberately not).
    Warning,
    /// A file could not be written.
    Failure,
}

/// Stable issue codes for programmatic consumption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportIssueCode {
    /// An annotation's label is no longer in the registry; its line was skipped.
    DanglingLabel,
    /// The image has no known dimensions; no annotation file was written.
    UnusableImage,
    /// Writing a file failed.
    WriteFailed,
    /// The output path is the document file; nothing was written there.
    DocumentConflict,
    /// Another image with the same stem already owns the annotation file.
    SharedAnnotationFile,
}
