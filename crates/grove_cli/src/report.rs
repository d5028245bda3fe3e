//! Rendering findings for people and machines, and mapping them to exit codes.

use grove_core::{worst_severity, Finding, Severity};
use grove_snapshot::ReadFailure;
use serde::Serialize;
use std::fmt::Write as _;

use crate::engine::Analysis;

pub const EXIT_OK: i32 = 0;
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_WARNINGS: i32 = 2;
pub const EXIT_DRIFT: i32 = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub documents: usize,
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

impl Summary {
    fn count(documents: usize, findings: &[Finding], unreadable: usize) -> Self {
        let mut summary = Summary {
            documents,
            errors: unreadable,
            ..Summary::default()
        };
        for finding in findings {
            match finding.severity {
                Severity::Error => summary.errors += 1,
                Severity::Warning => summary.warnings += 1,
                Severity::Info => summary.info += 1,
            }
        }
        summary
    }
}

/// What `validate` prints. Contains nothing that varies between runs over
/// the same snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub snapshot_sha256: String,
    pub summary: Summary,
    pub timed_out: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unreadable: Vec<ReadFailure>,
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    /// Whole-vault report, or only the findings attached to `only`.
    pub fn from_analysis(analysis: &Analysis, only: Option<&str>) -> Self {
        let keep = |path: &str| only.map_or(true, |p| p == path);
        let findings: Vec<Finding> = analysis
            .findings
            .iter()
            .filter(|f| keep(&f.path) || (f.path.is_empty() && analysis.timed_out()))
            .cloned()
            .collect();
        let unreadable: Vec<ReadFailure> = analysis
            .unreadable
            .iter()
            .filter(|u| keep(&u.path))
            .cloned()
            .collect();
        let skipped: Vec<String> = analysis
            .skipped
            .iter()
            .filter(|p| keep(p))
            .cloned()
            .collect();
        let documents = if only.is_some() { 1 } else { analysis.file_count };
        Self {
            snapshot_sha256: analysis.snapshot_sha256.clone(),
            summary: Summary::count(documents, &findings, unreadable.len()),
            timed_out: analysis.timed_out(),
            skipped,
            unreadable,
            findings,
        }
    }

    /// 0 clean (info allowed), 1 any error, 2 warnings only.
    pub fn exit_code(&self) -> i32 {
        if !self.unreadable.is_empty() {
            return EXIT_ERROR;
        }
        match worst_severity(&self.findings) {
            Some(Severity::Error) => EXIT_ERROR,
            Some(Severity::Warning) => EXIT_WARNINGS,
            Some(Severity::Info) | None => EXIT_OK,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Findings grouped by document, in the engine's sort order.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "snapshot_sha256={}", self.snapshot_sha256);
        let _ = writeln!(
            out,
            "documents={} errors={} warnings={} info={}",
            self.summary.documents, self.summary.errors, self.summary.warnings, self.summary.info
        );
        if self.timed_out {
            let _ = writeln!(out, "timed_out=true skipped={}", self.skipped.len());
        }

        let mut current: Option<&str> = None;
        for finding in &self.findings {
            if current != Some(finding.path.as_str()) {
                let heading = if finding.path.is_empty() {
                    "(vault)"
                } else {
                    finding.path.as_str()
                };
                let _ = writeln!(out, "\n{heading}");
                current = Some(finding.path.as_str());
            }
            let line = finding
                .span
                .line
                .map(|l| l.to_string())
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                out,
                "  {line:>5}  {:<7}  {}  {}",
                finding.severity.as_str(),
                finding.rule_id(),
                finding.message
            );
        }

        if !self.unreadable.is_empty() {
            let _ = writeln!(out, "\nunreadable");
            for failure in &self.unreadable {
                let _ = writeln!(out, "  {}: {}", failure.path, failure.message);
            }
        }
        out
    }
}
