//! Run-level aggregate of analysis results
//!
//! LintReport plays the role of aggregate root for one linter run: it owns every
//! AnalysisResult, remembers which records were rejected, and keeps the summary
//! statistics in step with the results it holds.

use crate::domain::requirements::{AnalysisResult, Severity, DISPLAY_AT_RISK, DISPLAY_OK};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Count of defects by severity level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectCounts {
    pub info: usize,
    pub minor: usize,
    pub major: usize,
    pub critical: usize,
}

impl DefectCounts {
    /// Total number of defects across all severities
    pub fn total(&self) -> usize {
        self.info + self.minor + self.major + self.critical
    }

    /// Add a defect to the counts
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Info => self.info += 1,
            Severity::Minor => self.minor += 1,
            Severity::Major => self.major += 1,
            Severity::Critical => self.critical += 1,
        }
    }

    /// Number of defects at or above the given severity
    pub fn at_or_above(&self, threshold: Severity) -> usize {
        Severity::ALL
            .iter()
            .filter(|s| **s >= threshold)
            .map(|s| match s {
                Severity::Info => self.info,
                Severity::Minor => self.minor,
                Severity::Major => self.major,
                Severity::Critical => self.critical,
            })
            .sum()
    }
}

/// Summary statistics for a lint report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LintSummary {
    /// Number of requirements analyzed
    pub total_requirements: usize,
    /// Number of requirements with at least one defect
    pub at_risk: usize,
    /// Defects by severity level
    pub defects_by_severity: DefectCounts,
    /// Rows skipped during ingestion (no title and no text)
    pub skipped_rows: usize,
    /// Total execution time in milliseconds
    pub execution_time_ms: u64,
}

/// A record that could not be analyzed, reported at its input position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRecord {
    /// Zero-based position in the input batch
    pub position: usize,
    /// Why the record was rejected
    pub message: String,
}

/// Complete outcome of one linter run
#[derive(Debug, Clone)]
pub struct LintReport {
    /// Unique identifier of this run
    pub run_id: Uuid,
    /// When the report was created
    pub generated_at: DateTime<Utc>,
    /// Label of the input (usually a file path)
    pub source: Option<String>,
    /// SHA-256 digest of the input bytes, when loaded from files
    pub input_digest: Option<String>,
    /// Per-requirement results in input order
    pub results: Vec<AnalysisResult>,
    /// Records that failed validation
    pub rejected: Vec<RejectedRecord>,
    /// Summary statistics
    pub summary: LintSummary,
}

impl LintReport {
    /// Create a new empty report
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            source: None,
            input_digest: None,
            results: Vec::new(),
            rejected: Vec::new(),
            summary: LintSummary::default(),
        }
    }

    /// Add a result to the report
    pub fn add_result(&mut self, result: AnalysisResult) {
        self.summary.total_requirements += 1;
        if result.has_defects() {
            self.summary.at_risk += 1;
        }
        for defect in result.defects() {
            self.summary.defects_by_severity.add(defect.severity());
        }
        self.results.push(result);
    }

    /// Record a rejected input
    pub fn add_rejection(&mut self, position: usize, message: impl Into<String>) {
        self.rejected.push(RejectedRecord {
            position,
            message: message.into(),
        });
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = Some(source.into());
    }

    pub fn set_input_digest(&mut self, digest: impl Into<String>) {
        self.input_digest = Some(digest.into());
    }

    pub fn set_skipped_rows(&mut self, count: usize) {
        self.summary.skipped_rows = count;
    }

    pub fn set_execution_time(&mut self, duration_ms: u64) {
        self.summary.execution_time_ms = duration_ms;
    }

    /// Whether any requirement has a defect
    pub fn has_defects(&self) -> bool {
        self.summary.defects_by_severity.total() > 0
    }

    /// Whether any defect reaches the given severity
    pub fn has_defects_at_or_above(&self, threshold: Severity) -> bool {
        self.summary.defects_by_severity.at_or_above(threshold) > 0
    }

    /// Mean score of scored results, one decimal; 0.0 when nothing was scored
    pub fn global_score(&self) -> f64 {
        let scores: Vec<u32> = self.results.iter().filter_map(|r| r.score()).collect();
        if scores.is_empty() {
            return 0.0;
        }
        let mean = scores.iter().map(|s| f64::from(*s)).sum::<f64>() / scores.len() as f64;
        (mean * 10.0).round() / 10.0
    }

    /// OK only when every result displays OK
    pub fn global_status(&self) -> &'static str {
        if self.results.iter().all(|r| r.display_status() == DISPLAY_OK) {
            DISPLAY_OK
        } else {
            DISPLAY_AT_RISK
        }
    }

    /// Merge another report into this one
    pub fn merge(&mut self, other: LintReport) {
        let offset = self.results.len() + self.rejected.len();
        for result in other.results {
            self.add_result(result);
        }
        for rejected in other.rejected {
            self.add_rejection(offset + rejected.position, rejected.message);
        }
        self.summary.skipped_rows += other.summary.skipped_rows;
        self.summary.execution_time_ms += other.summary.execution_time_ms;
    }

    /// Plain key/value view of the whole run
    pub fn to_representation(&self) -> Value {
        serde_json::json!({
            "run_id": self.run_id.to_string(),
            "generated_at": self.generated_at.to_rfc3339(),
            "source": self.source,
            "input_digest": self.input_digest,
            "summary": {
                "total_requirements": self.summary.total_requirements,
                "at_risk": self.summary.at_risk,
                "defects_by_severity": self.summary.defects_by_severity,
                "skipped_rows": self.summary.skipped_rows,
                "execution_time_ms": self.summary.execution_time_ms,
                "global_score": self.global_score(),
                "global_status": self.global_status(),
            },
            "results": self.results.iter().map(AnalysisResult::to_representation).collect::<Vec<_>>(),
            "rejected": self.rejected,
        })
    }
}

impl Default for LintReport {
    fn default() -> Self {
        Self::new()
    }
}
