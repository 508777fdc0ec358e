//! reqlint - Deterministic quality linting for natural-language requirements
//!
//! Architecture: Clean Architecture - Library interface serves as the application layer
//! - Pure rule engine separated from file formats, terminals and network calls
//! - Clean boundaries between core checks and the optional suggestion assistant
//! - Facade wires configuration, loading, analysis, enrichment and reporting

pub mod analyzer;
pub mod assistant;
pub mod config;
pub mod domain;
pub mod ingest;
pub mod report;
pub mod rules;

// Re-export main types for convenient access
pub use domain::errors::{LintError, LintResult};
pub use domain::report::{DefectCounts, LintReport, LintSummary, RejectedRecord};
pub use domain::requirements::{
    AnalysisResult, Defect, RequirementBuilder, RequirementRecord, Severity, Suggestion,
    SuggestionOrigin,
};

pub use config::{AssistantConfig, ConfigBuilder, InputConfig, LinterConfig, ReportConfig};

pub use analyzer::{AnalysisOptions, Analyzer};

pub use assistant::{DisabledSuggester, OpenAiSuggester, Suggester};

pub use ingest::{LoadedInput, LoadedRecords, RequirementLoader};

pub use report::{OutputFormat, ReportFormatter, ReportOptions};

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Main linter providing high-level operations over requirement sets
pub struct QualityLinter {
    config: LinterConfig,
    analyzer: Analyzer,
    loader: RequirementLoader,
    suggester: Arc<dyn Suggester>,
    report_formatter: ReportFormatter,
}

impl QualityLinter {
    /// Create a linter with the given configuration
    pub fn new_with_config(config: LinterConfig) -> LintResult<Self> {
        config.validate()?;

        let suggester = assistant::suggester_from_config(&config.assistant);
        let report_formatter = ReportFormatter::new(ReportOptions::from_config(&config.report));

        Ok(Self {
            analyzer: Analyzer::new(),
            loader: RequirementLoader::new(config.input.clone()),
            suggester,
            report_formatter,
            config,
        })
    }

    /// Create a linter with default configuration
    pub fn new() -> LintResult<Self> {
        Self::new_with_config(LinterConfig::default())
    }

    /// Create a linter loading configuration from file
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> LintResult<Self> {
        let config = LinterConfig::load_from_file(path)?;
        Self::new_with_config(config)
    }

    /// Replace the suggestion collaborator
    pub fn with_suggester(mut self, suggester: Arc<dyn Suggester>) -> Self {
        self.suggester = suggester;
        self
    }

    /// Set custom report formatter
    pub fn with_report_formatter(mut self, formatter: ReportFormatter) -> Self {
        self.report_formatter = formatter;
        self
    }

    pub fn config(&self) -> &LinterConfig {
        &self.config
    }

    pub fn suggester_name(&self) -> &str {
        self.suggester.name()
    }

    /// Analyze already-built records
    pub fn analyze_records(
        &self,
        records: &[RequirementRecord],
        options: &AnalysisOptions,
    ) -> LintReport {
        self.analyzer.analyze_into_report(records, options)
    }

    /// Analyze loosely typed records; malformed ones are recorded as rejected
    pub fn analyze_values(&self, values: &[Value], options: &AnalysisOptions) -> LintResult<LintReport> {
        self.analyzer.analyze_values_into_report(values, options)
    }

    /// Load every input path and analyze it into one report
    pub fn lint_paths<P: AsRef<Path>>(
        &self,
        paths: &[P],
        options: &AnalysisOptions,
    ) -> LintResult<LintReport> {
        let start_time = Instant::now();
        let inputs = self.loader.load_paths(paths)?;

        let mut report = LintReport::new();
        let mut digests = Vec::new();

        for input in &inputs {
            let partial = match &input.records {
                LoadedRecords::Typed(records) => self.analyze_records(records, options),
                LoadedRecords::Raw(values) => self.analyze_values(values, options)?,
            };
            report.merge(partial);
            report.summary.skipped_rows += input.skipped_rows;
            digests.push(input.digest.as_str());
        }

        let labels: Vec<String> = inputs.iter().map(|i| i.path.display().to_string()).collect();
        if !labels.is_empty() {
            report.set_source(labels.join(", "));
        }
        match digests.as_slice() {
            [] => {}
            [single] => report.set_input_digest(*single),
            many => report.set_input_digest(ingest::digest_bytes(many.join("\n").as_bytes())),
        }

        report.set_execution_time(start_time.elapsed().as_millis() as u64);

        tracing::info!(
            "Linted {} requirement(s) from {} file(s): {} at risk, global score {:.1}",
            report.summary.total_requirements,
            inputs.len(),
            report.summary.at_risk,
            report.global_score()
        );

        Ok(report)
    }

    /// Append assistant suggestions to at-risk results; returns how many were enriched
    pub async fn enrich_with_suggestions(&self, report: &mut LintReport) -> usize {
        let candidates = report
            .results
            .iter()
            .filter(|r| r.has_defects() && !r.is_enriched())
            .count();
        tracing::info!(
            "Assistant '{}': {}/{} candidate(s) with defects",
            self.suggester.name(),
            candidates,
            report.results.len()
        );

        let mut enriched = 0;
        for result in report.results.iter_mut() {
            if !result.has_defects() || result.is_enriched() {
                continue;
            }

            let suggestions = self
                .suggester
                .suggest(result.requirement(), result.defects())
                .await;
            if suggestions.is_empty() {
                continue;
            }

            match result.append_suggestions(suggestions) {
                Ok(()) => enriched += 1,
                Err(e) => tracing::warn!(
                    "Suggestions for '{}' discarded: {}",
                    result.requirement().id(),
                    e
                ),
            }
        }

        enriched
    }

    /// Format a lint report for output
    pub fn format_report(&self, report: &LintReport, format: OutputFormat) -> LintResult<String> {
        self.report_formatter.format_report(report, format)
    }

    /// Write one `reqlint_report.<ext>` file per format into `dir`
    pub fn write_reports<P: AsRef<Path>>(
        &self,
        report: &LintReport,
        dir: P,
        formats: &[OutputFormat],
    ) -> LintResult<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let mut written = Vec::new();
        for format in formats {
            let path = dir.join(format.file_name());
            let file = fs::File::create(&path)?;
            self.report_formatter.write_report(report, *format, file)?;
            tracing::info!("Report written to {}", path.display());
            written.push(path);
        }

        Ok(written)
    }
}

/// Convenience function to lint files with default settings, including suggestions
pub async fn lint_files<P: AsRef<Path>>(paths: &[P]) -> LintResult<LintReport> {
    let linter = QualityLinter::new()?;
    let mut report = linter.lint_paths(paths, &AnalysisOptions::default())?;
    linter.enrich_with_suggestions(&mut report).await;
    Ok(report)
}

/// Fail when any defect reaches `threshold`
pub fn quality_gate(report: &LintReport, threshold: Severity) -> LintResult<()> {
    let count = report.summary.defects_by_severity.at_or_above(threshold);
    if count > 0 {
        return Err(LintError::QualityGate { count, threshold });
    }
    Ok(())
}
