//! Report generation with multiple output formats
//!
//! CDD Principle: Anti-Corruption Layer - Formatters translate domain objects to external formats
//! - LintReport (domain) is converted to terminal, JSON, CSV and HTML representations
//! - Each formatter encapsulates the rules for its specific output format
//! - Severity filtering only hides rendered defects; scores are never recomputed

use crate::config::ReportConfig;
use crate::domain::errors::{LintError, LintResult};
use crate::domain::report::LintReport;
use crate::domain::requirements::{
    AnalysisResult, Defect, Severity, SuggestionOrigin, DISPLAY_AT_RISK, DISPLAY_OK,
};
use crate::ingest::csv::escape as csv_escape;
use serde_json::Value as JsonValue;
use std::io::Write;

/// Base name of report files written to an output directory
pub const REPORT_BASENAME: &str = "reqlint_report";

/// Columns of the CSV report, in order
pub const CSV_COLUMNS: [&str; 16] = [
    "id",
    "title",
    "text",
    "source",
    "system",
    "component",
    "priority",
    "verification_method",
    "acceptance_criteria",
    "status",
    "display_status",
    "score",
    "defects_count",
    "suggestions_count",
    "defects_json",
    "suggestions_json",
];

/// Supported output formats for lint reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format with colors
    Human,
    /// JSON format for programmatic consumption
    Json,
    /// One row per requirement for spreadsheets
    Csv,
    /// Standalone HTML page
    Html,
}

impl OutputFormat {
    /// Parse format from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "html" => Some(Self::Html),
            _ => None,
        }
    }

    /// Get all available format names
    pub fn all_formats() -> &'static [&'static str] {
        &["human", "json", "csv", "html"]
    }

    /// File extension used when the report is written to disk
    pub fn extension(self) -> &'static str {
        match self {
            Self::Human => "txt",
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Html => "html",
        }
    }

    /// `reqlint_report.<ext>`
    pub fn file_name(self) -> String {
        format!("{REPORT_BASENAME}.{}", self.extension())
    }
}

/// Options for customizing report output
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Whether to use colored output (for human format)
    pub use_colors: bool,
    /// Whether to show suggestions under each requirement
    pub show_suggestions: bool,
    /// Whether to show the evidence excerpt of each defect
    pub show_evidence: bool,
    /// Minimum severity level to include
    pub min_severity: Option<Severity>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            use_colors: true,
            show_suggestions: true,
            show_evidence: true,
            min_severity: None,
        }
    }
}

impl ReportOptions {
    /// Options seeded from the report section of the configuration
    pub fn from_config(config: &ReportConfig) -> Self {
        Self {
            use_colors: true,
            show_suggestions: config.show_suggestions,
            show_evidence: config.show_evidence,
            min_severity: config.min_severity,
        }
    }
}

/// Main report formatter that dispatches to specific formatters
pub struct ReportFormatter {
    options: ReportOptions,
}

impl ReportFormatter {
    /// Create a new report formatter with options
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    /// Format a lint report in the specified format
    pub fn format_report(&self, report: &LintReport, format: OutputFormat) -> LintResult<String> {
        match format {
            OutputFormat::Human => Ok(self.format_human(report)),
            OutputFormat::Json => self.format_json(report),
            OutputFormat::Csv => self.format_csv(report),
            OutputFormat::Html => Ok(self.format_html(report)),
        }
    }

    /// Write a formatted report to a writer
    pub fn write_report<W: Write>(
        &self,
        report: &LintReport,
        format: OutputFormat,
        mut writer: W,
    ) -> LintResult<()> {
        let formatted = self.format_report(report, format)?;
        writer.write_all(formatted.as_bytes())?;
        Ok(())
    }

    /// Defects at or above the configured minimum severity
    fn filter_defects<'a>(&self, defects: &'a [Defect]) -> Vec<&'a Defect> {
        defects
            .iter()
            .filter(|d| match self.options.min_severity {
                Some(min_severity) => d.severity() >= min_severity,
                None => true,
            })
            .collect()
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.options.use_colors {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    /// Format report in human-readable format
    fn format_human(&self, report: &LintReport) -> String {
        let mut output = String::new();

        if !report.has_defects() {
            output.push_str(&format!("✅ {}\n", self.paint("32", "No requirement defects found")));
        } else {
            let blocking = report.has_defects_at_or_above(Severity::Major);
            let (icon, color) = if blocking { ("❌", "31") } else { ("⚠️", "33") };
            output.push_str(&format!(
                "{} {}\n",
                icon,
                self.paint(color, "Requirement Defects Found")
            ));
        }
        output.push('\n');

        for result in &report.results {
            self.format_human_result(&mut output, result);
        }

        for rejected in &report.rejected {
            output.push_str(&format!(
                "⛔ {} #{}: {}\n",
                self.paint("31", "Rejected record"),
                rejected.position,
                rejected.message
            ));
        }
        if !report.rejected.is_empty() {
            output.push('\n');
        }

        output.push_str(&self.format_summary(report));
        output
    }

    fn format_human_result(&self, output: &mut String, result: &AnalysisResult) {
        let status = result.display_status();
        let status_color = match status {
            DISPLAY_OK => "32",
            DISPLAY_AT_RISK => "33",
            _ => "2",
        };
        let score = result.score().map_or("-".to_string(), |s| s.to_string());

        output.push_str(&format!(
            "📄 {} [{}] score {}\n",
            result.requirement().id(),
            self.paint(status_color, status),
            score
        ));

        for defect in self.filter_defects(result.defects()) {
            let severity_color = match defect.severity() {
                Severity::Critical | Severity::Major => "31",
                Severity::Minor => "33",
                Severity::Info => "36",
            };
            output.push_str(&format!(
                "  {} [{}] {}\n",
                self.paint("2", defect.rule_id()),
                self.paint(severity_color, defect.severity().as_str()),
                defect.message()
            ));

            if self.options.show_evidence && !defect.evidence().is_empty() {
                output.push_str(&format!("    {}\n", self.paint("2", &format!("│ {}", defect.evidence()))));
            }
        }

        if self.options.show_suggestions {
            for suggestion in result.suggestions() {
                let line = format!("💡 {} ({})", suggestion.message(), suggestion.origin());
                output.push_str(&format!("    {}\n", self.paint("32", &line)));
            }
        }

        output.push('\n');
    }

    /// Format the summary section
    fn format_summary(&self, report: &LintReport) -> String {
        let summary = &report.summary;
        let counts = &summary.defects_by_severity;
        let execution_time = (summary.execution_time_ms as f64) / 1000.0;

        let mut parts = Vec::new();
        for (count, label, color) in [
            (counts.critical, "critical", "31"),
            (counts.major, "major", "31"),
            (counts.minor, "minor", "33"),
            (counts.info, "info", "36"),
        ] {
            if count > 0 {
                parts.push(self.paint(color, &format!("{count} {label}")));
            }
        }
        let defects = if parts.is_empty() {
            self.paint("32", "0 defects")
        } else {
            parts.join(", ")
        };

        let mut line = format!(
            "📊 {} {} requirement{}, {} at risk, {} (global score {:.1}, {})",
            self.paint("1", "Summary:"),
            summary.total_requirements,
            if summary.total_requirements == 1 { "" } else { "s" },
            summary.at_risk,
            defects,
            report.global_score(),
            report.global_status()
        );
        if summary.skipped_rows > 0 {
            line.push_str(&format!(", {} row(s) skipped", summary.skipped_rows));
        }
        if !report.rejected.is_empty() {
            line.push_str(&format!(", {} rejected", report.rejected.len()));
        }
        line.push_str(&format!(" in {execution_time:.1}s\n"));
        line
    }

    /// Format report in JSON format
    fn format_json(&self, report: &LintReport) -> LintResult<String> {
        let mut value = report.to_representation();

        if let Some(results) = value.get_mut("results").and_then(JsonValue::as_array_mut) {
            for (entry, result) in results.iter_mut().zip(&report.results) {
                entry["defects"] = JsonValue::Array(
                    self.filter_defects(result.defects())
                        .into_iter()
                        .map(Defect::to_representation)
                        .collect(),
                );
                entry["display_status"] = JsonValue::from(result.display_status());
            }
        }

        serde_json::to_string_pretty(&value)
            .map_err(|e| LintError::report(format!("JSON serialization failed: {e}")))
    }

    /// Format report as CSV, one row per requirement
    fn format_csv(&self, report: &LintReport) -> LintResult<String> {
        let mut output = CSV_COLUMNS.join(",");
        output.push('\n');

        for result in &report.results {
            let record = result.requirement();
            let defects: Vec<JsonValue> = self
                .filter_defects(result.defects())
                .into_iter()
                .map(Defect::to_representation)
                .collect();
            let suggestions: Vec<JsonValue> =
                result.suggestions().iter().map(|s| s.to_representation()).collect();

            let defects_json = serde_json::to_string(&defects)
                .map_err(|e| LintError::report(format!("CSV serialization failed: {e}")))?;
            let suggestions_json = serde_json::to_string(&suggestions)
                .map_err(|e| LintError::report(format!("CSV serialization failed: {e}")))?;

            let cells = [
                record.id().to_string(),
                record.title().to_string(),
                record.text().to_string(),
                record.source().to_string(),
                record.system().to_string(),
                record.component().to_string(),
                record.priority().to_string(),
                record.verification_method().to_string(),
                record.acceptance_criteria().to_string(),
                result.status().to_string(),
                result.display_status().to_string(),
                result.score().map(|s| s.to_string()).unwrap_or_default(),
                defects.len().to_string(),
                suggestions.len().to_string(),
                defects_json,
                suggestions_json,
            ];

            let row: Vec<String> = cells.iter().map(|cell| csv_escape(cell)).collect();
            output.push_str(&row.join(","));
            output.push('\n');
        }

        Ok(output)
    }

    /// Format report as a standalone HTML page
    fn format_html(&self, report: &LintReport) -> String {
        let rows: Vec<String> = report
            .results
            .iter()
            .map(|result| self.format_html_row(result))
            .collect();

        let status_class = if report.global_status() == DISPLAY_OK { "ok" } else { "risk" };
        let source = report.source.as_deref().unwrap_or("-");

        format!(
            r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta name="viewport" content="width=device-width, initial-scale=1"/>
  <title>Requirement Quality Report</title>
  <style>
    body {{ font-family: Arial, sans-serif; margin: 24px; background: #f5f7fa; color: #333; }}
    header {{ font-size: 24px; font-weight: bold; padding-bottom: 10px; margin-bottom: 20px; border-bottom: 2px solid #888; }}
    .meta {{ color: #555; margin: 10px 0 18px 0; }}
    .ok {{ color: #2e7d32; font-weight: bold; }}
    .risk {{ color: #c62828; font-weight: bold; }}
    table {{ border-collapse: collapse; width: 100%; background: #fff; }}
    th, td {{ border: 1px solid #ddd; padding: 8px; vertical-align: top; }}
    th {{ background: #f0f0f0; text-align: left; }}
    ul {{ margin: 0; padding-left: 18px; }}
  </style>
</head>
<body>
  <header>Requirement Quality Report</header>
  <div class="meta">
    Generated {generated} &middot; Source: {source} &middot; Requirements: {total} &middot;
    Global score: {score:.1} &middot; Status: <span class="{status_class}">{status}</span>
  </div>
  <table>
    <thead>
      <tr>
        <th>ID</th><th>Title</th><th>Text</th><th>Source</th>
        <th>Status</th><th>Score</th><th>Defects</th><th>AI suggestions</th>
      </tr>
    </thead>
    <tbody>
{rows}
    </tbody>
  </table>
</body>
</html>
"#,
            generated = report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            source = escape_html(source),
            total = report.summary.total_requirements,
            score = report.global_score(),
            status = escape_html(report.global_status()),
            rows = rows.join("\n"),
        )
    }

    fn format_html_row(&self, result: &AnalysisResult) -> String {
        let record = result.requirement();
        let defects = self.filter_defects(result.defects());

        let defects_cell = if defects.is_empty() {
            r#"<span class="ok">OK</span>"#.to_string()
        } else {
            let items: String = defects
                .iter()
                .map(|d| {
                    format!(
                        "<li><b>{}</b> [{}] {}</li>",
                        escape_html(d.rule_id()),
                        escape_html(d.severity().as_str()),
                        escape_html(d.message())
                    )
                })
                .collect();
            format!("<ul>{items}</ul>")
        };

        let ai: Vec<String> = result
            .suggestions_from(SuggestionOrigin::Ai)
            .map(|s| format!("<li>{}</li>", escape_html(s.message())))
            .collect();
        let ai_cell = if ai.is_empty() {
            String::new()
        } else {
            format!("<ul>{}</ul>", ai.join(""))
        };

        let status = result.display_status();
        let status_class = if status == DISPLAY_OK { "ok" } else { "risk" };

        format!(
            r#"      <tr>
        <td>{id}</td>
        <td>{title}</td>
        <td style="white-space:pre-wrap">{text}</td>
        <td>{source}</td>
        <td><span class="{status_class}">{status}</span></td>
        <td style="text-align:right">{score}</td>
        <td>{defects_cell}</td>
        <td>{ai_cell}</td>
      </tr>"#,
            id = escape_html(record.id()),
            title = escape_html(record.title()),
            text = escape_html(record.text()),
            source = escape_html(record.source()),
            status = escape_html(status),
            score = result.score().map(|s| s.to_string()).unwrap_or_default(),
        )
    }
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self::new(ReportOptions::default())
    }
}

/// Escape HTML special characters
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
