//! Main analysis orchestrator for reqlint
//!
//! CDD Principle: Domain Services - Analyzer orchestrates the rule engine over requirements
//! - Turns one record into one checked AnalysisResult (defects, rule suggestions, score)
//! - Runs batches sequentially or on rayon, always preserving input order
//! - Isolates malformed representations so one bad record never sinks the batch

use crate::domain::errors::{LintError, LintResult};
use crate::domain::report::LintReport;
use crate::domain::requirements::{AnalysisResult, RequirementRecord};
use crate::rules::{compute_score, derive_suggestions, RuleEngine};
use rayon::prelude::*;
use serde_json::Value;
use std::time::Instant;

/// Orchestrates the rule engine over requirement records
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    engine: RuleEngine,
}

/// Options for customizing analysis behavior
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Whether to use parallel processing
    pub parallel: bool,
    /// Abort a report on the first rejected record instead of recording it
    pub fail_fast: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            fail_fast: false,
        }
    }
}

impl Analyzer {
    /// Create an analyzer around the built-in rule engine
    pub fn new() -> Self {
        Self {
            engine: RuleEngine::new(),
        }
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    /// Run every check against one record. Never fails.
    pub fn analyze_requirement(&self, requirement: &RequirementRecord) -> AnalysisResult {
        let defects = self.engine.detect(requirement);
        let suggestions = derive_suggestions(&defects);
        let score = compute_score(&defects);

        tracing::debug!(
            "Analyzed '{}': {} defect(s), score {}",
            requirement.id(),
            defects.len(),
            score
        );

        AnalysisResult::checked(requirement.clone(), defects, suggestions, score)
    }

    /// One result per record, in input order
    pub fn analyze_requirements(
        &self,
        requirements: &[RequirementRecord],
        options: &AnalysisOptions,
    ) -> Vec<AnalysisResult> {
        if options.parallel && requirements.len() > 1 {
            requirements
                .par_iter()
                .map(|r| self.analyze_requirement(r))
                .collect()
        } else {
            requirements
                .iter()
                .map(|r| self.analyze_requirement(r))
                .collect()
        }
    }

    /// Analyze a loosely typed record; malformed input is an engine-input error
    pub fn analyze_representation(&self, value: &Value) -> LintResult<AnalysisResult> {
        if !value.is_object() {
            return Err(LintError::engine_input(format!(
                "Expected a requirement record object, got {}",
                kind_of(value)
            )));
        }

        let requirement = RequirementRecord::from_representation(value)
            .map_err(|e| LintError::engine_input(format!("Malformed requirement record: {e}")))?;

        Ok(self.analyze_requirement(&requirement))
    }

    /// Per-record isolation: each position carries its own result or error
    pub fn analyze_representations(
        &self,
        values: &[Value],
        options: &AnalysisOptions,
    ) -> Vec<LintResult<AnalysisResult>> {
        if options.parallel && values.len() > 1 {
            values
                .par_iter()
                .map(|v| self.analyze_representation(v))
                .collect()
        } else {
            values
                .iter()
                .map(|v| self.analyze_representation(v))
                .collect()
        }
    }

    /// Analyze typed records straight into a report
    pub fn analyze_into_report(
        &self,
        requirements: &[RequirementRecord],
        options: &AnalysisOptions,
    ) -> LintReport {
        let start_time = Instant::now();
        let mut report = LintReport::new();

        for result in self.analyze_requirements(requirements, options) {
            report.add_result(result);
        }

        report.set_execution_time(start_time.elapsed().as_millis() as u64);
        report
    }

    /// Analyze representations into a report, recording rejected positions
    pub fn analyze_values_into_report(
        &self,
        values: &[Value],
        options: &AnalysisOptions,
    ) -> LintResult<LintReport> {
        let start_time = Instant::now();
        let mut report = LintReport::new();

        for (position, outcome) in self
            .analyze_representations(values, options)
            .into_iter()
            .enumerate()
        {
            match outcome {
                Ok(result) => report.add_result(result),
                Err(e) => {
                    if options.fail_fast {
                        return Err(e);
                    }
                    tracing::warn!("Rejected record at position {}: {}", position, e);
                    report.add_rejection(position, e.to_string());
                }
            }
        }

        report.set_execution_time(start_time.elapsed().as_millis() as u64);
        Ok(report)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Analyze one record with the built-in engine
pub fn analyze_requirement(requirement: &RequirementRecord) -> AnalysisResult {
    Analyzer::new().analyze_requirement(requirement)
}

/// Analyze a batch of records with the built-in engine
pub fn analyze_requirements(
    requirements: &[RequirementRecord],
    options: &AnalysisOptions,
) -> Vec<AnalysisResult> {
    Analyzer::new().analyze_requirements(requirements, options)
}

/// Analyze one loosely typed record with the built-in engine
pub fn analyze_representation(value: &Value) -> LintResult<AnalysisResult> {
    Analyzer::new().analyze_representation(value)
}

/// Analyze a batch of loosely typed records with the built-in engine
pub fn analyze_representations(
    values: &[Value],
    options: &AnalysisOptions,
) -> Vec<LintResult<AnalysisResult>> {
    Analyzer::new().analyze_representations(values, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::requirements::{Severity, DISPLAY_AT_RISK, DISPLAY_OK, STATUS_CHECKED};
    use rstest::rstest;
    use serde_json::json;

    fn record(id: &str, text: &str, method: &str, criteria: &str) -> RequirementRecord {
        RequirementRecord::builder(id)
            .text(text)
            .verification_method(method)
            .acceptance_criteria(criteria)
            .build()
            .unwrap()
    }

    fn rule_ids(result: &AnalysisResult) -> Vec<&str> {
        result.defects().iter().map(|d| d.rule_id()).collect()
    }

    #[test]
    fn test_scenario_weak_and_vague_untestable() {
        let result = analyze_requirement(&record("REQ-A", "The system should be fast.", "", ""));

        assert_eq!(rule_ids(&result), vec!["AMB-001", "AMB-002", "TST-001"]);
        assert_eq!(result.defects()[2].severity(), Severity::Major);
        assert_eq!(result.score(), Some(55));
        assert_eq!(result.suggestions().len(), 3);
        assert_eq!(result.display_status(), DISPLAY_AT_RISK);
    }

    #[test]
    fn test_scenario_clean_requirement() {
        let result = analyze_requirement(&record(
            "REQ-B",
            "The braking system shall stop the train within 800 m from 120 km/h on dry rail.",
            "Test",
            "Stopping distance measured over 10 runs is at most 800 m.",
        ));

        assert!(result.defects().is_empty());
        assert!(result.suggestions().is_empty());
        assert_eq!(result.score(), Some(100));
        assert_eq!(result.status(), STATUS_CHECKED);
        assert_eq!(result.display_status(), DISPLAY_OK);
    }

    #[test]
    fn test_scenario_short_acceptance_criteria() {
        let result = analyze_requirement(&record(
            "REQ-C",
            "The system shall export a report.",
            "Test",
            "Works.",
        ));

        assert_eq!(rule_ids(&result), vec!["AC-001"]);
        assert_eq!(result.score(), Some(90));
    }

    #[test]
    fn test_scenario_vague_acceptance_criteria() {
        let result = analyze_requirement(&record(
            "REQ-D",
            "The system shall write an audit log entry per login.",
            "Test",
            "Logging is secure and adequate.",
        ));

        let ids = rule_ids(&result);
        assert_eq!(ids.iter().filter(|id| **id == "AC-002").count(), 1);
        assert!(!ids.contains(&"AC-001"));
        assert!(!ids.iter().any(|id| id.starts_with("TST")));
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn test_batch_preserves_order(#[case] parallel: bool) {
        let records: Vec<_> = (0..20)
            .map(|i| record(&format!("REQ-{i:03}"), "The door shall open.", "Test", ""))
            .collect();
        let options = AnalysisOptions {
            parallel,
            ..Default::default()
        };

        let results = analyze_requirements(&records, &options);

        assert_eq!(results.len(), records.len());
        for (result, record) in results.iter().zip(&records) {
            assert_eq!(result.requirement().id(), record.id());
            assert_eq!(rule_ids(result), vec!["TST-002"]);
        }
    }

    #[test]
    fn test_empty_batch() {
        assert!(analyze_requirements(&[], &AnalysisOptions::default()).is_empty());
    }

    #[test]
    fn test_representation_rejects_non_record() {
        let err = analyze_representation(&json!("REQ-1")).unwrap_err();
        assert!(matches!(err, LintError::EngineInput { .. }));

        let err = analyze_representation(&json!({"id": "", "text": "x"})).unwrap_err();
        assert!(matches!(err, LintError::EngineInput { .. }));
    }

    #[test]
    fn test_representation_batch_isolates_failures() {
        let values = vec![
            json!({"id": "REQ-1", "text": "The pump should start."}),
            json!({"id": "REQ-2"}),
            json!(42),
            json!({"req_id": "REQ-4", "text": "The pump shall start.", "verification_method": "Test"}),
        ];

        let outcomes = analyze_representations(&values, &AnalysisOptions::default());

        assert_eq!(outcomes.len(), 4);
        assert!(outcomes[0].is_ok());
        assert!(outcomes[1].is_err());
        assert!(outcomes[2].is_err());
        let last = outcomes[3].as_ref().unwrap();
        assert_eq!(last.requirement().id(), "REQ-4");
    }

    #[test]
    fn test_values_into_report() {
        let analyzer = Analyzer::new();
        let values = vec![
            json!({"id": "REQ-1", "text": "The pump should start."}),
            json!(null),
        ];

        let report = analyzer
            .analyze_values_into_report(&values, &AnalysisOptions::default())
            .unwrap();
        assert_eq!(report.summary.total_requirements, 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].position, 1);

        let strict = AnalysisOptions {
            fail_fast: true,
            ..Default::default()
        };
        assert!(analyzer.analyze_values_into_report(&values, &strict).is_err());
    }
}
