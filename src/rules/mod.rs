//! Rule engine for detecting requirement quality defects
//!
//! Architectural Principle: Service Layer - the engine runs a fixed, ordered battery of checks
//! - Each check is a pure function from a requirement to zero or more defects
//! - Defect order is detection order: checks run in catalog order and never re-sort
//! - Scoring folds severities into a bounded integer; suggestions mirror defects 1:1

pub mod catalog;
pub mod text;

use crate::domain::requirements::{Defect, RequirementRecord, Suggestion};
use catalog::RuleDescriptor;
use text::{compact_whitespace, excerpt, first_term, EXCERPT_RADIUS};

/// Weak modal verbs, in scan order
pub const WEAK_MODAL_VERBS: [&str; 4] = ["should", "may", "might", "could"];

/// Qualitative, non-measurable terms, in scan order
pub const VAGUE_TERMS: [&str; 22] = [
    "user-friendly",
    "intuitive",
    "fast",
    "quick",
    "efficient",
    "robust",
    "reliable",
    "secure",
    "as appropriate",
    "if necessary",
    "if needed",
    "as needed",
    "etc",
    "sufficient",
    "adequate",
    "optimize",
    "minimize",
    "maximize",
    "high accuracy",
    "normal operation",
    "reliably",
    "low jitter",
];

/// Acceptance criteria shorter than this are not actionable
pub const MIN_ACCEPTANCE_CHARS: usize = 15;

/// Score of a requirement without defects
pub const BASE_SCORE: u32 = 100;

/// A single check over one requirement
pub type Check = fn(&RequirementRecord) -> Vec<Defect>;

/// Ordered set of checks applied to every requirement
#[derive(Debug, Clone)]
pub struct RuleEngine {
    checks: Vec<(&'static str, Check)>,
}

impl RuleEngine {
    /// Create an engine with the built-in checks in their fixed order
    pub fn new() -> Self {
        Self {
            checks: vec![
                ("weak_modal", check_weak_modal as Check),
                ("vague_terms", check_vague_terms as Check),
                ("testability", check_testability as Check),
                ("acceptance_criteria", check_acceptance_criteria as Check),
            ],
        }
    }

    /// Run every check and concatenate the defects in check order
    pub fn detect(&self, requirement: &RequirementRecord) -> Vec<Defect> {
        let mut defects = Vec::new();

        for (name, check) in &self.checks {
            let found = check(requirement);
            tracing::debug!(
                "Check '{}' found {} defect(s) in '{}'",
                name,
                found.len(),
                requirement.id()
            );
            defects.extend(found);
        }

        defects
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// One RULE suggestion per defect, in defect order
pub fn derive_suggestions(defects: &[Defect]) -> Vec<Suggestion> {
    defects.iter().map(Suggestion::from_defect).collect()
}

/// `clamp(100 - sum of penalties, 0, 100)`
pub fn compute_score(defects: &[Defect]) -> u32 {
    let penalty: u32 = defects.iter().map(|d| d.severity().penalty()).sum();
    BASE_SCORE.saturating_sub(penalty)
}

fn emit(rule: &RuleDescriptor, message: String) -> Defect {
    Defect::from_rule(rule.id, rule.category, rule.severity, message)
        .with_recommendation(rule.recommendation)
}

/// Title, text and acceptance criteria joined and whitespace-collapsed
fn ambiguity_blob(requirement: &RequirementRecord) -> String {
    compact_whitespace(&format!(
        "{} {} {}",
        requirement.title(),
        requirement.text(),
        requirement.acceptance_criteria()
    ))
}

/// AMB-001: weak modal verbs anywhere in the statement
pub fn check_weak_modal(requirement: &RequirementRecord) -> Vec<Defect> {
    let blob = ambiguity_blob(requirement);

    match first_term(&blob, &WEAK_MODAL_VERBS) {
        Some(term) => vec![emit(
            &catalog::WEAK_MODAL,
            format!(
                "Modal verb '{term}' detected (weak commitment). Prefer 'shall' or measurable phrasing."
            ),
        )
        .with_field("text")
        .with_evidence(excerpt(&blob, term, EXCERPT_RADIUS))],
        None => Vec::new(),
    }
}

/// AMB-002: qualitative terms anywhere in the statement
pub fn check_vague_terms(requirement: &RequirementRecord) -> Vec<Defect> {
    let blob = ambiguity_blob(requirement);

    match first_term(&blob, &VAGUE_TERMS) {
        Some(term) => vec![emit(
            &catalog::VAGUE_TERM,
            format!("Ambiguous term '{term}' detected (not measurable)."),
        )
        .with_field("text")
        .with_evidence(excerpt(&blob, term, EXCERPT_RADIUS))],
        None => Vec::new(),
    }
}

/// TST-001 / TST-002: verification method and acceptance criteria presence
pub fn check_testability(requirement: &RequirementRecord) -> Vec<Defect> {
    let has_method = !requirement.verification_method().trim().is_empty();
    let has_criteria = !requirement.acceptance_criteria().trim().is_empty();

    match (has_method, has_criteria) {
        (false, false) => vec![emit(
            &catalog::NOT_TESTABLE,
            "No verification method and no acceptance criteria provided (requirement not testable)."
                .to_string(),
        )
        .with_field("verification_method")
        .with_evidence("verification_method='', acceptance_criteria=''")],
        (true, false) => vec![emit(
            &catalog::MISSING_ACCEPTANCE,
            "Acceptance criteria missing (verification might be unclear).".to_string(),
        )
        .with_field("acceptance_criteria")
        .with_evidence("acceptance_criteria=''")],
        _ => Vec::new(),
    }
}

/// AC-001 / AC-002: quality of the acceptance criteria themselves
pub fn check_acceptance_criteria(requirement: &RequirementRecord) -> Vec<Defect> {
    let criteria = compact_whitespace(requirement.acceptance_criteria());
    if criteria.is_empty() {
        return Vec::new();
    }

    let mut defects = Vec::new();

    if criteria.chars().count() < MIN_ACCEPTANCE_CHARS {
        defects.push(
            emit(
                &catalog::SHORT_ACCEPTANCE,
                "Acceptance criteria is too short; likely not actionable/measurable.".to_string(),
            )
            .with_field("acceptance_criteria")
            .with_evidence(criteria.clone()),
        );
    }

    if let Some(term) = first_term(&criteria, &VAGUE_TERMS) {
        defects.push(
            emit(
                &catalog::VAGUE_ACCEPTANCE,
                format!("Ambiguous term '{term}' in acceptance criteria."),
            )
            .with_field("acceptance_criteria")
            .with_evidence(excerpt(&criteria, term, EXCERPT_RADIUS)),
        );
    }

    defects
}
