//! Static catalog of the built-in rules
//!
//! The checks read their category, severity and recommendation from here, and the
//! CLI uses the same entries for `explain` and `rules`.

use crate::domain::requirements::Severity;

pub const CATEGORY_AMBIGUITY: &str = "AMBIGUITY";
pub const CATEGORY_TESTABILITY: &str = "TESTABILITY";
pub const CATEGORY_ACCEPTANCE_CRITERIA: &str = "ACCEPTANCE_CRITERIA";

/// Description of one built-in rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleDescriptor {
    /// Stable rule code, e.g. `AMB-001`
    pub id: &'static str,
    /// Grouping label
    pub category: &'static str,
    /// Severity of every defect this rule emits
    pub severity: Severity,
    /// One-line summary
    pub title: &'static str,
    /// What the rule looks at and when it fires
    pub description: &'static str,
    /// Remediation hint carried by the defect
    pub recommendation: &'static str,
}

pub const WEAK_MODAL: RuleDescriptor = RuleDescriptor {
    id: "AMB-001",
    category: CATEGORY_AMBIGUITY,
    severity: Severity::Minor,
    title: "Weak commitment",
    description: "Fires once when title, text or acceptance criteria contain a weak modal \
                  verb (should, may, might, could).",
    recommendation: "Replace weak modals (should/may/...) with normative, measurable phrasing \
                     (shall + metrics).",
};

pub const VAGUE_TERM: RuleDescriptor = RuleDescriptor {
    id: "AMB-002",
    category: CATEGORY_AMBIGUITY,
    severity: Severity::Minor,
    title: "Vague or unmeasurable term",
    description: "Fires once when title, text or acceptance criteria contain a qualitative \
                  term such as fast, robust, efficient or as appropriate.",
    recommendation: "Replace qualitative terms with quantified criteria (time, rate, \
                     thresholds, tolerances).",
};

pub const NOT_TESTABLE: RuleDescriptor = RuleDescriptor {
    id: "TST-001",
    category: CATEGORY_TESTABILITY,
    severity: Severity::Major,
    title: "Not testable",
    description: "Fires when neither a verification method nor acceptance criteria are given.",
    recommendation: "Add a verification method (Test/Analysis/Inspection/Demonstration) and \
                     acceptance criteria.",
};

pub const MISSING_ACCEPTANCE: RuleDescriptor = RuleDescriptor {
    id: "TST-002",
    category: CATEGORY_TESTABILITY,
    severity: Severity::Minor,
    title: "Acceptance criteria missing",
    description: "Fires when a verification method is given but acceptance criteria are not.",
    recommendation: "Add concrete acceptance criteria (Given/When/Then, thresholds, \
                     tolerances).",
};

pub const SHORT_ACCEPTANCE: RuleDescriptor = RuleDescriptor {
    id: "AC-001",
    category: CATEGORY_ACCEPTANCE_CRITERIA,
    severity: Severity::Minor,
    title: "Acceptance criteria too short",
    description: "Fires when the acceptance criteria have fewer than 15 characters once \
                  whitespace is collapsed.",
    recommendation: "Write verifiable acceptance criteria (thresholds, steps, expected \
                     results).",
};

pub const VAGUE_ACCEPTANCE: RuleDescriptor = RuleDescriptor {
    id: "AC-002",
    category: CATEGORY_ACCEPTANCE_CRITERIA,
    severity: Severity::Info,
    title: "Vague term in acceptance criteria",
    description: "Fires when the acceptance criteria themselves contain a vague term.",
    recommendation: "Make the acceptance criteria measurable (figures, thresholds, \
                     tolerances, deadlines).",
};

/// Every built-in rule, in detection order
pub static RULES: [RuleDescriptor; 6] = [
    WEAK_MODAL,
    VAGUE_TERM,
    NOT_TESTABLE,
    MISSING_ACCEPTANCE,
    SHORT_ACCEPTANCE,
    VAGUE_ACCEPTANCE,
];

/// Look up a rule by id, ignoring case
pub fn find_rule(id: &str) -> Option<&'static RuleDescriptor> {
    RULES.iter().find(|rule| rule.id.eq_ignore_ascii_case(id.trim()))
}

/// Distinct categories in catalog order
pub fn categories() -> Vec<&'static str> {
    let mut categories: Vec<&'static str> = Vec::new();
    for rule in &RULES {
        if !categories.contains(&rule.category) {
            categories.push(rule.category);
        }
    }
    categories
}
