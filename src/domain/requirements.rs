//! Core domain models for requirement quality analysis
//!
//! Architecture: Rich Domain Models - entities validate themselves at construction
//! - RequirementRecord is immutable once built; only its builder can assemble one
//! - Defects and Suggestions carry their own invariants (non-empty ids, bounded confidence)
//! - AnalysisResult is the per-requirement aggregate with one sanctioned mutation point

use crate::domain::errors::{LintError, LintResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Source label used when a record does not name one
pub const DEFAULT_SOURCE: &str = "demo";

/// Lifecycle label of a result that has not been through the rule engine
pub const STATUS_LOADED: &str = "LOADED";

/// Lifecycle label set once the rule engine has run
pub const STATUS_CHECKED: &str = "CHECKED";

/// Display status of a checked requirement without defects
pub const DISPLAY_OK: &str = "OK";

/// Display status of a checked requirement with at least one defect
pub const DISPLAY_AT_RISK: &str = "AT_RISK";

/// Message of a rule suggestion whose defect carries no recommendation
pub const FALLBACK_RECOMMENDATION: &str =
    "Clarify the requirement and add measurable acceptance criteria.";

/// Open extension bag attached to a requirement record
pub type Metadata = BTreeMap<String, Value>;

/// Severity levels for requirement defects, ordered from least to most serious
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Severity {
    /// Worth a look, barely affects the score
    Info,
    /// Weakens the requirement but does not block verification
    Minor,
    /// Makes the requirement hard or impossible to verify
    Major,
    /// Reserved for defects that invalidate the requirement outright
    Critical,
}

impl Severity {
    /// Every level, in ascending order
    pub const ALL: [Severity; 4] = [Self::Info, Self::Minor, Self::Major, Self::Critical];

    /// Canonical string value
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Minor => "MINOR",
            Self::Major => "MAJOR",
            Self::Critical => "CRITICAL",
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Minor => "Minor",
            Self::Major => "Major",
            Self::Critical => "Critical",
        }
    }

    /// Score penalty applied for each defect of this severity
    pub fn penalty(self) -> u32 {
        match self {
            Self::Info => 5,
            Self::Minor => 10,
            Self::Major => 25,
            Self::Critical => 40,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = LintError;

    fn from_str(s: &str) -> LintResult<Self> {
        coerce(s, "severity", &Self::ALL, Self::as_str, Self::symbol)
    }
}

impl TryFrom<String> for Severity {
    type Error = LintError;

    fn try_from(value: String) -> LintResult<Self> {
        value.parse()
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        severity.as_str().to_string()
    }
}

/// Where a suggestion came from. Suggestions never decide anything on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SuggestionOrigin {
    /// Derived deterministically from a defect
    Rule,
    /// Proposed by the optional language-model assistant
    Ai,
    /// Entered by a reviewer
    Human,
}

impl SuggestionOrigin {
    /// Every origin
    pub const ALL: [SuggestionOrigin; 3] = [Self::Rule, Self::Ai, Self::Human];

    /// Canonical string value
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rule => "RULE",
            Self::Ai => "AI",
            Self::Human => "HUMAN",
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Rule => "Rule",
            Self::Ai => "Ai",
            Self::Human => "Human",
        }
    }
}

impl fmt::Display for SuggestionOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuggestionOrigin {
    type Err = LintError;

    fn from_str(s: &str) -> LintResult<Self> {
        coerce(s, "origin", &Self::ALL, Self::as_str, Self::symbol)
    }
}

impl TryFrom<String> for SuggestionOrigin {
    type Error = LintError;

    fn try_from(value: String) -> LintResult<Self> {
        value.parse()
    }
}

impl From<SuggestionOrigin> for String {
    fn from(origin: SuggestionOrigin) -> Self {
        origin.as_str().to_string()
    }
}

/// Strict parse of an open string onto a closed set of variants
fn coerce<T: Copy>(
    raw: &str,
    field: &str,
    variants: &[T],
    canonical: fn(T) -> &'static str,
    symbolic: fn(T) -> &'static str,
) -> LintResult<T> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(LintError::validation(format!("{field} is required (got empty)")));
    }

    variants
        .iter()
        .copied()
        .find(|v| canonical(*v) == value || symbolic(*v) == value)
        .ok_or_else(|| {
            let allowed = variants.iter().map(|v| canonical(*v)).collect::<Vec<_>>().join(", ");
            LintError::validation(format!("Invalid {field}='{value}'. Allowed: {allowed}"))
        })
}

/// One requirement under analysis, normalized from whatever format it came from
#[derive(Debug, Clone, PartialEq)]
pub struct RequirementRecord {
    id: String,
    title: String,
    text: String,
    source: String,
    system: String,
    component: String,
    priority: String,
    rationale: String,
    verification_method: String,
    acceptance_criteria: String,
    metadata: Metadata,
}

impl RequirementRecord {
    /// Start building a record with the given identifier
    pub fn builder(id: impl Into<String>) -> RequirementBuilder {
        RequirementBuilder::new(id)
    }

    /// Build a record from its identifying fields only
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        text: impl Into<String>,
    ) -> LintResult<Self> {
        Self::builder(id).title(title).text(text).build()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn priority(&self) -> &str {
        &self.priority
    }

    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    pub fn verification_method(&self) -> &str {
        &self.verification_method
    }

    pub fn acceptance_criteria(&self) -> &str {
        &self.acceptance_criteria
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Convert to a plain key/value representation
    pub fn to_representation(&self) -> Value {
        serde_json::json!({
            "id": self.id,
            "title": self.title,
            "text": self.text,
            "source": self.source,
            "system": self.system,
            "component": self.component,
            "priority": self.priority,
            "rationale": self.rationale,
            "verification_method": self.verification_method,
            "acceptance_criteria": self.acceptance_criteria,
            "metadata": self.metadata,
        })
    }

    /// Rebuild a record from its representation, validating it on the way
    pub fn from_representation(value: &Value) -> LintResult<Self> {
        let map = expect_object(value, "RequirementRecord")?;

        let metadata = match lookup(map, &["metadata", "meta"]) {
            None | Some(Value::Null) => Metadata::new(),
            Some(Value::Object(entries)) => {
                entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
            }
            Some(_) => {
                return Err(LintError::validation(
                    "RequirementRecord.metadata must be a key/value object",
                ))
            }
        };

        Self::builder(text_field(map, &["id", "req_id"], "RequirementRecord.id")?)
            .title(text_field(map, &["title"], "RequirementRecord.title")?)
            .text(text_field(map, &["text"], "RequirementRecord.text")?)
            .source(text_field(map, &["source"], "RequirementRecord.source")?)
            .system(text_field(map, &["system"], "RequirementRecord.system")?)
            .component(text_field(map, &["component"], "RequirementRecord.component")?)
            .priority(text_field(map, &["priority"], "RequirementRecord.priority")?)
            .rationale(text_field(map, &["rationale"], "RequirementRecord.rationale")?)
            .verification_method(text_field(
                map,
                &["verification_method"],
                "RequirementRecord.verification_method",
            )?)
            .acceptance_criteria(text_field(
                map,
                &["acceptance_criteria"],
                "RequirementRecord.acceptance_criteria",
            )?)
            .metadata(metadata)
            .build()
    }
}

/// Builder for [`RequirementRecord`]; `build` enforces the record invariants
#[derive(Debug, Clone, Default)]
pub struct RequirementBuilder {
    id: String,
    title: String,
    text: String,
    source: String,
    system: String,
    component: String,
    priority: String,
    rationale: String,
    verification_method: String,
    acceptance_criteria: String,
    metadata: Metadata,
}

impl RequirementBuilder {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = system.into();
        self
    }

    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.component = component.into();
        self
    }

    pub fn priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = priority.into();
        self
    }

    pub fn rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    pub fn verification_method(mut self, method: impl Into<String>) -> Self {
        self.verification_method = method.into();
        self
    }

    pub fn acceptance_criteria(mut self, criteria: impl Into<String>) -> Self {
        self.acceptance_criteria = criteria.into();
        self
    }

    /// Replace the whole metadata bag
    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Add a single metadata entry
    pub fn metadata_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Validate and produce the immutable record
    pub fn build(self) -> LintResult<RequirementRecord> {
        let id = self.id.trim().to_string();
        let title = self.title.trim().to_string();
        let text = self.text.trim().to_string();

        if id.is_empty() {
            return Err(LintError::validation("RequirementRecord.id must be non-empty"));
        }
        if title.is_empty() && text.is_empty() {
            return Err(LintError::validation(format!(
                "Requirement '{id}' must have at least a title or a text"
            )));
        }

        let source = match self.source.trim() {
            "" => DEFAULT_SOURCE.to_string(),
            s => s.to_string(),
        };

        Ok(RequirementRecord {
            id,
            title,
            text,
            source,
            system: self.system.trim().to_string(),
            component: self.component.trim().to_string(),
            priority: self.priority.trim().to_string(),
            rationale: self.rationale.trim().to_string(),
            verification_method: self.verification_method.trim().to_string(),
            acceptance_criteria: self.acceptance_criteria.trim().to_string(),
            metadata: self.metadata,
        })
    }
}

/// A rule violation detected in a requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defect {
    rule_id: String,
    category: String,
    severity: Severity,
    message: String,
    field: String,
    evidence: String,
    recommendation: String,
}

impl Defect {
    /// Create a defect, rejecting empty identifying fields
    pub fn new(
        rule_id: impl Into<String>,
        category: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> LintResult<Self> {
        let rule_id = rule_id.into().trim().to_string();
        let category = category.into().trim().to_string();
        let message = message.into().trim().to_string();

        if rule_id.is_empty() {
            return Err(LintError::validation("Defect.rule_id must be non-empty"));
        }
        if category.is_empty() {
            return Err(LintError::validation("Defect.category must be non-empty"));
        }
        if message.is_empty() {
            return Err(LintError::validation("Defect.message must be non-empty"));
        }

        Ok(Self {
            rule_id,
            category,
            severity,
            message,
            field: String::new(),
            evidence: String::new(),
            recommendation: String::new(),
        })
    }

    /// Infallible constructor for the built-in rules, whose identifiers are static
    pub(crate) fn from_rule(
        rule_id: &'static str,
        category: &'static str,
        severity: Severity,
        message: String,
    ) -> Self {
        debug_assert!(!rule_id.is_empty() && !category.is_empty() && !message.is_empty());
        Self {
            rule_id: rule_id.to_string(),
            category: category.to_string(),
            severity,
            message,
            field: String::new(),
            evidence: String::new(),
            recommendation: String::new(),
        }
    }

    /// Name the input attribute that triggered the defect
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into().trim().to_string();
        self
    }

    /// Attach a short excerpt of the offending text
    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = evidence.into().trim().to_string();
        self
    }

    /// Attach a remediation hint
    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = recommendation.into().trim().to_string();
        self
    }

    pub fn rule_id(&self) -> &str {
        &self.rule_id
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn evidence(&self) -> &str {
        &self.evidence
    }

    pub fn recommendation(&self) -> &str {
        &self.recommendation
    }

    /// One-line form: `RULE [SEVERITY] CATEGORY: message`
    pub fn format_display(&self) -> String {
        format!("{} [{}] {}: {}", self.rule_id, self.severity, self.category, self.message)
    }

    pub fn to_representation(&self) -> Value {
        serde_json::json!({
            "rule_id": self.rule_id,
            "category": self.category,
            "severity": self.severity.as_str(),
            "message": self.message,
            "field": self.field,
            "evidence": self.evidence,
            "recommendation": self.recommendation,
        })
    }

    pub fn from_representation(value: &Value) -> LintResult<Self> {
        let map = expect_object(value, "Defect")?;
        let severity: Severity = text_field(map, &["severity"], "Defect.severity")?.parse()?;

        Ok(Self::new(
            text_field(map, &["rule_id"], "Defect.rule_id")?,
            text_field(map, &["category"], "Defect.category")?,
            severity,
            text_field(map, &["message"], "Defect.message")?,
        )?
        .with_field(text_field(map, &["field"], "Defect.field")?)
        .with_evidence(text_field(map, &["evidence"], "Defect.evidence")?)
        .with_recommendation(text_field(map, &["recommendation"], "Defect.recommendation")?))
    }
}

/// A proposed improvement. Purely additive output, never authoritative.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    origin: SuggestionOrigin,
    message: String,
    rule_id: String,
    rationale: String,
    confidence: Option<f64>,
}

impl Suggestion {
    /// Create a suggestion with a non-empty message
    pub fn new(origin: SuggestionOrigin, message: impl Into<String>) -> LintResult<Self> {
        let message = message.into().trim().to_string();
        if message.is_empty() {
            return Err(LintError::validation("Suggestion.message must be non-empty"));
        }

        Ok(Self {
            origin,
            message,
            rule_id: String::new(),
            rationale: String::new(),
            confidence: None,
        })
    }

    /// The RULE suggestion derived from a defect
    pub fn from_defect(defect: &Defect) -> Self {
        let message = if defect.recommendation.is_empty() {
            FALLBACK_RECOMMENDATION.to_string()
        } else {
            defect.recommendation.clone()
        };

        Self {
            origin: SuggestionOrigin::Rule,
            message,
            rule_id: defect.rule_id.clone(),
            rationale: defect.message.clone(),
            confidence: None,
        }
    }

    /// Link the suggestion to a rule
    pub fn with_rule_id(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = rule_id.into().trim().to_string();
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into().trim().to_string();
        self
    }

    /// Attach a confidence in [0.0, 1.0]
    pub fn with_confidence(mut self, confidence: f64) -> LintResult<Self> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(LintError::validation(format!(
                "Suggestion.confidence must be in [0.0, 1.0] (got {confidence})"
            )));
        }
        self.confidence = Some(confidence);
        Ok(self)
    }

    pub fn origin(&self) -> SuggestionOrigin {
        self.origin
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn rule_id(&self) -> &str {
        &self.rule_id
    }

    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    pub fn confidence(&self) -> Option<f64> {
        self.confidence
    }

    pub fn to_representation(&self) -> Value {
        serde_json::json!({
            "origin": self.origin.as_str(),
            "message": self.message,
            "rule_id": self.rule_id,
            "rationale": self.rationale,
            "confidence": self.confidence,
        })
    }

    pub fn from_representation(value: &Value) -> LintResult<Self> {
        let map = expect_object(value, "Suggestion")?;
        let origin: SuggestionOrigin =
            text_field(map, &["origin", "source"], "Suggestion.origin")?.parse()?;

        let suggestion = Self::new(origin, text_field(map, &["message"], "Suggestion.message")?)?
            .with_rule_id(text_field(map, &["rule_id"], "Suggestion.rule_id")?)
            .with_rationale(text_field(map, &["rationale"], "Suggestion.rationale")?);

        match map.get("confidence") {
            None | Some(Value::Null) => Ok(suggestion),
            Some(Value::Number(n)) => match n.as_f64() {
                Some(confidence) => suggestion.with_confidence(confidence),
                None => Err(LintError::validation("Suggestion.confidence must be a number")),
            },
            Some(_) => Err(LintError::validation("Suggestion.confidence must be a number or null")),
        }
    }
}

/// Outcome of analyzing one requirement
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    requirement: RequirementRecord,
    defects: Vec<Defect>,
    suggestions: Vec<Suggestion>,
    score: Option<u32>,
    status: String,
    enriched: bool,
}

impl AnalysisResult {
    /// A freshly loaded requirement that no rule has looked at yet
    pub fn new(requirement: RequirementRecord) -> Self {
        Self {
            requirement,
            defects: Vec::new(),
            suggestions: Vec::new(),
            score: None,
            status: STATUS_LOADED.to_string(),
            enriched: false,
        }
    }

    /// Assemble a result from explicit parts, validating score and status
    pub fn from_parts(
        requirement: RequirementRecord,
        defects: Vec<Defect>,
        suggestions: Vec<Suggestion>,
        score: Option<u32>,
        status: impl Into<String>,
    ) -> LintResult<Self> {
        if let Some(score) = score {
            if score > 100 {
                return Err(LintError::validation(format!(
                    "AnalysisResult.score must be in [0..100] (got {score})"
                )));
            }
        }

        let status = match status.into().trim() {
            "" => STATUS_LOADED.to_string(),
            s => s.to_string(),
        };

        Ok(Self {
            requirement,
            defects,
            suggestions,
            score,
            status,
            enriched: false,
        })
    }

    /// Result produced by the rule engine; the score is already clamped
    pub(crate) fn checked(
        requirement: RequirementRecord,
        defects: Vec<Defect>,
        suggestions: Vec<Suggestion>,
        score: u32,
    ) -> Self {
        debug_assert!(score <= 100);
        Self {
            requirement,
            defects,
            suggestions,
            score: Some(score.min(100)),
            status: STATUS_CHECKED.to_string(),
            enriched: false,
        }
    }

    pub fn requirement(&self) -> &RequirementRecord {
        &self.requirement
    }

    /// Defects in detection order
    pub fn defects(&self) -> &[Defect] {
        &self.defects
    }

    /// Rule suggestions first, then any appended ones
    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn score(&self) -> Option<u32> {
        self.score
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Whether suggestions have already been appended after analysis
    pub fn is_enriched(&self) -> bool {
        self.enriched
    }

    pub fn is_checked(&self) -> bool {
        self.status == STATUS_CHECKED
    }

    pub fn has_defects(&self) -> bool {
        !self.defects.is_empty()
    }

    /// Status shown to readers of a report
    pub fn display_status(&self) -> &str {
        match (self.is_checked(), self.has_defects()) {
            (true, false) => DISPLAY_OK,
            (true, true) => DISPLAY_AT_RISK,
            _ => &self.status,
        }
    }

    /// Suggestions of a given origin
    pub fn suggestions_from(&self, origin: SuggestionOrigin) -> impl Iterator<Item = &Suggestion> {
        self.suggestions.iter().filter(move |s| s.origin == origin)
    }

    /// Append externally sourced suggestions. Allowed exactly once per result.
    ///
    /// Taking `&mut self` makes the caller the exclusive writer; results shared
    /// across threads need their own lock around this call.
    pub fn append_suggestions(&mut self, suggestions: Vec<Suggestion>) -> LintResult<()> {
        if self.enriched {
            return Err(LintError::validation(format!(
                "Suggestions were already appended to requirement '{}'",
                self.requirement.id
            )));
        }
        if let Some(rule) = suggestions.iter().find(|s| s.origin == SuggestionOrigin::Rule) {
            return Err(LintError::validation(format!(
                "RULE suggestions are derived by the engine and cannot be appended ({})",
                rule.message
            )));
        }

        self.suggestions.extend(suggestions);
        self.enriched = true;
        Ok(())
    }

    pub fn to_representation(&self) -> Value {
        serde_json::json!({
            "requirement": self.requirement.to_representation(),
            "defects": self.defects.iter().map(Defect::to_representation).collect::<Vec<_>>(),
            "suggestions": self.suggestions.iter().map(Suggestion::to_representation).collect::<Vec<_>>(),
            "score": self.score,
            "status": self.status,
            "enriched": self.enriched,
        })
    }

    pub fn from_representation(value: &Value) -> LintResult<Self> {
        let map = expect_object(value, "AnalysisResult")?;

        let requirement = match map.get("requirement") {
            Some(v) => RequirementRecord::from_representation(v)?,
            None => {
                return Err(LintError::validation("AnalysisResult.requirement is required"))
            }
        };

        let defects = list_field(map, &["defects", "issues"], "AnalysisResult.defects")?
            .iter()
            .map(Defect::from_representation)
            .collect::<LintResult<Vec<_>>>()?;

        let suggestions = list_field(map, &["suggestions"], "AnalysisResult.suggestions")?
            .iter()
            .map(Suggestion::from_representation)
            .collect::<LintResult<Vec<_>>>()?;

        let score = match map.get("score") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => match n.as_u64() {
                Some(s) => Some(u32::try_from(s).map_err(|_| {
                    LintError::validation(format!("AnalysisResult.score must be in [0..100] (got {s})"))
                })?),
                None => {
                    return Err(LintError::validation(format!(
                        "AnalysisResult.score must be an integer in [0..100] (got {n})"
                    )))
                }
            },
            Some(_) => {
                return Err(LintError::validation("AnalysisResult.score must be an integer or null"))
            }
        };

        let status = text_field(map, &["status"], "AnalysisResult.status")?;
        let mut result = Self::from_parts(requirement, defects, suggestions, score, status)?;

        result.enriched = match map.get("enriched") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => return Err(LintError::validation("AnalysisResult.enriched must be a boolean")),
        };

        Ok(result)
    }
}

fn expect_object<'a>(value: &'a Value, entity: &str) -> LintResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| LintError::validation(format!("{entity} representation must be an object")))
}

fn lookup<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| map.get(*k))
}

/// Read a scalar field as text; absent and null read as empty
fn text_field(map: &Map<String, Value>, keys: &[&str], name: &str) -> LintResult<String> {
    match lookup(map, keys) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(_) => Err(LintError::validation(format!("{name} must be a scalar value"))),
    }
}

fn list_field<'a>(
    map: &'a Map<String, Value>,
    keys: &[&str],
    name: &str,
) -> LintResult<&'a [Value]> {
    match lookup(map, keys) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(LintError::validation(format!("{name} must be a list"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn full_record() -> RequirementRecord {
        RequirementRecord::builder("REQ-042")
            .title("Braking")
            .text("The braking system shall stop the train within 800 m.")
            .source("doors")
            .system("Rolling stock")
            .component("Brake controller")
            .priority("High")
            .rationale("Safety case item 12")
            .verification_method("Test")
            .acceptance_criteria("Stopping distance over 10 runs is at most 800 m.")
            .metadata_entry("baseline", "B3")
            .metadata_entry("revision", 4)
            .build()
            .unwrap()
    }

    #[test]
    fn test_record_creation_defaults() {
        let record = RequirementRecord::new("  REQ-001 ", "", " The system shall log. ").unwrap();

        assert_eq!(record.id(), "REQ-001");
        assert_eq!(record.text(), "The system shall log.");
        assert_eq!(record.source(), DEFAULT_SOURCE);
        assert!(record.verification_method().is_empty());
        assert!(record.metadata().is_empty());
    }

    #[test]
    fn test_record_rejects_empty_id() {
        let err = RequirementRecord::new("   ", "Title", "Text").unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("id must be non-empty"));
    }

    #[test]
    fn test_record_rejects_missing_title_and_text() {
        let err = RequirementRecord::new("REQ-001", " ", "").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_record_round_trip() {
        let record = full_record();
        let rebuilt = RequirementRecord::from_representation(&record.to_representation()).unwrap();
        assert_eq!(rebuilt, record);
    }

    #[test]
    fn test_record_accepts_legacy_keys() {
        let value = json!({
            "req_id": "REQ-7",
            "text": "The pump shall start within 2 s.",
            "meta": {"owner": "fluids"}
        });

        let record = RequirementRecord::from_representation(&value).unwrap();
        assert_eq!(record.id(), "REQ-7");
        assert_eq!(record.metadata().get("owner"), Some(&json!("fluids")));
    }

    #[test]
    fn test_record_representation_rejects_non_object() {
        assert!(RequirementRecord::from_representation(&json!(["REQ-1"])).is_err());
        assert!(RequirementRecord::from_representation(&json!({"id": "R", "text": "x", "metadata": 3})).is_err());
    }

    #[rstest]
    #[case("INFO", Severity::Info)]
    #[case("MINOR", Severity::Minor)]
    #[case("MAJOR", Severity::Major)]
    #[case("Major", Severity::Major)]
    #[case(" CRITICAL ", Severity::Critical)]
    #[case("Critical", Severity::Critical)]
    fn test_severity_coercion_accepts(#[case] raw: &str, #[case] expected: Severity) {
        assert_eq!(raw.parse::<Severity>().unwrap(), expected);
    }

    #[rstest]
    #[case("major")]
    #[case("BLOCKER")]
    #[case("")]
    #[case("warning")]
    fn test_severity_coercion_rejects(#[case] raw: &str) {
        let err = raw.parse::<Severity>().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_severity_error_lists_allowed_values() {
        let err = "SEVERE".parse::<Severity>().unwrap_err();
        assert!(err.to_string().contains("Allowed: INFO, MINOR, MAJOR, CRITICAL"));
    }

    #[rstest]
    #[case("RULE", SuggestionOrigin::Rule)]
    #[case("AI", SuggestionOrigin::Ai)]
    #[case("Ai", SuggestionOrigin::Ai)]
    #[case("HUMAN", SuggestionOrigin::Human)]
    fn test_origin_coercion(#[case] raw: &str, #[case] expected: SuggestionOrigin) {
        assert_eq!(raw.parse::<SuggestionOrigin>().unwrap(), expected);
    }

    #[test]
    fn test_origin_rejects_unknown() {
        let err = "BOT".parse::<SuggestionOrigin>().unwrap_err();
        assert!(err.to_string().contains("Allowed: RULE, AI, HUMAN"));
    }

    #[test]
    fn test_severity_ordering_and_penalties() {
        assert!(Severity::Critical > Severity::Major);
        assert!(Severity::Major > Severity::Minor);
        assert!(Severity::Minor > Severity::Info);
        assert_eq!(
            Severity::ALL.iter().map(|s| s.penalty()).collect::<Vec<_>>(),
            vec![5, 10, 25, 40]
        );
    }

    #[test]
    fn test_severity_serde_uses_coercion() {
        let parsed: Severity = serde_yaml::from_str("Major").unwrap();
        assert_eq!(parsed, Severity::Major);
        assert!(serde_yaml::from_str::<Severity>("loud").is_err());
        assert_eq!(serde_json::to_value(Severity::Info).unwrap(), json!("INFO"));
    }

    #[test]
    fn test_defect_validation() {
        assert!(Defect::new("", "AMBIGUITY", Severity::Minor, "msg").is_err());
        assert!(Defect::new("AMB-001", " ", Severity::Minor, "msg").is_err());
        assert!(Defect::new("AMB-001", "AMBIGUITY", Severity::Minor, "").is_err());
    }

    #[test]
    fn test_defect_round_trip() {
        let defect = Defect::new("TST-001", "TESTABILITY", Severity::Major, "Not testable")
            .unwrap()
            .with_field("verification_method")
            .with_evidence("verification_method=''")
            .with_recommendation("Add a verification method.");

        let rebuilt = Defect::from_representation(&defect.to_representation()).unwrap();
        assert_eq!(rebuilt, defect);
        assert_eq!(defect.format_display(), "TST-001 [MAJOR] TESTABILITY: Not testable");
    }

    #[test]
    fn test_defect_representation_rejects_unknown_severity() {
        let value = json!({"rule_id": "X-1", "category": "C", "severity": "HUGE", "message": "m"});
        assert!(Defect::from_representation(&value).unwrap_err().is_validation());
    }

    #[rstest]
    #[case(0.0, true)]
    #[case(1.0, true)]
    #[case(0.42, true)]
    #[case(-0.01, false)]
    #[case(1.01, false)]
    #[case(f64::NAN, false)]
    fn test_suggestion_confidence_range(#[case] confidence: f64, #[case] valid: bool) {
        let suggestion = Suggestion::new(SuggestionOrigin::Ai, "Use 200 ms").unwrap();
        assert_eq!(suggestion.with_confidence(confidence).is_ok(), valid);
    }

    #[test]
    fn test_suggestion_requires_message() {
        assert!(Suggestion::new(SuggestionOrigin::Human, "  ").is_err());
    }

    #[test]
    fn test_suggestion_round_trip() {
        let suggestion = Suggestion::new(SuggestionOrigin::Ai, "State latency as <= 200 ms")
            .unwrap()
            .with_rule_id("AI-001")
            .with_rationale("Quantified")
            .with_confidence(0.75)
            .unwrap();

        let rebuilt = Suggestion::from_representation(&suggestion.to_representation()).unwrap();
        assert_eq!(rebuilt, suggestion);

        let legacy = json!({"source": "HUMAN", "message": "Split the requirement"});
        let parsed = Suggestion::from_representation(&legacy).unwrap();
        assert_eq!(parsed.origin(), SuggestionOrigin::Human);
        assert_eq!(parsed.confidence(), None);
    }

    #[test]
    fn test_suggestion_from_defect_falls_back() {
        let defect = Defect::new("AC-001", "ACCEPTANCE_CRITERIA", Severity::Minor, "Too short").unwrap();
        let suggestion = Suggestion::from_defect(&defect);

        assert_eq!(suggestion.origin(), SuggestionOrigin::Rule);
        assert_eq!(suggestion.message(), FALLBACK_RECOMMENDATION);
        assert_eq!(suggestion.rationale(), "Too short");
        assert_eq!(suggestion.rule_id(), "AC-001");
    }

    #[test]
    fn test_result_defaults_to_loaded() {
        let result = AnalysisResult::new(full_record());
        assert_eq!(result.status(), STATUS_LOADED);
        assert_eq!(result.score(), None);
        assert_eq!(result.display_status(), STATUS_LOADED);
    }

    #[test]
    fn test_result_rejects_out_of_range_score() {
        let err = AnalysisResult::from_parts(full_record(), vec![], vec![], Some(101), "CHECKED")
            .unwrap_err();
        assert!(err.is_validation());

        let value = json!({"requirement": full_record().to_representation(), "score": -3});
        assert!(AnalysisResult::from_representation(&value).is_err());
    }

    #[test]
    fn test_result_append_exactly_once() {
        let defect = Defect::new("AMB-002", "AMBIGUITY", Severity::Minor, "Vague").unwrap();
        let rule = Suggestion::from_defect(&defect);
        let mut result = AnalysisResult::checked(full_record(), vec![defect], vec![rule], 90);

        let ai = Suggestion::new(SuggestionOrigin::Ai, "Say 99.9 % availability").unwrap();
        result.append_suggestions(vec![ai]).unwrap();

        assert!(result.is_enriched());
        assert_eq!(result.suggestions().len(), 2);
        assert_eq!(result.suggestions()[0].origin(), SuggestionOrigin::Rule);
        assert_eq!(result.suggestions_from(SuggestionOrigin::Ai).count(), 1);

        let again = Suggestion::new(SuggestionOrigin::Ai, "Another idea").unwrap();
        assert!(result.append_suggestions(vec![again]).is_err());
        assert_eq!(result.suggestions().len(), 2);
    }

    #[test]
    fn test_result_append_rejects_rule_suggestions() {
        let mut result = AnalysisResult::checked(full_record(), vec![], vec![], 100);
        let rule = Suggestion::new(SuggestionOrigin::Rule, "Injected").unwrap();

        assert!(result.append_suggestions(vec![rule]).is_err());
        assert!(!result.is_enriched());
    }

    #[test]
    fn test_result_round_trip() {
        let defect = Defect::new("TST-002", "TESTABILITY", Severity::Minor, "AC missing")
            .unwrap()
            .with_recommendation("Add acceptance criteria.");
        let rule = Suggestion::from_defect(&defect);
        let mut result = AnalysisResult::checked(full_record(), vec![defect], vec![rule], 90);
        result
            .append_suggestions(vec![Suggestion::new(SuggestionOrigin::Ai, "Given/When/Then")
                .unwrap()
                .with_confidence(0.5)
                .unwrap()])
            .unwrap();

        let rebuilt = AnalysisResult::from_representation(&result.to_representation()).unwrap();
        assert_eq!(rebuilt, result);
        assert_eq!(rebuilt.display_status(), DISPLAY_AT_RISK);
    }
}
