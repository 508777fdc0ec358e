//! Configuration loading and management for reqlint
//!
//! Architecture: Anti-Corruption Layer - Configuration translates external YAML formats
//! - Raw YAML structures are converted to clean domain objects
//! - Column aliases let the loader accept exports from different requirement tools
//! - Environment overrides are applied last, on top of file and built-in defaults

use crate::domain::errors::{LintError, LintResult};
use crate::domain::requirements::{Severity, DEFAULT_SOURCE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Only supported configuration format version
pub const CONFIG_VERSION: &str = "1.0";

/// File names looked up, in order, when no configuration path is given
pub const DEFAULT_CONFIG_FILES: [&str; 3] = ["reqlint.yaml", "reqlint.yml", ".reqlint.yaml"];

/// Upper bound for assistant suggestions per requirement
pub const MAX_SUGGESTIONS_LIMIT: usize = 10;

/// Main configuration structure for reqlint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinterConfig {
    /// Configuration format version
    pub version: String,
    /// How input columns map onto record fields
    pub input: InputConfig,
    /// Optional language-model assistant
    pub assistant: AssistantConfig,
    /// Report rendering defaults
    pub report: ReportConfig,
}

/// Column aliases for tabular inputs; first non-empty alias wins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Source label for records that do not carry one
    pub default_source: String,
    pub id_columns: Vec<String>,
    pub title_columns: Vec<String>,
    pub text_columns: Vec<String>,
    pub source_columns: Vec<String>,
    pub system_columns: Vec<String>,
    pub component_columns: Vec<String>,
    pub priority_columns: Vec<String>,
    pub rationale_columns: Vec<String>,
    pub verification_columns: Vec<String>,
    pub acceptance_columns: Vec<String>,
}

/// Settings of the OpenAI-compatible suggestion assistant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Whether the assistant is called at all
    pub enabled: bool,
    /// Chat model name
    pub model: String,
    /// Base URL of the chat completions API
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Suggestions kept per requirement
    pub max_suggestions: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Default rendering options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Hide defects below this severity in rendered output
    pub min_severity: Option<Severity>,
    pub show_suggestions: bool,
    pub show_evidence: bool,
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            default_source: DEFAULT_SOURCE.to_string(),
            id_columns: columns(&["req_id", "id", "requirement_id"]),
            title_columns: columns(&["title", "summary"]),
            text_columns: columns(&[
                "requirement_text",
                "text",
                "requirement",
                "description",
                "content",
            ]),
            source_columns: columns(&["source", "tool", "origin"]),
            system_columns: columns(&["system"]),
            component_columns: columns(&["component"]),
            priority_columns: columns(&["priority"]),
            rationale_columns: columns(&["rationale"]),
            verification_columns: columns(&["verification_method", "verification"]),
            acceptance_columns: columns(&["acceptance_criteria", "ac"]),
        }
    }
}

impl InputConfig {
    /// Every alias list with the field it feeds
    pub fn alias_lists(&self) -> [(&'static str, &[String]); 10] {
        [
            ("id", self.id_columns.as_slice()),
            ("title", self.title_columns.as_slice()),
            ("text", self.text_columns.as_slice()),
            ("source", self.source_columns.as_slice()),
            ("system", self.system_columns.as_slice()),
            ("component", self.component_columns.as_slice()),
            ("priority", self.priority_columns.as_slice()),
            ("rationale", self.rationale_columns.as_slice()),
            ("verification_method", self.verification_columns.as_slice()),
            ("acceptance_criteria", self.acceptance_columns.as_slice()),
        ]
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: "gpt-5".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_suggestions: 3,
            timeout_secs: 30,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            min_severity: None,
            show_suggestions: true,
            show_evidence: true,
        }
    }
}

impl LinterConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> LintResult<Self> {
        let contents = fs::read_to_string(&path).map_err(|e| {
            LintError::config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            LintError::config(format!(
                "Failed to parse config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from string content
    pub fn load_from_str(content: &str) -> LintResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| LintError::config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Built-in configuration
    pub fn with_defaults() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            input: InputConfig::default(),
            assistant: AssistantConfig::default(),
            report: ReportConfig::default(),
        }
    }

    /// First default configuration file present in `dir`
    pub fn discover(dir: impl AsRef<Path>) -> Option<PathBuf> {
        DEFAULT_CONFIG_FILES
            .iter()
            .map(|name| dir.as_ref().join(name))
            .find(|path| path.is_file())
    }

    /// Validate the configuration
    pub fn validate(&self) -> LintResult<()> {
        if self.version != CONFIG_VERSION {
            return Err(LintError::config(format!(
                "Unsupported configuration version '{}' (expected {})",
                self.version, CONFIG_VERSION
            )));
        }

        for (field, aliases) in self.input.alias_lists() {
            if aliases.iter().all(|a| a.trim().is_empty()) {
                return Err(LintError::config(format!(
                    "input: at least one column alias is required for '{field}'"
                )));
            }
        }

        let assistant = &self.assistant;
        if !(1..=MAX_SUGGESTIONS_LIMIT).contains(&assistant.max_suggestions) {
            return Err(LintError::config(format!(
                "assistant.max_suggestions must be between 1 and {} (got {})",
                MAX_SUGGESTIONS_LIMIT, assistant.max_suggestions
            )));
        }
        if assistant.timeout_secs == 0 {
            return Err(LintError::config("assistant.timeout_secs must be positive"));
        }
        if assistant.model.trim().is_empty() {
            return Err(LintError::config("assistant.model must not be empty"));
        }
        if assistant.base_url.trim().is_empty() {
            return Err(LintError::config("assistant.base_url must not be empty"));
        }
        if assistant.api_key_env.trim().is_empty() {
            return Err(LintError::config("assistant.api_key_env must not be empty"));
        }

        Ok(())
    }

    /// Apply `ENABLE_AI`, `OPENAI_MODEL` and `OPENAI_BASE_URL` from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(flag) = lookup("ENABLE_AI") {
            self.assistant.enabled = is_truthy(&flag);
        }
        if let Some(model) = lookup("OPENAI_MODEL").filter(|m| !m.trim().is_empty()) {
            self.assistant.model = model.trim().to_string();
        }
        if let Some(url) = lookup("OPENAI_BASE_URL").filter(|u| !u.trim().is_empty()) {
            self.assistant.base_url = url.trim().to_string();
        }
    }

    /// Convert to YAML for display
    pub fn to_yaml(&self) -> LintResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| LintError::config(format!("Failed to serialize config: {e}")))
    }
}

impl Default for LinterConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// `1`, `true`, `yes`, `y` and `on`, case-insensitive
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: LinterConfig,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: LinterConfig::default(),
        }
    }

    pub fn default_source(mut self, source: impl Into<String>) -> Self {
        self.config.input.default_source = source.into();
        self
    }

    /// Accept another column name for requirement text
    pub fn add_text_column(mut self, column: impl Into<String>) -> Self {
        self.config.input.text_columns.push(column.into());
        self
    }

    /// Accept another column name for the requirement id
    pub fn add_id_column(mut self, column: impl Into<String>) -> Self {
        self.config.input.id_columns.push(column.into());
        self
    }

    pub fn enable_assistant(mut self, enabled: bool) -> Self {
        self.config.assistant.enabled = enabled;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.assistant.model = model.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.assistant.base_url = url.into();
        self
    }

    pub fn max_suggestions(mut self, max: usize) -> Self {
        self.config.assistant.max_suggestions = max;
        self
    }

    pub fn min_severity(mut self, severity: Severity) -> Self {
        self.config.report.min_severity = Some(severity);
        self
    }

    /// Build the final configuration
    pub fn build(self) -> LintResult<LinterConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = LinterConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.assistant.enabled);
        assert_eq!(config.assistant.model, "gpt-5");
        assert_eq!(config.input.id_columns[0], "req_id");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
version: "1.0"
assistant:
  enabled: true
  max_suggestions: 2
report:
  min_severity: Major
"#;

        let config = LinterConfig::load_from_str(yaml).unwrap();
        assert!(config.assistant.enabled);
        assert_eq!(config.assistant.max_suggestions, 2);
        assert_eq!(config.assistant.timeout_secs, 30);
        assert_eq!(config.report.min_severity, Some(Severity::Major));
        assert_eq!(config.input, InputConfig::default());
    }

    #[rstest]
    #[case("version: \"2.0\"\n")]
    #[case("assistant:\n  max_suggestions: 0\n")]
    #[case("assistant:\n  max_suggestions: 11\n")]
    #[case("assistant:\n  timeout_secs: 0\n")]
    #[case("assistant:\n  model: \"\"\n")]
    #[case("input:\n  text_columns: []\n")]
    #[case("report:\n  min_severity: LOUD\n")]
    fn test_invalid_configs(#[case] yaml: &str) {
        let err = LinterConfig::load_from_str(yaml).unwrap_err();
        assert!(matches!(err, LintError::Configuration { .. }));
    }

    #[test]
    fn test_load_from_file_and_discover() {
        let temp_dir = TempDir::new().unwrap();
        assert!(LinterConfig::discover(temp_dir.path()).is_none());

        let path = temp_dir.path().join("reqlint.yml");
        fs::write(&path, "input:\n  default_source: doors\n").unwrap();

        assert_eq!(LinterConfig::discover(temp_dir.path()), Some(path.clone()));
        let config = LinterConfig::load_from_file(&path).unwrap();
        assert_eq!(config.input.default_source, "doors");
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err = LinterConfig::load_from_file("/nonexistent/reqlint.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("ENABLE_AI", "Yes"),
            ("OPENAI_MODEL", " gpt-4o-mini "),
            ("OPENAI_BASE_URL", ""),
        ]
        .into_iter()
        .collect();

        let mut config = LinterConfig::default();
        config.apply_overrides_from(|k| env.get(k).map(|v| v.to_string()));

        assert!(config.assistant.enabled);
        assert_eq!(config.assistant.model, "gpt-4o-mini");
        assert_eq!(config.assistant.base_url, "https://api.openai.com/v1");

        config.apply_overrides_from(|k| (k == "ENABLE_AI").then(|| "off".to_string()));
        assert!(!config.assistant.enabled);
    }

    #[rstest]
    #[case("1", true)]
    #[case("TRUE", true)]
    #[case("on", true)]
    #[case("y", true)]
    #[case("0", false)]
    #[case("no", false)]
    #[case("", false)]
    fn test_truthy(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(is_truthy(value), expected);
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .default_source("polarion")
            .add_text_column("shall_statement")
            .enable_assistant(true)
            .max_suggestions(5)
            .build()
            .unwrap();

        assert_eq!(config.input.default_source, "polarion");
        assert!(config.input.text_columns.contains(&"shall_statement".to_string()));
        assert_eq!(config.assistant.max_suggestions, 5);

        assert!(ConfigBuilder::new().max_suggestions(0).build().is_err());
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = ConfigBuilder::new().min_severity(Severity::Minor).build().unwrap();
        let yaml = config.to_yaml().unwrap();
        assert_eq!(LinterConfig::load_from_str(&yaml).unwrap(), config);
    }
}
