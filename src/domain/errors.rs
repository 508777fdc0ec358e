//! Error taxonomy shared by every layer of reqlint
//!
//! Validation and engine-input errors describe programming or data-quality faults
//! and propagate to the immediate caller. Faults of the optional suggestion
//! collaborator never reach this type: they are absorbed at that boundary.

use crate::domain::requirements::Severity;
use std::path::Path;

/// Error types that can occur while loading, analyzing or reporting requirements
#[derive(Debug, thiserror::Error)]
pub enum LintError {
    /// A domain entity was malformed at construction time
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The orchestrator was handed something that is not a requirement record
    #[error("Engine input error: {message}")]
    EngineInput { message: String },

    /// Configuration file could not be loaded or parsed
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// An input file could not be mapped onto requirement records
    #[error("Input error in {path}: {message}")]
    Input { path: String, message: String },

    /// File could not be read or written
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// A report could not be rendered
    #[error("Report error: {message}")]
    Report { message: String },

    /// Defects reached the severity a run was gated on
    #[error("Quality gate failed: {count} defect(s) at or above {threshold}")]
    QualityGate { count: usize, threshold: Severity },
}

impl LintError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an engine input error
    pub fn engine_input(message: impl Into<String>) -> Self {
        Self::EngineInput {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an input error tied to a file
    pub fn input(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Input {
            path: path.as_ref().display().to_string(),
            message: message.into(),
        }
    }

    /// Create a report error
    pub fn report(message: impl Into<String>) -> Self {
        Self::Report {
            message: message.into(),
        }
    }

    /// Whether this error came from entity validation
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// Result type for reqlint operations
pub type LintResult<T> = Result<T, LintError>;
