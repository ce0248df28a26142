use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the record pipeline
#[derive(Debug, Error, Clone, Serialize, Deserialize)]
pub enum PipelineError {
    /// Input that the pipeline cannot process at all (data not an array, config not an object)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Malformed configuration detected outside of a specific rule
    #[error("Validation error: {0}")]
    Validation(String),

    /// A rule rejected its configuration
    #[error("Invalid configuration for rule '{rule_type}': {}", .errors.join("; "))]
    InvalidRuleConfig {
        rule_type: String,
        errors: Vec<String>,
    },

    /// No rule is registered under the requested type
    #[error("Unknown rule type: {0}")]
    UnknownRule(String),

    /// A rule failed while executing
    #[error("Rule '{rule_type}' failed: {context}")]
    RuleExecution {
        rule_type: String,
        context: String,
        #[source]
        #[serde(skip)]
        source: Option<Box<PipelineError>>,
    },

    /// A computed field function failed
    #[error("Computation error: {0}")]
    Computation(String),

    /// Misuse of the rule registry
    #[error("Registry error: {0}")]
    Registry(String),

    /// JSON serialization/deserialization errors
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// I/O errors (file reading, etc.)
    #[error("IO error: {0}")]
    Io(String),

    /// Errors while exporting a result
    #[error("Export error: {0}")]
    Export(String),
}

impl PipelineError {
    /// Creates a new rule execution error with context
    pub fn rule_execution<S: Into<String>, C: Into<String>>(
        rule_type: S,
        context: C,
        source: Option<PipelineError>,
    ) -> Self {
        PipelineError::RuleExecution {
            rule_type: rule_type.into(),
            context: context.into(),
            source: source.map(Box::new),
        }
    }

    /// Convert from std::io::Error
    pub fn from_io(err: std::io::Error) -> Self {
        PipelineError::Io(err.to_string())
    }

    /// Convert from serde_json::Error
    pub fn from_serde(err: serde_json::Error) -> Self {
        PipelineError::Deserialization(err.to_string())
    }

    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::InvalidInput(_) => "INVALID_INPUT",
            PipelineError::Validation(_) => "VALIDATION_ERROR",
            PipelineError::InvalidRuleConfig { .. } => "INVALID_RULE_CONFIG",
            PipelineError::UnknownRule(_) => "UNKNOWN_RULE",
            PipelineError::RuleExecution { .. } => "RULE_EXECUTION_ERROR",
            PipelineError::Computation(_) => "COMPUTATION_ERROR",
            PipelineError::Registry(_) => "REGISTRY_ERROR",
            PipelineError::Deserialization(_) => "DESERIALIZATION_ERROR",
            PipelineError::Io(_) => "IO_ERROR",
            PipelineError::Export(_) => "EXPORT_ERROR",
        }
    }

    /// The rule this error is attributed to, if any
    pub fn rule_type(&self) -> Option<&str> {
        match self {
            PipelineError::InvalidRuleConfig { rule_type, .. }
            | PipelineError::RuleExecution { rule_type, .. } => Some(rule_type),
            PipelineError::UnknownRule(rule_type) => Some(rule_type),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::from_serde(err)
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::from_io(err)
    }
}

/// Type alias for Result with PipelineError
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Structured error information carried in processing metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorInfo {
    /// Error code (e.g., "INVALID_INPUT", "RULE_EXECUTION_ERROR")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Rule that failed, if the failure is attributable to one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<String>,

    /// Timestamp when the error occurred
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ErrorInfo {
    /// Build error info from a pipeline error
    pub fn new(error: &PipelineError) -> Self {
        Self {
            code: error.code().to_string(),
            message: error.to_string(),
            rule_type: error.rule_type().map(str::to_string),
            timestamp: Some(Utc::now().to_rfc3339()),
        }
    }

    /// Create a builder for ErrorInfo
    pub fn builder(code: impl Into<String>, message: impl Into<String>) -> ErrorInfoBuilder {
        ErrorInfoBuilder::new(code, message)
    }
}

impl From<&PipelineError> for ErrorInfo {
    fn from(error: &PipelineError) -> Self {
        ErrorInfo::new(error)
    }
}

/// Builder for creating ErrorInfo instances with a fluent API
pub struct ErrorInfoBuilder {
    code: String,
    message: String,
    rule_type: Option<String>,
    timestamp: Option<String>,
}

impl ErrorInfoBuilder {
    /// Create a new ErrorInfoBuilder with required fields
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            rule_type: None,
            timestamp: Some(Utc::now().to_rfc3339()),
        }
    }

    /// Set the rule the error belongs to
    pub fn rule_type(mut self, rule_type: impl Into<String>) -> Self {
        self.rule_type = Some(rule_type.into());
        self
    }

    /// Set custom timestamp (defaults to now if not set)
    pub fn timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Build the ErrorInfo instance
    pub fn build(self) -> ErrorInfo {
        ErrorInfo {
            code: self.code,
            message: self.message,
            rule_type: self.rule_type,
            timestamp: self.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            PipelineError::InvalidInput("x".to_string()).code(),
            "INVALID_INPUT"
        );
        assert_eq!(
            PipelineError::UnknownRule("bogus".to_string()).code(),
            "UNKNOWN_RULE"
        );
        assert_eq!(
            PipelineError::rule_execution("sortBy", "boom", None).code(),
            "RULE_EXECUTION_ERROR"
        );
    }

    #[test]
    fn test_error_messages() {
        let err = PipelineError::InvalidRuleConfig {
            rule_type: "limit".to_string(),
            errors: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "Invalid configuration for rule 'limit': a; b");
        assert_eq!(
            PipelineError::UnknownRule("bogusRule".to_string()).to_string(),
            "Unknown rule type: bogusRule"
        );
    }

    #[test]
    fn test_rule_execution_source() {
        use std::error::Error;

        let err = PipelineError::rule_execution(
            "transform",
            "bad record",
            Some(PipelineError::Computation("division by zero".to_string())),
        );
        assert_eq!(err.rule_type(), Some("transform"));
        assert!(err.source().is_some());

        let info = ErrorInfo::new(&err);
        assert_eq!(info.code, "RULE_EXECUTION_ERROR");
        assert_eq!(info.rule_type, Some("transform".to_string()));
        assert_eq!(info.message, "Rule 'transform' failed: bad record");
    }

    #[test]
    fn test_error_info_builder() {
        let error = ErrorInfo::builder("TEST_ERROR", "Test message").build();
        assert_eq!(error.code, "TEST_ERROR");
        assert_eq!(error.message, "Test message");
        assert!(error.timestamp.is_some());
        assert!(error.rule_type.is_none());

        let error = ErrorInfo::builder("INVALID_RULE_CONFIG", "count must be non-negative")
            .rule_type("limit")
            .timestamp("2024-01-01T00:00:00Z")
            .build();
        assert_eq!(error.rule_type, Some("limit".to_string()));
        assert_eq!(error.timestamp, Some("2024-01-01T00:00:00Z".to_string()));

        let serialized = serde_json::to_value(&error).unwrap();
        assert_eq!(serialized["rule_type"], "limit");
    }
}
