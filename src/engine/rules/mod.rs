use crate::engine::error::{PipelineError, Result};
use crate::engine::utils::{deep_equals, get_nested_value, is_plain_object};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod config;
pub use config::RuleConfig;

pub mod include;
pub use include::IncludeRule;

pub mod exclude;
pub use exclude::ExcludeRule;

pub mod sort;
pub use sort::SortRule;

pub mod limit;
pub use limit::{LimitConfig, LimitRule};

pub mod transform;
pub use transform::{ComputeFn, ComputedField, TransformConfig, TransformRule};

// Re-export all built-in rules for easier access
pub mod builtins {
    use super::*;
    use std::sync::Arc;

    // Standard rule names used for registering built-ins
    pub const INCLUDE_RULE: &str = "include";
    pub const EXCLUDE_RULE: &str = "exclude";
    pub const SORT_RULE: &str = "sortBy";
    pub const LIMIT_RULE: &str = "limit";
    pub const TRANSFORM_RULE: &str = "transform";

    // Get all built-in rules
    pub fn get_all_rules() -> Vec<Arc<dyn Rule>> {
        vec![
            Arc::new(IncludeRule::new()),
            Arc::new(ExcludeRule::new()),
            Arc::new(SortRule::new()),
            Arc::new(TransformRule::new()),
            Arc::new(LimitRule::new()),
        ]
    }
}

/// Interface every pipeline rule implements
///
/// Rules are stateless: all per-call settings arrive through the [`RuleConfig`],
/// and `execute` returns fresh records instead of touching its input.
///
/// ## Contract
///
/// - `validate` is pure and never fails; an empty error list means the config is
///   safe to pass to `execute`.
/// - `execute` assumes a validated config. Given an invalid one it returns an
///   error rather than guessing.
/// - `priority` is fixed per rule type. Lower values run earlier in a pipeline.
pub trait Rule: Send + Sync {
    /// Name the rule is registered and configured under
    fn rule_type(&self) -> &str;

    /// Execution order within a pipeline, ascending
    fn priority(&self) -> i32;

    /// One-line human readable summary
    fn description(&self) -> &str {
        ""
    }

    /// Check a configuration without executing anything
    fn validate(&self, config: &RuleConfig) -> ValidationReport;

    /// Produce a new record array from `data`
    fn execute(&self, data: &[Value], config: &RuleConfig) -> Result<Vec<Value>>;

    /// Execute against an arbitrary JSON value, failing if it is not an array
    fn execute_value(&self, data: &Value, config: &RuleConfig) -> Result<Vec<Value>> {
        match data {
            Value::Array(records) => self.execute(records, config),
            other => Err(PipelineError::InvalidInput(format!(
                "rule '{}' expects an array of records, got {}",
                self.rule_type(),
                json_type_name(other)
            ))),
        }
    }

    /// Introspection record for this rule
    fn describe(&self) -> RuleDescriptor {
        RuleDescriptor {
            rule_type: self.rule_type().to_string(),
            priority: self.priority(),
            description: self.description().to_string(),
        }
    }
}

/// Serializable summary of a registered rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleDescriptor {
    pub rule_type: String,
    pub priority: i32,
    pub description: String,
}

/// Outcome of validating a rule or pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationReport {
    /// An empty, valid report
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.is_valid = false;
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Fold another report into this one, prefixing each message with `prefix`
    pub fn merge_prefixed(&mut self, prefix: &str, other: ValidationReport) {
        for error in other.errors {
            self.add_error(format!("{prefix}: {error}"));
        }
        for warning in other.warnings {
            self.add_warning(format!("{prefix}: {warning}"));
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Test whether a record satisfies the criteria
///
/// - An array of criteria matches when ANY element matches (OR)
/// - A single criterion matches when EVERY key resolves, via its dotted path,
///   to a value deep-equal to the expected one (AND)
///
/// A path missing from the record never matches, not even an expected `null`.
pub fn matches_record(record: &Value, criteria: &Value) -> bool {
    match criteria {
        Value::Array(alternatives) => alternatives.iter().any(|c| matches_record(record, c)),
        Value::Object(criterion) => criterion.iter().all(|(path, expected)| {
            get_nested_value(record, path).is_some_and(|actual| deep_equals(actual, expected))
        }),
        _ => false,
    }
}

/// Validation shared by the include and exclude rules
///
/// `empty_array_note` and `empty_object_note` describe what empty criteria
/// means for the calling rule; they are reported as warnings.
pub(crate) fn validate_criteria(
    config: &RuleConfig,
    empty_array_note: &str,
    empty_object_note: &str,
) -> ValidationReport {
    let mut report = ValidationReport::new();

    let Some(criteria) = config.as_json() else {
        report.add_error("criteria must be a JSON object or array of objects");
        return report;
    };

    match criteria {
        Value::Null => report.add_error("criteria must not be null"),
        Value::Object(criterion) => {
            if criterion.is_empty() {
                report.add_warning(empty_object_note);
            }
        }
        Value::Array(alternatives) => {
            if alternatives.is_empty() {
                report.add_warning(empty_array_note);
            }
            for (index, alternative) in alternatives.iter().enumerate() {
                if !is_plain_object(alternative) {
                    report.add_error(format!(
                        "criteria[{index}] must be an object, got {}",
                        json_type_name(alternative)
                    ));
                }
            }
        }
        other => report.add_error(format!(
            "criteria must be an object or an array of objects, got {}",
            json_type_name(other)
        )),
    }

    report
}

/// Short type name used in validation messages
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
