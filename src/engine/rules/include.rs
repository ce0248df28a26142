use crate::engine::error::{PipelineError, Result};
use crate::engine::rules::builtins::INCLUDE_RULE;
use crate::engine::rules::{Rule, RuleConfig, ValidationReport, matches_record, validate_criteria};
use log::debug;
use serde_json::Value;

/// Keeps only the records that match the criteria
pub struct IncludeRule;

impl IncludeRule {
    pub const PRIORITY: i32 = 1;

    pub fn new() -> Self {
        Self
    }
}

impl Default for IncludeRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for IncludeRule {
    fn rule_type(&self) -> &str {
        INCLUDE_RULE
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn description(&self) -> &str {
        "Keep records matching an object (AND) or any of an array of objects (OR)"
    }

    fn validate(&self, config: &RuleConfig) -> ValidationReport {
        validate_criteria(
            config,
            "empty criteria array: no records will be included",
            "empty criteria object: all records will be included",
        )
    }

    fn execute(&self, data: &[Value], config: &RuleConfig) -> Result<Vec<Value>> {
        let criteria = config.as_json().ok_or_else(|| {
            PipelineError::Validation("include expects JSON criteria".to_string())
        })?;

        let kept: Vec<Value> = data
            .iter()
            .filter(|record| matches_record(record, criteria))
            .cloned()
            .collect();

        debug!("Include: kept {} of {} records", kept.len(), data.len());
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn people() -> Vec<Value> {
        vec![
            json!({"name": "John", "status": "active", "age": 30}),
            json!({"name": "John", "status": "inactive", "age": 25}),
            json!({"name": "Jane", "status": "active", "age": 28}),
        ]
    }

    #[test]
    fn test_include_single_criterion() {
        let rule = IncludeRule::new();
        let out = rule
            .execute(&people(), &json!({"status": "active"}).into())
            .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["name"], "John");
        assert_eq!(out[1]["name"], "Jane");
    }

    #[test]
    fn test_include_or_criteria() {
        let rule = IncludeRule::new();
        let out = rule
            .execute(&people(), &json!([{"age": 25}, {"name": "Jane"}]).into())
            .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["status"], "inactive");
        assert_eq!(out[1]["name"], "Jane");
    }

    #[test]
    fn test_include_is_idempotent() {
        let rule = IncludeRule::new();
        let config: RuleConfig = json!({"name": "John"}).into();
        let once = rule.execute(&people(), &config).unwrap();
        let twice = rule.execute(&once, &config).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_include_does_not_touch_input() {
        let rule = IncludeRule::new();
        let data = people();
        let _ = rule.execute(&data, &json!({"status": "active"}).into()).unwrap();
        assert_eq!(data, people());
    }

    #[test]
    fn test_include_validation() {
        let rule = IncludeRule::new();
        assert!(rule.validate(&json!({"status": "active"}).into()).is_valid);

        let report = rule.validate(&json!([]).into());
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 1);

        assert!(!rule.validate(&json!(null).into()).is_valid);
        assert!(!rule.validate(&json!(7).into()).is_valid);
    }
}
