use crate::engine::error::{PipelineError, Result};
use crate::engine::rules::builtins::EXCLUDE_RULE;
use crate::engine::rules::{Rule, RuleConfig, ValidationReport, matches_record, validate_criteria};
use log::debug;
use serde_json::Value;

/// Drops the records that match the criteria
pub struct ExcludeRule;

impl ExcludeRule {
    pub const PRIORITY: i32 = 2;

    pub fn new() -> Self {
        Self
    }
}

impl Default for ExcludeRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for ExcludeRule {
    fn rule_type(&self) -> &str {
        EXCLUDE_RULE
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn description(&self) -> &str {
        "Drop records matching an object (AND) or any of an array of objects (OR)"
    }

    fn validate(&self, config: &RuleConfig) -> ValidationReport {
        validate_criteria(
            config,
            "empty criteria array: no records will be excluded",
            "empty criteria object: all records will be excluded",
        )
    }

    fn execute(&self, data: &[Value], config: &RuleConfig) -> Result<Vec<Value>> {
        let criteria = config.as_json().ok_or_else(|| {
            PipelineError::Validation("exclude expects JSON criteria".to_string())
        })?;

        let kept: Vec<Value> = data
            .iter()
            .filter(|record| !matches_record(record, criteria))
            .cloned()
            .collect();

        debug!(
            "Exclude: dropped {} of {} records",
            data.len() - kept.len(),
            data.len()
        );
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::rules::IncludeRule;
    use serde_json::json;

    fn orders() -> Vec<Value> {
        vec![
            json!({"id": 1, "state": "open", "region": {"code": "EU"}}),
            json!({"id": 2, "state": "closed", "region": {"code": "US"}}),
            json!({"id": 3, "state": "open", "region": {"code": "US"}}),
            json!({"id": 4, "state": "void"}),
        ]
    }

    #[test]
    fn test_exclude_nested_path() {
        let rule = ExcludeRule::new();
        let out = rule
            .execute(&orders(), &json!({"region.code": "US"}).into())
            .unwrap();

        let ids: Vec<i64> = out.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn test_exclude_empty_array_keeps_everything() {
        let rule = ExcludeRule::new();
        let out = rule.execute(&orders(), &json!([]).into()).unwrap();
        assert_eq!(out, orders());
    }

    #[test]
    fn test_include_and_exclude_partition() {
        let criteria = [
            json!({"state": "open"}),
            json!([{"state": "void"}, {"region.code": "EU"}]),
            json!({}),
            json!([]),
        ];

        for criterion in criteria {
            let config: RuleConfig = criterion.into();
            let included = IncludeRule::new().execute(&orders(), &config).unwrap();
            let excluded = ExcludeRule::new().execute(&orders(), &config).unwrap();

            assert_eq!(included.len() + excluded.len(), orders().len());
            for record in orders() {
                let in_included = included.contains(&record);
                let in_excluded = excluded.contains(&record);
                assert!(in_included != in_excluded);
            }
        }
    }

    #[test]
    fn test_exclude_validation_warnings() {
        let rule = ExcludeRule::new();
        let report = rule.validate(&json!({}).into());
        assert!(report.is_valid);
        assert_eq!(
            report.warnings,
            vec!["empty criteria object: all records will be excluded".to_string()]
        );
    }
}
