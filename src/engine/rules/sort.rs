use crate::engine::error::{PipelineError, Result};
use crate::engine::rules::builtins::SORT_RULE;
use crate::engine::rules::{Rule, RuleConfig, ValidationReport, json_type_name};
use crate::engine::utils::multi_key_comparator;
use log::debug;
use serde_json::Value;

/// Stable multi-key sort using natural ordering
///
/// Config is a single field path or an ordered list of them; earlier paths
/// win, later ones break ties.
pub struct SortRule;

impl SortRule {
    pub const PRIORITY: i32 = 10;

    pub fn new() -> Self {
        Self
    }

    fn sort_keys(config: &RuleConfig) -> Result<Vec<String>> {
        match config.as_json() {
            Some(Value::String(key)) => Ok(vec![key.clone()]),
            Some(Value::Array(keys)) => keys
                .iter()
                .map(|key| {
                    key.as_str().map(str::to_string).ok_or_else(|| {
                        PipelineError::Validation("sort keys must be strings".to_string())
                    })
                })
                .collect(),
            _ => Err(PipelineError::Validation(
                "sortBy expects a field path or an array of field paths".to_string(),
            )),
        }
    }
}

impl Default for SortRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for SortRule {
    fn rule_type(&self) -> &str {
        SORT_RULE
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn description(&self) -> &str {
        "Stable sort by one or more field paths using natural ordering"
    }

    fn validate(&self, config: &RuleConfig) -> ValidationReport {
        let mut report = ValidationReport::new();

        match config.as_json() {
            Some(Value::String(key)) => {
                if key.is_empty() {
                    report.add_error("sort key must not be empty");
                }
            }
            Some(Value::Array(keys)) => {
                if keys.is_empty() {
                    report.add_warning("empty sort key list: records keep their order");
                }
                for (index, key) in keys.iter().enumerate() {
                    match key {
                        Value::String(k) if k.is_empty() => {
                            report.add_error(format!("sort key at index {index} is empty"));
                        }
                        Value::String(_) => {}
                        other => report.add_error(format!(
                            "sort key at index {index} must be a string, got {}",
                            json_type_name(other)
                        )),
                    }
                }
            }
            Some(other) => report.add_error(format!(
                "sortBy expects a string or an array of strings, got {}",
                json_type_name(other)
            )),
            None => report.add_error("sortBy expects a JSON string or array config"),
        }

        report
    }

    fn execute(&self, data: &[Value], config: &RuleConfig) -> Result<Vec<Value>> {
        let keys = Self::sort_keys(config)?;
        let mut sorted = data.to_vec();

        if !keys.is_empty() {
            debug!("Sort: ordering {} records by {:?}", sorted.len(), keys);
            // sort_by is stable
            sorted.sort_by(multi_key_comparator(keys));
        }

        Ok(sorted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::utils::natural_compare;
    use serde_json::json;
    use std::cmp::Ordering;

    fn names(records: &[Value]) -> Vec<&str> {
        records.iter().map(|r| r["name"].as_str().unwrap()).collect()
    }

    #[test]
    fn test_sort_single_key_natural() {
        let data = vec![
            json!({"name": "item10"}),
            json!({"name": "item2"}),
            json!({"name": "Item1"}),
        ];
        let out = SortRule::new().execute(&data, &json!("name").into()).unwrap();
        assert_eq!(names(&out), vec!["Item1", "item2", "item10"]);
    }

    #[test]
    fn test_sort_numeric_values() {
        let data = vec![json!({"v": 10}), json!({"v": "9"}), json!({"v": 2.5})];
        let out = SortRule::new().execute(&data, &json!(["v"]).into()).unwrap();
        assert_eq!(out, vec![json!({"v": 2.5}), json!({"v": "9"}), json!({"v": 10})]);
    }

    #[test]
    fn test_sort_is_stable() {
        let data = vec![
            json!({"name": "b", "group": 1}),
            json!({"name": "a", "group": 2}),
            json!({"name": "c", "group": 1}),
            json!({"name": "d", "group": 2}),
        ];
        let out = SortRule::new().execute(&data, &json!("group").into()).unwrap();
        assert_eq!(names(&out), vec!["b", "c", "a", "d"]);
    }

    #[test]
    fn test_sort_composition_matches_chained_sorts() {
        let data = vec![
            json!({"name": "x", "dept": "ops", "age": 40}),
            json!({"name": "y", "dept": "eng", "age": 35}),
            json!({"name": "z", "dept": "ops", "age": 22}),
            json!({"name": "w", "dept": "eng", "age": 35}),
            json!({"name": "v", "dept": "art"}),
        ];
        let rule = SortRule::new();

        let combined = rule.execute(&data, &json!(["dept", "age"]).into()).unwrap();
        let by_age = rule.execute(&data, &json!("age").into()).unwrap();
        let chained = rule.execute(&by_age, &json!("dept").into()).unwrap();

        assert_eq!(combined, chained);
        assert_eq!(names(&combined), vec!["v", "y", "w", "z", "x"]);
    }

    #[test]
    fn test_sort_mixed_decimals_and_labels() {
        let mut data = Vec::new();
        for n in 0..100 {
            data.push(json!({"v": format!("9.{n}")}));
            data.push(json!({"v": format!("9.{n}a")}));
            data.push(json!({"v": format!("{}.{}", n % 7, n % 13)}));
            data.push(json!({"v": format!("{}.{}b", n % 11, n % 5)}));
        }

        let out = SortRule::new().execute(&data, &json!("v").into()).unwrap();

        assert_eq!(out.len(), data.len());
        for pair in out.windows(2) {
            assert_ne!(natural_compare(&pair[0]["v"], &pair[1]["v"]), Ordering::Greater);
        }
        // numeric strings come before labels
        let first_label = out
            .iter()
            .position(|r| r["v"].as_str().unwrap().parse::<f64>().is_err())
            .unwrap();
        assert!(out[first_label..]
            .iter()
            .all(|r| r["v"].as_str().unwrap().parse::<f64>().is_err()));
    }

    #[test]
    fn test_sort_missing_values_first() {
        let data = vec![json!({"name": "a", "rank": 2}), json!({"name": "b"})];
        let out = SortRule::new().execute(&data, &json!("rank").into()).unwrap();
        assert_eq!(names(&out), vec!["b", "a"]);
    }

    #[test]
    fn test_sort_empty_keys_is_noop() {
        let data = vec![json!({"name": "b"}), json!({"name": "a"})];
        let out = SortRule::new().execute(&data, &json!([]).into()).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_sort_validation() {
        let rule = SortRule::new();
        assert!(rule.validate(&json!("name").into()).is_valid);
        assert!(rule.validate(&json!(["a", "b.c"]).into()).is_valid);

        let report = rule.validate(&json!([]).into());
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 1);

        assert!(!rule.validate(&json!(["a", ""]).into()).is_valid);
        assert!(!rule.validate(&json!(["a", 3]).into()).is_valid);
        assert!(!rule.validate(&json!("").into()).is_valid);
        assert!(!rule.validate(&json!({"field": "a"}).into()).is_valid);
    }
}
