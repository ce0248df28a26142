use crate::engine::error::{PipelineError, Result};
use crate::engine::rules::builtins::LIMIT_RULE;
use crate::engine::rules::{Rule, RuleConfig, ValidationReport, json_type_name};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parsed limit settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitConfig {
    pub count: usize,
    #[serde(default)]
    pub offset: usize,
}

impl LimitConfig {
    /// Parse either a bare count (`10`) or `{"count": 10, "offset": 5}`
    pub fn from_json(input: &Value) -> Result<Self> {
        match input {
            Value::Object(map) => {
                let count = map
                    .get("count")
                    .ok_or_else(|| {
                        PipelineError::Validation("Missing 'count' in limit config".to_string())
                    })
                    .and_then(|v| parse_non_negative(v, "count"))?;
                let offset = match map.get("offset") {
                    Some(v) => parse_non_negative(v, "offset")?,
                    None => 0,
                };
                Ok(LimitConfig { count, offset })
            }
            other => Ok(LimitConfig {
                count: parse_non_negative(other, "count")?,
                offset: 0,
            }),
        }
    }

    /// Apply slice semantics: skip `offset`, then take at most `count`
    pub fn apply(&self, data: &[Value]) -> Vec<Value> {
        data.iter()
            .skip(self.offset)
            .take(self.count)
            .cloned()
            .collect()
    }
}

/// Accepts integral JSON numbers >= 0, including `10.0`
fn as_non_negative_integer(value: &Value) -> Option<usize> {
    let number = value.as_number()?;
    if let Some(n) = number.as_u64() {
        return usize::try_from(n).ok();
    }
    let f = number.as_f64()?;
    if f >= 0.0 && f.fract() == 0.0 && f <= usize::MAX as f64 {
        Some(f as usize)
    } else {
        None
    }
}

fn parse_non_negative(value: &Value, name: &str) -> Result<usize> {
    as_non_negative_integer(value).ok_or_else(|| {
        PipelineError::Validation(format!("'{name}' must be a non-negative integer"))
    })
}

/// Returns a window of at most `count` records starting at `offset`
pub struct LimitRule;

impl LimitRule {
    pub const PRIORITY: i32 = 20;

    pub fn new() -> Self {
        Self
    }
}

impl Default for LimitRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for LimitRule {
    fn rule_type(&self) -> &str {
        LIMIT_RULE
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn description(&self) -> &str {
        "Keep at most `count` records, optionally skipping `offset` first"
    }

    fn validate(&self, config: &RuleConfig) -> ValidationReport {
        let mut report = ValidationReport::new();

        let Some(input) = config.as_json() else {
            report.add_error("limit expects a number or {count, offset} config");
            return report;
        };

        let count = match input {
            Value::Object(map) => {
                if let Some(offset) = map.get("offset")
                    && as_non_negative_integer(offset).is_none()
                {
                    report.add_error("offset must be a non-negative integer");
                }
                match map.get("count") {
                    Some(count) => Some(count),
                    None => {
                        report.add_error("count is required");
                        None
                    }
                }
            }
            Value::Number(_) => Some(input),
            other => {
                report.add_error(format!(
                    "limit expects a number or an object, got {}",
                    json_type_name(other)
                ));
                None
            }
        };

        if let Some(count) = count {
            match as_non_negative_integer(count) {
                Some(0) => report.add_warning("count is 0: the result will be empty"),
                Some(_) => {}
                None => report.add_error("count must be a non-negative integer"),
            }
        }

        report
    }

    fn execute(&self, data: &[Value], config: &RuleConfig) -> Result<Vec<Value>> {
        let input = config.as_json().ok_or_else(|| {
            PipelineError::Validation("limit expects a JSON config".to_string())
        })?;
        let limit = LimitConfig::from_json(input)?;

        debug!(
            "Limit: count={} offset={} over {} records",
            limit.count,
            limit.offset,
            data.len()
        );
        Ok(limit.apply(data))
    }
}
