use crate::engine::rules::transform::TransformConfig;
use serde_json::Value;

/// Settings handed to a single rule
///
/// Most configs are plain JSON, exactly as they appear in a pipeline
/// definition. Transform configs built in code use the typed variant so
/// computed fields can carry closures.
#[derive(Debug, Clone)]
pub enum RuleConfig {
    /// Raw JSON settings
    Json(Value),
    /// Transform settings built in code
    Transform(TransformConfig),
}

impl RuleConfig {
    /// The JSON settings, if this is a JSON config
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            RuleConfig::Json(value) => Some(value),
            RuleConfig::Transform(_) => None,
        }
    }

    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            RuleConfig::Json(_) => "json",
            RuleConfig::Transform(_) => "transform",
        }
    }
}

impl From<Value> for RuleConfig {
    fn from(value: Value) -> Self {
        RuleConfig::Json(value)
    }
}

impl From<TransformConfig> for RuleConfig {
    fn from(config: TransformConfig) -> Self {
        RuleConfig::Transform(config)
    }
}
