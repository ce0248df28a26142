use crate::engine::error::{PipelineError, Result};
use crate::engine::rules::RuleConfig;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Ordered mapping of rule type to rule config
///
/// Only the keys present run. Order of insertion is kept so rules that share a
/// priority execute deterministically.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    entries: Vec<(String, RuleConfig)>,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the config for `rule_type`, builder style
    pub fn with(mut self, rule_type: impl Into<String>, config: impl Into<RuleConfig>) -> Self {
        self.insert(rule_type, config);
        self
    }

    /// Add or replace the config for `rule_type`
    ///
    /// A replaced entry keeps its original position.
    pub fn insert(&mut self, rule_type: impl Into<String>, config: impl Into<RuleConfig>) {
        let rule_type = rule_type.into();
        let config = config.into();
        match self.entries.iter_mut().find(|(name, _)| *name == rule_type) {
            Some(entry) => entry.1 = config,
            None => self.entries.push((rule_type, config)),
        }
    }

    pub fn get(&self, rule_type: &str) -> Option<&RuleConfig> {
        self.entries
            .iter()
            .find(|(name, _)| name == rule_type)
            .map(|(_, config)| config)
    }

    pub fn remove(&mut self, rule_type: &str) -> Option<RuleConfig> {
        let index = self.entries.iter().position(|(name, _)| name == rule_type)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleConfig)> {
        self.entries
            .iter()
            .map(|(name, config)| (name.as_str(), config))
    }

    pub fn rule_types(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build from a JSON object such as `{"include": {...}, "limit": 10}`
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| {
            PipelineError::InvalidInput("pipeline config must be a JSON object".to_string())
        })?;

        let mut config = Self::new();
        for (rule_type, rule_config) in map {
            config.insert(rule_type.clone(), rule_config.clone());
        }
        Ok(config)
    }

    /// Load pipeline config from JSON string
    pub fn from_json(json_str: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json_str)?;
        Self::from_value(&value)
    }

    /// Load pipeline config from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json_str = fs::read_to_string(path)?;
        Self::from_json(&json_str)
    }
}

impl TryFrom<&Value> for PipelineConfig {
    type Error = PipelineError;

    fn try_from(value: &Value) -> Result<Self> {
        Self::from_value(value)
    }
}

impl<K, C> FromIterator<(K, C)> for PipelineConfig
where
    K: Into<String>,
    C: Into<RuleConfig>,
{
    fn from_iter<I: IntoIterator<Item = (K, C)>>(iter: I) -> Self {
        let mut config = Self::new();
        for (rule_type, rule_config) in iter {
            config.insert(rule_type, rule_config);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::rules::TransformConfig;
    use serde_json::json;

    #[test]
    fn test_from_value_keeps_key_order() {
        let config = PipelineConfig::from_value(&json!({
            "limit": 1,
            "include": [{"status": "active"}],
            "bogus": {}
        }))
        .unwrap();

        let keys: Vec<&str> = config.rule_types().collect();
        assert_eq!(keys, vec!["limit", "include", "bogus"]);
        assert_eq!(config.get("limit").unwrap().as_json(), Some(&json!(1)));
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        let err = PipelineConfig::from_value(&json!([1, 2])).unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
    }

    #[test]
    fn test_from_json() {
        let config = PipelineConfig::from_json(r#"{"sortBy": ["name"], "limit": 10}"#).unwrap();
        assert_eq!(config.len(), 2);

        let err = PipelineConfig::from_json("{not json").unwrap_err();
        assert_eq!(err.code(), "DESERIALIZATION_ERROR");
    }

    #[test]
    fn test_from_file_missing() {
        let err = PipelineConfig::from_file("/definitely/not/here.json").unwrap_err();
        assert_eq!(err.code(), "IO_ERROR");
    }

    #[test]
    fn test_builder_replaces_in_place() {
        let config = PipelineConfig::new()
            .with("include", json!({"a": 1}))
            .with("transform", TransformConfig::new().field("a"))
            .with("include", json!({"a": 2}));

        let keys: Vec<&str> = config.rule_types().collect();
        assert_eq!(keys, vec!["include", "transform"]);
        assert_eq!(config.get("include").unwrap().as_json(), Some(&json!({"a": 2})));
    }

    #[test]
    fn test_remove_and_collect() {
        let mut config: PipelineConfig = vec![("limit", json!(3)), ("sortBy", json!("n"))]
            .into_iter()
            .collect();
        assert!(config.remove("limit").is_some());
        assert!(config.remove("limit").is_none());
        assert_eq!(config.len(), 1);
        assert!(!config.is_empty());
    }
}
