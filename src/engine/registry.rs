//! # Rule Registry Module
//!
//! Holds the rule implementations available to a [`crate::DataProcessor`],
//! keyed by rule type. A registry is populated once (usually at startup) and
//! is read-only while pipelines execute, so it can be shared behind an `Arc`.

use crate::engine::error::{PipelineError, Result};
use crate::engine::rules::{Rule, RuleConfig, RuleDescriptor, builtins};
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Name-to-implementation map of pipeline rules
#[derive(Default, Clone)]
pub struct RuleRegistry {
    rules: HashMap<String, Arc<dyn Rule>>,
}

impl RuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in include, exclude, sortBy,
    /// transform and limit rules
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for rule in builtins::get_all_rules() {
            registry.insert(rule);
        }
        registry
    }

    /// Register a rule under its `rule_type`
    ///
    /// Registering a type that already exists replaces the previous rule and
    /// logs a warning. A rule with an empty type name is rejected.
    pub fn register(&mut self, rule: Arc<dyn Rule>) -> Result<()> {
        if rule.rule_type().trim().is_empty() {
            return Err(PipelineError::Registry(
                "rule type name must not be empty".to_string(),
            ));
        }
        self.insert(rule);
        Ok(())
    }

    fn insert(&mut self, rule: Arc<dyn Rule>) {
        let rule_type = rule.rule_type().to_string();
        if self.rules.insert(rule_type.clone(), rule).is_some() {
            warn!("Rule '{}' was already registered and has been replaced", rule_type);
        } else {
            debug!("Registered rule '{}'", rule_type);
        }
    }

    pub fn get(&self, rule_type: &str) -> Option<&Arc<dyn Rule>> {
        self.rules.get(rule_type)
    }

    pub fn has(&self, rule_type: &str) -> bool {
        self.rules.contains_key(rule_type)
    }

    /// Remove a rule, returning it if it was registered
    pub fn unregister(&mut self, rule_type: &str) -> Option<Arc<dyn Rule>> {
        self.rules.remove(rule_type)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All registered rules ordered by ascending priority, ties by type name
    pub fn list_by_priority(&self) -> Vec<Arc<dyn Rule>> {
        let mut rules: Vec<Arc<dyn Rule>> = self.rules.values().cloned().collect();
        rules.sort_by(|a, b| {
            a.priority()
                .cmp(&b.priority())
                .then_with(|| a.rule_type().cmp(b.rule_type()))
        });
        rules
    }

    /// Registered rule type names ordered by priority
    pub fn rule_types(&self) -> Vec<String> {
        self.list_by_priority()
            .iter()
            .map(|rule| rule.rule_type().to_string())
            .collect()
    }

    /// Descriptors of every registered rule ordered by priority
    pub fn describe_all(&self) -> Vec<RuleDescriptor> {
        self.list_by_priority()
            .iter()
            .map(|rule| rule.describe())
            .collect()
    }

    /// Validate `config` for the named rule, then execute it over `data`
    pub fn execute_rule(&self, rule_type: &str, data: &Value, config: &RuleConfig) -> Result<Vec<Value>> {
        let rule = self
            .get(rule_type)
            .ok_or_else(|| PipelineError::UnknownRule(rule_type.to_string()))?;

        let report = rule.validate(config);
        if !report.is_valid {
            return Err(PipelineError::InvalidRuleConfig {
                rule_type: rule_type.to_string(),
                errors: report.errors,
            });
        }
        for warning in &report.warnings {
            warn!("Rule '{}': {}", rule_type, warning);
        }

        rule.execute_value(data, config)
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.rule_types())
            .finish()
    }
}
