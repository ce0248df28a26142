//! # Execution Trace Module
//!
//! Step-by-step tracing for debugging pipelines. Each executed rule records a
//! snapshot of the records it produced; config keys with no registered rule
//! are recorded as skipped.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of a pipeline step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StepResult {
    /// The rule ran
    Executed,
    /// The config named a rule that is not registered
    Skipped,
}

/// A single step in the execution trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionStep {
    pub rule_type: String,
    /// Priority of the rule (None for skipped steps)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    pub result: StepResult,
    /// Records after this step (only for Executed steps)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<Value>>,
}

impl ExecutionStep {
    /// Create a new executed step with a snapshot of its output
    pub fn executed(rule_type: &str, priority: i32, records: &[Value]) -> Self {
        Self {
            rule_type: rule_type.to_string(),
            priority: Some(priority),
            result: StepResult::Executed,
            records: Some(records.to_vec()),
        }
    }

    /// Create a skipped step
    pub fn skipped(rule_type: &str) -> Self {
        Self {
            rule_type: rule_type.to_string(),
            priority: None,
            result: StepResult::Skipped,
            records: None,
        }
    }
}

/// Complete execution trace containing all steps
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionTrace {
    pub steps: Vec<ExecutionStep>,
}

impl ExecutionTrace {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn add_step(&mut self, step: ExecutionStep) {
        self.steps.push(step);
    }

    /// Records produced by the last executed step
    pub fn final_records(&self) -> Option<&[Value]> {
        self.steps
            .iter()
            .rev()
            .find(|s| s.result == StepResult::Executed)
            .and_then(|s| s.records.as_deref())
    }

    pub fn executed_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.result == StepResult::Executed)
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.result == StepResult::Skipped)
            .count()
    }
}
