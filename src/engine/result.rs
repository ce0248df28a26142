use crate::engine::error::ErrorInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Output of a pipeline run: the records plus execution metadata
///
/// Always well-formed. A failed run carries `metadata.error` and an empty
/// `result`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub result: Vec<Value>,
    pub metadata: ProcessingMetadata,
}

impl ProcessingResult {
    pub fn is_success(&self) -> bool {
        self.metadata.error.is_none()
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        self.metadata.error.as_ref()
    }

    /// Rule types in the order they were applied
    pub fn applied_rule_types(&self) -> Vec<&str> {
        self.metadata
            .applied_rules
            .iter()
            .map(|rule| rule.rule_type.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    /// Unique id of this run, for correlating logs
    pub run_id: String,
    pub processed_at: DateTime<Utc>,
    pub input_count: usize,
    pub output_count: usize,
    pub processing_time_ms: f64,
    pub applied_rules: Vec<AppliedRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl ProcessingMetadata {
    pub fn new(input_count: usize) -> Self {
        Self {
            run_id: Uuid::now_v7().to_string(),
            processed_at: Utc::now(),
            input_count,
            output_count: 0,
            processing_time_ms: 0.0,
            applied_rules: Vec::new(),
            error: None,
        }
    }
}

/// One rule that ran during a pipeline call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppliedRule {
    pub rule_type: String,
    pub priority: i32,
    pub input_count: usize,
    pub output_count: usize,
    pub duration_ms: f64,
}
