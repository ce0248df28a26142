/*!
# Recordflow-rs

A rule-driven pipeline for filtering, ordering, paging and reshaping arrays of JSON records.

## Overview

A pipeline is configured as a JSON object whose keys name rules and whose values configure them.
Every rule is an independent stage: it receives the current record array and produces a new one.
The processor runs the rules named in the config in ascending priority order, whatever order the
keys were written in, and returns the surviving records together with run metadata.

## Key Components

* **DataProcessor**: Orchestrates a run: resolves rules, orders them, executes and reports
* **Rule**: A trait implemented by pipeline stages (`validate` + `execute`)
* **RuleRegistry**: The named set of rules a processor can use
* **PipelineConfig**: Ordered rule type -> rule config mapping
* **ProcessingResult**: Surviving records plus metadata (counts, timing, applied rules, error)

## Built-in Rules

| Rule        | Priority | Config                                                         |
|-------------|----------|----------------------------------------------------------------|
| `include`   | 1        | criteria object (AND) or array of criteria objects (OR)        |
| `exclude`   | 2        | same shape as `include`; drops the matching records            |
| `sortBy`    | 10       | field path or array of field paths, natural ascending order    |
| `transform` | 15       | `{"fields": [...], "computed": {...}, "rename": {...}}`        |
| `limit`     | 20       | a count, or `{"count": n, "offset": m}`                        |

## Usage Example

```rust
use recordflow_rs::DataProcessor;
use serde_json::json;

let processor = DataProcessor::default();

let data = json!([
    {"name": "John", "age": 30, "status": "active"},
    {"name": "Jane", "age": 25, "status": "active"},
    {"name": "Bob", "age": 35, "status": "inactive"}
]);

// Key order does not matter: limit always runs last
let config = json!({
    "limit": 2,
    "sortBy": ["name"],
    "exclude": {"status": "inactive"}
});

let result = processor.process_json(&data, &config);
assert!(result.is_success());
assert_eq!(result.result[0]["name"], "Jane");
assert_eq!(result.result[1]["name"], "John");
assert_eq!(result.applied_rule_types(), vec!["exclude", "sortBy", "limit"]);
```

## Computed Fields

Computed fields can be templates in JSON configs, or closures when the config is built in code:

```rust
use recordflow_rs::{DataProcessor, PipelineConfig, TransformConfig};
use serde_json::{Value, json};

let transform = TransformConfig::new()
    .computed_template("label", "{{name}} ({{age}})")
    .computed_fn("isAdult", |record| {
        Ok(Value::Bool(record["age"].as_i64().unwrap_or(0) >= 18))
    });

let config = PipelineConfig::new().with("transform", transform);
let result = DataProcessor::default().process_data(&json!([{"name": "Ann", "age": 17}]), &config);

assert_eq!(result.result[0]["label"], "Ann (17)");
assert_eq!(result.result[0]["isAdult"], false);
```

## Error Handling

Processing never panics and never returns `Err`: a failed run comes back with an empty result and
the error in its metadata. Configs can be checked up front with `validate_condition`:

```rust
use recordflow_rs::DataProcessor;
use serde_json::json;

let processor = DataProcessor::default();

let report = processor.validate_json(&json!({"bogusRule": {}, "limit": -1}));
assert!(!report.is_valid);
assert!(report.errors.iter().any(|e| e.contains("unknown rule type: bogusRule")));

let failed = processor.process_json(&json!([{"a": 1}]), &json!({"limit": -1}));
assert!(!failed.is_success());
assert!(failed.result.is_empty());
assert_eq!(failed.error().unwrap().code, "INVALID_RULE_CONFIG");
```

## Extending with Custom Rules

```rust
use recordflow_rs::{DataProcessor, Result, Rule, RuleConfig, RuleRegistry, ValidationReport};
use serde_json::{Value, json};
use std::sync::Arc;

struct DedupRule;

impl Rule for DedupRule {
    fn rule_type(&self) -> &str {
        "dedup"
    }

    fn priority(&self) -> i32 {
        5
    }

    fn validate(&self, config: &RuleConfig) -> ValidationReport {
        let mut report = ValidationReport::new();
        if !matches!(config.as_json(), Some(Value::String(_))) {
            report.add_error("dedup expects a field name");
        }
        report
    }

    fn execute(&self, data: &[Value], config: &RuleConfig) -> Result<Vec<Value>> {
        let field = config.as_json().and_then(Value::as_str).unwrap_or_default();
        let mut seen = Vec::new();
        Ok(data
            .iter()
            .filter(|record| {
                let key = record.get(field).cloned().unwrap_or(Value::Null);
                if seen.contains(&key) {
                    false
                } else {
                    seen.push(key);
                    true
                }
            })
            .cloned()
            .collect())
    }
}

let mut registry = RuleRegistry::with_builtins();
registry.register(Arc::new(DedupRule))?;
let processor = DataProcessor::new(Arc::new(registry));

let result = processor.process_json(&json!([{"id": 1}, {"id": 1}, {"id": 2}]), &json!({"dedup": "id"}));
assert_eq!(result.result.len(), 2);
# Ok::<(), recordflow_rs::PipelineError>(())
```
*/

pub mod engine;

// Re-export all public APIs for easier access
pub use engine::error::{ErrorInfo, PipelineError, Result};
pub use engine::export::{ExportFormat, ExportOptions, export_records, export_result};
pub use engine::rules::{
    ComputeFn, ComputedField, LimitConfig, Rule, RuleConfig, RuleDescriptor, TransformConfig,
    ValidationReport,
};
pub use engine::trace::{ExecutionStep, ExecutionTrace};
pub use engine::{
    AppliedRule, DataProcessor, PipelineConfig, ProcessingMetadata, ProcessingResult,
    ProcessorOptions, RuleRegistry,
};
