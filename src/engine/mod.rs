/*!
# Engine Module

The record processing pipeline.

## Architecture

- **Rules** ([`rules`]): independent stages implementing the [`Rule`] trait
- **Registry** ([`RuleRegistry`]): rules available to a processor, by type name
- **Pipeline config** ([`PipelineConfig`]): which rules run, and with what settings
- **Processor** ([`DataProcessor`]): resolves the config against the registry,
  orders rules by priority and threads the records through them

A run moves through validate -> execute (one rule at a time, ascending priority)
-> done or failed. Failures never escape `process_*`: they come back as
`metadata.error` with an empty result.
*/

pub mod error;
pub mod export;
pub mod pipeline;
pub mod registry;
pub mod result;
pub mod rules;
pub mod trace;
pub mod utils;

// Re-export key types for easier access
pub use error::{ErrorInfo, PipelineError, Result};
pub use export::{ExportFormat, ExportOptions, export_result};
pub use pipeline::PipelineConfig;
pub use registry::RuleRegistry;
pub use result::{AppliedRule, ProcessingMetadata, ProcessingResult};
pub use rules::{Rule, RuleConfig, RuleDescriptor, ValidationReport};
pub use trace::{ExecutionStep, ExecutionTrace};

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Behaviour switches for a [`DataProcessor`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorOptions {
    /// Run each rule's `validate` before executing it and fail the run on errors
    #[serde(default = "default_true")]
    pub validate_before_execute: bool,
    /// Log validation warnings at `warn` level while processing
    #[serde(default = "default_true")]
    pub log_warnings: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            validate_before_execute: true,
            log_warnings: true,
        }
    }
}

/// Pipeline orchestrator: runs the rules named in a [`PipelineConfig`] over an
/// array of records
///
/// Holds no per-call state, so one processor can serve concurrent callers.
pub struct DataProcessor {
    registry: Arc<RuleRegistry>,
    options: ProcessorOptions,
}

impl Default for DataProcessor {
    fn default() -> Self {
        Self::new(Arc::new(RuleRegistry::with_builtins()))
    }
}

impl DataProcessor {
    /// Creates a processor over the given registry
    pub fn new(registry: Arc<RuleRegistry>) -> Self {
        Self::with_options(registry, ProcessorOptions::default())
    }

    pub fn with_options(registry: Arc<RuleRegistry>, options: ProcessorOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    /// Run `config` over `data`, which must be a JSON array of records
    pub fn process_data(&self, data: &Value, config: &PipelineConfig) -> ProcessingResult {
        match data {
            Value::Array(records) => self.run(records, config, None),
            other => self.reject(PipelineError::InvalidInput(format!(
                "data must be an array of records, got {}",
                rules::json_type_name(other)
            ))),
        }
    }

    /// Run a JSON pipeline config (an object of rule type -> rule config) over `data`
    pub fn process_json(&self, data: &Value, config: &Value) -> ProcessingResult {
        match PipelineConfig::from_value(config) {
            Ok(config) => self.process_data(data, &config),
            Err(e) => self.reject(e),
        }
    }

    /// Run `config` over an in-memory record slice
    pub fn process_records(&self, records: &[Value], config: &PipelineConfig) -> ProcessingResult {
        self.run(records, config, None)
    }

    /// Like [`process_data`](Self::process_data), also returning a trace with a
    /// snapshot of the records after every rule
    pub fn process_data_with_trace(
        &self,
        data: &Value,
        config: &PipelineConfig,
    ) -> (ProcessingResult, ExecutionTrace) {
        let mut trace = ExecutionTrace::new();
        let result = match data {
            Value::Array(records) => self.run(records, config, Some(&mut trace)),
            other => self.reject(PipelineError::InvalidInput(format!(
                "data must be an array of records, got {}",
                rules::json_type_name(other)
            ))),
        };
        (result, trace)
    }

    /// Pre-flight a pipeline config without touching any data
    ///
    /// Errors and warnings are prefixed with the rule type they came from.
    /// Config keys with no registered rule are errors.
    pub fn validate_condition(&self, config: &PipelineConfig) -> ValidationReport {
        let mut report = ValidationReport::new();

        if config.is_empty() {
            report.add_warning("no rules configured: data passes through unchanged");
        }

        for (rule_type, rule_config) in config.iter() {
            match self.registry.get(rule_type) {
                Some(rule) => report.merge_prefixed(rule_type, rule.validate(rule_config)),
                None => report.add_error(format!("unknown rule type: {rule_type}")),
            }
        }

        report
    }

    /// Pre-flight a JSON pipeline config
    pub fn validate_json(&self, config: &Value) -> ValidationReport {
        match PipelineConfig::from_value(config) {
            Ok(config) => self.validate_condition(&config),
            Err(e) => {
                let mut report = ValidationReport::new();
                report.add_error(e.to_string());
                report
            }
        }
    }

    /// Resolve config keys to registered rules, ordered by priority.
    /// Ties keep config order.
    fn plan<'c>(
        &self,
        config: &'c PipelineConfig,
        trace: &mut Option<&mut ExecutionTrace>,
    ) -> Vec<(Arc<dyn Rule>, &'c RuleConfig)> {
        let mut plan = Vec::with_capacity(config.len());

        for (rule_type, rule_config) in config.iter() {
            match self.registry.get(rule_type) {
                Some(rule) => plan.push((Arc::clone(rule), rule_config)),
                None => {
                    warn!("Ignoring config key '{}': no rule registered", rule_type);
                    if let Some(trace) = trace.as_mut() {
                        trace.add_step(ExecutionStep::skipped(rule_type));
                    }
                }
            }
        }

        plan.sort_by_key(|(rule, _)| rule.priority());
        plan
    }

    fn run(
        &self,
        records: &[Value],
        config: &PipelineConfig,
        mut trace: Option<&mut ExecutionTrace>,
    ) -> ProcessingResult {
        let started = Instant::now();
        let mut metadata = ProcessingMetadata::new(records.len());
        let plan = self.plan(config, &mut trace);

        debug!(
            "Run {}: {} records through {} rules",
            metadata.run_id,
            records.len(),
            plan.len()
        );

        let mut current: Option<Vec<Value>> = None;

        for (rule, rule_config) in plan {
            let rule_started = Instant::now();
            let input = current.as_deref().unwrap_or(records);
            let input_count = input.len();
            debug!(
                "Run {}: applying '{}' ({} config)",
                metadata.run_id,
                rule.rule_type(),
                rule_config.kind()
            );

            let output = match self.apply_rule(rule.as_ref(), rule_config, input) {
                Ok(output) => output,
                Err(e) => return self.fail(metadata, started, e),
            };

            debug!(
                "Run {}: rule '{}' produced {} of {} records",
                metadata.run_id,
                rule.rule_type(),
                output.len(),
                input_count
            );
            metadata.applied_rules.push(AppliedRule {
                rule_type: rule.rule_type().to_string(),
                priority: rule.priority(),
                input_count,
                output_count: output.len(),
                duration_ms: elapsed_ms(rule_started),
            });
            if let Some(trace) = trace.as_mut() {
                trace.add_step(ExecutionStep::executed(
                    rule.rule_type(),
                    rule.priority(),
                    &output,
                ));
            }

            current = Some(output);
        }

        let result = current.unwrap_or_else(|| records.to_vec());
        metadata.output_count = result.len();
        metadata.processing_time_ms = elapsed_ms(started);

        info!(
            "Run {} completed: {} -> {} records in {:.3}ms",
            metadata.run_id, metadata.input_count, metadata.output_count, metadata.processing_time_ms
        );

        ProcessingResult { result, metadata }
    }

    fn apply_rule(&self, rule: &dyn Rule, config: &RuleConfig, input: &[Value]) -> Result<Vec<Value>> {
        if self.options.validate_before_execute {
            let report = rule.validate(config);
            if !report.is_valid {
                return Err(PipelineError::InvalidRuleConfig {
                    rule_type: rule.rule_type().to_string(),
                    errors: report.errors,
                });
            }
            if self.options.log_warnings {
                for warning in &report.warnings {
                    warn!("Rule '{}': {}", rule.rule_type(), warning);
                }
            }
        }

        rule.execute(input, config).map_err(|e| match e {
            PipelineError::RuleExecution { .. } => e,
            other => PipelineError::rule_execution(rule.rule_type(), other.to_string(), Some(other)),
        })
    }

    fn fail(&self, mut metadata: ProcessingMetadata, started: Instant, e: PipelineError) -> ProcessingResult {
        error!("Run {} failed: {}", metadata.run_id, e);
        metadata.output_count = 0;
        metadata.processing_time_ms = elapsed_ms(started);
        metadata.error = Some(ErrorInfo::new(&e));
        ProcessingResult {
            result: Vec::new(),
            metadata,
        }
    }

    /// A failed result for input that never reached any rule
    fn reject(&self, e: PipelineError) -> ProcessingResult {
        let started = Instant::now();
        self.fail(ProcessingMetadata::new(0), started, e)
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
