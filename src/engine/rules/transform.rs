//! # Transform Rule
//!
//! Reshapes each record in a single pass, always in this order:
//!
//! 1. `fields` narrows the record to the listed paths (missing paths are omitted).
//!    The path string itself becomes the output key.
//! 2. `computed` adds derived fields. Functions and templates read the
//!    ORIGINAL record, not the narrowed one. A failing function sets its field
//!    to `null` and logs a warning; the rest of the pass carries on.
//! 3. `rename` moves top-level keys of the in-progress record to new names.
//!
//! ## Example Usage
//!
//! ```json
//! {
//!     "transform": {
//!         "fields": ["name", "user.email"],
//!         "computed": {"label": "{{name}} <{{user.email}}>"},
//!         "rename": {"user.email": "email"}
//!     }
//! }
//! ```

use crate::engine::error::{PipelineError, Result};
use crate::engine::rules::builtins::TRANSFORM_RULE;
use crate::engine::rules::{Rule, RuleConfig, ValidationReport, json_type_name};
use crate::engine::utils::{get_nested_value, value_to_plain_string};
use log::{debug, warn};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Function computing a derived field from the original record
pub type ComputeFn = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// A derived field definition
#[derive(Clone)]
pub enum ComputedField {
    /// Text with `{{field.path}}` placeholders filled from the record
    Template(String),
    /// Arbitrary computation over the record
    Function(ComputeFn),
}

impl fmt::Debug for ComputedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputedField::Template(template) => f.debug_tuple("Template").field(template).finish(),
            ComputedField::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl ComputedField {
    /// Evaluate against a record. Function failures surface as errors.
    pub fn evaluate(&self, record: &Value) -> Result<Value> {
        match self {
            ComputedField::Template(template) => Ok(Value::String(render_template(template, record))),
            ComputedField::Function(compute) => compute(record),
        }
    }
}

/// Fill `{{path}}` placeholders with values from `record`
///
/// Unresolved and empty paths (`{{}}`) render as the empty string. An
/// unterminated `{{` is kept literally.
pub fn render_template(template: &str, record: &Value) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        match after_open.find("}}") {
            Some(end) => {
                let path = after_open[..end].trim();
                if !path.is_empty()
                    && let Some(value) = get_nested_value(record, path)
                {
                    output.push_str(&value_to_plain_string(value));
                }
                rest = &after_open[end + 2..];
            }
            None => {
                output.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    output.push_str(rest);
    output
}

/// Parsed transform settings
#[derive(Debug, Clone, Default)]
pub struct TransformConfig {
    pub fields: Option<Vec<String>>,
    pub computed: Vec<(String, ComputedField)>,
    pub rename: Vec<(String, String)>,
}

impl TransformConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `path` when narrowing records
    pub fn field(mut self, path: impl Into<String>) -> Self {
        self.fields.get_or_insert_with(Vec::new).push(path.into());
        self
    }

    /// Keep all of `paths` when narrowing records
    pub fn fields<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields
            .get_or_insert_with(Vec::new)
            .extend(paths.into_iter().map(Into::into));
        self
    }

    /// Add a field computed by a closure over the original record
    pub fn computed_fn<F>(mut self, name: impl Into<String>, compute: F) -> Self
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.computed
            .push((name.into(), ComputedField::Function(Arc::new(compute))));
        self
    }

    /// Add a field rendered from a `{{path}}` template
    pub fn computed_template(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.computed
            .push((name.into(), ComputedField::Template(template.into())));
        self
    }

    /// Rename `from` to `to` after fields and computed values are applied
    pub fn rename(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.rename.push((from.into(), to.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_none() && self.computed.is_empty() && self.rename.is_empty()
    }

    /// Parse a JSON transform config. Computed entries must be template strings.
    pub fn from_json(input: &Value) -> Result<Self> {
        let map = input.as_object().ok_or_else(|| {
            PipelineError::Validation("transform config must be an object".to_string())
        })?;

        let fields = match map.get("fields") {
            None => None,
            Some(Value::Array(items)) => Some(
                items
                    .iter()
                    .map(|item| {
                        item.as_str().map(str::to_string).ok_or_else(|| {
                            PipelineError::Validation("'fields' must contain strings".to_string())
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            Some(_) => {
                return Err(PipelineError::Validation(
                    "'fields' must be an array of strings".to_string(),
                ));
            }
        };

        let mut computed = Vec::new();
        if let Some(entries) = map.get("computed") {
            let entries = entries.as_object().ok_or_else(|| {
                PipelineError::Validation("'computed' must be an object".to_string())
            })?;
            for (name, template) in entries {
                let template = template.as_str().ok_or_else(|| {
                    PipelineError::Validation(format!(
                        "computed field '{name}' must be a template string"
                    ))
                })?;
                computed.push((name.clone(), ComputedField::Template(template.to_string())));
            }
        }

        let mut rename = Vec::new();
        if let Some(pairs) = map.get("rename") {
            let pairs = pairs.as_object().ok_or_else(|| {
                PipelineError::Validation("'rename' must be an object".to_string())
            })?;
            for (from, to) in pairs {
                let to = to.as_str().ok_or_else(|| {
                    PipelineError::Validation(format!("rename target for '{from}' must be a string"))
                })?;
                rename.push((from.clone(), to.to_string()));
            }
        }

        Ok(TransformConfig {
            fields,
            computed,
            rename,
        })
    }

    /// Apply this transform to one record, returning a new record
    pub fn apply(&self, record: &Value) -> Value {
        let mut output = match &self.fields {
            Some(fields) => {
                let mut narrowed = Map::new();
                for path in fields {
                    if let Some(value) = get_nested_value(record, path) {
                        narrowed.insert(path.clone(), value.clone());
                    }
                }
                Value::Object(narrowed)
            }
            None => record.clone(),
        };

        let Value::Object(map) = &mut output else {
            debug!("Transform: record is not an object, leaving it unchanged");
            return output;
        };

        for (name, field) in &self.computed {
            let value = match field.evaluate(record) {
                Ok(value) => value,
                Err(e) => {
                    warn!("Transform: computed field '{}' failed: {}", name, e);
                    Value::Null
                }
            };
            map.insert(name.clone(), value);
        }

        for (from, to) in &self.rename {
            if from == to {
                continue;
            }
            if let Some(value) = map.shift_remove(from) {
                map.insert(to.clone(), value);
            }
        }

        output
    }
}

/// Reshapes records: select fields, add computed ones, rename keys
pub struct TransformRule;

impl TransformRule {
    pub const PRIORITY: i32 = 15;

    pub fn new() -> Self {
        Self
    }

    fn validate_json(input: &Value, report: &mut ValidationReport) {
        let Value::Object(map) = input else {
            report.add_error(format!(
                "transform config must be an object, got {}",
                json_type_name(input)
            ));
            return;
        };

        for key in map.keys() {
            if !matches!(key.as_str(), "fields" | "computed" | "rename") {
                report.add_warning(format!("unknown transform option '{key}' is ignored"));
            }
        }

        match map.get("fields") {
            None => {}
            Some(Value::Array(items)) => {
                for (index, item) in items.iter().enumerate() {
                    match item {
                        Value::String(path) if path.is_empty() => {
                            report.add_error(format!("fields[{index}] must not be empty"));
                        }
                        Value::String(_) => {}
                        other => report.add_error(format!(
                            "fields[{index}] must be a string, got {}",
                            json_type_name(other)
                        )),
                    }
                }
            }
            Some(other) => report.add_error(format!(
                "fields must be an array of strings, got {}",
                json_type_name(other)
            )),
        }

        match map.get("computed") {
            None => {}
            Some(Value::Object(entries)) => {
                for (name, value) in entries {
                    if !value.is_string() {
                        report.add_error(format!(
                            "computed field '{name}' must be a template string or function, got {}",
                            json_type_name(value)
                        ));
                    }
                }
            }
            Some(other) => report.add_error(format!(
                "computed must be an object, got {}",
                json_type_name(other)
            )),
        }

        match map.get("rename") {
            None => {}
            Some(Value::Object(pairs)) => {
                for (from, to) in pairs {
                    match to {
                        Value::String(name) if name.is_empty() => {
                            report.add_error(format!("rename target for '{from}' must not be empty"));
                        }
                        Value::String(_) => {}
                        other => report.add_error(format!(
                            "rename target for '{from}' must be a string, got {}",
                            json_type_name(other)
                        )),
                    }
                }
            }
            Some(other) => report.add_error(format!(
                "rename must be an object, got {}",
                json_type_name(other)
            )),
        }

        let has_operation = ["fields", "computed", "rename"]
            .iter()
            .any(|key| map.contains_key(*key));
        if !has_operation {
            report.add_warning("transform has no fields, computed or rename: records pass through");
        }
    }

    fn validate_typed(config: &TransformConfig, report: &mut ValidationReport) {
        if let Some(fields) = &config.fields
            && fields.iter().any(String::is_empty)
        {
            report.add_error("field paths must not be empty");
        }
        if config.computed.iter().any(|(name, _)| name.is_empty()) {
            report.add_error("computed field names must not be empty");
        }
        if config.rename.iter().any(|(_, to)| to.is_empty()) {
            report.add_error("rename targets must not be empty");
        }
        if config.is_empty() {
            report.add_warning("transform has no fields, computed or rename: records pass through");
        }
    }
}

impl Default for TransformRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for TransformRule {
    fn rule_type(&self) -> &str {
        TRANSFORM_RULE
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn description(&self) -> &str {
        "Select fields, add computed fields and rename keys on every record"
    }

    fn validate(&self, config: &RuleConfig) -> ValidationReport {
        let mut report = ValidationReport::new();
        match config {
            RuleConfig::Json(input) => Self::validate_json(input, &mut report),
            RuleConfig::Transform(typed) => Self::validate_typed(typed, &mut report),
        }
        report
    }

    fn execute(&self, data: &[Value], config: &RuleConfig) -> Result<Vec<Value>> {
        let parsed;
        let transform = match config {
            RuleConfig::Transform(typed) => typed,
            RuleConfig::Json(input) => {
                parsed = TransformConfig::from_json(input)?;
                &parsed
            }
        };

        debug!(
            "Transform: {} records, fields={:?}, {} computed, {} renames",
            data.len(),
            transform.fields,
            transform.computed.len(),
            transform.rename.len()
        );
        Ok(data.iter().map(|record| transform.apply(record)).collect())
    }
}
