//! # Export Module
//!
//! Serializes the records of a [`ProcessingResult`] to text.
//!
//! - `json`: the record array, compact or pretty-printed
//! - `csv` / `tsv`: one column per field name seen in ANY record (in order of
//!   first appearance), every field quoted, embedded quotes doubled, missing
//!   and `null` values rendered as empty strings, nested values as compact JSON.
//!   Every record must be an object; anything else is an export error.

use crate::engine::error::{PipelineError, Result};
use crate::engine::result::ProcessingResult;
use crate::engine::rules::json_type_name;
use crate::engine::utils::{is_plain_object, value_to_plain_string};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
    Tsv,
}

impl ExportFormat {
    fn delimiter(self) -> u8 {
        match self {
            ExportFormat::Tsv => b'\t',
            _ => b',',
        }
    }
}

impl FromStr for ExportFormat {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "tsv" => Ok(ExportFormat::Tsv),
            other => Err(PipelineError::Export(format!(
                "unsupported export format '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
        };
        f.write_str(name)
    }
}

/// Export settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Whether to pretty-print the output (for JSON only).
    #[serde(default)]
    pub pretty: bool,
}

/// Export the records of `result` with default options
pub fn export_result(result: &ProcessingResult, format: ExportFormat) -> Result<String> {
    export_records(&result.result, format, &ExportOptions::default())
}

/// Export the records of `result`
pub fn export_result_with(
    result: &ProcessingResult,
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<String> {
    export_records(&result.result, format, options)
}

/// Export a record array
pub fn export_records(records: &[Value], format: ExportFormat, options: &ExportOptions) -> Result<String> {
    debug!("Export: {} records as {}", records.len(), format);

    match format {
        ExportFormat::Json => {
            if options.pretty {
                serde_json::to_string_pretty(records)
            } else {
                serde_json::to_string(records)
            }
            .map_err(|e| PipelineError::Export(format!("Failed to serialize to JSON: {}", e)))
        }
        ExportFormat::Csv | ExportFormat::Tsv => to_delimited(records, format.delimiter()),
    }
}

/// Union of field names across all records, in order of first appearance
pub fn collect_headers(records: &[Value]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut headers = Vec::new();
    for record in records {
        if let Value::Object(map) = record {
            for key in map.keys() {
                if seen.insert(key.as_str()) {
                    headers.push(key.clone());
                }
            }
        }
    }
    headers
}

fn to_delimited(records: &[Value], delimiter: u8) -> Result<String> {
    if records.is_empty() {
        return Ok(String::new());
    }
    if let Some((index, record)) = records
        .iter()
        .enumerate()
        .find(|(_, record)| !is_plain_object(record))
    {
        return Err(PipelineError::Export(format!(
            "record {index} has type {}, only objects can be exported as rows",
            json_type_name(record)
        )));
    }

    let headers = collect_headers(records);
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let export_err = |e: csv::Error| PipelineError::Export(e.to_string());

    writer.write_record(&headers).map_err(export_err)?;
    for record in records {
        let row = headers.iter().map(|header| {
            record
                .get(header)
                .map(value_to_plain_string)
                .unwrap_or_default()
        });
        writer.write_record(row).map_err(export_err)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| PipelineError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| PipelineError::Export(e.to_string()))
}
