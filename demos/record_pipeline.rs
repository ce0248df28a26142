//! # Record Pipeline Example
//!
//! Runs a small catalogue of products through a pipeline that filters, sorts,
//! reshapes and pages it, then exports the result as CSV.
//!
//! Run with: `RUST_LOG=debug cargo run --example record_pipeline`

use recordflow_rs::{
    DataProcessor, ExportFormat, PipelineConfig, TransformConfig, export_result,
};
use serde_json::{Value, json};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let processor = DataProcessor::default();

    println!("Registered rules:");
    for descriptor in processor.registry().describe_all() {
        println!(
            "  {:<10} priority {:>2}  {}",
            descriptor.rule_type, descriptor.priority, descriptor.description
        );
    }

    let products = json!([
        {"sku": "item10", "name": "Lamp", "price": 25.5, "stock": 3, "category": "home"},
        {"sku": "item2", "name": "Desk", "price": 180, "stock": 0, "category": "office"},
        {"sku": "item1", "name": "Chair", "price": 95, "stock": 12, "category": "office"},
        {"sku": "item3", "name": "Rug", "price": 60, "stock": 5, "category": "home"},
        {"sku": "item21", "name": "Shelf", "price": 70, "stock": 1, "category": "home", "discontinued": true}
    ]);

    // Parse the pipeline from JSON, then add a computed field in code
    let mut config = PipelineConfig::from_json(
        r#"
        {
            "limit": {"count": 3},
            "exclude": [{"discontinued": true}, {"stock": 0}],
            "sortBy": ["category", "sku"]
        }
        "#,
    )?;
    config.insert(
        "transform",
        TransformConfig::new()
            .fields(["sku", "name", "price"])
            .computed_template("label", "{{name}} ({{sku}})")
            .computed_fn("lowStock", |record| {
                Ok(Value::Bool(record["stock"].as_u64().is_some_and(|s| s < 5)))
            })
            .rename("price", "unitPrice"),
    );

    let report = processor.validate_condition(&config);
    for warning in &report.warnings {
        println!("warning: {}", warning);
    }
    if !report.is_valid {
        for error in &report.errors {
            println!("error: {}", error);
        }
        return Ok(());
    }

    let (result, trace) = processor.process_data_with_trace(&products, &config);

    println!("\nSteps:");
    for step in &trace.steps {
        let count = step.records.as_ref().map_or(0, Vec::len);
        println!("  {:<10} {:?} -> {} records", step.rule_type, step.result, count);
    }

    println!("\nMetadata:\n{}", serde_json::to_string_pretty(&result.metadata)?);
    println!("\nCSV:\n{}", export_result(&result, ExportFormat::Csv)?);

    // A failing run reports the error instead of returning partial data
    let failed = processor.process_json(&products, &json!({"sortBy": 42}));
    if let Some(error) = failed.error() {
        println!("Rejected pipeline: [{}] {}", error.code, error.message);
    }

    Ok(())
}
