//! Report validation utilities.

use crate::report::REPORT_VERSION;
use crate::schema;
use jsonschema::JSONSchema;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Validation error type.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Schema validation failed: {0}")]
    SchemaError(String),

    #[error("Unsorted dependencies under {parent}: {detail}")]
    UnsortedDependencies { parent: String, detail: String },

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result of report validation.
#[derive(Debug)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.valid = false;
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a report against the JSON schema and its ordering rules.
pub fn validate_report(report: &Value) -> Result<ValidationResult, ValidationError> {
    let mut result = ValidationResult::new();

    let schema_value = schema::report_schema();
    let compiled = JSONSchema::compile(&schema_value)
        .map_err(|e| ValidationError::SchemaError(e.to_string()))?;

    if let Err(errors) = compiled.validate(report) {
        for error in errors {
            result.add_error(ValidationError::SchemaError(format!(
                "{} at {}",
                error, error.instance_path
            )));
        }
    }

    if let Some(version) = report.get("report_version").and_then(Value::as_u64) {
        if version != u64::from(REPORT_VERSION) {
            result.add_warning(format!(
                "report_version {} differs from supported version {}",
                version, REPORT_VERSION
            ));
        }
    }

    if let Some(nodes) = report.get("dependencies").and_then(Value::as_array) {
        check_node_order("<root>", nodes, &mut result);
    }

    Ok(result)
}

/// Read a report file and validate it.
pub fn validate_report_file(path: &Path) -> Result<ValidationResult, ValidationError> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    validate_report(&value)
}

/// Resources must precede scenarios, names strictly ascending within each.
fn check_node_order(parent: &str, nodes: &[Value], result: &mut ValidationResult) {
    let keys: Vec<(u8, &str)> = nodes
        .iter()
        .map(|node| {
            let rank = match node.get("type").and_then(Value::as_str) {
                Some("resource") => 0,
                _ => 1,
            };
            let name = node.get("name").and_then(Value::as_str).unwrap_or("");
            (rank, name)
        })
        .collect();

    for pair in keys.windows(2) {
        if pair[0] >= pair[1] {
            result.add_error(ValidationError::UnsortedDependencies {
                parent: parent.to_string(),
                detail: format!("{} before {}", pair[0].1, pair[1].1),
            });
        }
    }

    for node in nodes {
        if let Some(children) = node.get("children").and_then(Value::as_array) {
            let name = node.get("name").and_then(Value::as_str).unwrap_or("?");
            check_node_order(name, children, result);
        }
    }
}
