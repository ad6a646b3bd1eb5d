//! JSON Schema validation for crash record batch documents.
//!
//! This module checks the shape of a batch document before it reaches the
//! classifier: the format version, the optional column list, that every row
//! is an object and that identity and year cells hold scalar values. It also
//! asserts that a batch schema carries the columns the rules need.
//!
//! Malformed documents are rejected here; defective *records* are not. A
//! null `unique_id` or an implausible `vehicle_year` is valid input that the
//! classifier routes to discard or quarantine.
//!
//! # Example
//! ```rust
//! use crashdq_core::validation::{initialize_batch_validator, validate_and_parse_batch};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! initialize_batch_validator()?;
//!
//! let json_str = r#"{
//!     "format_version": "1.0",
//!     "columns": ["unique_id", "collision_id", "vehicle_year"],
//!     "rows": [{"unique_id": 1, "collision_id": 10, "vehicle_year": 2010}]
//! }"#;
//!
//! let batch = validate_and_parse_batch(json_str)?;
//! assert_eq!(batch.len(), 1);
//! # Ok(())
//! # }
//! ```

use jsonschema::Validator;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

use crate::models::{BatchDocument, RecordTable};

/// Batch document validation errors with detailed reporting
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Schema compilation failed during initialization
    #[error("JSON Schema compilation failed: {message}")]
    SchemaCompilation {
        /// Compiler message
        message: String,
    },

    /// Validation failed with specific field errors
    #[error("Batch validation failed with {error_count} errors: {errors:?}")]
    ValidationFailed {
        /// Total number of schema violations
        error_count: usize,
        /// Reported violation messages, capped
        errors: Vec<String>,
    },

    /// Unsupported format version detected
    #[error("Unsupported format version '{version}'. Supported versions: {supported:?}")]
    UnsupportedVersion {
        /// Version found in the document
        version: String,
        /// Versions this build accepts
        supported: Vec<String>,
    },

    /// Required columns are absent from the batch schema
    #[error("Batch is missing required columns: {missing:?}")]
    MissingColumns {
        /// Every required column that is absent
        missing: Vec<String>,
    },

    /// JSON parsing error
    #[error("JSON parsing failed: {source}")]
    JsonParsing {
        /// Underlying parse error
        #[from]
        source: serde_json::Error,
    },
}

/// Supported batch format versions
const SUPPORTED_VERSIONS: &[&str] = &["1.0"];

/// Embedded JSON Schema for v1.0 batch documents
const BATCH_SCHEMA_V1_0: &str = r##"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "crashdq Record Batch Format v1.0",
  "type": "object",
  "required": ["format_version", "rows"],
  "properties": {
    "format_version": {
      "type": "string",
      "pattern": "^1\\.0$"
    },
    "columns": {
      "type": "array",
      "items": { "type": "string", "minLength": 1 },
      "uniqueItems": true
    },
    "rows": {
      "type": "array",
      "items": {
        "type": "object",
        "properties": {
          "unique_id": { "$ref": "#/$defs/nullable_int_like" },
          "collision_id": { "$ref": "#/$defs/nullable_int_like" },
          "vehicle_year": { "$ref": "#/$defs/nullable_int_like" }
        }
      }
    }
  },
  "$defs": {
    "nullable_int_like": {
      "type": ["integer", "number", "string", "null"]
    }
  }
}"##;

/// Compiled JSON Schema instance (initialized once)
static COMPILED_SCHEMA: OnceLock<Validator> = OnceLock::new();

/// Upper bound on individual schema errors kept in `ValidationFailed`.
const MAX_REPORTED_ERRORS: usize = 20;

/// Initialize and compile the batch JSON Schema
///
/// Compiles the embedded schema and caches it for reuse. Call once during
/// startup; later calls are no-ops.
///
/// # Errors
/// Returns `ValidationError::SchemaCompilation` if the embedded schema is invalid.
pub fn initialize_batch_validator() -> Result<(), ValidationError> {
    if COMPILED_SCHEMA.get().is_some() {
        return Ok(());
    }

    let schema_json = get_batch_schema_definition()?;
    let compiled = jsonschema::validator_for(&schema_json).map_err(|e| {
        ValidationError::SchemaCompilation {
            message: format!("Schema compilation error: {}", e),
        }
    })?;

    // A concurrent caller may have set it first
    let _ = COMPILED_SCHEMA.set(compiled);

    Ok(())
}

/// Validate a batch document against the embedded JSON Schema
///
/// Checks format version compatibility first, then reports every schema
/// violation, keeping the first few messages.
///
/// # Errors
/// - `SchemaCompilation` if [`initialize_batch_validator`] was not called
/// - `UnsupportedVersion` for a format version other than `1.0`
/// - `ValidationFailed` for any structural violation
pub fn validate_batch_document(json_value: &Value) -> Result<(), ValidationError> {
    let schema = COMPILED_SCHEMA
        .get()
        .ok_or_else(|| ValidationError::SchemaCompilation {
            message: "Batch validator not initialized. Call initialize_batch_validator() first."
                .to_string(),
        })?;

    validate_format_version(json_value)?;

    let errors: Vec<String> = schema
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();

    if !errors.is_empty() {
        let error_count = errors.len();
        return Err(ValidationError::ValidationFailed {
            error_count,
            errors: errors.into_iter().take(MAX_REPORTED_ERRORS).collect(),
        });
    }

    Ok(())
}

/// Validate format version compatibility
fn validate_format_version(json_value: &Value) -> Result<(), ValidationError> {
    let version = json_value
        .get("format_version")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ValidationError::ValidationFailed {
            error_count: 1,
            errors: vec!["Missing required field 'format_version'".to_string()],
        })?;

    if !SUPPORTED_VERSIONS.contains(&version) {
        return Err(ValidationError::UnsupportedVersion {
            version: version.to_string(),
            supported: SUPPORTED_VERSIONS.iter().map(|s| s.to_string()).collect(),
        });
    }

    Ok(())
}

/// Validate and load a record batch from JSON
///
/// Combines JSON parsing, schema validation and conversion to a
/// [`RecordTable`]. When the document has no `columns` list the schema is
/// derived from the row keys.
///
/// # Errors
/// Returns validation errors for malformed JSON or schema violations.
pub fn validate_and_parse_batch(json_str: &str) -> Result<RecordTable, ValidationError> {
    let json_value: Value = serde_json::from_str(json_str)?;

    validate_batch_document(&json_value)?;

    let document: BatchDocument = serde_json::from_value(json_value)?;
    Ok(RecordTable::from(document))
}

/// Assert that a batch schema carries every required column
///
/// Unlike the classifier, which stops at the first absent identity column,
/// this reports all of them.
pub fn assert_required_columns(
    table: &RecordTable,
    required: &[&str],
) -> Result<(), ValidationError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|column| !table.has_column(column))
        .map(|column| column.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingColumns { missing })
    }
}

/// Get the embedded batch JSON Schema as a parsed Value
pub fn get_batch_schema_definition() -> Result<Value, ValidationError> {
    serde_json::from_str(BATCH_SCHEMA_V1_0).map_err(|e| ValidationError::SchemaCompilation {
        message: format!("Failed to parse embedded schema: {}", e),
    })
}
