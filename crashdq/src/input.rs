//! Record source: loads batch documents and classifier configuration.

use crashdq_core::{
    CrashDqError, RecordTable, Result, assert_required_columns,
    quality::{ClassifierConfig, rules::REQUIRED_COLUMNS},
    validate_and_parse_batch,
};
use std::path::Path;

/// Reads, validates and parses a batch document.
///
/// The document must pass the batch JSON Schema and carry both identity
/// columns. Record-level defects are left for the classifier.
pub async fn load_batch(path: &Path) -> Result<RecordTable> {
    let json_str = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CrashDqError::io(format!("Failed to read {}", path.display()), e))?;

    let table = validate_and_parse_batch(&json_str)?;
    assert_required_columns(&table, &REQUIRED_COLUMNS)?;

    tracing::debug!(
        "Loaded {} records with columns {:?} from {}",
        table.len(),
        table.columns,
        path.display()
    );
    Ok(table)
}

/// Reads a classifier configuration file.
///
/// Missing fields take their defaults and unknown keys are rejected. The
/// result is not validated here.
pub async fn load_config(path: &Path) -> Result<ClassifierConfig> {
    let json_str = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CrashDqError::io(format!("Failed to read {}", path.display()), e))?;

    serde_json::from_str(&json_str).map_err(|e| {
        CrashDqError::serialization(format!("Invalid classifier config {}", path.display()), e)
    })
}
