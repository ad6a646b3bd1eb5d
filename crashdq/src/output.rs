//! Sink: writes classification results as JSON documents.
//!
//! One run owns one partition directory, `<root>/run_date=<date>/`. The
//! directory is replaced on every write so a re-run for the same date never
//! mixes old and new files.

use crashdq_core::{
    BatchDocument, ClassificationResult, CrashDqError, MetricsReport, RecordTable, Result,
    models::RunDate, validate_batch_document,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Clean partition file name.
pub const CLEAN_FILE: &str = "clean.json";
/// Quarantine partition file name.
pub const QUARANTINE_FILE: &str = "quarantine.json";
/// Discard partition file name.
pub const DISCARD_FILE: &str = "discard.json";
/// Combined metrics report file name.
pub const METRICS_FILE: &str = "metrics.json";
/// Summary metrics file name.
pub const METRICS_SUMMARY_FILE: &str = "metrics_summary.json";
/// Per-reason metrics file name.
pub const METRICS_BY_REASON_FILE: &str = "metrics_by_reason.json";

/// Returns the partition directory for a run.
pub fn partition_dir(root: &Path, run_date: RunDate) -> PathBuf {
    root.join(format!("run_date={}", run_date))
}

/// Writes every output of a run, replacing any previous partition.
///
/// Record tables are checked against the batch JSON Schema before anything
/// touches the filesystem.
///
/// # Returns
/// The partition directory that was written.
pub async fn write_result(result: &ClassificationResult, root: &Path) -> Result<PathBuf> {
    let tables = [
        (CLEAN_FILE, batch_json(&result.clean)?),
        (QUARANTINE_FILE, batch_json(&result.quarantine)?),
        (DISCARD_FILE, batch_json(&result.discard)?),
    ];
    tracing::debug!("✓ Output validation passed");

    let dir = partition_dir(root, result.run_date);
    replace_dir(&dir).await?;

    for (file, json_data) in &tables {
        save_json(json_data, &dir.join(file)).await?;
    }

    save_serialized(&MetricsReport::from_result(result), &dir.join(METRICS_FILE)).await?;
    save_serialized(&result.metrics_summary, &dir.join(METRICS_SUMMARY_FILE)).await?;
    save_serialized(&result.metrics_by_reason, &dir.join(METRICS_BY_REASON_FILE)).await?;

    Ok(dir)
}

/// Serializes a table as a batch document and validates it.
fn batch_json(table: &RecordTable) -> Result<String> {
    let document = BatchDocument::from(table);
    let json_value = serde_json::to_value(&document)
        .map_err(|e| CrashDqError::serialization("Batch document serialization", e))?;
    validate_batch_document(&json_value)?;

    serde_json::to_string_pretty(&json_value)
        .map_err(|e| CrashDqError::serialization("Batch document serialization", e))
}

/// Removes `dir` if present and creates it empty.
async fn replace_dir(dir: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => tracing::debug!("Replaced existing partition {}", dir.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(CrashDqError::io(
                format!("Failed to remove {}", dir.display()),
                e,
            ));
        }
    }

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| CrashDqError::io(format!("Failed to create {}", dir.display()), e))
}

/// Serializes a value as pretty JSON and writes it.
async fn save_serialized<T: Serialize + ?Sized>(value: &T, output_path: &Path) -> Result<()> {
    let json_data = serde_json::to_string_pretty(value).map_err(|e| {
        CrashDqError::serialization(format!("Failed to serialize {}", output_path.display()), e)
    })?;
    save_json(&json_data, output_path).await
}

/// Saves JSON data to file.
pub async fn save_json(json_data: &str, output_path: &Path) -> Result<()> {
    tokio::fs::write(output_path, json_data)
        .await
        .map_err(|e| CrashDqError::Io {
            context: format!("Failed to write to {}", output_path.display()),
            source: e,
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_dir_layout() {
        let run_date: RunDate = "2026-02-27".parse().unwrap();
        let dir = partition_dir(Path::new("out"), run_date);
        assert_eq!(dir, Path::new("out").join("run_date=2026-02-27"));
    }
}
