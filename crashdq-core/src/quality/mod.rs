//! Data quality classification module.
//!
//! This module partitions a crash record batch into three disjoint classes:
//! - **Clean**: no rule fired
//! - **Quarantine**: only reviewable defects, kept for audit
//! - **Discard**: the record lacks the identity needed downstream
//!
//! Each record's reasons are the fold of an ordered rule list; the reasons
//! are joined into the `dq_reasons` column only when rows are written.
//!
//! # Example
//! ```rust
//! use crashdq_core::models::RecordTable;
//! use crashdq_core::quality::classify;
//!
//! let batch = RecordTable::new(["unique_id", "collision_id", "vehicle_year"]);
//! let result = classify(&batch, Some("2026-02-27".parse().unwrap())).unwrap();
//! assert_eq!(result.metrics_summary.len(), 4);
//! ```

mod classifier;
mod config;
mod metrics;
mod models;
mod reason;
pub mod rules;

// Re-export public API
pub use classifier::QualityClassifier;
pub use config::{
    ClassifierConfig, ConfigValidationError, DEFAULT_MAX_YEAR_OFFSET, DEFAULT_MIN_VEHICLE_YEAR,
    IdentityRule, YearBound,
};
pub use metrics::{build_summary, reason_counts};
pub use models::{
    ClassificationResult, DQ_REASONS_COLUMN, MetricName, MetricsReport, MetricsReportRow,
    REASON_COUNT_METRIC, RUN_DATE_COLUMN, ReasonCount, SummaryMetric,
};
pub use reason::{REASON_SEPARATOR, Reason, ReasonClass, ReasonSet, UnknownReason, split_reasons};
pub use rules::{Rule, RuleSet};

use crate::Result;
use crate::models::{RecordTable, RunDate};

/// Classifies a batch with the default configuration.
///
/// `run_date` defaults to the local calendar date.
pub fn classify(batch: &RecordTable, run_date: Option<RunDate>) -> Result<ClassificationResult> {
    QualityClassifier::with_defaults().classify(batch, run_date)
}
