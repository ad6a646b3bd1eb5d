//! Core data structures and classification engine for crashdq.
//!
//! This crate provides the record batch model, the data-quality classifier
//! that partitions vehicle-crash records into clean, quarantine and discard
//! tables, the metrics derived from that partition and the batch document
//! validation shared with the `crashdq` binary.
//!
//! # Guarantees
//! - Every input record lands in exactly one output table
//! - Defective records are outcomes, never errors
//! - Classification is a pure function of batch, run date, configuration
//!   and clock date
//!
//! # Architecture
//! - Rules are an immutable ordered list folded over each record
//! - Reasons are enum tokens, joined into `dq_reasons` only on output
//! - Metrics are recomputed from the written tables

pub mod error;
pub mod logging;
pub mod models;
pub mod quality;
pub mod validation;

// Re-export commonly used types
pub use error::{CrashDqError, Result};
pub use logging::init_logging;
pub use models::{BATCH_FORMAT_VERSION, BatchDocument, Record, RecordTable, RunDate};
pub use quality::{
    ClassificationResult, ClassifierConfig, IdentityRule, MetricsReport, QualityClassifier,
    Reason, YearBound, classify,
};

pub use validation::{
    ValidationError, assert_required_columns, initialize_batch_validator,
    validate_and_parse_batch, validate_batch_document,
};
