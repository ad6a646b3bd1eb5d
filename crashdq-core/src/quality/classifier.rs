//! Quality classifier facade.
//!
//! This module provides the `QualityClassifier` that evaluates the rule list
//! on every record of a batch and partitions the batch into clean,
//! quarantine and discard tables.

use chrono::{Datelike, Local, NaiveDate};
use serde_json::Value;

use crate::Result;
use crate::error::CrashDqError;
use crate::models::{RecordTable, RunDate};

use super::config::{ClassifierConfig, YearBound};
use super::metrics::{build_summary, count, reason_counts};
use super::models::{ClassificationResult, DQ_REASONS_COLUMN, RUN_DATE_COLUMN};
use super::rules::{BatchSchema, RuleSet, YearRange};

/// Data-quality classifier for crash record batches.
///
/// The classifier is a pure function of the batch, the run date, its
/// configuration and the clock date (only read under
/// [`YearBound::WallClock`]).
///
/// # Example
///
/// ```rust
/// use crashdq_core::models::{RecordTable, RunDate};
/// use crashdq_core::quality::{ClassifierConfig, IdentityRule, QualityClassifier};
///
/// let config = ClassifierConfig::new().with_identity_rule(IdentityRule::EitherNull);
/// let classifier = QualityClassifier::new(config);
///
/// let batch = RecordTable::new(["unique_id", "collision_id", "vehicle_year"]);
/// let run_date: RunDate = "2026-02-27".parse().unwrap();
/// let result = classifier.classify(&batch, Some(run_date)).unwrap();
/// assert!(result.clean.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct QualityClassifier {
    config: ClassifierConfig,
}

impl QualityClassifier {
    /// Creates a new classifier with the given configuration.
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Creates a new classifier with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ClassifierConfig::default())
    }

    /// Returns a reference to the classifier configuration.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Builds the ordered rule list for a run.
    ///
    /// The upper year bound is taken from `run_date` or `today` depending on
    /// [`ClassifierConfig::year_bound`].
    ///
    /// # Errors
    /// `Configuration` if `min_vehicle_year` is above the resulting upper
    /// bound, which would quarantine every non-null year.
    pub fn rule_set(&self, run_date: RunDate, today: NaiveDate) -> Result<RuleSet> {
        let bound_year = match self.config.year_bound {
            YearBound::RunDate => run_date.year(),
            YearBound::WallClock => today.year(),
        };
        let years = YearRange::new(
            self.config.min_vehicle_year,
            bound_year.saturating_add(self.config.max_year_offset),
        );
        if years.min > years.max {
            return Err(CrashDqError::configuration(format!(
                "min_vehicle_year {} is above the maximum accepted year {}",
                years.min, years.max
            )));
        }
        Ok(RuleSet::vehicles(self.config.identity_rule, years))
    }

    /// Classifies a batch using the local calendar date as the clock.
    ///
    /// `run_date` defaults to today when `None`.
    pub fn classify(
        &self,
        batch: &RecordTable,
        run_date: Option<RunDate>,
    ) -> Result<ClassificationResult> {
        let today = Local::now().date_naive();
        let run_date = run_date.unwrap_or_else(|| RunDate::new(today));
        self.classify_at(batch, run_date, today)
    }

    /// Classifies a batch with an explicit clock date.
    ///
    /// # Errors
    /// - `Configuration` if the classifier configuration is invalid
    /// - `StructuralInput` if an identity column is missing from the schema
    ///   or a rule input cannot be read as a nullable integer; no partial
    ///   result is returned
    pub fn classify_at(
        &self,
        batch: &RecordTable,
        run_date: RunDate,
        today: NaiveDate,
    ) -> Result<ClassificationResult> {
        self.config
            .validate()
            .map_err(|e| CrashDqError::configuration(e.to_string()))?;

        let rules = self.rule_set(run_date, today)?;
        let schema = BatchSchema::inspect(batch)?;
        if !schema.has_vehicle_year {
            tracing::debug!("Batch has no vehicle_year column; every record will be quarantined");
        }

        let stamp = Value::String(run_date.to_string());

        let mut clean = RecordTable::new(
            batch
                .columns
                .iter()
                .filter(|c| c.as_str() != DQ_REASONS_COLUMN)
                .cloned(),
        );
        clean.ensure_column(RUN_DATE_COLUMN);

        let mut flagged_schema = RecordTable::new(batch.columns.iter().cloned());
        flagged_schema.ensure_column(DQ_REASONS_COLUMN);
        flagged_schema.ensure_column(RUN_DATE_COLUMN);
        let mut quarantine = flagged_schema.clone();
        let mut discard = flagged_schema;

        for record in &batch.rows {
            let reasons = rules.evaluate(&schema, record)?;
            let mut row = record.clone();
            row.insert(RUN_DATE_COLUMN.to_string(), stamp.clone());

            if reasons.is_empty() {
                row.remove(DQ_REASONS_COLUMN);
                clean.push(row);
                continue;
            }

            row.insert(DQ_REASONS_COLUMN.to_string(), Value::String(reasons.join()));
            if reasons.is_discard() {
                discard.push(row);
            } else {
                quarantine.push(row);
            }
        }

        let metrics_summary = build_summary(
            run_date,
            count(batch.len()),
            count(clean.len()),
            count(quarantine.len()),
            count(discard.len()),
        );
        let metrics_by_reason = reason_counts(run_date, [&quarantine, &discard]);

        tracing::info!(
            "Classified {} records for run {}: {} clean, {} quarantine, {} discard",
            batch.len(),
            run_date,
            clean.len(),
            quarantine.len(),
            discard.len()
        );
        for reason in &metrics_by_reason {
            tracing::debug!("  {}: {}", reason.reason, reason.count);
        }

        Ok(ClassificationResult {
            clean,
            quarantine,
            discard,
            metrics_summary,
            metrics_by_reason,
            run_date,
        })
    }

    /// Classifies a batch shard by shard and combines the results.
    ///
    /// Equivalent to a single [`classify_at`](Self::classify_at) call on the
    /// whole batch.
    pub fn classify_sharded(
        &self,
        batch: &RecordTable,
        run_date: RunDate,
        today: NaiveDate,
        shard_count: usize,
    ) -> Result<ClassificationResult> {
        let parts = batch
            .split_into_shards(shard_count)
            .iter()
            .map(|shard| self.classify_at(shard, run_date, today))
            .collect::<Result<Vec<_>>>()?;
        ClassificationResult::concat(parts)
    }
}
