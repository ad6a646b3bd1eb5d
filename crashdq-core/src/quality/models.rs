//! Classification result models.
//!
//! A [`ClassificationResult`] holds the three partition tables and the
//! metrics that describe them. Metrics carry counts and reason tokens only,
//! never record values.

use serde::{Deserialize, Serialize};

use crate::error::{CrashDqError, Result};
use crate::models::{RecordTable, RunDate};

use super::metrics;

/// Column holding the joined reason tokens on quarantine and discard rows.
pub const DQ_REASONS_COLUMN: &str = "dq_reasons";

/// Column stamped with the run date on every output row.
pub const RUN_DATE_COLUMN: &str = "run_date";

/// Metric name used for per-reason rows of the combined report.
pub const REASON_COUNT_METRIC: &str = "dq_reason_count";

/// Summary counter names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    /// Records in the input batch
    TotalRowsRead,
    /// Records with no reasons
    TotalClean,
    /// Records with reasons, none of discard class
    TotalQuarantine,
    /// Records with at least one discard-class reason
    TotalDiscard,
}

impl MetricName {
    /// Every summary counter, in output order.
    pub const ALL: [Self; 4] = [
        Self::TotalRowsRead,
        Self::TotalClean,
        Self::TotalQuarantine,
        Self::TotalDiscard,
    ];

    /// Name written to the `metric` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TotalRowsRead => "total_rows_read",
            Self::TotalClean => "total_clean",
            Self::TotalQuarantine => "total_quarantine",
            Self::TotalDiscard => "total_discard",
        }
    }
}

/// One row of `metrics_summary`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryMetric {
    /// Run the counter belongs to
    pub run_date: RunDate,
    /// Counter name
    pub metric: MetricName,
    /// Row count
    pub value: u64,
}

/// One row of `metrics_by_reason`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonCount {
    /// Run the count belongs to
    pub run_date: RunDate,
    /// Reason token as written in `dq_reasons`
    pub reason: String,
    /// Flagged records carrying the token
    pub count: u64,
}

/// Output of one classifier invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Records with no reasons; never carries `dq_reasons`
    pub clean: RecordTable,
    /// Records with only quarantine-class reasons
    pub quarantine: RecordTable,
    /// Records with at least one discard-class reason
    pub discard: RecordTable,
    /// Exactly four rows, one per [`MetricName`]
    pub metrics_summary: Vec<SummaryMetric>,
    /// One row per distinct reason token; empty when nothing was flagged
    pub metrics_by_reason: Vec<ReasonCount>,
    /// Date stamped on every output row
    pub run_date: RunDate,
}

impl ClassificationResult {
    /// Value of a summary counter, or 0 if the row is absent.
    pub fn summary_value(&self, metric: MetricName) -> u64 {
        self.metrics_summary
            .iter()
            .find(|m| m.metric == metric)
            .map_or(0, |m| m.value)
    }

    /// Count for a reason token, or 0 if it never fired.
    pub fn reason_count(&self, reason: &str) -> u64 {
        self.metrics_by_reason
            .iter()
            .find(|r| r.reason == reason)
            .map_or(0, |r| r.count)
    }

    /// Combines results of disjoint shards classified with the same run date.
    ///
    /// Tables are concatenated in order, summary counters are added and
    /// reason counts are recomputed from the combined `dq_reasons` columns.
    pub fn concat<I>(parts: I) -> Result<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        let mut parts = parts.into_iter();
        let first = parts
            .next()
            .ok_or_else(|| CrashDqError::configuration("No classification results to combine"))?;
        let run_date = first.run_date;

        let mut totals: Vec<u64> = MetricName::ALL
            .iter()
            .map(|m| first.summary_value(*m))
            .collect();
        let mut clean = vec![first.clean];
        let mut quarantine = vec![first.quarantine];
        let mut discard = vec![first.discard];

        for part in parts {
            if part.run_date != run_date {
                return Err(CrashDqError::configuration(format!(
                    "Cannot combine results for run dates {} and {}",
                    run_date, part.run_date
                )));
            }
            for (total, metric) in totals.iter_mut().zip(MetricName::ALL) {
                *total = total.saturating_add(part.summary_value(metric));
            }
            clean.push(part.clean);
            quarantine.push(part.quarantine);
            discard.push(part.discard);
        }

        let clean = RecordTable::concat(clean);
        let quarantine = RecordTable::concat(quarantine);
        let discard = RecordTable::concat(discard);

        let metrics_summary = MetricName::ALL
            .into_iter()
            .zip(totals)
            .map(|(metric, value)| SummaryMetric {
                run_date,
                metric,
                value,
            })
            .collect();
        let metrics_by_reason = metrics::reason_counts(run_date, [&quarantine, &discard]);

        Ok(Self {
            clean,
            quarantine,
            discard,
            metrics_summary,
            metrics_by_reason,
            run_date,
        })
    }
}

/// One row of the combined metrics report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsReportRow {
    /// Run the row belongs to
    pub run_date: RunDate,
    /// Summary counter name or `dq_reason_count`
    pub metric: String,
    /// Counter value
    pub value: u64,
    /// Set only on per-reason rows
    pub reason: Option<String>,
    /// Set only on per-reason rows; equal to `value`
    pub count: Option<u64>,
}

/// Summary and per-reason metrics flattened into one five-column report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Summary rows followed by reason rows
    pub rows: Vec<MetricsReportRow>,
}

impl MetricsReport {
    /// Builds the report: summary rows first, then one row per reason.
    pub fn from_result(result: &ClassificationResult) -> Self {
        let summary = result.metrics_summary.iter().map(|m| MetricsReportRow {
            run_date: m.run_date,
            metric: m.metric.as_str().to_string(),
            value: m.value,
            reason: None,
            count: None,
        });
        let reasons = result.metrics_by_reason.iter().map(|r| MetricsReportRow {
            run_date: r.run_date,
            metric: REASON_COUNT_METRIC.to_string(),
            value: r.count,
            reason: Some(r.reason.clone()),
            count: Some(r.count),
        });

        Self {
            rows: summary.chain(reasons).collect(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the report has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run_date() -> RunDate {
        "2026-02-27".parse().unwrap()
    }

    fn result_with(clean: u64, quarantine: u64, discard: u64) -> ClassificationResult {
        let run_date = run_date();
        let total = clean.saturating_add(quarantine).saturating_add(discard);
        ClassificationResult {
            clean: RecordTable::default(),
            quarantine: RecordTable::default(),
            discard: RecordTable::default(),
            metrics_summary: metrics::build_summary(run_date, total, clean, quarantine, discard),
            metrics_by_reason: vec![ReasonCount {
                run_date,
                reason: "No_vehicle_year".to_string(),
                count: quarantine,
            }],
            run_date,
        }
    }

    #[test]
    fn test_metric_names_serialize_snake_case() {
        for metric in MetricName::ALL {
            let json = serde_json::to_value(metric).unwrap();
            assert_eq!(json, json!(metric.as_str()));
        }
    }

    #[test]
    fn test_summary_value_lookup() {
        let result = result_with(3, 2, 1);
        assert_eq!(result.summary_value(MetricName::TotalRowsRead), 6);
        assert_eq!(result.summary_value(MetricName::TotalDiscard), 1);
        assert_eq!(result.reason_count("No_vehicle_year"), 2);
        assert_eq!(result.reason_count("discard_missing_id"), 0);
    }

    #[test]
    fn test_metrics_report_shape() {
        let result = result_with(3, 2, 1);
        let report = MetricsReport::from_result(&result);

        assert_eq!(report.len(), 5);
        assert!(report.rows[..4].iter().all(|r| r.reason.is_none() && r.count.is_none()));

        let reason_row = &report.rows[4];
        assert_eq!(reason_row.metric, REASON_COUNT_METRIC);
        assert_eq!(reason_row.reason.as_deref(), Some("No_vehicle_year"));
        assert_eq!(reason_row.count, Some(reason_row.value));

        let json = serde_json::to_value(&report.rows[0]).unwrap();
        assert_eq!(json["run_date"], "2026-02-27");
        assert_eq!(json["metric"], "total_rows_read");
        assert_eq!(json["reason"], serde_json::Value::Null);
    }

    #[test]
    fn test_metrics_report_without_reasons() {
        let mut result = result_with(4, 0, 0);
        result.metrics_by_reason.clear();
        let report = MetricsReport::from_result(&result);
        assert_eq!(report.len(), 4);
    }

    #[test]
    fn test_concat_rejects_empty_input() {
        let err = ClassificationResult::concat(Vec::new()).unwrap_err();
        assert!(matches!(err, CrashDqError::Configuration { .. }));
    }

    #[test]
    fn test_concat_rejects_mixed_run_dates() {
        let a = result_with(1, 0, 0);
        let mut b = result_with(1, 0, 0);
        b.run_date = "2026-02-28".parse().unwrap();

        let err = ClassificationResult::concat([a, b]).unwrap_err();
        assert!(err.to_string().contains("2026-02-28"));
    }

    #[test]
    fn test_concat_adds_summary_counters() {
        let combined =
            ClassificationResult::concat([result_with(1, 2, 3), result_with(4, 0, 1)]).unwrap();
        assert_eq!(combined.summary_value(MetricName::TotalRowsRead), 11);
        assert_eq!(combined.summary_value(MetricName::TotalClean), 5);
        assert_eq!(combined.summary_value(MetricName::TotalQuarantine), 2);
        assert_eq!(combined.summary_value(MetricName::TotalDiscard), 4);
        assert_eq!(combined.metrics_summary.len(), 4);
    }
}
