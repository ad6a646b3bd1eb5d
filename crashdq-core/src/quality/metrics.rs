//! Metric derivation.
//!
//! Reason counts are always recomputed from the written `dq_reasons`
//! strings, so they describe exactly what lands in the sink.

use std::collections::HashMap;

use crate::models::{RecordTable, RunDate};

use super::models::{DQ_REASONS_COLUMN, MetricName, ReasonCount, SummaryMetric};
use super::reason::split_reasons;

/// Converts a row count to a metric value.
pub(crate) fn count(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

/// Builds the four summary rows in [`MetricName::ALL`] order.
pub fn build_summary(
    run_date: RunDate,
    total_rows_read: u64,
    total_clean: u64,
    total_quarantine: u64,
    total_discard: u64,
) -> Vec<SummaryMetric> {
    [
        (MetricName::TotalRowsRead, total_rows_read),
        (MetricName::TotalClean, total_clean),
        (MetricName::TotalQuarantine, total_quarantine),
        (MetricName::TotalDiscard, total_discard),
    ]
    .into_iter()
    .map(|(metric, value)| SummaryMetric {
        run_date,
        metric,
        value,
    })
    .collect()
}

/// Counts reason tokens across the `dq_reasons` columns of `tables`.
///
/// Each row contributes one count per token. The result is ordered by count
/// descending; ties keep the order in which tokens first appeared. Rows
/// whose `dq_reasons` is not a string contribute nothing.
pub fn reason_counts<'a, I>(run_date: RunDate, tables: I) -> Vec<ReasonCount>
where
    I: IntoIterator<Item = &'a RecordTable>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, u64)> = Vec::new();

    let joined = tables
        .into_iter()
        .flat_map(|table| table.column_values(DQ_REASONS_COLUMN))
        .filter_map(serde_json::Value::as_str);

    for reasons in joined {
        for token in split_reasons(reasons) {
            if let Some(&slot) = index.get(token) {
                if let Some(entry) = counts.get_mut(slot) {
                    entry.1 = entry.1.saturating_add(1);
                }
            } else {
                index.insert(token.to_string(), counts.len());
                counts.push((token.to_string(), 1));
            }
        }
    }

    // Stable sort keeps first-appearance order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    counts
        .into_iter()
        .map(|(reason, count)| ReasonCount {
            run_date,
            reason,
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use serde_json::{Value, json};

    fn table(reasons: &[&str]) -> RecordTable {
        let rows: Vec<Record> = reasons
            .iter()
            .map(|r| {
                json!({"unique_id": 1, "dq_reasons": r})
                    .as_object()
                    .cloned()
                    .unwrap_or_default()
            })
            .collect();
        RecordTable::with_rows(["unique_id", "dq_reasons"], rows)
    }

    fn run_date() -> RunDate {
        "2026-02-27".parse().unwrap()
    }

    #[test]
    fn test_build_summary_order() {
        let summary = build_summary(run_date(), 10, 5, 3, 2);
        let names: Vec<MetricName> = summary.iter().map(|m| m.metric).collect();
        assert_eq!(names, MetricName::ALL.to_vec());
        let values: Vec<u64> = summary.iter().map(|m| m.value).collect();
        assert_eq!(values, vec![10, 5, 3, 2]);
    }

    #[test]
    fn test_reason_counts_explode_joined_tokens() {
        let quarantine = table(&["invalid_vehicle_year_range"]);
        let discard = table(&["discard_missing_id;invalid_vehicle_year_range"]);

        let counts = reason_counts(run_date(), [&quarantine, &discard]);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].reason, "invalid_vehicle_year_range");
        assert_eq!(counts[0].count, 2);
        assert_eq!(counts[1].reason, "discard_missing_id");
        assert_eq!(counts[1].count, 1);
        // Sum of counts equals the number of tokens, not the number of rows
        assert_eq!(counts.iter().map(|c| c.count).sum::<u64>(), 3);
    }

    #[test]
    fn test_reason_counts_ties_keep_first_appearance() {
        let quarantine = table(&["No_vehicle_year", "invalid_vehicle_year_range"]);
        let counts = reason_counts(run_date(), [&quarantine]);
        let order: Vec<&str> = counts.iter().map(|c| c.reason.as_str()).collect();
        assert_eq!(order, vec!["No_vehicle_year", "invalid_vehicle_year_range"]);
    }

    #[test]
    fn test_reason_counts_skip_blank_and_non_string() {
        let mut quarantine = table(&["", ";"]);
        if let Some(row) = quarantine.rows.get_mut(0) {
            row.insert("dq_reasons".to_string(), Value::Null);
        }
        let counts = reason_counts(run_date(), [&quarantine]);
        assert!(counts.is_empty());
    }

    #[test]
    fn test_reason_counts_empty_tables() {
        let counts = reason_counts(run_date(), [&RecordTable::default()]);
        assert!(counts.is_empty());
    }
}
