//! Validation rules.
//!
//! Rules are plain values held in an ordered [`RuleSet`]. A record's reasons
//! are the fold of that list over an empty [`ReasonSet`], so the order of
//! tokens in `dq_reasons` is exactly the order of the list.

use crate::error::{CrashDqError, Result};
use crate::models::{Record, RecordTable, read_nullable_int};

use super::config::IdentityRule;
use super::reason::{Reason, ReasonSet};

/// Record identity column.
pub const UNIQUE_ID: &str = "unique_id";
/// Crash identity column.
pub const COLLISION_ID: &str = "collision_id";
/// Optional vehicle model-year column.
pub const VEHICLE_YEAR: &str = "vehicle_year";

/// Columns the classifier cannot run without.
pub const REQUIRED_COLUMNS: [&str; 2] = [UNIQUE_ID, COLLISION_ID];

/// Inclusive range of plausible vehicle years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    /// Lowest accepted year
    pub min: i32,
    /// Highest accepted year
    pub max: i32,
}

impl YearRange {
    /// Creates an inclusive range.
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Returns true if `year` lies inside the range.
    pub fn contains(&self, year: i64) -> bool {
        (i64::from(self.min)..=i64::from(self.max)).contains(&year)
    }
}

/// Facts about the batch schema that rules depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSchema {
    /// Whether the `vehicle_year` column exists
    pub has_vehicle_year: bool,
}

impl BatchSchema {
    /// Inspects a table's schema.
    ///
    /// Fails if a required identity column is absent.
    pub fn inspect(table: &RecordTable) -> Result<Self> {
        if let Some(missing) = REQUIRED_COLUMNS.iter().find(|c| !table.has_column(c)) {
            return Err(CrashDqError::missing_column(*missing));
        }
        Ok(Self {
            has_vehicle_year: table.has_column(VEHICLE_YEAR),
        })
    }
}

/// A single validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Discard-class: identities missing per the configured variant
    Identity(IdentityRule),
    /// Quarantine-class: non-null vehicle year outside the range
    VehicleYearRange(YearRange),
    /// Quarantine-class: the schema has no vehicle_year column
    VehicleYearColumn,
}

impl Rule {
    /// Short name used in logs and the `rules` listing.
    pub fn name(&self) -> &'static str {
        match self {
            Rule::Identity(_) => "identity",
            Rule::VehicleYearRange(_) => "vehicle_year_range",
            Rule::VehicleYearColumn => "vehicle_year_column",
        }
    }

    /// The reason this rule contributes when it fires.
    pub fn reason(&self) -> Reason {
        match self {
            Rule::Identity(_) => Reason::MissingId,
            Rule::VehicleYearRange(_) => Reason::InvalidVehicleYearRange,
            Rule::VehicleYearColumn => Reason::NoVehicleYear,
        }
    }

    /// Evaluates the rule on one record.
    ///
    /// Returns `Ok(None)` when the rule does not fire. Errors only when a
    /// cell the rule reads cannot be coerced to a nullable integer.
    pub fn evaluate(&self, schema: &BatchSchema, record: &Record) -> Result<Option<Reason>> {
        match self {
            Rule::Identity(variant) => {
                let unique_id = read_cell(record, UNIQUE_ID)?;
                let collision_id = read_cell(record, COLLISION_ID)?;
                Ok(variant
                    .is_violated(unique_id, collision_id)
                    .then_some(Reason::MissingId))
            }
            Rule::VehicleYearRange(range) => {
                if !schema.has_vehicle_year {
                    return Ok(None);
                }
                Ok(match read_cell(record, VEHICLE_YEAR)? {
                    Some(year) if !range.contains(year) => Some(Reason::InvalidVehicleYearRange),
                    _ => None,
                })
            }
            Rule::VehicleYearColumn => Ok((!schema.has_vehicle_year).then_some(Reason::NoVehicleYear)),
        }
    }
}

fn read_cell(record: &Record, column: &str) -> Result<Option<i64>> {
    match record.get(column) {
        Some(value) => read_nullable_int(value, column),
        None => Ok(None),
    }
}

/// Immutable, ordered list of rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Creates a rule set that evaluates `rules` in the given order.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The vehicle rule order: identity, year range, year column.
    pub fn vehicles(identity: IdentityRule, years: YearRange) -> Self {
        Self::new(vec![
            Rule::Identity(identity),
            Rule::VehicleYearRange(years),
            Rule::VehicleYearColumn,
        ])
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Folds every rule over an empty reason set for one record.
    pub fn evaluate(&self, schema: &BatchSchema, record: &Record) -> Result<ReasonSet> {
        self.rules.iter().try_fold(ReasonSet::new(), |acc, rule| {
            rule.evaluate(schema, record).map(|hit| match hit {
                Some(reason) => acc.with(reason),
                None => acc,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap_or_default()
    }

    const WITH_YEAR: BatchSchema = BatchSchema {
        has_vehicle_year: true,
    };
    const WITHOUT_YEAR: BatchSchema = BatchSchema {
        has_vehicle_year: false,
    };

    fn range() -> YearRange {
        YearRange::new(1900, 2027)
    }

    #[test]
    fn test_year_range_is_inclusive() {
        let r = range();
        assert!(r.contains(1900));
        assert!(r.contains(2027));
        assert!(!r.contains(1899));
        assert!(!r.contains(2028));
    }

    #[test]
    fn test_inspect_requires_identity_columns() {
        let table = RecordTable::new(["unique_id", "vehicle_year"]);
        let err = BatchSchema::inspect(&table).unwrap_err();
        assert!(err.to_string().contains("collision_id"));

        let table = RecordTable::new(["unique_id", "collision_id"]);
        let schema = BatchSchema::inspect(&table).unwrap();
        assert!(!schema.has_vehicle_year);
    }

    #[test]
    fn test_identity_rule_both_null() {
        let rule = Rule::Identity(IdentityRule::BothNull);
        let both = record(json!({"unique_id": null, "collision_id": null}));
        let one = record(json!({"unique_id": null, "collision_id": 10}));

        assert_eq!(
            rule.evaluate(&WITH_YEAR, &both).unwrap(),
            Some(Reason::MissingId)
        );
        assert_eq!(rule.evaluate(&WITH_YEAR, &one).unwrap(), None);
    }

    #[test]
    fn test_identity_rule_either_null() {
        let rule = Rule::Identity(IdentityRule::EitherNull);
        let one = record(json!({"unique_id": 2, "collision_id": null}));
        // Missing key reads as null
        let absent = record(json!({"collision_id": 10}));
        let ok = record(json!({"unique_id": 2, "collision_id": 11}));

        assert_eq!(
            rule.evaluate(&WITH_YEAR, &one).unwrap(),
            Some(Reason::MissingId)
        );
        assert_eq!(
            rule.evaluate(&WITH_YEAR, &absent).unwrap(),
            Some(Reason::MissingId)
        );
        assert_eq!(rule.evaluate(&WITH_YEAR, &ok).unwrap(), None);
    }

    #[test]
    fn test_year_range_ignores_null_and_absent_column() {
        let rule = Rule::VehicleYearRange(range());
        let null_year = record(json!({"vehicle_year": null}));
        let old = record(json!({"vehicle_year": 1899}));

        assert_eq!(rule.evaluate(&WITH_YEAR, &null_year).unwrap(), None);
        assert_eq!(
            rule.evaluate(&WITH_YEAR, &old).unwrap(),
            Some(Reason::InvalidVehicleYearRange)
        );
        assert_eq!(rule.evaluate(&WITHOUT_YEAR, &old).unwrap(), None);
    }

    #[test]
    fn test_year_column_rule_fires_only_without_column() {
        let rule = Rule::VehicleYearColumn;
        let row = record(json!({"unique_id": 1}));
        assert_eq!(
            rule.evaluate(&WITHOUT_YEAR, &row).unwrap(),
            Some(Reason::NoVehicleYear)
        );
        assert_eq!(rule.evaluate(&WITH_YEAR, &row).unwrap(), None);
    }

    #[test]
    fn test_uncoercible_year_is_structural() {
        let rule = Rule::VehicleYearRange(range());
        let row = record(json!({"vehicle_year": "nineteen-ninety"}));
        let err = rule.evaluate(&WITH_YEAR, &row).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_rule_set_fold_order() {
        let rules = RuleSet::vehicles(IdentityRule::BothNull, range());
        let names: Vec<&str> = rules.rules().iter().map(Rule::name).collect();
        assert_eq!(
            names,
            vec!["identity", "vehicle_year_range", "vehicle_year_column"]
        );

        let row = record(json!({"unique_id": null, "collision_id": null, "vehicle_year": 1800}));
        let reasons = rules.evaluate(&WITH_YEAR, &row).unwrap();
        assert_eq!(reasons.join(), "discard_missing_id;invalid_vehicle_year_range");
    }

    #[test]
    fn test_rule_set_custom_order_changes_token_order_only() {
        let reordered = RuleSet::new(vec![
            Rule::VehicleYearRange(range()),
            Rule::Identity(IdentityRule::BothNull),
        ]);
        let row = record(json!({"unique_id": null, "collision_id": null, "vehicle_year": 1800}));
        let reasons = reordered.evaluate(&WITH_YEAR, &row).unwrap();
        assert_eq!(reasons.join(), "invalid_vehicle_year_range;discard_missing_id");
        assert!(reasons.is_discard());
    }

    #[test]
    fn test_rule_set_clean_record() {
        let rules = RuleSet::vehicles(IdentityRule::EitherNull, range());
        let row = record(json!({"unique_id": 1, "collision_id": 10, "vehicle_year": 2010}));
        assert!(rules.evaluate(&WITH_YEAR, &row).unwrap().is_empty());
    }
}
