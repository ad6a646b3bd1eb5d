//! Classifier configuration.
//!
//! This module provides the rule choices the classifier can run with: the
//! identity-discard variant, the source of the upper vehicle-year bound and
//! the bounds themselves.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Oldest vehicle year accepted by default.
pub const DEFAULT_MIN_VEHICLE_YEAR: i32 = 1900;

/// Years past the bound year still accepted by default (next model year).
pub const DEFAULT_MAX_YEAR_OFFSET: i32 = 1;

/// Which identity condition sends a record to discard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdentityRule {
    /// Discard only when both `unique_id` and `collision_id` are null
    #[default]
    BothNull,
    /// Discard when either `unique_id` or `collision_id` is null
    EitherNull,
}

impl IdentityRule {
    /// Applies the rule to the two nullable identities.
    pub fn is_violated(&self, unique_id: Option<i64>, collision_id: Option<i64>) -> bool {
        match self {
            IdentityRule::BothNull => unique_id.is_none() && collision_id.is_none(),
            IdentityRule::EitherNull => unique_id.is_none() || collision_id.is_none(),
        }
    }
}

/// Where the upper bound of the vehicle-year range comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum YearBound {
    /// Year of the run date; reproducible for historical re-runs
    #[default]
    RunDate,
    /// Year of the calendar date at evaluation time
    WallClock,
}

/// Validation errors for classifier configuration.
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    /// Lowest year outside 0..=9999
    #[error("min_vehicle_year must be between 0 and 9999, got {0}")]
    InvalidMinVehicleYear(i32),
    /// Offset outside 0..=100
    #[error("max_year_offset must be between 0 and 100, got {0}")]
    InvalidYearOffset(i32),
}

/// Quality classifier configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Identity-discard variant
    pub identity_rule: IdentityRule,
    /// Source of the upper vehicle-year bound
    pub year_bound: YearBound,
    /// Lowest accepted vehicle year (inclusive)
    pub min_vehicle_year: i32,
    /// Added to the bound year to get the highest accepted year (inclusive)
    pub max_year_offset: i32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            identity_rule: IdentityRule::BothNull,
            year_bound: YearBound::RunDate,
            min_vehicle_year: DEFAULT_MIN_VEHICLE_YEAR,
            max_year_offset: DEFAULT_MAX_YEAR_OFFSET,
        }
    }
}

impl ClassifierConfig {
    /// Creates a new classifier config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the identity-discard variant.
    pub fn with_identity_rule(mut self, rule: IdentityRule) -> Self {
        self.identity_rule = rule;
        self
    }

    /// Builder method to set the year-bound source.
    pub fn with_year_bound(mut self, bound: YearBound) -> Self {
        self.year_bound = bound;
        self
    }

    /// Builder method to set the lowest accepted vehicle year.
    pub fn with_min_vehicle_year(mut self, year: i32) -> Self {
        self.min_vehicle_year = year;
        self
    }

    /// Builder method to set the upper-bound offset.
    pub fn with_max_year_offset(mut self, offset: i32) -> Self {
        if offset < 0 {
            tracing::warn!("max_year_offset {} clamped to 0", offset);
        }
        self.max_year_offset = offset.max(0);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(0..=9999).contains(&self.min_vehicle_year) {
            return Err(ConfigValidationError::InvalidMinVehicleYear(
                self.min_vehicle_year,
            ));
        }
        if !(0..=100).contains(&self.max_year_offset) {
            return Err(ConfigValidationError::InvalidYearOffset(
                self.max_year_offset,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifier_config_default() {
        let config = ClassifierConfig::default();
        assert_eq!(config.identity_rule, IdentityRule::BothNull);
        assert_eq!(config.year_bound, YearBound::RunDate);
        assert_eq!(config.min_vehicle_year, 1900);
        assert_eq!(config.max_year_offset, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_classifier_config_builder() {
        let config = ClassifierConfig::new()
            .with_identity_rule(IdentityRule::EitherNull)
            .with_year_bound(YearBound::WallClock)
            .with_min_vehicle_year(1950)
            .with_max_year_offset(2);

        assert_eq!(config.identity_rule, IdentityRule::EitherNull);
        assert_eq!(config.year_bound, YearBound::WallClock);
        assert_eq!(config.min_vehicle_year, 1950);
        assert_eq!(config.max_year_offset, 2);
    }

    #[test]
    fn test_negative_offset_is_clamped() {
        let config = ClassifierConfig::new().with_max_year_offset(-3);
        assert_eq!(config.max_year_offset, 0);
    }

    #[test]
    fn test_identity_rule_variants() {
        let both = IdentityRule::BothNull;
        assert!(both.is_violated(None, None));
        assert!(!both.is_violated(None, Some(10)));
        assert!(!both.is_violated(Some(1), None));
        assert!(!both.is_violated(Some(1), Some(10)));

        let either = IdentityRule::EitherNull;
        assert!(either.is_violated(None, None));
        assert!(either.is_violated(None, Some(10)));
        assert!(either.is_violated(Some(1), None));
        assert!(!either.is_violated(Some(1), Some(10)));
    }

    #[test]
    fn test_validate_invalid_min_year() {
        let config = ClassifierConfig {
            min_vehicle_year: -1,
            ..ClassifierConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidMinVehicleYear(-1))
        ));
    }

    #[test]
    fn test_validate_invalid_offset() {
        // Set the field directly to bypass clamping
        let config = ClassifierConfig {
            max_year_offset: 500,
            ..ClassifierConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidYearOffset(500))
        ));
    }

    #[test]
    fn test_config_serde_names() {
        let config = ClassifierConfig::new().with_identity_rule(IdentityRule::EitherNull);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["identity_rule"], "either_null");
        assert_eq!(json["year_bound"], "run_date");
    }

    #[test]
    fn test_config_partial_json_uses_defaults() {
        let config: ClassifierConfig =
            serde_json::from_str(r#"{"identity_rule": "either_null"}"#).unwrap();
        assert_eq!(config.identity_rule, IdentityRule::EitherNull);
        assert_eq!(config.min_vehicle_year, DEFAULT_MIN_VEHICLE_YEAR);
        assert_eq!(config.year_bound, YearBound::RunDate);
    }
}
