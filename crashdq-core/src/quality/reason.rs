//! Reason tokens and per-record reason accumulation.
//!
//! Rules append [`Reason`] values to a [`ReasonSet`]; the semicolon-joined
//! `dq_reasons` string is produced only when rows are written out.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Separator between reason tokens in the `dq_reasons` column.
pub const REASON_SEPARATOR: char = ';';

/// Outcome class a reason forces on its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasonClass {
    /// Reviewable defect, kept for audit
    Quarantine,
    /// Record lacks the minimum identity for any downstream use
    Discard,
}

/// A single violated rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reason {
    /// Identity rule fired
    #[serde(rename = "discard_missing_id")]
    MissingId,
    /// Vehicle year present but outside the plausible range
    #[serde(rename = "invalid_vehicle_year_range")]
    InvalidVehicleYearRange,
    /// Batch schema has no vehicle_year column at all
    #[serde(rename = "No_vehicle_year")]
    NoVehicleYear,
}

impl Reason {
    /// Every reason, in rule-evaluation order.
    pub const ALL: [Self; 3] = [
        Self::MissingId,
        Self::InvalidVehicleYearRange,
        Self::NoVehicleYear,
    ];

    /// Stable token written to `dq_reasons` and `metrics_by_reason`.
    pub fn token(&self) -> &'static str {
        match self {
            Self::MissingId => "discard_missing_id",
            Self::InvalidVehicleYearRange => "invalid_vehicle_year_range",
            Self::NoVehicleYear => "No_vehicle_year",
        }
    }

    /// Outcome class of this reason.
    pub fn class(&self) -> ReasonClass {
        match self {
            Self::MissingId => ReasonClass::Discard,
            Self::InvalidVehicleYearRange | Self::NoVehicleYear => ReasonClass::Quarantine,
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Error returned when a token does not name a known reason.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown reason token '{0}'")]
pub struct UnknownReason(pub String);

impl FromStr for Reason {
    type Err = UnknownReason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.token() == s)
            .ok_or_else(|| UnknownReason(s.to_string()))
    }
}

/// Ordered reasons accumulated for one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReasonSet {
    reasons: Vec<Reason>,
}

impl ReasonSet {
    /// An empty set: no violation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the set with `reason` appended. A reason already present is
    /// not repeated.
    pub fn with(mut self, reason: Reason) -> Self {
        if !self.reasons.contains(&reason) {
            self.reasons.push(reason);
        }
        self
    }

    /// Returns true if no rule fired.
    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }

    /// Number of reasons.
    pub fn len(&self) -> usize {
        self.reasons.len()
    }

    /// Reasons in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &Reason> {
        self.reasons.iter()
    }

    /// Returns true if `reason` is present.
    pub fn contains(&self, reason: Reason) -> bool {
        self.reasons.contains(&reason)
    }

    /// Returns true if any reason forces the discard class.
    pub fn is_discard(&self) -> bool {
        self.reasons
            .iter()
            .any(|r| r.class() == ReasonClass::Discard)
    }

    /// Serializes to the `dq_reasons` representation.
    pub fn join(&self) -> String {
        let mut out = String::new();
        for reason in &self.reasons {
            if !out.is_empty() {
                out.push(REASON_SEPARATOR);
            }
            out.push_str(reason.token());
        }
        out
    }
}

impl FromIterator<Reason> for ReasonSet {
    fn from_iter<I: IntoIterator<Item = Reason>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), Self::with)
    }
}

/// Splits a `dq_reasons` string into its tokens.
///
/// Blank segments are skipped, so `""`, `";"` and `"a;;b"` never produce
/// empty tokens. Unknown tokens are returned as-is.
pub fn split_reasons(joined: &str) -> impl Iterator<Item = &str> {
    joined
        .split(REASON_SEPARATOR)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
