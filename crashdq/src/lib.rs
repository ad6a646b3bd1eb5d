//! Library module for the crashdq binary.
//!
//! Exposes the CLI definition, the JSON record source and the JSON sink so
//! they can be exercised by tests. The binary entry point is in main.rs.

pub mod input;
pub mod output;
pub mod run;

use clap::{Args, Parser, Subcommand, ValueEnum};
use crashdq_core::models::RunDate;
use crashdq_core::quality::{IdentityRule, YearBound};
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "crashdq")]
#[command(about = "Data-quality classification for vehicle-crash record batches")]
#[command(version)]
#[command(long_about = "
crashdq - Vehicle-crash record data-quality stage

Partitions a record batch into three disjoint tables:
- clean: no rule fired
- quarantine: reviewable defects (implausible or missing vehicle year)
- discard: records without the identity needed downstream

Every quarantine and discard row carries a dq_reasons column listing the
rules it violated. Summary and per-reason metrics are written alongside.

EXAMPLES:
  crashdq classify --input batch.json --run-date 2026-02-27
  crashdq classify --input batch.json --identity-rule either-null --dry-run
  crashdq validate --input batch.json
  crashdq rules
")]
pub struct Cli {
    /// Flags accepted by every command
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify a batch and write the partition and metrics
    Classify(ClassifyArgs),
    /// Check batch document shape and required columns
    Validate(ValidateArgs),
    /// Print the rule order and reason tokens
    Rules(RulesArgs),
}

/// Logging flags.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(
        short,
        long,
        global = true,
        help = "Suppress all output except errors"
    )]
    pub quiet: bool,
}

/// Rule configuration shared by `classify` and `rules`.
#[derive(Args, Debug, Default, Clone)]
pub struct RuleArgs {
    /// JSON classifier configuration file
    #[arg(long, value_name = "FILE", help = "Classifier configuration (JSON)")]
    pub config: Option<PathBuf>,

    /// Identity-discard variant
    #[arg(long, value_enum, help = "When to discard for missing identity")]
    pub identity_rule: Option<IdentityRuleArg>,

    /// Source of the upper vehicle-year bound
    #[arg(long, value_enum, help = "Year the upper vehicle-year bound is based on")]
    pub year_bound: Option<YearBoundArg>,

    /// Lowest accepted vehicle year
    #[arg(long, help = "Lowest accepted vehicle year (inclusive)")]
    pub min_vehicle_year: Option<i32>,

    /// Years past the bound year still accepted
    #[arg(long, help = "Years past the bound year still accepted")]
    pub max_year_offset: Option<i32>,

    /// Run date
    #[arg(
        long,
        env = "CRASHDQ_RUN_DATE",
        value_name = "YYYY-MM-DD",
        help = "Run date stamped on every output row (default: today)"
    )]
    pub run_date: Option<RunDate>,
}

/// Arguments for `classify`.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Input batch document
    #[arg(short, long, value_name = "FILE", help = "Input batch document (JSON)")]
    pub input: PathBuf,

    /// Rule selection
    #[command(flatten)]
    pub rules: RuleArgs,

    /// Output root directory
    #[arg(
        short,
        long,
        default_value = "output",
        help = "Directory receiving run_date=<date>/ partitions"
    )]
    pub output_dir: PathBuf,

    /// Number of shards classified concurrently
    #[arg(
        long,
        default_value = "1",
        help = "Split the batch into this many shards and classify them in parallel"
    )]
    pub shards: usize,

    /// Skip writing output
    #[arg(long, help = "Classify and report without writing any files")]
    pub dry_run: bool,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Input batch document
    #[arg(short, long, value_name = "FILE", help = "Input batch document (JSON)")]
    pub input: PathBuf,
}

/// Arguments for `rules`.
#[derive(Args, Debug)]
pub struct RulesArgs {
    /// Rule selection
    #[command(flatten)]
    pub rules: RuleArgs,
}

/// CLI spelling of [`IdentityRule`].
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityRuleArg {
    /// Discard only when both identities are null
    BothNull,
    /// Discard when either identity is null
    EitherNull,
}

impl From<IdentityRuleArg> for IdentityRule {
    fn from(value: IdentityRuleArg) -> Self {
        match value {
            IdentityRuleArg::BothNull => Self::BothNull,
            IdentityRuleArg::EitherNull => Self::EitherNull,
        }
    }
}

/// CLI spelling of [`YearBound`].
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearBoundArg {
    /// Year of the run date
    RunDate,
    /// Year of the current calendar date
    WallClock,
}

impl From<YearBoundArg> for YearBound {
    fn from(value: YearBoundArg) -> Self {
        match value {
            YearBoundArg::RunDate => Self::RunDate,
            YearBoundArg::WallClock => Self::WallClock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_classify() {
        let cli = Cli::try_parse_from([
            "crashdq",
            "-v",
            "classify",
            "--input",
            "batch.json",
            "--run-date",
            "2026-02-27",
            "--identity-rule",
            "either-null",
            "--year-bound",
            "wall-clock",
            "--shards",
            "4",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(cli.global.verbose, 1);
        let Command::Classify(args) = cli.command else {
            panic!("expected classify");
        };
        assert_eq!(args.input, PathBuf::from("batch.json"));
        assert_eq!(args.rules.run_date.map(|d| d.to_string()).as_deref(), Some("2026-02-27"));
        assert_eq!(args.rules.identity_rule, Some(IdentityRuleArg::EitherNull));
        assert_eq!(args.rules.year_bound, Some(YearBoundArg::WallClock));
        assert_eq!(args.shards, 4);
        assert!(args.dry_run);
        assert_eq!(args.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn test_cli_rejects_bad_run_date() {
        let result = Cli::try_parse_from([
            "crashdq",
            "classify",
            "--input",
            "batch.json",
            "--run-date",
            "27/02/2026",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["crashdq"]).is_err());
    }

    #[test]
    fn test_value_enum_conversions() {
        assert_eq!(
            IdentityRule::from(IdentityRuleArg::EitherNull),
            IdentityRule::EitherNull
        );
        assert_eq!(YearBound::from(YearBoundArg::RunDate), YearBound::RunDate);
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
