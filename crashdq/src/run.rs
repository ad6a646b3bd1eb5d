//! Command workflows: classify, validate and rule listing.

use anyhow::{Context, Result};
use crashdq_core::{
    ClassificationResult, ClassifierConfig, QualityClassifier, RecordTable,
    models::RunDate,
    quality::{IdentityRule, MetricName, ReasonClass, Rule},
};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::{ClassifyArgs, GlobalArgs, RuleArgs, RulesArgs, ValidateArgs, input, output};

/// Builds the classifier configuration from an optional file and flags.
///
/// Flags override file values, which override defaults.
pub async fn build_config(args: &RuleArgs) -> Result<ClassifierConfig> {
    let mut config = match &args.config {
        Some(path) => input::load_config(path).await?,
        None => ClassifierConfig::new(),
    };

    if let Some(rule) = args.identity_rule {
        config = config.with_identity_rule(rule.into());
    }
    if let Some(bound) = args.year_bound {
        config = config.with_year_bound(bound.into());
    }
    if let Some(year) = args.min_vehicle_year {
        config = config.with_min_vehicle_year(year);
    }
    if let Some(offset) = args.max_year_offset {
        config = config.with_max_year_offset(offset);
    }

    config
        .validate()
        .context("Invalid classifier configuration")?;
    Ok(config)
}

/// Classifies a batch and writes the results unless `dry_run` is set.
///
/// The stdout summary is skipped under `--quiet`.
pub async fn classify_command(args: &ClassifyArgs, global: &GlobalArgs) -> Result<()> {
    info!("Starting classification...");
    info!("Input: {}", args.input.display());

    let config = build_config(&args.rules).await?;
    let batch = input::load_batch(&args.input)
        .await
        .with_context(|| format!("Failed to load batch {}", args.input.display()))?;
    info!("✓ Loaded {} records", batch.len());

    let run_date = args.rules.run_date.unwrap_or_else(RunDate::today);
    let classifier = QualityClassifier::new(config);
    let result = if args.shards > 1 {
        classify_in_parallel(&classifier, &batch, run_date, args.shards).await?
    } else {
        classifier.classify_at(&batch, run_date, RunDate::today().date())?
    };

    info!("✓ Classification completed for run {}", result.run_date);
    report(&result);

    if args.dry_run {
        info!("Dry run: no files written");
    } else {
        let dir = output::write_result(&result, &args.output_dir)
            .await
            .context("Failed to write classification output")?;
        info!("✓ Results saved to {}", dir.display());
        if !global.quiet {
            println!("Output: {}", dir.display());
        }
    }

    if !global.quiet {
        println!(
            "Rows read: {}",
            result.summary_value(MetricName::TotalRowsRead)
        );
        println!("Clean: {}", result.clean.len());
        println!("Quarantine: {}", result.quarantine.len());
        println!("Discard: {}", result.discard.len());
    }

    Ok(())
}

/// Splits a batch into shards, classifies them on blocking worker threads
/// and combines the results in shard order.
pub async fn classify_in_parallel(
    classifier: &QualityClassifier,
    batch: &RecordTable,
    run_date: RunDate,
    shard_count: usize,
) -> Result<ClassificationResult> {
    let today = RunDate::today().date();
    let shards = batch.split_into_shards(shard_count);
    info!("Classifying {} shards in parallel", shards.len());

    let mut tasks = JoinSet::new();
    for (index, shard) in shards.into_iter().enumerate() {
        let classifier = classifier.clone();
        tasks.spawn_blocking(move || (index, classifier.classify_at(&shard, run_date, today)));
    }

    let mut parts = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        let (index, result) = joined.context("Shard classification task failed")?;
        parts.push((index, result.with_context(|| format!("Shard {} failed", index))?));
    }
    parts.sort_by_key(|(index, _)| *index);

    Ok(ClassificationResult::concat(
        parts.into_iter().map(|(_, part)| part),
    )?)
}

/// Logs summary counters and per-reason counts.
fn report(result: &ClassificationResult) {
    for metric in &result.metrics_summary {
        info!("  {}: {}", metric.metric.as_str(), metric.value);
    }

    let discarded = result.summary_value(MetricName::TotalDiscard);
    if discarded > 0 {
        warn!("{} records discarded for missing identity", discarded);
    }
    for reason in &result.metrics_by_reason {
        info!("  reason {}: {}", reason.reason, reason.count);
    }
}

/// Validates a batch document without classifying it.
pub async fn validate_command(args: &ValidateArgs, global: &GlobalArgs) -> Result<()> {
    info!("Validating {}", args.input.display());

    let batch = input::load_batch(&args.input)
        .await
        .with_context(|| format!("Batch {} is not valid", args.input.display()))?;

    info!("✓ Batch validation passed");
    if global.quiet {
        return Ok(());
    }
    println!("Batch is valid");
    println!("Records: {}", batch.len());
    println!("Columns: {}", batch.columns.join(", "));
    if !batch.has_column(crashdq_core::quality::rules::VEHICLE_YEAR) {
        println!("Note: no vehicle_year column; every record will be quarantined");
    }

    Ok(())
}

/// Prints the rule order for the effective configuration.
pub async fn rules_command(args: &RulesArgs) -> Result<()> {
    let config = build_config(&args.rules).await?;
    let run_date = args.rules.run_date.unwrap_or_else(RunDate::today);
    let rules = QualityClassifier::new(config)
        .rule_set(run_date, RunDate::today().date())
        .context("Invalid vehicle-year range")?;

    println!("Rules for run {} (evaluated in order):", run_date);
    for (position, rule) in rules.rules().iter().enumerate() {
        println!(
            "  {}. {:<20} {:<28} {:<11} {}",
            position.saturating_add(1),
            rule.name(),
            rule.reason().token(),
            class_name(rule.reason().class()),
            describe(rule)
        );
    }

    Ok(())
}

fn class_name(class: ReasonClass) -> &'static str {
    match class {
        ReasonClass::Quarantine => "quarantine",
        ReasonClass::Discard => "discard",
    }
}

/// Human-readable condition for a rule.
pub fn describe(rule: &Rule) -> String {
    match rule {
        Rule::Identity(IdentityRule::BothNull) => {
            "unique_id and collision_id are both null".to_string()
        }
        Rule::Identity(IdentityRule::EitherNull) => {
            "unique_id or collision_id is null".to_string()
        }
        Rule::VehicleYearRange(range) => format!(
            "vehicle_year present and outside [{}, {}]",
            range.min, range.max
        ),
        Rule::VehicleYearColumn => "batch has no vehicle_year column".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IdentityRuleArg;
    use crashdq_core::quality::{YearBound, rules::YearRange};

    #[tokio::test]
    async fn test_build_config_applies_flags() {
        let args = RuleArgs {
            identity_rule: Some(IdentityRuleArg::EitherNull),
            min_vehicle_year: Some(1950),
            ..RuleArgs::default()
        };
        let config = build_config(&args).await.unwrap();
        assert_eq!(config.identity_rule, IdentityRule::EitherNull);
        assert_eq!(config.min_vehicle_year, 1950);
        assert_eq!(config.year_bound, YearBound::RunDate);
    }

    #[tokio::test]
    async fn test_build_config_rejects_invalid_values() {
        let args = RuleArgs {
            min_vehicle_year: Some(-1),
            ..RuleArgs::default()
        };
        assert!(build_config(&args).await.is_err());
    }

    #[tokio::test]
    async fn test_quiet_validate_still_reports_errors() {
        let quiet = GlobalArgs {
            verbose: 0,
            quiet: true,
        };
        let args = ValidateArgs {
            input: std::path::PathBuf::from("does-not-exist.json"),
        };
        assert!(validate_command(&args, &quiet).await.is_err());
    }

    #[test]
    fn test_describe_rules() {
        assert_eq!(
            describe(&Rule::VehicleYearRange(YearRange::new(1900, 2027))),
            "vehicle_year present and outside [1900, 2027]"
        );
        assert!(describe(&Rule::Identity(IdentityRule::EitherNull)).contains("or"));
    }
}
