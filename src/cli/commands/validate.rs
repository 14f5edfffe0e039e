//! Validate command implementation for the tracker processor CLI
//!
//! Loads the metadata snapshot once, then preprocesses and validates every
//! discovered bundle on its own task. Each task works on a private clone of
//! the metadata cache, since preprocessing caches resolved objects.

use super::shared::{
    RunSummary, create_progress_bar, discover_bundles, load_bundle, load_configuration,
    setup_logging,
};
use crate::app::services::metadata_cache::MetadataCache;
use crate::app::services::tracker_processor::{ProcessingResult, TrackerProcessor};
use crate::app::services::validation::ValidationReport;
use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::{Error, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Outcome of one bundle file
#[derive(Debug)]
pub struct BundleOutcome {
    pub path: PathBuf,
    pub result: Result<ProcessingResult>,
}

/// Validate command runner
pub async fn run_validate(args: ValidateArgs) -> Result<RunSummary> {
    let start_time = Instant::now();

    setup_logging(&args)?;
    debug!("Validate arguments: {:?}", args);
    args.validate()?;

    let config = load_configuration(&args).await?;
    let (cache, load_stats) = MetadataCache::load(&args.metadata, config.id_schemes.clone()).await?;
    info!(
        "Metadata loaded: {} programs, {} stages, {} attribute option combos, {} org units in {:.2}s",
        load_stats.programs,
        load_stats.program_stages,
        load_stats.category_option_combos,
        load_stats.organisation_units,
        load_stats.load_duration.as_secs_f64()
    );

    let bundles = discover_bundles(&args.bundle)?;
    if bundles.is_empty() {
        warn!("No bundle files found in {}", args.bundle.display());
    }

    let processor = Arc::new(TrackerProcessor::new(config)?);
    let outcomes = process_bundles(&args, processor, Arc::new(cache), bundles).await?;

    let mut summary = summarize(&outcomes);
    summary.processing_time = start_time.elapsed();

    match args.output_format {
        OutputFormat::Text => print_text_report(&outcomes, &summary),
        OutputFormat::Json => print_json_report(&outcomes, &summary)?,
    }

    info!("Validation completed: {}", summary.summary());
    Ok(summary)
}

/// Process bundles concurrently, bounded by the configured job count
///
/// Outcomes are returned in discovery order.
pub async fn process_bundles(
    args: &ValidateArgs,
    processor: Arc<TrackerProcessor>,
    cache: Arc<MetadataCache>,
    bundles: Vec<PathBuf>,
) -> Result<Vec<BundleOutcome>> {
    let concurrency = args.concurrency();
    debug!(
        "Processing {} bundles with {} concurrent jobs",
        bundles.len(),
        concurrency
    );

    let progress = args
        .show_progress()
        .then(|| create_progress_bar(bundles.len() as u64, "Validating bundles"));

    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut workers = JoinSet::new();

    for (index, path) in bundles.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let processor = Arc::clone(&processor);
        let cache = Arc::clone(&cache);

        workers.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| Error::processing_interrupted(format!("Job queue closed: {}", e)))?;
            let result = process_bundle(&path, processor, cache).await;
            Ok::<_, Error>((index, BundleOutcome { path, result }))
        });
    }

    let mut outcomes = Vec::new();
    while let Some(joined) = workers.join_next().await {
        let (index, outcome) = joined.map_err(|e| {
            Error::processing_interrupted(format!("Bundle task failed: {}", e))
        })??;

        if let Some(pb) = &progress {
            pb.inc(1);
            pb.set_message(
                outcome
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            );
        }
        outcomes.push((index, outcome));
    }

    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    outcomes.sort_by_key(|(index, _)| *index);
    Ok(outcomes.into_iter().map(|(_, outcome)| outcome).collect())
}

/// Load one bundle and run it through the pipeline on a private cache
async fn process_bundle(
    path: &Path,
    processor: Arc<TrackerProcessor>,
    cache: Arc<MetadataCache>,
) -> Result<ProcessingResult> {
    let bundle = load_bundle(path).await?;
    debug!("Loaded {} records from {}", bundle.len(), path.display());

    let result = tokio::task::spawn_blocking(move || {
        let mut cache = MetadataCache::clone(&cache);
        processor.process(bundle, &mut cache)
    })
    .await
    .map_err(|e| Error::processing_interrupted(format!("Bundle task failed: {}", e)))?;

    debug!("{}: {}", path.display(), result.summary());
    Ok(result)
}

fn summarize(outcomes: &[BundleOutcome]) -> RunSummary {
    let mut summary = RunSummary::default();
    for outcome in outcomes {
        summary.bundles_processed += 1;
        match &outcome.result {
            Ok(result) => {
                summary.records_submitted += result.stats.total_input;
                summary.records_accepted += result.accepted_count();
                summary.errors_reported += result.report.error_count();
                if result.has_errors() {
                    summary.bundles_with_errors += 1;
                }
            }
            Err(_) => summary.bundles_failed += 1,
        }
    }
    summary
}

fn print_text_report(outcomes: &[BundleOutcome], summary: &RunSummary) {
    for outcome in outcomes {
        println!("\n{}", outcome.path.display().to_string().bold());

        let result = match &outcome.result {
            Ok(result) => result,
            Err(e) => {
                println!("  {} {:#}", "FAILED".red().bold(), e);
                continue;
            }
        };

        let status = if result.report.bundle_rejected {
            "REJECTED".red().bold()
        } else if result.has_errors() {
            "PARTIAL".yellow().bold()
        } else {
            "OK".green().bold()
        };
        println!("  {} {}", status, result.summary());

        for error in &result.report.errors {
            println!("    {}", error.to_string().red());
        }
    }

    let line = format!("\n{}", summary.summary());
    if summary.is_clean() {
        println!("{}", line.bright_green());
    } else {
        println!("{}", line.bright_red());
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonBundleReport<'a> {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    submitted: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    accepted: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a ValidationReport>,
    messages: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonRunReport<'a> {
    bundles: Vec<JsonBundleReport<'a>>,
    bundles_with_errors: usize,
    bundles_failed: usize,
    records_submitted: usize,
    records_accepted: usize,
    errors_reported: usize,
}

fn print_json_report(outcomes: &[BundleOutcome], summary: &RunSummary) -> Result<()> {
    let bundles = outcomes
        .iter()
        .map(|outcome| {
            let file = outcome.path.display().to_string();
            match &outcome.result {
                Ok(result) => JsonBundleReport {
                    file,
                    failure: None,
                    submitted: Some(result.stats.total_input),
                    accepted: Some(result.accepted_count()),
                    report: Some(&result.report),
                    messages: result.report.errors.iter().map(|e| e.to_string()).collect(),
                },
                Err(e) => JsonBundleReport {
                    file,
                    failure: Some(format!("{:#}", e)),
                    submitted: None,
                    accepted: None,
                    report: None,
                    messages: Vec::new(),
                },
            }
        })
        .collect();

    let report = JsonRunReport {
        bundles,
        bundles_with_errors: summary.bundles_with_errors,
        bundles_failed: summary.bundles_failed,
        records_submitted: summary.records_submitted,
        records_accepted: summary.records_accepted,
        errors_reported: summary.errors_reported,
    };

    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| Error::json("report", "Failed to serialize validation report", e))?;
    println!("{}", json);
    Ok(())
}
