//! Shared components for CLI commands
//!
//! Logging setup, configuration loading, bundle discovery and the run
//! summary reported back to `main`.

use crate::app::models::TrackerBundle;
use crate::cli::args::ValidateArgs;
use crate::config::Config;
use crate::constants::{BUNDLE_FILE_EXTENSION, LOG_TARGET};
use crate::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Totals over every bundle handled by one command invocation
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub bundles_processed: usize,
    /// Bundles with at least one validation error
    pub bundles_with_errors: usize,
    /// Bundle files that could not be read or parsed
    pub bundles_failed: usize,
    pub records_submitted: usize,
    pub records_accepted: usize,
    pub errors_reported: usize,
    pub processing_time: Duration,
}

impl RunSummary {
    /// No bundle failed to load and no record was reported
    pub fn is_clean(&self) -> bool {
        self.bundles_with_errors == 0 && self.bundles_failed == 0
    }

    pub fn summary(&self) -> String {
        format!(
            "{} bundles ({} with errors, {} unreadable): {} -> {} records, {} errors in {:.2}s",
            self.bundles_processed,
            self.bundles_with_errors,
            self.bundles_failed,
            self.records_submitted,
            self.records_accepted,
            self.errors_reported,
            self.processing_time.as_secs_f64()
        )
    }
}

/// Set up structured logging for the validate command
pub fn setup_logging(args: &ValidateArgs) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}={}", LOG_TARGET, log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| Error::configuration(format!("Failed to initialise logging: {}", e)))?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Load configuration from file (if given) and apply CLI overrides
pub async fn load_configuration(args: &ValidateArgs) -> Result<Config> {
    let config = match &args.config_file {
        Some(path) => {
            info!("Using config file: {}", path.display());
            Config::load(path).await?
        }
        None => {
            info!("No config file given, using defaults");
            Config::default()
        }
    };

    let config = args.apply_overrides(config);
    config.validate()?;
    Ok(config)
}

/// Discover bundle files below `path`
///
/// A file is returned as is; a directory is walked recursively for files
/// with the bundle extension. Results are sorted for a stable report order.
pub fn discover_bundles(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(Error::bundle_not_found(path.display().to_string()));
    }

    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut bundles = Vec::new();
    for entry in WalkDir::new(path).follow_links(false) {
        let entry = entry.map_err(|e| {
            Error::directory_traversal(format!("Failed to walk {}", path.display()), e)
        })?;
        let file = entry.path();
        if file.is_file()
            && file.extension().and_then(|s| s.to_str()) == Some(BUNDLE_FILE_EXTENSION)
        {
            bundles.push(file.to_path_buf());
        }
    }

    bundles.sort();
    debug!(
        "Discovered {} bundle files in {}",
        bundles.len(),
        path.display()
    );
    Ok(bundles)
}

/// Read and parse one bundle file
pub async fn load_bundle(path: &Path) -> Result<TrackerBundle> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::io(format!("Failed to read bundle {}", path.display()), e))?;

    serde_json::from_str(&content)
        .map_err(|e| Error::json(path.display().to_string(), "Invalid tracker bundle", e))
}

/// Create a progress bar with appropriate styling
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_run_summary_is_clean() {
        let mut summary = RunSummary::default();
        assert!(summary.is_clean());

        summary.bundles_with_errors = 1;
        assert!(!summary.is_clean());
    }

    #[test]
    fn test_discover_bundles_single_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("bundle.json");
        fs::write(&file, "{}").unwrap();

        assert_eq!(discover_bundles(&file).unwrap(), vec![file]);
    }

    #[test]
    fn test_discover_bundles_walks_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("nested/a.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let bundles = discover_bundles(dir.path()).unwrap();

        assert_eq!(bundles.len(), 2);
        assert!(bundles.iter().all(|p| p.extension().unwrap() == "json"));
    }

    #[test]
    fn test_discover_bundles_missing_path() {
        let dir = TempDir::new().unwrap();
        let result = discover_bundles(&dir.path().join("missing"));
        assert!(matches!(result, Err(Error::BundleNotFound { .. })));
    }

    #[tokio::test]
    async fn test_load_bundle_reports_file_on_bad_json() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("broken.json");
        fs::write(&file, "{ not json").unwrap();

        let err = load_bundle(&file).await.unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[tokio::test]
    async fn test_load_bundle_defaults_missing_sections() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("events.json");
        fs::write(&file, r#"{ "events": [] }"#).unwrap();

        let bundle = load_bundle(&file).await.unwrap();
        assert!(bundle.is_empty());
    }
}
