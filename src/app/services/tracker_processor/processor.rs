//! Main tracker processor implementation and pipeline orchestration
//!
//! Runs one bundle through forward reference registration, preprocessing and
//! validation against a metadata cache owned by the caller.

use super::stats::{ProcessingResult, ProcessingStats};
use crate::Result;
use crate::app::models::TrackerBundle;
use crate::app::services::metadata_cache::MetadataCache;
use crate::app::services::preprocessor::{BundlePreProcessor, default_preprocessors};
use crate::app::services::validation::{ValidationEngine, ValidationHook, default_hooks};
use crate::config::Config;
use std::time::Instant;
use tracing::{debug, info};

/// Tracker bundle processor
///
/// Processing one bundle is synchronous and mutates the cache it is given
/// (forward references and metadata resolved by preprocessing). Bundles that
/// are processed concurrently must each use their own cache, typically a
/// clone of one loaded cache.
///
/// # Example
///
/// ```rust
/// use tracker_processor::{Config, MetadataCache, TrackerBundle, TrackerProcessor};
///
/// # fn example(bundle: TrackerBundle, mut cache: MetadataCache) -> tracker_processor::Result<()> {
/// let processor = TrackerProcessor::new(Config::default())?;
/// let result = processor.process(bundle, &mut cache);
///
/// println!("{}", result.summary());
/// for error in &result.report.errors {
///     println!("{}", error);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TrackerProcessor {
    config: Config,
    preprocessors: Vec<Box<dyn BundlePreProcessor>>,
    engine: ValidationEngine,
}

impl TrackerProcessor {
    /// Create a processor with the default preprocessors and validation hooks
    ///
    /// # Errors
    /// Returns `Error::Configuration` if the configuration is invalid
    pub fn new(config: Config) -> Result<Self> {
        Self::with_components(config, default_preprocessors(), default_hooks())
    }

    /// Create a processor with custom preprocessors and validation hooks
    pub fn with_components(
        config: Config,
        preprocessors: Vec<Box<dyn BundlePreProcessor>>,
        hooks: Vec<Box<dyn ValidationHook>>,
    ) -> Result<Self> {
        config.validate()?;
        let engine = ValidationEngine::with_hooks(config.validation.clone(), hooks);
        Ok(Self {
            config,
            preprocessors,
            engine,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &ValidationEngine {
        &self.engine
    }

    /// Process one bundle
    ///
    /// 1. Register forward references for every new record of the bundle
    /// 2. Run the preprocessors in order
    /// 3. Validate and drop rejected records
    pub fn process(
        &self,
        mut bundle: TrackerBundle,
        cache: &mut MetadataCache,
    ) -> ProcessingResult {
        let start_time = Instant::now();
        let mut stats = ProcessingStats::new();
        stats.total_input = bundle.len();

        info!("Processing tracker bundle of {} records", bundle.len());

        stats.references_registered = cache.register_references(&bundle);

        for preprocessor in &self.preprocessors {
            let filled = preprocessor.process(&mut bundle, cache);
            debug!(
                "{} filled {} identifiers",
                preprocessor.name(),
                filled.total_filled()
            );
            stats.preprocess.merge(&filled);
        }

        let outcome = self.engine.validate(bundle, cache);

        stats.errors = outcome.report.error_count();
        stats.rejected = outcome.report.rejected.len();
        stats.final_output = outcome.bundle.len();
        stats.processing_time = start_time.elapsed();

        info!(
            "Bundle processing complete: {} -> {} records ({} errors)",
            stats.total_input, stats.final_output, stats.errors
        );

        ProcessingResult::new(outcome.bundle, outcome.report, stats)
    }
}
