//! Bundle preprocessing
//!
//! Preprocessors complete records before validation by filling identifiers
//! the submitter left out, using only the metadata cache. They never reject
//! a record; incomplete records are left for validation to report.

pub mod event_program;

#[cfg(test)]
pub mod tests;

pub use event_program::EventProgramPreProcessor;

use crate::app::models::TrackerBundle;
use crate::app::services::metadata_cache::MetadataCache;
use std::fmt;

/// Counts of identifiers filled in by a preprocessing pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreProcessStats {
    /// Events whose program was taken from their program stage
    pub programs_filled: usize,
    /// Events whose program stage was taken from a program without registration
    pub program_stages_filled: usize,
    /// Events whose attribute option combo was taken from their category options
    pub attribute_option_combos_filled: usize,
    /// The pass stopped early on a program stage without a program
    pub aborted: bool,
}

impl PreProcessStats {
    pub fn total_filled(&self) -> usize {
        self.programs_filled + self.program_stages_filled + self.attribute_option_combos_filled
    }

    pub fn merge(&mut self, other: &PreProcessStats) {
        self.programs_filled += other.programs_filled;
        self.program_stages_filled += other.program_stages_filled;
        self.attribute_option_combos_filled += other.attribute_option_combos_filled;
        self.aborted |= other.aborted;
    }
}

/// A completion pass over a whole bundle
pub trait BundlePreProcessor: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Complete records of `bundle` in place
    ///
    /// May insert resolved metadata into `cache` so later records and
    /// validation find it under its uid.
    fn process(&self, bundle: &mut TrackerBundle, cache: &mut MetadataCache) -> PreProcessStats;
}

/// Preprocessors run by default, in order
pub fn default_preprocessors() -> Vec<Box<dyn BundlePreProcessor>> {
    vec![Box::new(EventProgramPreProcessor)]
}
