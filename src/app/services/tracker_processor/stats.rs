//! Processing statistics and result structures for the tracker pipeline
//!
//! This module provides types for tracking what preprocessing filled in, how
//! many records validation rejected and the final accepted bundle.

use crate::app::models::{TrackerBundle, TrackerType};
use crate::app::services::preprocessor::PreProcessStats;
use crate::app::services::validation::ValidationReport;
use std::time::Duration;

/// Statistics for one bundle run through the pipeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessingStats {
    /// Number of submitted records
    pub total_input: usize,
    /// Forward references registered for records of the submission
    pub references_registered: usize,
    /// Identifiers filled in by preprocessing
    pub preprocess: PreProcessStats,
    /// Number of validation errors
    pub errors: usize,
    /// Number of records removed by validation
    pub rejected: usize,
    /// Number of accepted records
    pub final_output: usize,
    pub processing_time: Duration,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepted records as a percentage of submitted records
    pub fn acceptance_rate(&self) -> f64 {
        if self.total_input == 0 {
            100.0
        } else {
            (self.final_output as f64 / self.total_input as f64) * 100.0
        }
    }

    /// Every submitted record was accepted
    pub fn is_successful(&self) -> bool {
        self.rejected == 0 && self.errors == 0
    }

    /// Get summary of processing statistics
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Processing Summary: {} -> {} records ({:.1}% accepted) | \
             Filled: {} programs, {} stages, {} attribute option combos | \
             Errors: {} | Rejected: {}",
            self.total_input,
            self.final_output,
            self.acceptance_rate(),
            self.preprocess.programs_filled,
            self.preprocess.program_stages_filled,
            self.preprocess.attribute_option_combos_filled,
            self.errors,
            self.rejected
        );
        if self.preprocess.aborted {
            summary.push_str(" | Preprocessing aborted on inconsistent metadata");
        }
        summary
    }
}

/// Result of processing one bundle
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// Records that passed validation
    pub bundle: TrackerBundle,
    pub report: ValidationReport,
    pub stats: ProcessingStats,
}

impl ProcessingResult {
    pub fn new(bundle: TrackerBundle, report: ValidationReport, stats: ProcessingStats) -> Self {
        Self {
            bundle,
            report,
            stats,
        }
    }

    /// Number of accepted records
    pub fn accepted_count(&self) -> usize {
        self.bundle.len()
    }

    /// Number of accepted records of one kind
    pub fn accepted(&self, tracker_type: TrackerType) -> usize {
        self.bundle.count(tracker_type)
    }

    pub fn has_errors(&self) -> bool {
        self.report.has_errors()
    }

    pub fn is_successful(&self) -> bool {
        self.stats.is_successful()
    }

    /// Get summary string for logging
    pub fn summary(&self) -> String {
        self.stats.summary()
    }
}
