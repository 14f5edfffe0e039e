//! Tracker processing pipeline
//!
//! This module ties the pipeline together for one submitted bundle:
//!
//! 1. **Reference registration**: every new record of the bundle becomes a
//!    forward reference in the cache so siblings can point at it
//! 2. **Preprocessing**: omitted program, program stage and attribute option
//!    combo identifiers are filled in from metadata
//! 3. **Validation**: the hook chain reports errors and rejected records are
//!    removed
//!
//! - [`processor`] - Main TrackerProcessor struct and pipeline orchestration
//! - [`stats`] - Processing statistics and result structures

pub mod processor;
pub mod stats;

#[cfg(test)]
pub mod tests;

pub use processor::TrackerProcessor;
pub use stats::{ProcessingResult, ProcessingStats};
