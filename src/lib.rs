//! Tracker Processor Library
//!
//! A Rust library for preprocessing and validating tracker bundles (tracked
//! entities, enrollments, events and the relationships between them) against
//! a metadata cache that has been loaded before validation starts.
//!
//! This library provides tools for:
//! - Completing events with identifiers that can be derived from metadata
//!   (program from program stage, program stage from a program without
//!   registration, attribute option combo from attribute category options)
//! - Running an ordered chain of validation hooks over every record kind
//! - Accumulating typed, per-record errors and deciding which records are
//!   accepted and which are removed from the bundle
//! - Loading metadata snapshots and bundles from JSON for the CLI

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod category_options;
        pub mod metadata_cache;
        pub mod preprocessor;
        pub mod tracker_processor;
        pub mod validation;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::metadata::IdScheme;
pub use app::models::{Enrollment, Event, Relationship, TrackedEntity, TrackerBundle, TrackerType};
pub use app::services::metadata_cache::MetadataCache;
pub use app::services::tracker_processor::{ProcessingResult, ProcessingStats, TrackerProcessor};
pub use app::services::validation::{TrackerErrorCode, ValidationErrorReporter, ValidationReport};
pub use config::Config;

/// Result type alias for the tracker processor
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for tracker processing operations
///
/// These cover failures of the processor itself (I/O, malformed input,
/// configuration). Problems with individual records are never reported
/// through this type; they are collected by the
/// [`ValidationErrorReporter`].
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialisation failed
    #[error("JSON error in '{file}': {message}")]
    Json {
        file: String,
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Metadata snapshot is internally inconsistent
    #[error("Metadata snapshot error: {message}")]
    MetadataSnapshot { message: String },

    /// Bundle file or directory not found
    #[error("Bundle not found: {path}")]
    BundleNotFound { path: String },

    /// Directory traversal error
    #[error("Directory traversal error: {message}")]
    DirectoryTraversal {
        message: String,
        #[source]
        source: walkdir::Error,
    },

    /// Processing interrupted
    #[error("Processing interrupted: {reason}")]
    ProcessingInterrupted { reason: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a JSON error for the given file
    pub fn json(
        file: impl Into<String>,
        message: impl Into<String>,
        source: serde_json::Error,
    ) -> Self {
        Self::Json {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a metadata snapshot error
    pub fn metadata_snapshot(message: impl Into<String>) -> Self {
        Self::MetadataSnapshot {
            message: message.into(),
        }
    }

    /// Create a bundle not found error
    pub fn bundle_not_found(path: impl Into<String>) -> Self {
        Self::BundleNotFound { path: path.into() }
    }

    /// Create a directory traversal error
    pub fn directory_traversal(message: impl Into<String>, source: walkdir::Error) -> Self {
        Self::DirectoryTraversal {
            message: message.into(),
            source,
        }
    }

    /// Create a processing interrupted error
    pub fn processing_interrupted(reason: impl Into<String>) -> Self {
        Self::ProcessingInterrupted {
            reason: reason.into(),
        }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Json {
            file: "unknown".to_string(),
            message: "JSON parsing failed".to_string(),
            source: error,
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(error: walkdir::Error) -> Self {
        Self::DirectoryTraversal {
            message: "Directory traversal failed".to_string(),
            source: error,
        }
    }
}
