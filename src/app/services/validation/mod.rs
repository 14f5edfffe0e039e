//! Bundle validation
//!
//! Validation runs an ordered list of hooks over a preprocessed bundle.
//! Each hook reports typed errors against individual records through the
//! [`ValidationErrorReporter`]; records with errors are removed from the
//! bundle and listed in the [`ValidationReport`].

pub mod engine;
pub mod error_code;
pub mod hooks;
pub mod reporter;

#[cfg(test)]
pub mod tests;

pub use engine::{RejectedRecord, ValidationEngine, ValidationOutcome, ValidationReport};
pub use error_code::{ErrorKind, TrackerErrorCode};
pub use hooks::{ValidationContext, ValidationHook, default_hooks};
pub use reporter::{TrackerErrorReport, ValidationErrorReporter};
