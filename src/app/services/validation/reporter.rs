//! Collects record-level validation errors
//!
//! Hooks report every problem they find through a [`ValidationErrorReporter`].
//! A record with at least one error is marked invalid so later hooks can skip
//! it and the engine can remove it from the bundle.

use super::error_code::{ErrorKind, TrackerErrorCode};
use crate::app::models::{TrackerDto, TrackerType};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// One validation error tied to a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerErrorReport {
    pub error_code: TrackerErrorCode,
    pub tracker_type: TrackerType,
    pub uid: String,
    pub args: Vec<String>,
}

impl TrackerErrorReport {
    /// Human readable message; formatted on demand
    pub fn message(&self) -> String {
        self.error_code.format(&self.args)
    }

    pub fn kind(&self) -> ErrorKind {
        self.error_code.kind()
    }
}

impl fmt::Display for TrackerErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}",
            self.error_code,
            self.tracker_type,
            self.uid,
            self.message()
        )
    }
}

/// Accumulates errors and tracks which records became invalid
#[derive(Debug, Default)]
pub struct ValidationErrorReporter {
    reports: Vec<TrackerErrorReport>,
    invalid: HashMap<TrackerType, HashSet<String>>,
    fail_fast: bool,
}

impl ValidationErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reporter that asks validation to stop after the first error
    pub fn fail_fast() -> Self {
        Self {
            fail_fast: true,
            ..Self::default()
        }
    }

    /// Record an error against `dto` and mark it invalid
    pub fn add_error<D>(
        &mut self,
        dto: &D,
        error_code: TrackerErrorCode,
        args: &[&dyn fmt::Display],
    ) where
        D: TrackerDto + ?Sized,
    {
        let tracker_type = dto.tracker_type();
        let uid = dto.uid().to_string();

        self.invalid
            .entry(tracker_type)
            .or_default()
            .insert(uid.clone());
        self.reports.push(TrackerErrorReport {
            error_code,
            tracker_type,
            uid,
            args: args.iter().map(|arg| arg.to_string()).collect(),
        });
    }

    /// Record an error only when `condition` holds
    pub fn add_error_if<D, F>(
        &mut self,
        condition: F,
        dto: &D,
        error_code: TrackerErrorCode,
        args: &[&dyn fmt::Display],
    ) where
        D: TrackerDto + ?Sized,
        F: FnOnce() -> bool,
    {
        if condition() {
            self.add_error(dto, error_code, args);
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.reports.is_empty()
    }

    pub fn reports(&self) -> &[TrackerErrorReport] {
        &self.reports
    }

    pub fn into_reports(self) -> Vec<TrackerErrorReport> {
        self.reports
    }

    /// Whether the record has at least one error
    pub fn is_invalid(&self, tracker_type: TrackerType, uid: &str) -> bool {
        self.invalid
            .get(&tracker_type)
            .is_some_and(|uids| uids.contains(uid))
    }

    /// Whether `dto` has at least one error
    pub fn is_invalid_dto<D: TrackerDto + ?Sized>(&self, dto: &D) -> bool {
        self.is_invalid(dto.tracker_type(), dto.uid())
    }

    /// Number of invalid records of one kind
    pub fn invalid_count(&self, tracker_type: TrackerType) -> usize {
        self.invalid.get(&tracker_type).map_or(0, HashSet::len)
    }

    /// Fail-fast reporter that has seen an error
    pub fn should_stop(&self) -> bool {
        self.fail_fast && self.has_errors()
    }
}
