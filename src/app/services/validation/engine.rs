//! Runs validation hooks over a bundle and builds the validation report

use super::hooks::{ValidationContext, ValidationHook, default_hooks};
use super::reporter::{TrackerErrorReport, ValidationErrorReporter};
use crate::app::models::{TrackerBundle, TrackerDto, TrackerType};
use crate::app::services::metadata_cache::MetadataCache;
use crate::config::{AtomicMode, ValidationConfig, ValidationMode};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// A record that was dropped from the bundle
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedRecord {
    pub tracker_type: TrackerType,
    pub uid: String,
}

/// Outcome of validating one bundle
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub created_at: DateTime<Utc>,
    pub validation_mode: ValidationMode,
    pub atomic_mode: AtomicMode,
    pub errors: Vec<TrackerErrorReport>,
    pub rejected: Vec<RejectedRecord>,
    /// Every record was rejected (atomic mode or fail fast stop)
    pub bundle_rejected: bool,
}

impl ValidationReport {
    fn empty(config: &ValidationConfig) -> Self {
        Self {
            created_at: Utc::now(),
            validation_mode: config.validation_mode,
            atomic_mode: config.atomic_mode,
            errors: Vec::new(),
            rejected: Vec::new(),
            bundle_rejected: false,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Errors reported against one record
    pub fn errors_for<'a>(
        &'a self,
        tracker_type: TrackerType,
        uid: &'a str,
    ) -> impl Iterator<Item = &'a TrackerErrorReport> + 'a {
        self.errors
            .iter()
            .filter(move |e| e.tracker_type == tracker_type && e.uid == uid)
    }

    /// Number of rejected records of one kind
    pub fn rejected_count(&self, tracker_type: TrackerType) -> usize {
        self.rejected
            .iter()
            .filter(|r| r.tracker_type == tracker_type)
            .count()
    }
}

/// Bundle that passed validation together with the report
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub bundle: TrackerBundle,
    pub report: ValidationReport,
}

/// Ordered list of hooks plus the configured validation behaviour
#[derive(Debug)]
pub struct ValidationEngine {
    hooks: Vec<Box<dyn ValidationHook>>,
    config: ValidationConfig,
}

impl ValidationEngine {
    /// Engine running the default hooks
    pub fn new(config: ValidationConfig) -> Self {
        Self::with_hooks(config, default_hooks())
    }

    pub fn with_hooks(config: ValidationConfig, hooks: Vec<Box<dyn ValidationHook>>) -> Self {
        Self { hooks, config }
    }

    /// Names of the configured hooks, in run order
    pub fn hook_names(&self) -> Vec<&'static str> {
        self.hooks.iter().map(|hook| hook.name()).collect()
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate `bundle` against `cache`
    ///
    /// Invalid records are removed from the returned bundle. In atomic mode
    /// `All`, or when fail fast stopped validation, any error rejects every
    /// record.
    pub fn validate(&self, bundle: TrackerBundle, cache: &MetadataCache) -> ValidationOutcome {
        let mut report = ValidationReport::empty(&self.config);

        if self.config.validation_mode == ValidationMode::Skip {
            debug!("Validation skipped for bundle of {} records", bundle.len());
            return ValidationOutcome { bundle, report };
        }

        let submitted = record_ids(&bundle);
        let mut reporter = match self.config.validation_mode {
            ValidationMode::FailFast => ValidationErrorReporter::fail_fast(),
            _ => ValidationErrorReporter::new(),
        };
        let mut working = bundle;
        let mut stopped = false;

        for hook in &self.hooks {
            run_hook(hook.as_ref(), &mut reporter, &working, cache);

            if reporter.should_stop() {
                info!("Validation stopped by fail fast after {}", hook.name());
                stopped = true;
                break;
            }

            if hook.remove_on_error() {
                let removed = working.retain(|t, uid| !reporter.is_invalid(t, uid));
                if removed > 0 {
                    debug!("{} removed {} invalid records", hook.name(), removed);
                }
            }
        }

        let reject_all =
            stopped || (self.config.atomic_mode == AtomicMode::All && reporter.has_errors());
        if reject_all {
            warn!(
                "Rejecting all {} records of the bundle ({} errors)",
                submitted.len(),
                reporter.reports().len()
            );
            working.clear();
        } else {
            working.retain(|t, uid| !reporter.is_invalid(t, uid));
        }

        let accepted = record_ids(&working).into_iter().collect::<HashSet<_>>();
        report.rejected = submitted
            .into_iter()
            .filter(|record| !accepted.contains(record))
            .collect();
        report.bundle_rejected = reject_all;
        report.errors = reporter.into_reports();

        ValidationOutcome {
            bundle: working,
            report,
        }
    }
}

/// Run one hook over every record kind in validation order
fn run_hook(
    hook: &dyn ValidationHook,
    reporter: &mut ValidationErrorReporter,
    bundle: &TrackerBundle,
    cache: &MetadataCache,
) {
    let ctx = ValidationContext::new(bundle, cache);

    for tracked_entity in &bundle.tracked_entities {
        if !skipped(hook, reporter, tracked_entity) {
            hook.validate_tracked_entity(reporter, &ctx, tracked_entity);
        }
        if reporter.should_stop() {
            return;
        }
    }
    for enrollment in &bundle.enrollments {
        if !skipped(hook, reporter, enrollment) {
            hook.validate_enrollment(reporter, &ctx, enrollment);
        }
        if reporter.should_stop() {
            return;
        }
    }
    for event in &bundle.events {
        if !skipped(hook, reporter, event) {
            hook.validate_event(reporter, &ctx, event);
        }
        if reporter.should_stop() {
            return;
        }
    }
    for relationship in &bundle.relationships {
        if !skipped(hook, reporter, relationship) {
            hook.validate_relationship(reporter, &ctx, relationship);
        }
        if reporter.should_stop() {
            return;
        }
    }
}

fn skipped(
    hook: &dyn ValidationHook,
    reporter: &ValidationErrorReporter,
    dto: &dyn TrackerDto,
) -> bool {
    hook.skip_on_error() && reporter.is_invalid_dto(dto)
}

fn record_ids(bundle: &TrackerBundle) -> Vec<RejectedRecord> {
    fn id(dto: &dyn TrackerDto) -> RejectedRecord {
        RejectedRecord {
            tracker_type: dto.tracker_type(),
            uid: dto.uid().to_string(),
        }
    }

    bundle
        .tracked_entities
        .iter()
        .map(|r| id(r))
        .chain(bundle.enrollments.iter().map(|r| id(r)))
        .chain(bundle.events.iter().map(|r| id(r)))
        .chain(bundle.relationships.iter().map(|r| id(r)))
        .collect()
}
