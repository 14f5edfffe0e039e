//! Checks that every record carries a well formed uid that no other record
//! of the same kind in the bundle uses

use super::{ValidationContext, ValidationHook};
use crate::app::models::{Enrollment, Event, Relationship, TrackedEntity, TrackerDto};
use crate::app::services::validation::error_code::TrackerErrorCode;
use crate::app::services::validation::reporter::ValidationErrorReporter;
use crate::constants::UID_PATTERN;
use regex::Regex;
use std::sync::LazyLock;

static UID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(UID_PATTERN).expect("UID pattern is a valid regex"));

/// Whether `uid` is eleven alphanumeric characters starting with a letter
pub fn is_valid_uid(uid: &str) -> bool {
    UID_REGEX.is_match(uid)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PreCheckUidFormatHook;

impl PreCheckUidFormatHook {
    fn check<D: TrackerDto>(
        reporter: &mut ValidationErrorReporter,
        ctx: &ValidationContext<'_>,
        dto: &D,
    ) {
        reporter.add_error_if(
            || !is_valid_uid(dto.uid()),
            dto,
            TrackerErrorCode::E1048,
            &[&dto.tracker_type(), &dto.uid()],
        );
        reporter.add_error_if(
            || ctx.bundle.occurrences(dto.tracker_type(), dto.uid()) > 1,
            dto,
            TrackerErrorCode::E1099,
            &[&dto.tracker_type(), &dto.uid()],
        );
    }
}

impl ValidationHook for PreCheckUidFormatHook {
    fn name(&self) -> &'static str {
        "PreCheckUidFormat"
    }

    fn validate_tracked_entity(
        &self,
        reporter: &mut ValidationErrorReporter,
        ctx: &ValidationContext<'_>,
        tracked_entity: &TrackedEntity,
    ) {
        Self::check(reporter, ctx, tracked_entity);
    }

    fn validate_enrollment(
        &self,
        reporter: &mut ValidationErrorReporter,
        ctx: &ValidationContext<'_>,
        enrollment: &Enrollment,
    ) {
        Self::check(reporter, ctx, enrollment);
    }

    fn validate_event(
        &self,
        reporter: &mut ValidationErrorReporter,
        ctx: &ValidationContext<'_>,
        event: &Event,
    ) {
        Self::check(reporter, ctx, event);
    }

    fn validate_relationship(
        &self,
        reporter: &mut ValidationErrorReporter,
        ctx: &ValidationContext<'_>,
        relationship: &Relationship,
    ) {
        Self::check(reporter, ctx, relationship);
    }

    fn remove_on_error(&self) -> bool {
        true
    }
}
