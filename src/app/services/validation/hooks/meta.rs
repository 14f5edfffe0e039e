//! Checks that referenced metadata exists in the cache

use super::{ValidationContext, ValidationHook};
use crate::app::models::metadata::{OrganisationUnit, Program, ProgramStage, TrackedEntityType};
use crate::app::models::{Enrollment, Event, TrackedEntity, TrackerDto, non_blank};
use crate::app::services::metadata_cache::{CachedMetadata, MetadataCache};
use crate::app::services::validation::error_code::TrackerErrorCode;
use crate::app::services::validation::reporter::ValidationErrorReporter;

#[derive(Debug, Default, Clone, Copy)]
pub struct PreCheckMetaHook;

/// Report `error_code` when a present identifier does not resolve
///
/// Missing identifiers are left to the mandatory fields check.
fn require_metadata<T: CachedMetadata, D: TrackerDto>(
    reporter: &mut ValidationErrorReporter,
    cache: &MetadataCache,
    dto: &D,
    error_code: TrackerErrorCode,
    identifier: &Option<String>,
) {
    if let Some(id) = non_blank(identifier) {
        reporter.add_error_if(|| !cache.contains::<T>(id), dto, error_code, &[&id]);
    }
}

impl ValidationHook for PreCheckMetaHook {
    fn name(&self) -> &'static str {
        "PreCheckMeta"
    }

    fn validate_tracked_entity(
        &self,
        reporter: &mut ValidationErrorReporter,
        ctx: &ValidationContext<'_>,
        tracked_entity: &TrackedEntity,
    ) {
        require_metadata::<OrganisationUnit, _>(
            reporter,
            ctx.cache,
            tracked_entity,
            TrackerErrorCode::E1049,
            &tracked_entity.org_unit,
        );
        require_metadata::<TrackedEntityType, _>(
            reporter,
            ctx.cache,
            tracked_entity,
            TrackerErrorCode::E1005,
            &tracked_entity.tracked_entity_type,
        );
    }

    fn validate_enrollment(
        &self,
        reporter: &mut ValidationErrorReporter,
        ctx: &ValidationContext<'_>,
        enrollment: &Enrollment,
    ) {
        require_metadata::<Program, _>(
            reporter,
            ctx.cache,
            enrollment,
            TrackerErrorCode::E1069,
            &enrollment.program,
        );
        require_metadata::<OrganisationUnit, _>(
            reporter,
            ctx.cache,
            enrollment,
            TrackerErrorCode::E1070,
            &enrollment.org_unit,
        );
    }

    fn validate_event(
        &self,
        reporter: &mut ValidationErrorReporter,
        ctx: &ValidationContext<'_>,
        event: &Event,
    ) {
        require_metadata::<Program, _>(
            reporter,
            ctx.cache,
            event,
            TrackerErrorCode::E1010,
            &event.program,
        );
        require_metadata::<OrganisationUnit, _>(
            reporter,
            ctx.cache,
            event,
            TrackerErrorCode::E1011,
            &event.org_unit,
        );
        require_metadata::<ProgramStage, _>(
            reporter,
            ctx.cache,
            event,
            TrackerErrorCode::E1013,
            &event.program_stage,
        );
    }

    fn remove_on_error(&self) -> bool {
        true
    }

    fn skip_on_error(&self) -> bool {
        true
    }
}
