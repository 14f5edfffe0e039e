//! Checks that the reference fields every record needs are present

use super::{ValidationContext, ValidationHook};
use crate::app::models::{Enrollment, Event, Relationship, TrackedEntity, TrackerDto, non_blank};
use crate::app::services::validation::error_code::TrackerErrorCode;
use crate::app::services::validation::reporter::ValidationErrorReporter;
use crate::constants::fields;

#[derive(Debug, Default, Clone, Copy)]
pub struct PreCheckMandatoryFieldsHook;

fn require<D: TrackerDto>(
    reporter: &mut ValidationErrorReporter,
    dto: &D,
    error_code: TrackerErrorCode,
    field: &'static str,
    value: &Option<String>,
) {
    reporter.add_error_if(|| non_blank(value).is_none(), dto, error_code, &[&field]);
}

impl ValidationHook for PreCheckMandatoryFieldsHook {
    fn name(&self) -> &'static str {
        "PreCheckMandatoryFields"
    }

    fn validate_tracked_entity(
        &self,
        reporter: &mut ValidationErrorReporter,
        _ctx: &ValidationContext<'_>,
        tracked_entity: &TrackedEntity,
    ) {
        let code = TrackerErrorCode::E1121;
        require(
            reporter,
            tracked_entity,
            code,
            fields::TRACKED_ENTITY_TYPE,
            &tracked_entity.tracked_entity_type,
        );
        require(
            reporter,
            tracked_entity,
            code,
            fields::ORG_UNIT,
            &tracked_entity.org_unit,
        );
    }

    fn validate_enrollment(
        &self,
        reporter: &mut ValidationErrorReporter,
        _ctx: &ValidationContext<'_>,
        enrollment: &Enrollment,
    ) {
        let code = TrackerErrorCode::E1122;
        require(reporter, enrollment, code, fields::ORG_UNIT, &enrollment.org_unit);
        require(reporter, enrollment, code, fields::PROGRAM, &enrollment.program);
        require(
            reporter,
            enrollment,
            code,
            fields::TRACKED_ENTITY,
            &enrollment.tracked_entity,
        );
    }

    fn validate_event(
        &self,
        reporter: &mut ValidationErrorReporter,
        _ctx: &ValidationContext<'_>,
        event: &Event,
    ) {
        let code = TrackerErrorCode::E1123;
        require(reporter, event, code, fields::ORG_UNIT, &event.org_unit);
        require(reporter, event, code, fields::PROGRAM_STAGE, &event.program_stage);
        require(reporter, event, code, fields::PROGRAM, &event.program);
    }

    fn validate_relationship(
        &self,
        reporter: &mut ValidationErrorReporter,
        _ctx: &ValidationContext<'_>,
        relationship: &Relationship,
    ) {
        require(
            reporter,
            relationship,
            TrackerErrorCode::E1124,
            fields::RELATIONSHIP_TYPE,
            &relationship.relationship_type,
        );
    }

    fn remove_on_error(&self) -> bool {
        true
    }
}
