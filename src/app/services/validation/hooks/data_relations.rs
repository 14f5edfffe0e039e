//! Cross-entity consistency checks
//!
//! Verifies that the metadata and records an enrollment, event or
//! relationship points at agree with each other: the program accepts the
//! org unit, the stage belongs to the program, the event's enrollment is in
//! the same program, and the attribute option combo fits the program's
//! category combo and the given category options.
//!
//! Rules whose metadata does not resolve are skipped; the meta check reports
//! those references.

use super::{ValidationContext, ValidationHook};
use crate::app::models::metadata::{
    CategoryOption, CategoryOptionCombo, OrganisationUnit, Program, ProgramStage,
    TrackedEntityType,
};
use crate::app::models::{
    Enrollment, Event, Relationship, RelationshipItem, TrackerType, non_blank,
};
use crate::app::services::category_options::{option_set_matches, parse_option_ids};
use crate::app::services::validation::error_code::TrackerErrorCode;
use crate::app::services::validation::reporter::ValidationErrorReporter;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
pub struct PreCheckDataRelationsHook;

impl ValidationHook for PreCheckDataRelationsHook {
    fn name(&self) -> &'static str {
        "PreCheckDataRelations"
    }

    fn validate_enrollment(
        &self,
        reporter: &mut ValidationErrorReporter,
        ctx: &ValidationContext<'_>,
        enrollment: &Enrollment,
    ) {
        let Some(program) = ctx.cache.resolve::<Program>(&enrollment.program) else {
            debug!(
                "Enrollment {}: program does not resolve, skipping data relations",
                enrollment.enrollment
            );
            return;
        };

        reporter.add_error_if(
            || !program.is_registration(),
            enrollment,
            TrackerErrorCode::E1014,
            &[&program.uid],
        );

        if let Some(org_unit) = ctx.cache.resolve::<OrganisationUnit>(&enrollment.org_unit) {
            if !ctx.cache.program_has_org_unit(program, org_unit) {
                reporter.add_error(
                    enrollment,
                    TrackerErrorCode::E1041,
                    &[&org_unit.uid, &program.uid],
                );
            }
        }

        if let Some(tracked_entity_type) = &program.tracked_entity_type {
            let enrolled_type = tracked_entity_type_of_enrollment(ctx, enrollment);
            if enrolled_type.as_deref() != Some(tracked_entity_type.uid.as_str()) {
                reporter.add_error(
                    enrollment,
                    TrackerErrorCode::E1022,
                    &[
                        &non_blank(&enrollment.tracked_entity).unwrap_or_default(),
                        &program.uid,
                    ],
                );
            }
        }
    }

    fn validate_event(
        &self,
        reporter: &mut ValidationErrorReporter,
        ctx: &ValidationContext<'_>,
        event: &Event,
    ) {
        let Some(program) = ctx.cache.resolve::<Program>(&event.program) else {
            debug!(
                "Event {}: program does not resolve, skipping data relations",
                event.event
            );
            return;
        };

        if let Some(program_stage) = ctx.cache.resolve::<ProgramStage>(&event.program_stage) {
            validate_program_stage_in_program(reporter, event, program_stage, program);
        }
        validate_registration_program(reporter, ctx, event, program);
        if let Some(org_unit) = ctx.cache.resolve::<OrganisationUnit>(&event.org_unit) {
            if !ctx.cache.program_has_org_unit(program, org_unit) {
                reporter.add_error(
                    event,
                    TrackerErrorCode::E1029,
                    &[&org_unit.uid, &program.uid],
                );
            }
        }
        validate_event_category_option_combo(reporter, ctx, event, program);
    }

    fn validate_relationship(
        &self,
        reporter: &mut ValidationErrorReporter,
        ctx: &ValidationContext<'_>,
        relationship: &Relationship,
    ) {
        validate_relationship_reference(reporter, ctx, relationship, &relationship.from);
        validate_relationship_reference(reporter, ctx, relationship, &relationship.to);
    }

    fn remove_on_error(&self) -> bool {
        true
    }

    fn skip_on_error(&self) -> bool {
        true
    }
}

// =============================================================================
// Enrollment and Event Linkage
// =============================================================================

/// Uid of the tracked entity type of the enrolled tracked entity
///
/// Looked up among persisted tracked entities first, then among the
/// referenced tracked entities of this submission.
fn tracked_entity_type_of_enrollment(
    ctx: &ValidationContext<'_>,
    enrollment: &Enrollment,
) -> Option<String> {
    let uid = non_blank(&enrollment.tracked_entity)?;

    if let Some(existing) = ctx.cache.existing_tracked_entity(uid) {
        return Some(existing.tracked_entity_type.clone());
    }
    ctx.cache.reference(uid)?;
    let tracked_entity = ctx.bundle.tracked_entity(uid)?;
    let type_id = non_blank(&tracked_entity.tracked_entity_type)?;
    Some(
        ctx.cache
            .get::<TrackedEntityType>(type_id)
            .map_or_else(|| type_id.to_string(), |tet| tet.uid.clone()),
    )
}

/// Uid of the program of the enrollment an event belongs to
fn program_of_event_enrollment(ctx: &ValidationContext<'_>, event: &Event) -> Option<String> {
    let uid = non_blank(&event.enrollment)?;

    if let Some(existing) = ctx.cache.existing_enrollment(uid) {
        return Some(existing.program.clone());
    }
    ctx.cache.reference(uid)?;
    let enrollment = ctx.bundle.enrollment(uid)?;
    let program_id = non_blank(&enrollment.program)?;
    Some(
        ctx.cache
            .get::<Program>(program_id)
            .map_or_else(|| program_id.to_string(), |program| program.uid.clone()),
    )
}

fn validate_program_stage_in_program(
    reporter: &mut ValidationErrorReporter,
    event: &Event,
    program_stage: &ProgramStage,
    program: &Program,
) {
    let belongs = program_stage
        .program()
        .is_some_and(|owner| owner.uid == program.uid);
    if !belongs {
        reporter.add_error(
            event,
            TrackerErrorCode::E1089,
            &[&event.event, &program_stage.uid, &program.uid],
        );
    }
}

fn validate_registration_program(
    reporter: &mut ValidationErrorReporter,
    ctx: &ValidationContext<'_>,
    event: &Event,
    program: &Program,
) {
    if !program.is_registration() {
        return;
    }

    let Some(enrollment) = non_blank(&event.enrollment) else {
        reporter.add_error(event, TrackerErrorCode::E1033, &[&event.event]);
        return;
    };

    let enrollment_program = program_of_event_enrollment(ctx, event);
    if enrollment_program.as_deref() != Some(program.uid.as_str()) {
        reporter.add_error(
            event,
            TrackerErrorCode::E1079,
            &[&event.event, &program.uid, &enrollment],
        );
    }
}

// =============================================================================
// Attribute Option Combo
// =============================================================================

fn has_attribute_option_combo(event: &Event) -> bool {
    non_blank(&event.attribute_option_combo).is_some()
}

fn has_attribute_category_options(event: &Event) -> bool {
    non_blank(&event.attribute_category_options).is_some()
}

fn validate_event_category_option_combo(
    reporter: &mut ValidationErrorReporter,
    ctx: &ValidationContext<'_>,
    event: &Event,
    program: &Program,
) {
    // Existence and default-combo checks all report before bailing out
    let mut is_valid = validate_attribute_option_combo_exists(reporter, ctx, event);
    is_valid = validate_category_options_exist(reporter, ctx, event) && is_valid;
    is_valid = validate_default_program_category_combo(reporter, ctx, event, program) && is_valid;
    if !is_valid {
        return;
    }

    let Some(aoc) = resolve_attribute_option_combo(ctx, event, program) else {
        add_aoc_and_options_combination_error(reporter, event, program);
        return;
    };
    if !validate_attribute_option_combo_in_program_category_combo(reporter, ctx, event, program) {
        return;
    }
    validate_attribute_option_combo_matches_options(reporter, ctx, event, program, aoc);
}

fn validate_attribute_option_combo_exists(
    reporter: &mut ValidationErrorReporter,
    ctx: &ValidationContext<'_>,
    event: &Event,
) -> bool {
    let Some(aoc_id) = non_blank(&event.attribute_option_combo) else {
        return true;
    };
    if ctx.cache.contains::<CategoryOptionCombo>(aoc_id) {
        return true;
    }
    reporter.add_error(event, TrackerErrorCode::E1115, &[&aoc_id]);
    false
}

fn validate_category_options_exist(
    reporter: &mut ValidationErrorReporter,
    ctx: &ValidationContext<'_>,
    event: &Event,
) -> bool {
    let mut all_exist = true;
    for id in parse_option_ids(event.attribute_category_options.as_deref()) {
        if !ctx.cache.contains::<CategoryOption>(&id) {
            reporter.add_error(event, TrackerErrorCode::E1116, &[&id]);
            all_exist = false;
        }
    }
    all_exist
}

/// A program with a non-default category combo needs an explicit, non-default
/// attribute option combo or category options
fn validate_default_program_category_combo(
    reporter: &mut ValidationErrorReporter,
    ctx: &ValidationContext<'_>,
    event: &Event,
    program: &Program,
) -> bool {
    if program.category_combo.is_default {
        return true;
    }

    if !has_attribute_option_combo(event) && !has_attribute_category_options(event) {
        reporter.add_error(event, TrackerErrorCode::E1055, &[]);
        return false;
    }

    let default_aoc_given = ctx
        .cache
        .resolve::<CategoryOptionCombo>(&event.attribute_option_combo)
        .is_some_and(|aoc| aoc.category_combo.is_default);
    if default_aoc_given {
        reporter.add_error(event, TrackerErrorCode::E1055, &[]);
        return false;
    }

    true
}

/// Attribute option combo the event is recorded against
///
/// Events without one in a program with the default category combo use the
/// default attribute option combo.
fn resolve_attribute_option_combo<'a>(
    ctx: &ValidationContext<'a>,
    event: &Event,
    program: &Program,
) -> Option<&'a Arc<CategoryOptionCombo>> {
    if !has_attribute_option_combo(event) && program.category_combo.is_default {
        ctx.cache.get_default::<CategoryOptionCombo>()
    } else {
        ctx.cache
            .resolve::<CategoryOptionCombo>(&event.attribute_option_combo)
    }
}

fn validate_attribute_option_combo_in_program_category_combo(
    reporter: &mut ValidationErrorReporter,
    ctx: &ValidationContext<'_>,
    event: &Event,
    program: &Program,
) -> bool {
    let Some(aoc) = ctx
        .cache
        .resolve::<CategoryOptionCombo>(&event.attribute_option_combo)
    else {
        return true;
    };

    if aoc.category_combo.uid != program.category_combo.uid {
        reporter.add_error(
            event,
            TrackerErrorCode::E1054,
            &[
                &non_blank(&event.attribute_option_combo).unwrap_or_default(),
                &program.category_combo.uid,
            ],
        );
        return false;
    }
    true
}

fn validate_attribute_option_combo_matches_options(
    reporter: &mut ValidationErrorReporter,
    ctx: &ValidationContext<'_>,
    event: &Event,
    program: &Program,
    aoc: &CategoryOptionCombo,
) {
    if !has_attribute_category_options(event) {
        return;
    }

    let option_uids: BTreeSet<String> =
        parse_option_ids(event.attribute_category_options.as_deref())
            .iter()
            .filter_map(|id| ctx.cache.get::<CategoryOption>(id))
            .map(|option| option.uid.clone())
            .collect();

    if !option_set_matches(aoc, &option_uids) {
        add_aoc_and_options_combination_error(reporter, event, program);
    }
}

/// The program's category combo stands in for the attribute option combo
/// when the event did not name one
fn add_aoc_and_options_combination_error(
    reporter: &mut ValidationErrorReporter,
    event: &Event,
    program: &Program,
) {
    let options = event
        .attribute_category_options
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();

    match non_blank(&event.attribute_option_combo) {
        Some(aoc_id) => {
            reporter.add_error(event, TrackerErrorCode::E1117, &[&aoc_id, &options])
        }
        None => reporter.add_error(
            event,
            TrackerErrorCode::E1117,
            &[&program.category_combo.uid, &options],
        ),
    }
}

// =============================================================================
// Relationships
// =============================================================================

fn validate_relationship_reference(
    reporter: &mut ValidationErrorReporter,
    ctx: &ValidationContext<'_>,
    relationship: &Relationship,
    item: &RelationshipItem,
) {
    let Some(uid) = item.uid() else {
        return;
    };

    let tracker_type = item.tracker_type();
    let exists = match tracker_type {
        TrackerType::TrackedEntity => ctx.cache.tracked_entity_exists(uid),
        TrackerType::Enrollment => ctx.cache.enrollment_exists(uid),
        TrackerType::Event => ctx.cache.event_exists(uid),
        TrackerType::Relationship => true,
    };

    if !exists {
        reporter.add_error(
            relationship,
            TrackerErrorCode::E4012,
            &[&tracker_type.name(), &uid],
        );
    }
}
