//! Tests for bundle validation


use crate::app::models::existing::{ExistingEnrollment, ExistingEvent, ExistingTrackedEntity};
use crate::app::models::metadata::{
    CategoryCombo, CategoryOption, CategoryOptionCombo, OrganisationUnit, Program,
    TrackedEntityType,
};
use crate::app::models::{
    Enrollment, Event, Relationship, RelationshipItem, TrackedEntity, TrackerBundle,
};
use crate::app::services::metadata_cache::MetadataCache;
use crate::app::services::validation::hooks::{ValidationContext, ValidationHook};
use crate::app::services::validation::reporter::ValidationErrorReporter;
use crate::config::IdSchemeConfig;
use std::sync::Arc;

pub const ORG_UNIT: &str = "OU000000001";
pub const UNASSIGNED_ORG_UNIT: &str = "OU000000002";
pub const EVENT_PROGRAM: &str = "PRGevent001";
pub const EVENT_STAGE: &str = "PSevent0001";
pub const DEFAULT_EVENT_PROGRAM: &str = "PRGdefault1";
pub const DEFAULT_EVENT_STAGE: &str = "PSdefault01";
pub const TRACKER_PROGRAM: &str = "PRGtracker1";
pub const TRACKER_STAGE: &str = "PStracker01";
pub const OTHER_TRACKER_PROGRAM: &str = "PRGtracker2";
pub const OTHER_TRACKER_STAGE: &str = "PStracker21";
pub const PERSON_TYPE: &str = "TETperson01";
pub const OTHER_TYPE: &str = "TETother001";
pub const PARTNER_AOC: &str = "AOCpartner1";
pub const EXISTING_TRACKED_ENTITY: &str = "TEexisting1";
pub const EXISTING_ENROLLMENT: &str = "ENexisting1";
pub const EXISTING_EVENT: &str = "EVexisting1";

/// Cache with event and tracker programs, category combos and existing records
///
/// - `PRGevent001`: without registration, non-default combo `CCpartner01`
/// - `PRGdefault1`: without registration, default combo
/// - `PRGtracker1`: with registration for `TETperson01`, default combo
/// - `PRGtracker2`: with registration, no tracked entity type
/// - every program is assigned to `OU000000001` only
pub fn create_test_cache() -> MetadataCache {
    let mut cache = MetadataCache::new(IdSchemeConfig::default());

    let cc_default = Arc::new(CategoryCombo::new("CCdefault01", true));
    let cc_partner = Arc::new(CategoryCombo::new("CCpartner01", false));
    let cc_other = Arc::new(CategoryCombo::new("CCother0001", false));
    cache.set_default(Arc::clone(&cc_default));
    cache.insert(Arc::clone(&cc_partner));
    cache.insert(Arc::clone(&cc_other));

    let co_default = Arc::new(CategoryOption::new("COdefault01"));
    let co_a = Arc::new(CategoryOption::new("CO000000001").with_code("PARTNER_A"));
    let co_b = Arc::new(CategoryOption::new("CO000000002").with_code("PARTNER_B"));
    for option in [&co_default, &co_a, &co_b] {
        cache.insert(Arc::clone(option));
    }

    cache.set_default(Arc::new(CategoryOptionCombo::new(
        "AOCdefault1",
        Arc::clone(&cc_default),
        vec![Arc::clone(&co_default)],
    )));
    cache.insert(Arc::new(CategoryOptionCombo::new(
        PARTNER_AOC,
        Arc::clone(&cc_partner),
        vec![Arc::clone(&co_a), Arc::clone(&co_b)],
    )));
    cache.insert(Arc::new(CategoryOptionCombo::new(
        "AOCother001",
        Arc::clone(&cc_other),
        vec![Arc::clone(&co_a)],
    )));

    let person = Arc::new(TrackedEntityType::new(PERSON_TYPE));
    cache.insert(Arc::clone(&person));
    cache.insert(Arc::new(TrackedEntityType::new(OTHER_TYPE)));

    cache.insert(Arc::new(OrganisationUnit::new(ORG_UNIT)));
    cache.insert(Arc::new(OrganisationUnit::new(UNASSIGNED_ORG_UNIT)));

    let programs = [
        Program::builder(EVENT_PROGRAM, Arc::clone(&cc_partner))
            .without_registration()
            .stage(EVENT_STAGE)
            .build(),
        Program::builder(DEFAULT_EVENT_PROGRAM, Arc::clone(&cc_default))
            .without_registration()
            .stage(DEFAULT_EVENT_STAGE)
            .build(),
        Program::builder(TRACKER_PROGRAM, Arc::clone(&cc_default))
            .tracked_entity_type(person)
            .stage(TRACKER_STAGE)
            .build(),
        Program::builder(OTHER_TRACKER_PROGRAM, Arc::clone(&cc_default))
            .stage(OTHER_TRACKER_STAGE)
            .build(),
    ];
    for program in programs {
        for stage in &program.program_stages {
            cache.insert(Arc::clone(stage));
        }
        cache.add_program_org_units(program.uid.clone(), [ORG_UNIT]);
        cache.insert(program);
    }

    cache.add_existing_tracked_entity(ExistingTrackedEntity {
        uid: EXISTING_TRACKED_ENTITY.to_string(),
        tracked_entity_type: PERSON_TYPE.to_string(),
    });
    cache.add_existing_enrollment(ExistingEnrollment {
        uid: EXISTING_ENROLLMENT.to_string(),
        program: TRACKER_PROGRAM.to_string(),
    });
    cache.add_existing_event(ExistingEvent {
        uid: EXISTING_EVENT.to_string(),
    });

    cache
}

pub fn some(value: &str) -> Option<String> {
    Some(value.to_string())
}

pub fn tracked_entity(uid: &str, tracked_entity_type: &str) -> TrackedEntity {
    TrackedEntity {
        tracked_entity: uid.to_string(),
        tracked_entity_type: some(tracked_entity_type),
        org_unit: some(ORG_UNIT),
    }
}

pub fn enrollment(uid: &str, program: &str, tracked_entity: &str) -> Enrollment {
    Enrollment {
        enrollment: uid.to_string(),
        program: some(program),
        org_unit: some(ORG_UNIT),
        tracked_entity: some(tracked_entity),
    }
}

/// Valid event of the non-default event program
pub fn partner_event(uid: &str) -> Event {
    Event {
        event: uid.to_string(),
        program: some(EVENT_PROGRAM),
        program_stage: some(EVENT_STAGE),
        org_unit: some(ORG_UNIT),
        attribute_option_combo: some(PARTNER_AOC),
        ..Default::default()
    }
}

/// Event of a registration program
pub fn tracker_event(uid: &str, enrollment: Option<&str>) -> Event {
    Event {
        event: uid.to_string(),
        program: some(TRACKER_PROGRAM),
        program_stage: some(TRACKER_STAGE),
        org_unit: some(ORG_UNIT),
        enrollment: enrollment.map(str::to_string),
        ..Default::default()
    }
}

pub fn relationship(uid: &str, from: RelationshipItem, to: RelationshipItem) -> Relationship {
    Relationship {
        relationship: uid.to_string(),
        relationship_type: some("RTYfriend01"),
        from,
        to,
    }
}

/// Run one hook over every record of `bundle`
pub fn run_hook(
    hook: &dyn ValidationHook,
    bundle: &TrackerBundle,
    cache: &MetadataCache,
) -> ValidationErrorReporter {
    let mut reporter = ValidationErrorReporter::new();
    let ctx = ValidationContext::new(bundle, cache);

    for te in &bundle.tracked_entities {
        hook.validate_tracked_entity(&mut reporter, &ctx, te);
    }
    for en in &bundle.enrollments {
        hook.validate_enrollment(&mut reporter, &ctx, en);
    }
    for ev in &bundle.events {
        hook.validate_event(&mut reporter, &ctx, ev);
    }
    for rel in &bundle.relationships {
        hook.validate_relationship(&mut reporter, &ctx, rel);
    }
    reporter
}
