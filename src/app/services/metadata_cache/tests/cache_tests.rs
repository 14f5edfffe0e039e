//! Tests for metadata cache lookups, insertion and forward references

use crate::app::models::existing::{ExistingEnrollment, ExistingTrackedEntity};
use crate::app::models::metadata::{
    CategoryCombo, CategoryOption, CategoryOptionCombo, IdScheme, OrganisationUnit, Program,
};
use crate::app::models::{Enrollment, Event, TrackedEntity, TrackerBundle};
use crate::app::services::metadata_cache::MetadataCache;
use crate::config::IdSchemeConfig;
use std::collections::BTreeSet;
use std::sync::Arc;

fn partner_program() -> Arc<Program> {
    Program::builder("PRGevent001", Arc::new(CategoryCombo::new("CCpartner01", false)))
        .code("EVENT_PROGRAM")
        .without_registration()
        .stage("PSevent0001")
        .build()
}

#[test]
fn test_put_under_uid_and_get() {
    let mut cache = MetadataCache::default();
    cache.put(IdScheme::Uid, partner_program());

    assert!(cache.get::<Program>("PRGevent001").is_some());
    assert!(cache.get::<Program>("EVENT_PROGRAM").is_none());
    assert_eq!(cache.count::<Program>(), 1);
}

#[test]
fn test_put_without_identifier_in_scheme_is_skipped() {
    let mut cache = MetadataCache::default();
    cache.put(IdScheme::Name, partner_program());
    assert_eq!(cache.count::<Program>(), 0);
}

#[test]
fn test_insert_indexes_configured_scheme_and_uid() {
    let mut cache = MetadataCache::new(IdSchemeConfig::uniform(IdScheme::Code));
    cache.insert(partner_program());

    let by_code = cache.get::<Program>("EVENT_PROGRAM").unwrap();
    let by_uid = cache.get::<Program>("PRGevent001").unwrap();
    assert!(Arc::ptr_eq(by_code, by_uid));
    assert_eq!(cache.count::<Program>(), 1);
}

#[test]
fn test_put_same_object_twice_is_idempotent() {
    let mut cache = MetadataCache::default();
    let program = partner_program();
    cache.put(IdScheme::Uid, Arc::clone(&program));
    cache.put(IdScheme::Uid, program);
    assert_eq!(cache.count::<Program>(), 1);
}

#[test]
fn test_resolve_ignores_blank_identifiers() {
    let mut cache = MetadataCache::default();
    cache.insert(Arc::new(OrganisationUnit::new("OU000000001")));

    assert!(cache.resolve::<OrganisationUnit>(&Some("OU000000001".into())).is_some());
    assert!(cache.resolve::<OrganisationUnit>(&Some("  ".into())).is_none());
    assert!(cache.resolve::<OrganisationUnit>(&None).is_none());
}

#[test]
fn test_default_lookup() {
    let mut cache = MetadataCache::default();
    assert!(cache.get_default::<CategoryOptionCombo>().is_none());

    let default_cc = Arc::new(CategoryCombo::new("CCdefault01", true));
    let default_aoc = Arc::new(CategoryOptionCombo::new(
        "AOCdefault1",
        Arc::clone(&default_cc),
        vec![Arc::new(CategoryOption::new("COdefault01"))],
    ));
    cache.set_default(default_cc);
    cache.set_default(default_aoc);

    assert_eq!(
        cache.get_default::<CategoryOptionCombo>().unwrap().uid,
        "AOCdefault1"
    );
    assert!(cache.get_default::<CategoryCombo>().unwrap().is_default);
}

#[test]
fn test_cached_aoc_lookup_is_order_independent() {
    let mut cache = MetadataCache::default();
    let program = partner_program();
    let options: BTreeSet<String> = ["CO2", "CO1"].iter().map(|s| s.to_string()).collect();
    cache.cache_aoc_for_program_options(&program, options, "AOCpartner1");

    let lookup: BTreeSet<String> = ["CO1", "CO2"].iter().map(|s| s.to_string()).collect();
    assert_eq!(
        cache.cached_aoc_for_program_options(&program, &lookup),
        Some("AOCpartner1")
    );

    let other: BTreeSet<String> = ["CO1"].iter().map(|s| s.to_string()).collect();
    assert_eq!(cache.cached_aoc_for_program_options(&program, &other), None);
}

#[test]
fn test_program_org_unit_assignment() {
    let mut cache = MetadataCache::default();
    let program = partner_program();
    cache.add_program_org_units("PRGevent001", ["OU000000001"]);

    assert!(cache.program_has_org_unit(&program, &OrganisationUnit::new("OU000000001")));
    assert!(!cache.program_has_org_unit(&program, &OrganisationUnit::new("OU000000002")));
    assert_eq!(cache.program_org_units().len(), 1);
}

#[test]
fn test_register_references_skips_existing_records() {
    let mut cache = MetadataCache::default();
    cache.add_existing_tracked_entity(ExistingTrackedEntity {
        uid: "TEexisting1".into(),
        tracked_entity_type: "TETperson01".into(),
    });
    cache.add_existing_enrollment(ExistingEnrollment {
        uid: "ENexisting1".into(),
        program: "PRGtracker1".into(),
    });

    let bundle = TrackerBundle {
        tracked_entities: vec![
            TrackedEntity {
                tracked_entity: "TEexisting1".into(),
                ..Default::default()
            },
            TrackedEntity {
                tracked_entity: "TEnew000001".into(),
                ..Default::default()
            },
        ],
        enrollments: vec![Enrollment {
            enrollment: "ENnew000001".into(),
            tracked_entity: Some("TEnew000001".into()),
            ..Default::default()
        }],
        events: vec![Event {
            event: "EVnew000001".into(),
            enrollment: Some("ENexisting1".into()),
            ..Default::default()
        }],
        ..Default::default()
    };

    assert_eq!(cache.register_references(&bundle), 3);
    assert!(cache.reference("TEexisting1").is_none());
    assert_eq!(
        cache.reference("ENnew000001").unwrap().parent_uid.as_deref(),
        Some("TEnew000001")
    );
    assert_eq!(
        cache.reference("EVnew000001").unwrap().parent_uid.as_deref(),
        Some("ENexisting1")
    );

    assert!(cache.tracked_entity_exists("TEexisting1"));
    assert!(cache.tracked_entity_exists("TEnew000001"));
    assert!(cache.enrollment_exists("ENexisting1"));
    assert!(cache.event_exists("EVnew000001"));
    assert!(!cache.event_exists("EVmissing01"));
}

#[test]
fn test_clone_is_independent() {
    let mut cache = MetadataCache::default();
    let mut copy = cache.clone();
    copy.insert(partner_program());

    assert_eq!(copy.count::<Program>(), 1);
    assert_eq!(cache.count::<Program>(), 0);

    cache.insert(Arc::new(OrganisationUnit::new("OU000000001")));
    assert!(copy.get::<OrganisationUnit>("OU000000001").is_none());
}
