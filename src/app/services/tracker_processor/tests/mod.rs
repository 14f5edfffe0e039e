//! Tests for the tracker processing pipeline


use crate::app::models::{Enrollment, Event, TrackedEntity};
use crate::app::services::metadata_cache::MetadataCache;
use crate::app::services::metadata_cache::tests::create_test_snapshot;
use crate::config::IdSchemeConfig;

/// Cache loaded from the shared snapshot, with the tracker program assigned
/// to the clinic org unit as well
pub fn create_test_cache() -> MetadataCache {
    let (mut cache, _) =
        MetadataCache::from_snapshot(create_test_snapshot(), IdSchemeConfig::default())
            .expect("test snapshot links cleanly");
    cache.add_program_org_units("PRGtracker1", ["OU000000001"]);
    cache
}

pub fn create_test_event(uid: &str) -> Event {
    Event {
        event: uid.to_string(),
        org_unit: Some("OU000000001".to_string()),
        ..Default::default()
    }
}

pub fn create_test_tracked_entity(uid: &str) -> TrackedEntity {
    TrackedEntity {
        tracked_entity: uid.to_string(),
        tracked_entity_type: Some("TETperson01".to_string()),
        org_unit: Some("OU000000001".to_string()),
    }
}

pub fn create_test_enrollment(uid: &str, tracked_entity: &str) -> Enrollment {
    Enrollment {
        enrollment: uid.to_string(),
        program: Some("PRGtracker1".to_string()),
        org_unit: Some("OU000000001".to_string()),
        tracked_entity: Some(tracked_entity.to_string()),
    }
}
