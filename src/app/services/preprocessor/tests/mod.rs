//! Tests for bundle preprocessing


use crate::app::models::Event;
use crate::app::services::metadata_cache::MetadataCache;
use crate::app::services::metadata_cache::tests::create_test_snapshot;
use crate::config::IdSchemeConfig;

/// Cache loaded from the shared metadata snapshot
pub fn create_test_cache(id_schemes: IdSchemeConfig) -> MetadataCache {
    let (cache, _) = MetadataCache::from_snapshot(create_test_snapshot(), id_schemes)
        .expect("test snapshot links cleanly");
    cache
}

pub fn create_test_event(
    uid: &str,
    program: Option<&str>,
    program_stage: Option<&str>,
) -> Event {
    Event {
        event: uid.to_string(),
        program: program.map(str::to_string),
        program_stage: program_stage.map(str::to_string),
        org_unit: Some("OU000000001".to_string()),
        ..Default::default()
    }
}
