//! Tests for loading metadata snapshots into the cache

use super::*;
use crate::Error;
use crate::app::models::existing::ExistingEvent;
use crate::app::models::metadata::{CategoryOptionCombo, IdScheme, Program, ProgramStage};
use crate::app::services::metadata_cache::MetadataCache;
use crate::config::IdSchemeConfig;
use std::collections::BTreeSet;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_from_snapshot_links_programs_and_stages() {
    let (cache, stats) =
        MetadataCache::from_snapshot(create_test_snapshot(), IdSchemeConfig::default()).unwrap();

    assert_eq!(stats.programs, 2);
    assert_eq!(stats.program_stages, 3);
    assert_eq!(stats.detached_stages, 1);

    let tracker = cache.get::<Program>("PRGtracker1").unwrap();
    let stage_uids: Vec<&str> = tracker
        .program_stages
        .iter()
        .map(|s| s.uid.as_str())
        .collect();
    assert_eq!(stage_uids, vec!["PStracker01", "PStracker02"]);
    assert!(tracker.category_combo.is_default);
    assert_eq!(
        tracker.tracked_entity_type.as_ref().unwrap().uid,
        "TETperson01"
    );

    let stage = cache.get::<ProgramStage>("PStracker02").unwrap();
    assert_eq!(stage.program().unwrap().uid, "PRGtracker1");

    let orphan = cache.get::<ProgramStage>("PSorphan001").unwrap();
    assert!(orphan.program().is_none());
}

#[test]
fn test_from_snapshot_fills_lookups() {
    let (cache, _) =
        MetadataCache::from_snapshot(create_test_snapshot(), IdSchemeConfig::default()).unwrap();

    assert_eq!(
        cache.get_default::<CategoryOptionCombo>().unwrap().uid,
        "AOCdefault1"
    );

    let program = cache.get::<Program>("PRGevent001").unwrap();
    let options: BTreeSet<String> = ["CO000000001", "CO000000002"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(
        cache.cached_aoc_for_program_options(program, &options),
        Some("AOCpartner1")
    );
    assert!(cache.program_org_units()["PRGevent001"].contains("OU000000001"));
}

#[test]
fn test_from_snapshot_with_code_scheme() {
    let (cache, _) = MetadataCache::from_snapshot(
        create_test_snapshot(),
        IdSchemeConfig::uniform(IdScheme::Code),
    )
    .unwrap();

    assert!(cache.get::<Program>("EVENT_PROGRAM").is_some());
    assert!(cache.get::<Program>("PRGevent001").is_some());
    assert!(cache.get::<CategoryOptionCombo>("AOC_A_B").is_some());
}

#[test]
fn test_unknown_category_combo_is_an_error() {
    let mut snapshot = create_test_snapshot();
    snapshot.programs[0].category_combo = Some("CCmissing01".to_string());

    let result = MetadataCache::from_snapshot(snapshot, IdSchemeConfig::default());
    assert!(matches!(result, Err(Error::MetadataSnapshot { .. })));
}

#[test]
fn test_stage_with_unknown_program_is_an_error() {
    let mut snapshot = create_test_snapshot();
    snapshot.program_stages[0].program = Some("PRGmissing1".to_string());

    let result = MetadataCache::from_snapshot(snapshot, IdSchemeConfig::default());
    assert!(matches!(result, Err(Error::MetadataSnapshot { .. })));
}

#[tokio::test]
async fn test_load_from_json_file() {
    let mut snapshot = create_test_snapshot();
    snapshot.events.push(ExistingEvent {
        uid: "EVstored001".to_string(),
    });

    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", serde_json::to_string(&snapshot).unwrap()).unwrap();

    let (cache, stats) = MetadataCache::load(file.path(), IdSchemeConfig::default())
        .await
        .unwrap();
    assert_eq!(stats.existing_records, 1);
    assert!(cache.event_exists("EVstored001"));
    assert!(cache.get::<Program>("PRGevent001").unwrap().is_without_registration());
}

#[tokio::test]
async fn test_load_invalid_json() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{ \"programs\": 42 }}").unwrap();

    let result = MetadataCache::load(file.path(), IdSchemeConfig::default()).await;
    assert!(matches!(result, Err(Error::Json { .. })));
}
