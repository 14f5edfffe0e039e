//! Tests for the metadata cache and snapshot loader

pub mod cache_tests;
pub mod loader_tests;

use super::loader::{
    CachedAocSnapshot, CategoryComboSnapshot, CategoryOptionComboSnapshot, DefaultsSnapshot,
    IdentifiableSnapshot, MetadataSnapshot, ProgramSnapshot, ProgramStageSnapshot,
};
use crate::app::models::metadata::ProgramType;
use std::collections::HashMap;

pub fn identity(uid: &str) -> IdentifiableSnapshot {
    IdentifiableSnapshot {
        uid: uid.to_string(),
        code: None,
        name: None,
    }
}

pub fn coded(uid: &str, code: &str) -> IdentifiableSnapshot {
    IdentifiableSnapshot {
        uid: uid.to_string(),
        code: Some(code.to_string()),
        name: None,
    }
}

/// Snapshot with a default and a partner category combo, one event program,
/// one tracker program and one stage without a program
pub fn create_test_snapshot() -> MetadataSnapshot {
    MetadataSnapshot {
        category_options: vec![
            coded("CO000000001", "PARTNER_A"),
            coded("CO000000002", "PARTNER_B"),
            identity("COdefault01"),
        ],
        category_combos: vec![
            CategoryComboSnapshot {
                identity: identity("CCdefault01"),
                is_default: true,
            },
            CategoryComboSnapshot {
                identity: identity("CCpartner01"),
                is_default: false,
            },
        ],
        category_option_combos: vec![
            CategoryOptionComboSnapshot {
                identity: identity("AOCdefault1"),
                category_combo: "CCdefault01".to_string(),
                category_options: vec!["COdefault01".to_string()],
            },
            CategoryOptionComboSnapshot {
                identity: coded("AOCpartner1", "AOC_A_B"),
                category_combo: "CCpartner01".to_string(),
                category_options: vec!["CO000000001".to_string(), "CO000000002".to_string()],
            },
        ],
        organisation_units: vec![coded("OU000000001", "CLINIC_1")],
        tracked_entity_types: vec![identity("TETperson01")],
        programs: vec![
            ProgramSnapshot {
                identity: coded("PRGevent001", "EVENT_PROGRAM"),
                program_type: ProgramType::WithoutRegistration,
                category_combo: Some("CCpartner01".to_string()),
                tracked_entity_type: None,
            },
            ProgramSnapshot {
                identity: identity("PRGtracker1"),
                program_type: ProgramType::WithRegistration,
                category_combo: None,
                tracked_entity_type: Some("TETperson01".to_string()),
            },
        ],
        program_stages: vec![
            ProgramStageSnapshot {
                identity: identity("PSevent0001"),
                program: Some("PRGevent001".to_string()),
            },
            ProgramStageSnapshot {
                identity: identity("PStracker01"),
                program: Some("PRGtracker1".to_string()),
            },
            ProgramStageSnapshot {
                identity: identity("PStracker02"),
                program: Some("PRGtracker1".to_string()),
            },
            ProgramStageSnapshot {
                identity: identity("PSorphan001"),
                program: None,
            },
        ],
        program_org_units: HashMap::from([(
            "PRGevent001".to_string(),
            vec!["OU000000001".to_string()],
        )]),
        defaults: DefaultsSnapshot {
            category_combo: Some("CCdefault01".to_string()),
            category_option_combo: Some("AOCdefault1".to_string()),
        },
        cached_attribute_option_combos: vec![CachedAocSnapshot {
            program: "PRGevent001".to_string(),
            category_options: vec!["CO000000002".to_string(), "CO000000001".to_string()],
            attribute_option_combo: "AOCpartner1".to_string(),
        }],
        tracked_entities: Vec::new(),
        enrollments: Vec::new(),
        events: Vec::new(),
    }
}
