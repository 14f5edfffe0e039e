//! Metadata snapshot loading
//!
//! A [`MetadataSnapshot`] is the flat, uid-linked JSON form of the metadata a
//! bundle is validated against. Loading links programs to their stages,
//! attribute option combos to their category combos and options, and fills
//! the precomputed lookups of the [`MetadataCache`].

use super::MetadataCache;
use crate::app::models::existing::{ExistingEnrollment, ExistingEvent, ExistingTrackedEntity};
use crate::app::models::metadata::{
    CategoryCombo, CategoryOption, CategoryOptionCombo, OrganisationUnit, Program, ProgramStage,
    ProgramType, TrackedEntityType,
};
use crate::config::IdSchemeConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Uid, code and name shared by every metadata entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifiableSnapshot {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryComboSnapshot {
    #[serde(flatten)]
    pub identity: IdentifiableSnapshot,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryOptionComboSnapshot {
    #[serde(flatten)]
    pub identity: IdentifiableSnapshot,
    pub category_combo: String,
    #[serde(default)]
    pub category_options: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramSnapshot {
    #[serde(flatten)]
    pub identity: IdentifiableSnapshot,
    #[serde(default)]
    pub program_type: ProgramType,
    /// Category combo uid; the default combo when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_combo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracked_entity_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramStageSnapshot {
    #[serde(flatten)]
    pub identity: IdentifiableSnapshot,
    /// Owning program uid; absent only in broken metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultsSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_combo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_option_combo: Option<String>,
}

/// Precomputed attribute option combo for a program and set of category options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedAocSnapshot {
    pub program: String,
    pub category_options: Vec<String>,
    pub attribute_option_combo: String,
}

/// Flat, uid-linked form of all metadata a bundle is validated against
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetadataSnapshot {
    pub category_options: Vec<IdentifiableSnapshot>,
    pub category_combos: Vec<CategoryComboSnapshot>,
    pub category_option_combos: Vec<CategoryOptionComboSnapshot>,
    pub organisation_units: Vec<IdentifiableSnapshot>,
    pub tracked_entity_types: Vec<IdentifiableSnapshot>,
    pub programs: Vec<ProgramSnapshot>,
    /// Stages in program order; the first stage of a program is listed first
    pub program_stages: Vec<ProgramStageSnapshot>,
    /// Program uid -> assigned organisation unit uids
    pub program_org_units: HashMap<String, Vec<String>>,
    pub defaults: DefaultsSnapshot,
    pub cached_attribute_option_combos: Vec<CachedAocSnapshot>,
    pub tracked_entities: Vec<ExistingTrackedEntity>,
    pub enrollments: Vec<ExistingEnrollment>,
    pub events: Vec<ExistingEvent>,
}

/// Statistics about loading a snapshot into a cache
#[derive(Debug, Clone, Default)]
pub struct LoadStats {
    pub programs: usize,
    pub program_stages: usize,
    /// Stages listed without a program
    pub detached_stages: usize,
    pub category_option_combos: usize,
    pub organisation_units: usize,
    pub existing_records: usize,
    pub load_duration: Duration,
}

impl MetadataCache {
    /// Load a metadata snapshot from a JSON file
    ///
    /// # Errors
    /// * Returns `Error::Io` if the file cannot be read
    /// * Returns `Error::Json` if the file is not a valid snapshot
    /// * Returns `Error::MetadataSnapshot` if the snapshot links to unknown uids
    pub async fn load(path: &Path, id_schemes: IdSchemeConfig) -> Result<(Self, LoadStats)> {
        info!("Loading metadata snapshot from {}", path.display());

        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::io(
                format!("Failed to read metadata snapshot {}", path.display()),
                e,
            )
        })?;
        let snapshot: MetadataSnapshot = serde_json::from_str(&content).map_err(|e| {
            Error::json(path.display().to_string(), "Invalid metadata snapshot", e)
        })?;

        Self::from_snapshot(snapshot, id_schemes)
    }

    /// Build a cache from an in-memory snapshot
    pub fn from_snapshot(
        snapshot: MetadataSnapshot,
        id_schemes: IdSchemeConfig,
    ) -> Result<(Self, LoadStats)> {
        let start_time = Instant::now();
        let mut cache = MetadataCache::new(id_schemes);
        let mut stats = LoadStats::default();

        let mut options: HashMap<String, Arc<CategoryOption>> = HashMap::new();
        for co in snapshot.category_options {
            let option = Arc::new(CategoryOption {
                uid: co.uid,
                code: co.code,
                name: co.name,
            });
            options.insert(option.uid.clone(), Arc::clone(&option));
            cache.insert(option);
        }

        let mut combos: HashMap<String, Arc<CategoryCombo>> = HashMap::new();
        for cc in snapshot.category_combos {
            let combo = Arc::new(CategoryCombo {
                uid: cc.identity.uid,
                code: cc.identity.code,
                name: cc.identity.name,
                is_default: cc.is_default,
            });
            combos.insert(combo.uid.clone(), Arc::clone(&combo));
            cache.insert(combo);
        }

        let default_combo = match &snapshot.defaults.category_combo {
            Some(uid) => Some(lookup(&combos, uid, "default category combo")?),
            None => combos.values().find(|cc| cc.is_default).cloned(),
        };
        if let Some(combo) = &default_combo {
            cache.set_default(Arc::clone(combo));
        }

        for coc in snapshot.category_option_combos {
            let category_combo = lookup(
                &combos,
                &coc.category_combo,
                &format!("category combo of {}", coc.identity.uid),
            )?;
            let category_options = coc
                .category_options
                .iter()
                .map(|uid| {
                    lookup(
                        &options,
                        uid,
                        &format!("category option of {}", coc.identity.uid),
                    )
                })
                .collect::<Result<Vec<_>>>()?;

            cache.insert(Arc::new(CategoryOptionCombo {
                uid: coc.identity.uid,
                code: coc.identity.code,
                name: coc.identity.name,
                category_combo,
                category_options,
            }));
            stats.category_option_combos += 1;
        }

        if let Some(uid) = &snapshot.defaults.category_option_combo {
            let aoc = cache
                .get::<CategoryOptionCombo>(uid)
                .cloned()
                .ok_or_else(|| {
                    Error::metadata_snapshot(format!(
                        "Default category option combo {} is not defined",
                        uid
                    ))
                })?;
            cache.set_default(aoc);
        }

        for ou in snapshot.organisation_units {
            cache.insert(Arc::new(OrganisationUnit {
                uid: ou.uid,
                code: ou.code,
                name: ou.name,
            }));
            stats.organisation_units += 1;
        }

        let mut tracked_entity_types: HashMap<String, Arc<TrackedEntityType>> = HashMap::new();
        for tet in snapshot.tracked_entity_types {
            let tet = Arc::new(TrackedEntityType {
                uid: tet.uid,
                code: tet.code,
                name: tet.name,
            });
            tracked_entity_types.insert(tet.uid.clone(), Arc::clone(&tet));
            cache.insert(tet);
        }

        for ps in &snapshot.programs {
            let category_combo = match &ps.category_combo {
                Some(uid) => {
                    lookup(&combos, uid, &format!("category combo of {}", ps.identity.uid))?
                }
                None => default_combo.clone().ok_or_else(|| {
                    Error::metadata_snapshot(format!(
                        "Program {} has no category combo and no default combo is defined",
                        ps.identity.uid
                    ))
                })?,
            };

            let mut builder = Program::builder(ps.identity.uid.clone(), category_combo)
                .program_type(ps.program_type);
            if let Some(code) = &ps.identity.code {
                builder = builder.code(code.clone());
            }
            if let Some(name) = &ps.identity.name {
                builder = builder.name(name.clone());
            }
            if let Some(uid) = &ps.tracked_entity_type {
                builder = builder.tracked_entity_type(lookup(
                    &tracked_entity_types,
                    uid,
                    &format!("tracked entity type of {}", ps.identity.uid),
                )?);
            }
            for stage in snapshot
                .program_stages
                .iter()
                .filter(|stage| stage.program.as_deref() == Some(ps.identity.uid.as_str()))
            {
                builder = builder.stage_with(
                    stage.identity.uid.clone(),
                    stage.identity.code.clone(),
                    stage.identity.name.clone(),
                );
            }

            let program = builder.build();
            for stage in &program.program_stages {
                cache.insert(Arc::clone(stage));
                stats.program_stages += 1;
            }
            cache.insert(program);
            stats.programs += 1;
        }

        for stage in &snapshot.program_stages {
            match &stage.program {
                Some(program_uid) => {
                    if !cache.contains::<Program>(program_uid) {
                        return Err(Error::metadata_snapshot(format!(
                            "Program stage {} references unknown program {}",
                            stage.identity.uid, program_uid
                        )));
                    }
                }
                None => {
                    warn!(
                        "Program stage {} has no program; its events cannot be completed",
                        stage.identity.uid
                    );
                    let mut detached = ProgramStage::detached(stage.identity.uid.clone());
                    detached.code = stage.identity.code.clone();
                    detached.name = stage.identity.name.clone();
                    cache.insert(Arc::new(detached));
                    stats.detached_stages += 1;
                }
            }
        }

        for (program_uid, org_units) in snapshot.program_org_units {
            cache.add_program_org_units(program_uid, org_units);
        }

        for cached in snapshot.cached_attribute_option_combos {
            let program = cache
                .get::<Program>(&cached.program)
                .cloned()
                .ok_or_else(|| {
                    Error::metadata_snapshot(format!(
                        "Cached attribute option combo {} references unknown program {}",
                        cached.attribute_option_combo, cached.program
                    ))
                })?;
            let option_uids: BTreeSet<String> = cached.category_options.into_iter().collect();
            cache.cache_aoc_for_program_options(
                &program,
                option_uids,
                cached.attribute_option_combo,
            );
        }

        stats.existing_records =
            snapshot.tracked_entities.len() + snapshot.enrollments.len() + snapshot.events.len();
        for te in snapshot.tracked_entities {
            cache.add_existing_tracked_entity(te);
        }
        for en in snapshot.enrollments {
            cache.add_existing_enrollment(en);
        }
        for ev in snapshot.events {
            cache.add_existing_event(ev);
        }

        stats.load_duration = start_time.elapsed();
        info!(
            "Metadata cache loaded: {} programs, {} program stages ({} detached), {} attribute option combos, {} org units, {} existing records in {:?}",
            stats.programs,
            stats.program_stages,
            stats.detached_stages,
            stats.category_option_combos,
            stats.organisation_units,
            stats.existing_records,
            stats.load_duration
        );

        Ok((cache, stats))
    }
}

fn lookup<T>(objects: &HashMap<String, Arc<T>>, uid: &str, what: &str) -> Result<Arc<T>> {
    objects
        .get(uid)
        .cloned()
        .ok_or_else(|| Error::metadata_snapshot(format!("Unknown {}: {}", what, uid)))
}
