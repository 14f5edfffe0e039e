//! Fills event program, program stage and attribute option combo identifiers

use super::{BundlePreProcessor, PreProcessStats};
use crate::app::models::metadata::{
    CategoryOption, CategoryOptionCombo, IdScheme, Program, ProgramStage,
};
use crate::app::models::{Event, TrackerBundle, non_blank};
use crate::app::services::category_options::parse_option_ids;
use crate::app::services::metadata_cache::MetadataCache;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Completes events of program-only or stage-only submissions
///
/// - An event with a program stage but no program gets the stage's program.
/// - An event of a program without registration and no stage gets the
///   program's first stage.
/// - An event of a program with a non-default category combo, no attribute
///   option combo and some category options gets the precomputed attribute
///   option combo for those options.
///
/// A program stage without a program is broken metadata. The pass stops at
/// the first such event and leaves every later event untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventProgramPreProcessor;

/// Result of completing one event's program linkage
enum Linkage {
    Unchanged,
    ProgramFilled,
    StageFilled,
    DetachedStage,
}

impl EventProgramPreProcessor {
    fn fill_program_linkage(event: &mut Event, cache: &mut MetadataCache) -> Linkage {
        if non_blank(&event.program_stage).is_some() {
            let Some(stage) = cache.resolve::<ProgramStage>(&event.program_stage).cloned() else {
                return Linkage::Unchanged;
            };
            let Some(program) = stage.program() else {
                return Linkage::DetachedStage;
            };
            event.program = Some(program.uid.clone());
            cache.put(IdScheme::Uid, program);
            Linkage::ProgramFilled
        } else if non_blank(&event.program).is_some() {
            let Some(program) = cache.resolve::<Program>(&event.program) else {
                return Linkage::Unchanged;
            };
            if !program.is_without_registration() {
                return Linkage::Unchanged;
            }
            let Some(stage) = program.program_stages.first().cloned() else {
                return Linkage::Unchanged;
            };
            event.program_stage = Some(stage.uid.clone());
            cache.put(IdScheme::Uid, stage);
            Linkage::StageFilled
        } else {
            Linkage::Unchanged
        }
    }

    /// Set the attribute option combo of events that only name category options
    fn fill_attribute_option_combos(
        bundle: &mut TrackerBundle,
        cache: &MetadataCache,
        stats: &mut PreProcessStats,
    ) {
        let scheme = cache.id_schemes().category_option_combo;

        for event in &mut bundle.events {
            if non_blank(&event.attribute_option_combo).is_some()
                || non_blank(&event.attribute_category_options).is_none()
            {
                continue;
            }
            let Some(program) = cache.resolve::<Program>(&event.program) else {
                continue;
            };
            if program.category_combo.is_default {
                continue;
            }

            let Some(option_uids) = resolve_option_uids(cache, event) else {
                debug!(
                    "Event {}: not every category option resolves, attribute option combo left blank",
                    event.event
                );
                continue;
            };
            let Some(aoc) = cache
                .cached_aoc_for_program_options(program, &option_uids)
                .and_then(|aoc_uid| cache.get::<CategoryOptionCombo>(aoc_uid))
            else {
                continue;
            };

            match scheme.identifier_of(aoc.as_ref()) {
                Some(identifier) => {
                    event.attribute_option_combo = Some(identifier.to_string());
                    stats.attribute_option_combos_filled += 1;
                }
                None => debug!(
                    "Event {}: attribute option combo {} has no {} identifier",
                    event.event, aoc.uid, scheme
                ),
            }
        }
    }
}

/// Uids of the event's category options; `None` if any does not resolve
fn resolve_option_uids(cache: &MetadataCache, event: &Event) -> Option<BTreeSet<String>> {
    parse_option_ids(event.attribute_category_options.as_deref())
        .iter()
        .map(|id| {
            cache
                .get::<CategoryOption>(id)
                .map(|option| option.uid.clone())
        })
        .collect()
}

impl BundlePreProcessor for EventProgramPreProcessor {
    fn name(&self) -> &'static str {
        "EventProgramPreProcessor"
    }

    fn process(&self, bundle: &mut TrackerBundle, cache: &mut MetadataCache) -> PreProcessStats {
        let mut stats = PreProcessStats::default();

        for event in &mut bundle.events {
            if non_blank(&event.program).is_some() && non_blank(&event.program_stage).is_some() {
                continue;
            }
            match Self::fill_program_linkage(event, cache) {
                Linkage::Unchanged => {}
                Linkage::ProgramFilled => stats.programs_filled += 1,
                Linkage::StageFilled => stats.program_stages_filled += 1,
                Linkage::DetachedStage => {
                    warn!(
                        "Program stage {} of event {} has no program; metadata is inconsistent, stopping preprocessing",
                        non_blank(&event.program_stage).unwrap_or_default(),
                        event.event
                    );
                    stats.aborted = true;
                    return stats;
                }
            }
        }

        Self::fill_attribute_option_combos(bundle, cache, &mut stats);

        debug!(
            "Preprocessing filled {} programs, {} program stages, {} attribute option combos",
            stats.programs_filled, stats.program_stages_filled, stats.attribute_option_combos_filled
        );
        stats
    }
}
