//! Validation hooks
//!
//! A hook checks one aspect of every record in the bundle. Hooks run in a
//! fixed order; each one sees the bundle as left by the previous hooks.

pub mod data_relations;
pub mod mandatory_fields;
pub mod meta;
pub mod uid_format;

pub use data_relations::PreCheckDataRelationsHook;
pub use mandatory_fields::PreCheckMandatoryFieldsHook;
pub use meta::PreCheckMetaHook;
pub use uid_format::PreCheckUidFormatHook;

use super::reporter::ValidationErrorReporter;
use crate::app::models::{Enrollment, Event, Relationship, TrackedEntity, TrackerBundle};
use crate::app::services::metadata_cache::MetadataCache;
use std::fmt;

/// Read-only view a hook validates against
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Records still under validation; also the lookup for sibling records
    pub bundle: &'a TrackerBundle,
    pub cache: &'a MetadataCache,
}

impl<'a> ValidationContext<'a> {
    pub fn new(bundle: &'a TrackerBundle, cache: &'a MetadataCache) -> Self {
        Self { bundle, cache }
    }
}

/// One validation step applied to every record kind
///
/// All record methods default to doing nothing, so a hook only implements
/// the kinds it cares about.
pub trait ValidationHook: fmt::Debug + Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn validate_tracked_entity(
        &self,
        _reporter: &mut ValidationErrorReporter,
        _ctx: &ValidationContext<'_>,
        _tracked_entity: &TrackedEntity,
    ) {
    }

    fn validate_enrollment(
        &self,
        _reporter: &mut ValidationErrorReporter,
        _ctx: &ValidationContext<'_>,
        _enrollment: &Enrollment,
    ) {
    }

    fn validate_event(
        &self,
        _reporter: &mut ValidationErrorReporter,
        _ctx: &ValidationContext<'_>,
        _event: &Event,
    ) {
    }

    fn validate_relationship(
        &self,
        _reporter: &mut ValidationErrorReporter,
        _ctx: &ValidationContext<'_>,
        _relationship: &Relationship,
    ) {
    }

    /// Remove invalid records from the bundle once this hook has run
    fn remove_on_error(&self) -> bool {
        false
    }

    /// Do not run this hook on records an earlier hook already rejected
    fn skip_on_error(&self) -> bool {
        false
    }
}

/// Hooks run by default, in order
pub fn default_hooks() -> Vec<Box<dyn ValidationHook>> {
    vec![
        Box::new(PreCheckUidFormatHook),
        Box::new(PreCheckMandatoryFieldsHook),
        Box::new(PreCheckMetaHook),
        Box::new(PreCheckDataRelationsHook),
    ]
}
