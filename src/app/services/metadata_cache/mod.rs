//! Metadata cache providing O(1) metadata lookups during preprocessing and validation
//!
//! The cache is populated before a bundle is processed (see [`loader`]) and is
//! only read afterwards, with one exception: the preprocessor inserts program
//! and program stage objects it resolved so later steps find them under the
//! canonical UID scheme.
//!
//! Besides metadata the cache knows about records that already exist in the
//! backing store and about forward references to records of the current
//! submission.
//!
//! Each bundle is processed against its own cache instance. Cloning is cheap
//! (metadata objects are shared through `Arc`), so concurrent bundles clone
//! one loaded cache instead of sharing a mutable one.

pub mod loader;

#[cfg(test)]
pub mod tests;

pub use loader::{LoadStats, MetadataSnapshot};

use crate::app::models::existing::{
    ExistingEnrollment, ExistingEvent, ExistingTrackedEntity, ReferenceTrackerEntity,
};
use crate::app::models::metadata::{
    CategoryCombo, CategoryOption, CategoryOptionCombo, IdScheme, Identifiable, MetadataKind,
    OrganisationUnit, Program, ProgramStage, TrackedEntityType,
};
use crate::app::models::{TrackerBundle, TrackerType, non_blank};
use crate::config::IdSchemeConfig;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Metadata type that can be stored in and resolved from the cache
pub trait CachedMetadata: Identifiable + Sized {
    const KIND: MetadataKind;

    /// Scheme under which records refer to this kind of metadata
    fn configured_scheme(schemes: &IdSchemeConfig) -> IdScheme;

    #[doc(hidden)]
    fn store(cache: &MetadataCache) -> &HashMap<String, Arc<Self>>;

    #[doc(hidden)]
    fn store_mut(cache: &mut MetadataCache) -> &mut HashMap<String, Arc<Self>>;
}

/// Key of the precomputed attribute option combo lookup:
/// category combo uid and the uids of the chosen category options
type AocLookupKey = (String, BTreeSet<String>);

/// Read-mostly store of metadata, existing records and forward references
#[derive(Debug, Clone, Default)]
pub struct MetadataCache {
    /// Identifier schemes used by incoming records
    id_schemes: IdSchemeConfig,

    programs: HashMap<String, Arc<Program>>,
    program_stages: HashMap<String, Arc<ProgramStage>>,
    category_combos: HashMap<String, Arc<CategoryCombo>>,
    category_options: HashMap<String, Arc<CategoryOption>>,
    category_option_combos: HashMap<String, Arc<CategoryOptionCombo>>,
    organisation_units: HashMap<String, Arc<OrganisationUnit>>,
    tracked_entity_types: HashMap<String, Arc<TrackedEntityType>>,

    /// Uid of the default object per kind (e.g. the default category option combo)
    defaults: HashMap<MetadataKind, String>,

    /// Program uid -> uids of the organisation units the program is assigned to
    program_org_units: HashMap<String, HashSet<String>>,

    /// Precomputed (category combo, category options) -> attribute option combo uid
    cached_aocs: HashMap<AocLookupKey, String>,

    existing_tracked_entities: HashMap<String, ExistingTrackedEntity>,
    existing_enrollments: HashMap<String, ExistingEnrollment>,
    existing_events: HashMap<String, ExistingEvent>,

    /// Records of the current submission that may be referenced before they exist
    references: HashMap<String, ReferenceTrackerEntity>,
}

macro_rules! impl_cached_metadata {
    ($ty:ty, $kind:expr, $field:ident, |$schemes:ident| $scheme:expr) => {
        impl CachedMetadata for $ty {
            const KIND: MetadataKind = $kind;

            fn configured_scheme($schemes: &IdSchemeConfig) -> IdScheme {
                $scheme
            }

            fn store(cache: &MetadataCache) -> &HashMap<String, Arc<Self>> {
                &cache.$field
            }

            fn store_mut(cache: &mut MetadataCache) -> &mut HashMap<String, Arc<Self>> {
                &mut cache.$field
            }
        }
    };
}

impl_cached_metadata!(Program, MetadataKind::Program, programs, |s| s.program);
impl_cached_metadata!(
    ProgramStage,
    MetadataKind::ProgramStage,
    program_stages,
    |s| s.program_stage
);
// Records never reference category combos directly
impl_cached_metadata!(
    CategoryCombo,
    MetadataKind::CategoryCombo,
    category_combos,
    |_s| IdScheme::Uid
);
impl_cached_metadata!(
    CategoryOption,
    MetadataKind::CategoryOption,
    category_options,
    |s| s.category_option
);
impl_cached_metadata!(
    CategoryOptionCombo,
    MetadataKind::CategoryOptionCombo,
    category_option_combos,
    |s| s.category_option_combo
);
impl_cached_metadata!(
    OrganisationUnit,
    MetadataKind::OrganisationUnit,
    organisation_units,
    |s| s.org_unit
);
impl_cached_metadata!(
    TrackedEntityType,
    MetadataKind::TrackedEntityType,
    tracked_entity_types,
    |s| s.tracked_entity_type
);

impl MetadataCache {
    /// Create an empty cache for records using the given identifier schemes
    pub fn new(id_schemes: IdSchemeConfig) -> Self {
        Self {
            id_schemes,
            ..Default::default()
        }
    }

    /// Identifier schemes used by incoming records
    pub fn id_schemes(&self) -> &IdSchemeConfig {
        &self.id_schemes
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    /// Resolve a metadata object by an identifier it has been stored under
    pub fn get<T: CachedMetadata>(&self, identifier: &str) -> Option<&Arc<T>> {
        T::store(self).get(identifier)
    }

    /// Resolve an optional identifier; blank identifiers never resolve
    pub fn resolve<T: CachedMetadata>(&self, identifier: &Option<String>) -> Option<&Arc<T>> {
        non_blank(identifier).and_then(|id| self.get::<T>(id))
    }

    /// Whether an object is stored under `identifier`
    pub fn contains<T: CachedMetadata>(&self, identifier: &str) -> bool {
        T::store(self).contains_key(identifier)
    }

    /// Insert or overwrite `object` under its identifier in `scheme`
    ///
    /// Objects without an identifier in that scheme (e.g. no code) are not
    /// stored. Re-inserting the same object is a no-op in effect.
    pub fn put<T: CachedMetadata>(&mut self, scheme: IdScheme, object: Arc<T>) {
        let Some(identifier) = scheme.identifier_of(object.as_ref()).map(str::to_string) else {
            debug!(
                "{} {} has no {} identifier, not cached under that scheme",
                T::KIND,
                object.uid(),
                scheme
            );
            return;
        };
        T::store_mut(self).insert(identifier, object);
    }

    /// Insert `object` under its uid and under the configured scheme for its kind
    pub fn insert<T: CachedMetadata>(&mut self, object: Arc<T>) {
        let scheme = T::configured_scheme(&self.id_schemes);
        if scheme != IdScheme::Uid {
            self.put(scheme, Arc::clone(&object));
        }
        self.put(IdScheme::Uid, object);
    }

    /// Number of distinct objects of one kind
    pub fn count<T: CachedMetadata>(&self) -> usize {
        T::store(self)
            .values()
            .map(|object| object.uid())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Insert `object` and mark it as the default of its kind
    pub fn set_default<T: CachedMetadata>(&mut self, object: Arc<T>) {
        self.defaults.insert(T::KIND, object.uid().to_string());
        self.insert(object);
    }

    /// Default object of a kind, e.g. the default category option combo
    pub fn get_default<T: CachedMetadata>(&self) -> Option<&Arc<T>> {
        self.defaults
            .get(&T::KIND)
            .and_then(|uid| self.get::<T>(uid))
    }

    // =========================================================================
    // Precomputed Lookups
    // =========================================================================

    /// Remember which attribute option combo belongs to a program's category
    /// combo and a set of category option uids
    pub fn cache_aoc_for_program_options(
        &mut self,
        program: &Program,
        option_uids: BTreeSet<String>,
        aoc_uid: impl Into<String>,
    ) {
        self.cached_aocs.insert(
            (program.category_combo.uid.clone(), option_uids),
            aoc_uid.into(),
        );
    }

    /// Uid of the attribute option combo precomputed for `program` and the
    /// given category option uids
    pub fn cached_aoc_for_program_options(
        &self,
        program: &Program,
        option_uids: &BTreeSet<String>,
    ) -> Option<&str> {
        self.cached_aocs
            .get(&(program.category_combo.uid.clone(), option_uids.clone()))
            .map(String::as_str)
    }

    /// Assign organisation units to a program
    pub fn add_program_org_units<I, S>(&mut self, program_uid: impl Into<String>, org_unit_uids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.program_org_units
            .entry(program_uid.into())
            .or_default()
            .extend(org_unit_uids.into_iter().map(Into::into));
    }

    /// Program uid -> assigned organisation unit uids
    pub fn program_org_units(&self) -> &HashMap<String, HashSet<String>> {
        &self.program_org_units
    }

    /// Whether `org_unit` is assigned to `program`
    pub fn program_has_org_unit(&self, program: &Program, org_unit: &OrganisationUnit) -> bool {
        self.program_org_units
            .get(&program.uid)
            .is_some_and(|org_units| org_units.contains(&org_unit.uid))
    }

    // =========================================================================
    // Existing Records and Forward References
    // =========================================================================

    pub fn add_existing_tracked_entity(&mut self, tracked_entity: ExistingTrackedEntity) {
        self.existing_tracked_entities
            .insert(tracked_entity.uid.clone(), tracked_entity);
    }

    pub fn add_existing_enrollment(&mut self, enrollment: ExistingEnrollment) {
        self.existing_enrollments
            .insert(enrollment.uid.clone(), enrollment);
    }

    pub fn add_existing_event(&mut self, event: ExistingEvent) {
        self.existing_events.insert(event.uid.clone(), event);
    }

    pub fn existing_tracked_entity(&self, uid: &str) -> Option<&ExistingTrackedEntity> {
        self.existing_tracked_entities.get(uid)
    }

    pub fn existing_enrollment(&self, uid: &str) -> Option<&ExistingEnrollment> {
        self.existing_enrollments.get(uid)
    }

    pub fn existing_event(&self, uid: &str) -> Option<&ExistingEvent> {
        self.existing_events.get(uid)
    }

    pub fn add_reference(&mut self, reference: ReferenceTrackerEntity) {
        self.references.insert(reference.uid.clone(), reference);
    }

    /// Forward reference to a not yet persisted record of the submission
    pub fn reference(&self, uid: &str) -> Option<&ReferenceTrackerEntity> {
        self.references.get(uid)
    }

    /// Register a forward reference for every record of `bundle` that does
    /// not exist yet
    ///
    /// Enrollments point at their tracked entity and events at their
    /// enrollment as parent.
    ///
    /// # Returns
    ///
    /// Number of references registered
    pub fn register_references(&mut self, bundle: &TrackerBundle) -> usize {
        let mut registered = 0;

        for te in &bundle.tracked_entities {
            if self.register_reference(TrackerType::TrackedEntity, &te.tracked_entity, None) {
                registered += 1;
            }
        }
        for en in &bundle.enrollments {
            let parent = non_blank(&en.tracked_entity).map(str::to_string);
            if self.register_reference(TrackerType::Enrollment, &en.enrollment, parent) {
                registered += 1;
            }
        }
        for ev in &bundle.events {
            let parent = non_blank(&ev.enrollment).map(str::to_string);
            if self.register_reference(TrackerType::Event, &ev.event, parent) {
                registered += 1;
            }
        }

        debug!("Registered {} forward references", registered);
        registered
    }

    fn register_reference(
        &mut self,
        tracker_type: TrackerType,
        uid: &str,
        parent_uid: Option<String>,
    ) -> bool {
        let uid = uid.trim();
        if uid.is_empty() {
            return false;
        }
        let exists = match tracker_type {
            TrackerType::TrackedEntity => self.existing_tracked_entities.contains_key(uid),
            TrackerType::Enrollment => self.existing_enrollments.contains_key(uid),
            TrackerType::Event => self.existing_events.contains_key(uid),
            TrackerType::Relationship => true,
        };
        if exists {
            return false;
        }
        self.add_reference(ReferenceTrackerEntity::new(uid, parent_uid));
        true
    }

    /// Tracked entity is persisted or referenced by the current submission
    pub fn tracked_entity_exists(&self, uid: &str) -> bool {
        self.existing_tracked_entities.contains_key(uid) || self.references.contains_key(uid)
    }

    /// Enrollment is persisted or referenced by the current submission
    pub fn enrollment_exists(&self, uid: &str) -> bool {
        self.existing_enrollments.contains_key(uid) || self.references.contains_key(uid)
    }

    /// Event is persisted or referenced by the current submission
    pub fn event_exists(&self, uid: &str) -> bool {
        self.existing_events.contains_key(uid) || self.references.contains_key(uid)
    }
}
