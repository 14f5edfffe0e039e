//! Data models for tracker processing
//!
//! This module contains the records submitted in a tracker bundle (tracked
//! entities, enrollments, events and relationships) and the bundle itself.
//! Metadata snapshots live in [`metadata`], records that already exist in
//! the backing store and forward references live in [`existing`].

pub mod existing;
pub mod metadata;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Return the trimmed value of an optional identifier, or `None` when it is
/// missing, empty or whitespace-only
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Tracker Types
// =============================================================================

/// Kind of record in a tracker bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackerType {
    TrackedEntity,
    Enrollment,
    Event,
    Relationship,
}

impl TrackerType {
    /// All record kinds in validation order
    pub const ALL: [TrackerType; 4] = [
        TrackerType::TrackedEntity,
        TrackerType::Enrollment,
        TrackerType::Event,
        TrackerType::Relationship,
    ];

    /// Display name used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            TrackerType::TrackedEntity => "TrackedEntity",
            TrackerType::Enrollment => "Enrollment",
            TrackerType::Event => "Event",
            TrackerType::Relationship => "Relationship",
        }
    }
}

impl fmt::Display for TrackerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Common view over every record kind, used to key validation errors
pub trait TrackerDto {
    /// Identifier of the record itself
    fn uid(&self) -> &str;

    /// Kind of the record
    fn tracker_type(&self) -> TrackerType;
}

// =============================================================================
// Records
// =============================================================================

/// A tracked entity (the subject that is enrolled and has events)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEntity {
    pub tracked_entity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracked_entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_unit: Option<String>,
}

/// Enrollment of a tracked entity into a program
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub enrollment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracked_entity: Option<String>,
}

/// A single event recorded against a program stage
///
/// `attribute_category_options` is a semicolon separated list of category
/// option identifiers; together with the program's category combo it
/// determines the attribute option combo when none is given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrollment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_option_combo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_category_options: Option<String>,
}

/// One end of a relationship, tagged with the kind of record it points at
///
/// Serialised externally tagged, e.g. `{"event": "Kj6vYde4LHh"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipItem {
    TrackedEntity(String),
    Enrollment(String),
    Event(String),
}

impl RelationshipItem {
    /// Kind of record referenced by this item
    pub fn tracker_type(&self) -> TrackerType {
        match self {
            RelationshipItem::TrackedEntity(_) => TrackerType::TrackedEntity,
            RelationshipItem::Enrollment(_) => TrackerType::Enrollment,
            RelationshipItem::Event(_) => TrackerType::Event,
        }
    }

    /// Identifier of the referenced record, if not blank
    pub fn uid(&self) -> Option<&str> {
        let uid = match self {
            RelationshipItem::TrackedEntity(uid)
            | RelationshipItem::Enrollment(uid)
            | RelationshipItem::Event(uid) => uid.trim(),
        };
        (!uid.is_empty()).then_some(uid)
    }
}

/// A directed link between two records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub relationship: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_type: Option<String>,
    pub from: RelationshipItem,
    pub to: RelationshipItem,
}

macro_rules! impl_tracker_dto {
    ($ty:ty, $field:ident, $kind:expr) => {
        impl TrackerDto for $ty {
            fn uid(&self) -> &str {
                &self.$field
            }

            fn tracker_type(&self) -> TrackerType {
                $kind
            }
        }
    };
}

impl_tracker_dto!(TrackedEntity, tracked_entity, TrackerType::TrackedEntity);
impl_tracker_dto!(Enrollment, enrollment, TrackerType::Enrollment);
impl_tracker_dto!(Event, event, TrackerType::Event);
impl_tracker_dto!(Relationship, relationship, TrackerType::Relationship);

// =============================================================================
// Bundle
// =============================================================================

/// A submitted batch of records, ordered per kind
///
/// Records are mutated only by preprocessors. During validation the bundle
/// doubles as the lookup for sibling records that are part of the same
/// submission but not yet persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackerBundle {
    pub tracked_entities: Vec<TrackedEntity>,
    pub enrollments: Vec<Enrollment>,
    pub events: Vec<Event>,
    pub relationships: Vec<Relationship>,
}

impl TrackerBundle {
    /// Create an empty bundle
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a tracked entity of this submission by uid
    pub fn tracked_entity(&self, uid: &str) -> Option<&TrackedEntity> {
        self.tracked_entities
            .iter()
            .find(|te| te.tracked_entity == uid)
    }

    /// Find an enrollment of this submission by uid
    pub fn enrollment(&self, uid: &str) -> Option<&Enrollment> {
        self.enrollments.iter().find(|en| en.enrollment == uid)
    }

    /// Find an event of this submission by uid
    pub fn event(&self, uid: &str) -> Option<&Event> {
        self.events.iter().find(|ev| ev.event == uid)
    }

    /// Whether a record of the given kind and uid is part of this submission
    pub fn contains(&self, tracker_type: TrackerType, uid: &str) -> bool {
        match tracker_type {
            TrackerType::TrackedEntity => self.tracked_entity(uid).is_some(),
            TrackerType::Enrollment => self.enrollment(uid).is_some(),
            TrackerType::Event => self.event(uid).is_some(),
            TrackerType::Relationship => self
                .relationships
                .iter()
                .any(|rel| rel.relationship == uid),
        }
    }

    /// Number of records of one kind sharing `uid`
    pub fn occurrences(&self, tracker_type: TrackerType, uid: &str) -> usize {
        match tracker_type {
            TrackerType::TrackedEntity => self
                .tracked_entities
                .iter()
                .filter(|te| te.tracked_entity == uid)
                .count(),
            TrackerType::Enrollment => self
                .enrollments
                .iter()
                .filter(|en| en.enrollment == uid)
                .count(),
            TrackerType::Event => self.events.iter().filter(|ev| ev.event == uid).count(),
            TrackerType::Relationship => self
                .relationships
                .iter()
                .filter(|rel| rel.relationship == uid)
                .count(),
        }
    }

    /// Number of records of one kind
    pub fn count(&self, tracker_type: TrackerType) -> usize {
        match tracker_type {
            TrackerType::TrackedEntity => self.tracked_entities.len(),
            TrackerType::Enrollment => self.enrollments.len(),
            TrackerType::Event => self.events.len(),
            TrackerType::Relationship => self.relationships.len(),
        }
    }

    /// Total number of records across all kinds
    pub fn len(&self) -> usize {
        TrackerType::ALL.iter().map(|t| self.count(*t)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keep only records for which `keep` returns true
    ///
    /// `keep` sees a record's kind and uid only, so records of one kind
    /// sharing a uid are kept or dropped together.
    ///
    /// # Returns
    ///
    /// Number of records removed
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(TrackerType, &str) -> bool,
    {
        let before = self.len();
        self.tracked_entities
            .retain(|r| keep(r.tracker_type(), r.uid()));
        self.enrollments.retain(|r| keep(r.tracker_type(), r.uid()));
        self.events.retain(|r| keep(r.tracker_type(), r.uid()));
        self.relationships
            .retain(|r| keep(r.tracker_type(), r.uid()));
        before - self.len()
    }

    /// Remove every record from the bundle
    pub fn clear(&mut self) {
        self.tracked_entities.clear();
        self.enrollments.clear();
        self.events.clear();
        self.relationships.clear();
    }
}
