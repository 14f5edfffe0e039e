//! Records that already exist outside the submitted bundle
//!
//! Persisted tracked entities, enrollments and events are loaded into the
//! metadata cache before validation. A [`ReferenceTrackerEntity`] marks a
//! record that is not persisted yet but is part of the current submission,
//! so other records may point at it.

use serde::{Deserialize, Serialize};

/// Tracked entity already stored, with the uid of its type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingTrackedEntity {
    pub uid: String,
    pub tracked_entity_type: String,
}

/// Enrollment already stored, with the uid of its program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingEnrollment {
    pub uid: String,
    pub program: String,
}

/// Event already stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingEvent {
    pub uid: String,
}

/// Forward reference to a record of the current submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceTrackerEntity {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_uid: Option<String>,
}

impl ReferenceTrackerEntity {
    pub fn new(uid: impl Into<String>, parent_uid: Option<String>) -> Self {
        Self {
            uid: uid.into(),
            parent_uid,
        }
    }
}
