//! Application constants for the tracker processor
//!
//! This module contains delimiters, identifier patterns and default values
//! used throughout the preprocessing and validation pipeline.

// =============================================================================
// Identifier Formats
// =============================================================================

/// Delimiter between category option identifiers in an event's
/// attribute category options field
pub const CATEGORY_OPTION_DELIMITER: char = ';';

/// Pattern every record UID must match: a letter followed by ten alphanumerics
pub const UID_PATTERN: &str = r"^[a-zA-Z][a-zA-Z0-9]{10}$";

// =============================================================================
// Field Names
// =============================================================================

/// Property names used as arguments for missing-property errors
pub mod fields {
    pub const TRACKED_ENTITY: &str = "trackedEntity";
    pub const TRACKED_ENTITY_TYPE: &str = "trackedEntityType";
    pub const ORG_UNIT: &str = "orgUnit";
    pub const PROGRAM: &str = "program";
    pub const PROGRAM_STAGE: &str = "programStage";
    pub const RELATIONSHIP_TYPE: &str = "relationshipType";
}

// =============================================================================
// Logging and CLI Defaults
// =============================================================================

/// Log target used for the default `EnvFilter` directive
pub const LOG_TARGET: &str = "tracker_processor";

/// File extension of bundle files discovered in a directory
pub const BUNDLE_FILE_EXTENSION: &str = "json";
