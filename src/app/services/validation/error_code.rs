//! Typed validation error codes
//!
//! Each code carries a message template with positional `{0}`, `{1}`, ...
//! placeholders and the kind of problem it describes. Arguments are only used
//! to format the message.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\d+)\}").expect("placeholder pattern is a valid regex"));

/// Broad category of a record-level validation error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// An identifier does not resolve in the cache or bundle
    MissingReference,
    /// Two resolvable entities disagree on a value that must match
    RelationshipInconsistency,
    /// A value is present or absent in a combination the rules forbid
    PolicyViolation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrackerErrorCode {
    E1005,
    E1010,
    E1011,
    E1013,
    E1014,
    E1022,
    E1029,
    E1033,
    E1041,
    E1048,
    E1049,
    E1054,
    E1055,
    E1069,
    E1070,
    E1079,
    E1089,
    E1099,
    E1115,
    E1116,
    E1117,
    E1121,
    E1122,
    E1123,
    E1124,
    E4012,
}

impl TrackerErrorCode {
    /// Message template with positional placeholders
    pub fn message_template(&self) -> &'static str {
        use TrackerErrorCode::*;
        match self {
            E1005 => "Could not find TrackedEntityType: `{0}`.",
            E1010 => "Could not find Program: `{0}`, linked to Event.",
            E1011 => "Could not find OrganisationUnit: `{0}`, linked to Event.",
            E1013 => "Could not find ProgramStage: `{0}`, linked to Event.",
            E1014 => {
                "Provided Program: `{0}`, is a Program without registration. An Enrollment cannot be created into Program without registration."
            }
            E1022 => "TrackedEntity: `{0}`, must have same TrackedEntityType as Program `{1}`.",
            E1029 => "Event OrganisationUnit: `{0}`, and Program: `{1}`, don't match.",
            E1033 => "Event: `{0}`, Enrollment value is NULL.",
            E1041 => "Enrollment OrganisationUnit: `{0}`, and Program: `{1}`, don't match.",
            E1048 => "Object: `{0}`, uid: `{1}`, has an invalid uid format.",
            E1049 => "Could not find OrganisationUnit: `{0}`, linked to Tracked Entity.",
            E1054 => "AttributeOptionCombo `{0}` is not in the event programs category combo `{1}`.",
            E1055 => {
                "Default AttributeOptionCombo is not allowed since program has non-default CategoryCombo."
            }
            E1069 => "Could not find Program: `{0}`, linked to Enrollment.",
            E1070 => "Could not find OrganisationUnit: `{0}`, linked to Enrollment.",
            E1079 => "Event: `{0}`, program: `{1}` is different from program defined in enrollment `{2}`.",
            E1089 => "Event: `{0}`, references a Program Stage `{1}` that does not belong to Program `{2}`.",
            E1099 => "Object: `{0}`, uid: `{1}`, is submitted more than once in the bundle.",
            E1115 => "Could not find CategoryOptionCombo: `{0}`.",
            E1116 => "Could not find CategoryOption: `{0}`.",
            E1117 => {
                "CategoryOptionCombo does not exist for given category combo and category options: `{0}`, `{1}`."
            }
            E1121 => "Missing required tracked entity property: `{0}`.",
            E1122 => "Missing required enrollment property: `{0}`.",
            E1123 => "Missing required event property: `{0}`.",
            E1124 => "Missing required relationship property: `{0}`.",
            E4012 => "Could not find `{0}`: `{1}`, linked to Relationship.",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        use TrackerErrorCode::*;
        match self {
            E1005 | E1010 | E1011 | E1013 | E1049 | E1069 | E1070 | E1115 | E1116 | E1117
            | E4012 => ErrorKind::MissingReference,
            E1022 | E1029 | E1041 | E1054 | E1079 | E1089 => ErrorKind::RelationshipInconsistency,
            E1014 | E1033 | E1048 | E1055 | E1099 | E1121 | E1122 | E1123 | E1124 => {
                ErrorKind::PolicyViolation
            }
        }
    }

    /// Format the message template with positional arguments
    ///
    /// Placeholders are only looked up in the template, so argument text is
    /// copied verbatim. Placeholders without a matching argument are left as
    /// they are.
    pub fn format(&self, args: &[String]) -> String {
        PLACEHOLDER_REGEX
            .replace_all(self.message_template(), |caps: &Captures<'_>| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| args.get(i))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

impl fmt::Display for TrackerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
