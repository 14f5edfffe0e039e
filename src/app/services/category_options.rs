//! Attribute category option parsing and matching
//!
//! An event may name its attribute option combo indirectly through a
//! semicolon separated list of category option identifiers. These helpers
//! turn that list into a set and check whether an attribute option combo is
//! built from exactly that set of options.

use crate::app::models::metadata::CategoryOptionCombo;
use crate::constants::CATEGORY_OPTION_DELIMITER;
use std::collections::BTreeSet;

/// Parse a delimited attribute category options value into a set of ids
///
/// Surrounding whitespace is stripped; a missing or blank value yields an
/// empty set. Duplicate ids collapse and empty segments are ignored.
pub fn parse_option_ids(value: Option<&str>) -> BTreeSet<String> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return BTreeSet::new();
    };

    value
        .split(CATEGORY_OPTION_DELIMITER)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether `aoc` is built from exactly the category options in `option_uids`
///
/// True iff both sets have the same size and every target uid is one of the
/// combo's options.
pub fn option_set_matches(aoc: &CategoryOptionCombo, option_uids: &BTreeSet<String>) -> bool {
    let aoc_options = aoc.category_option_uids();
    aoc_options.len() == option_uids.len()
        && option_uids
            .iter()
            .all(|uid| aoc_options.contains(uid.as_str()))
}
