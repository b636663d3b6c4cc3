//! State FIPS code -> postal abbreviation lookup.
//!
//! Edge rows carry a human-readable `From_state`/`To_state`. The lookup is a
//! capability: [`UsStates`] knows the 50 states, DC and the inhabited
//! territories; [`FipsPassthrough`] is the degraded form that echoes the
//! zero-padded FIPS code. Any code missing from the table also falls back to
//! the padded FIPS string.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Resolves a state FIPS code to the label used in edge tables.
pub trait StateLookup {
    /// Postal abbreviation for a state FIPS code, if known.
    fn abbreviation(&self, state_fips: &str) -> Option<&'static str>;

    /// Label for an edge row: the abbreviation, else the zero-padded FIPS.
    fn label(&self, state_fips: &str) -> String {
        let padded = pad_state_fips(state_fips);
        match self.abbreviation(&padded) {
            Some(abbr) => abbr.to_string(),
            None => padded,
        }
    }
}

/// Built-in table of U.S. states, DC and territories.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsStates;

/// Lookup without a table; labels are the padded FIPS codes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FipsPassthrough;

static STATES: &[(&str, &str)] = &[
    ("01", "AL"),
    ("02", "AK"),
    ("04", "AZ"),
    ("05", "AR"),
    ("06", "CA"),
    ("08", "CO"),
    ("09", "CT"),
    ("10", "DE"),
    ("11", "DC"),
    ("12", "FL"),
    ("13", "GA"),
    ("15", "HI"),
    ("16", "ID"),
    ("17", "IL"),
    ("18", "IN"),
    ("19", "IA"),
    ("20", "KS"),
    ("21", "KY"),
    ("22", "LA"),
    ("23", "ME"),
    ("24", "MD"),
    ("25", "MA"),
    ("26", "MI"),
    ("27", "MN"),
    ("28", "MS"),
    ("29", "MO"),
    ("30", "MT"),
    ("31", "NE"),
    ("32", "NV"),
    ("33", "NH"),
    ("34", "NJ"),
    ("35", "NM"),
    ("36", "NY"),
    ("37", "NC"),
    ("38", "ND"),
    ("39", "OH"),
    ("40", "OK"),
    ("41", "OR"),
    ("42", "PA"),
    ("44", "RI"),
    ("45", "SC"),
    ("46", "SD"),
    ("47", "TN"),
    ("48", "TX"),
    ("49", "UT"),
    ("50", "VT"),
    ("51", "VA"),
    ("53", "WA"),
    ("54", "WV"),
    ("55", "WI"),
    ("56", "WY"),
    ("60", "AS"),
    ("66", "GU"),
    ("69", "MP"),
    ("72", "PR"),
    ("78", "VI"),
];

static BY_FIPS: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| STATES.iter().copied().collect());

impl StateLookup for UsStates {
    fn abbreviation(&self, state_fips: &str) -> Option<&'static str> {
        BY_FIPS.get(state_fips).copied()
    }
}

impl StateLookup for FipsPassthrough {
    fn abbreviation(&self, _state_fips: &str) -> Option<&'static str> {
        None
    }
}

/// Reverse lookup used by region filters that accept an abbreviation.
pub fn fips_for_abbreviation(abbr: &str) -> Option<&'static str> {
    STATES
        .iter()
        .find(|(_, a)| a.eq_ignore_ascii_case(abbr.trim()))
        .map(|(fips, _)| *fips)
}

/// Left-pad a numeric state code to two digits ("8" -> "08").
pub fn pad_state_fips(state_fips: &str) -> String {
    let trimmed = state_fips.trim();
    if !trimmed.is_empty() && trimmed.len() < 2 && trimmed.chars().all(|c| c.is_ascii_digit()) {
        format!("{:0>2}", trimmed)
    } else {
        trimmed.to_string()
    }
}
