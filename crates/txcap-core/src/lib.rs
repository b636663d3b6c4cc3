//! # txcap-core: County Transmission Capacity Model
//!
//! Data structures shared by the txcap crates: the MATPOWER-style grid input
//! tables, the county polygon layer, and the county-pair edges the pipeline
//! produces.
//!
//! ## Design Philosophy
//!
//! The output is an **undirected weighted multigraph** where:
//! - **Nodes**: U.S. counties, keyed by 5-digit FIPS code
//! - **Edges**: aggregated transfer capacity (MW) between a county pair, one
//!   edge per line type (AC, HVDC)
//!
//! Inputs are normalized once into typed records so that downstream stages
//! never look at raw column names:
//!
//! ```rust
//! use txcap_core::*;
//!
//! let branch = Branch {
//!     from_bus: Some(BusId::new("1")),
//!     to_bus: Some(BusId::new("2")),
//!     x: Some(ReactancePu(0.1)),
//!     rate_a: Some(MegavoltAmperes(300.0)),
//!     status: Some(1.0),
//!     ..Branch::default()
//! };
//! assert!(branch.is_in_service());
//! assert!(!branch.is_transformer());
//! ```
//!
//! ## Core Data Structures
//!
//! - [`GridTables`] - bus, branch, substation, bus2sub, zone and DC-line rows
//! - [`CountySet`] - county polygons with their coordinate reference
//! - [`EnrichedBus`] - a bus after geolocation (county, zone, interconnect)
//! - [`CountyEdge`] - one aggregated county-pair row
//! - Type-safe keys: [`BusId`], [`SubstationId`], [`ZoneId`], [`CountyFips`]
//!
//! ## Modules
//!
//! - [`diagnostics`] - data-quality issues recorded during a run
//! - [`graph_utils`] - county graph statistics and DOT export
//! - [`states`] - state FIPS -> postal abbreviation
//! - [`units`] - MW / MVA / kV / per-unit newtypes

use serde::{Deserialize, Serialize};

pub mod county;
pub mod diagnostics;
pub mod edge;
pub mod error;
pub mod graph_utils;
pub mod grid;
pub mod states;
pub mod units;

pub use county::{County, CountySet, Crs};
pub use diagnostics::{DiagnosticIssue, Diagnostics, RunDiagnostics, RunStats, Severity};
pub use edge::{AcMetrics, CountyEdge, EdgeColumn, EdgeEndpoint, EdgeMetrics, EdgeType, HvdcMetrics};
pub use error::{TxcapError, TxcapResult};
pub use graph_utils::*;
pub use grid::{
    Branch, BranchTable, Bus, BusSubstation, BusTable, CountyAssignment, DcLink, DcLinkTable,
    EnrichedBus, GridTables, Substation, Zone,
};
pub use states::{FipsPassthrough, StateLookup, UsStates};
pub use units::{Kilovolts, MegavoltAmperes, Megawatts, ReactancePu, SusceptancePu};

macro_rules! string_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[inline]
            pub fn new(value: impl Into<String>) -> Self {
                $name(value.into())
            }
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_key!(
    /// Bus key. Integer-valued ids are normalized to their integer text on load.
    BusId
);
string_key!(
    /// Substation key.
    SubstationId
);
string_key!(
    /// Load/balancing zone key.
    ZoneId
);
string_key!(
    /// 5-character county FIPS code (2-digit state + 3-digit county).
    ///
    /// Ordering is lexicographic, which is the ordering used to put county
    /// pairs into canonical low/high form.
    CountyFips
);

impl CountyFips {
    /// Normalize a raw county id. Numeric ids shorter than five digits are
    /// zero-padded (`8031` -> `"08031"`); other ids are kept verbatim.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.len() < 5 && trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Some(CountyFips(format!("{:0>5}", trimmed)));
        }
        Some(CountyFips(trimmed.to_string()))
    }

    /// Build a code from separate state and county numeric parts.
    pub fn from_parts(state: &str, county: &str) -> Option<Self> {
        let state = state.trim();
        let county = county.trim();
        if state.is_empty() || county.is_empty() {
            return None;
        }
        Some(CountyFips(format!("{:0>2}{:0>3}", state, county)))
    }

    /// Leading two characters of a well-formed code.
    pub fn state_part(&self) -> Option<&str> {
        if self.0.len() == 5 && self.0.is_char_boundary(2) {
            Some(&self.0[..2])
        } else {
            None
        }
    }
}
