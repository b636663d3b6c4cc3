//! County-pair edges, the terminal artifact of a run.

use crate::units::{Kilovolts, MegavoltAmperes, Megawatts, ReactancePu, SusceptancePu};
use crate::{CountyFips, TxcapError, ZoneId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EdgeType {
    #[serde(rename = "AC")]
    Ac,
    #[serde(rename = "HVDC")]
    Hvdc,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Ac => "AC",
            EdgeType::Hvdc => "HVDC",
        }
    }
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeType {
    type Err = TxcapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AC" => Ok(EdgeType::Ac),
            "HVDC" | "DC" => Ok(EdgeType::Hvdc),
            other => Err(TxcapError::Parse(format!("unknown edge type '{other}'"))),
        }
    }
}

/// Descriptive metadata for one side of an edge. Every field other than the
/// FIPS code is the most frequent non-null value among contributing rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeEndpoint {
    pub fips: CountyFips,
    pub county: Option<String>,
    pub state_fips: Option<String>,
    /// State abbreviation derived from `state_fips`
    pub state: Option<String>,
    pub zone: Option<ZoneId>,
    pub zone_name: Option<String>,
    pub interconnect: Option<String>,
}

impl EdgeEndpoint {
    pub fn bare(fips: CountyFips) -> Self {
        Self {
            fips,
            county: None,
            state_fips: None,
            state: None,
            zone: None,
            zone_name: None,
            interconnect: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcMetrics {
    pub n_circuits: usize,
    pub sum_rate_mva: MegavoltAmperes,
    pub sum_b_pu: SusceptancePu,
    /// 1 / `sum_b_pu`, undefined when the sum is zero
    pub x_eq_pu: Option<ReactancePu>,
    pub pf_used_med: Option<f64>,
    /// Median of the lower endpoint voltage (by-voltage power factor only)
    pub kv_min_med: Option<Kilovolts>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HvdcMetrics {
    pub n_links: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EdgeMetrics {
    Ac(AcMetrics),
    Hvdc(HvdcMetrics),
}

/// One row of the output edge table. `from.fips <= to.fips` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyEdge {
    pub from: EdgeEndpoint,
    pub to: EdgeEndpoint,
    pub capacity: Megawatts,
    pub metrics: EdgeMetrics,
}

impl CountyEdge {
    pub fn edge_type(&self) -> EdgeType {
        match self.metrics {
            EdgeMetrics::Ac(_) => EdgeType::Ac,
            EdgeMetrics::Hvdc(_) => EdgeType::Hvdc,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.from.fips == self.to.fips
    }

    pub fn ac(&self) -> Option<&AcMetrics> {
        match &self.metrics {
            EdgeMetrics::Ac(m) => Some(m),
            EdgeMetrics::Hvdc(_) => None,
        }
    }

    pub fn hvdc(&self) -> Option<&HvdcMetrics> {
        match &self.metrics {
            EdgeMetrics::Hvdc(m) => Some(m),
            EdgeMetrics::Ac(_) => None,
        }
    }
}

/// Columns of the edge table in canonical presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeColumn {
    EdgeType,
    FromState,
    FromFips,
    FromCounty,
    FromZone,
    FromZoneName,
    FromInterconnect,
    ToState,
    ToFips,
    ToCounty,
    ToZone,
    ToZoneName,
    ToInterconnect,
    TxCapacityMw,
    NCircuits,
    NLinks,
    SumRateMva,
    SumBPu,
    XEqPu,
    PfUsedMed,
    KvMinMed,
}

impl EdgeColumn {
    pub const ALL: [EdgeColumn; 21] = [
        EdgeColumn::EdgeType,
        EdgeColumn::FromState,
        EdgeColumn::FromFips,
        EdgeColumn::FromCounty,
        EdgeColumn::FromZone,
        EdgeColumn::FromZoneName,
        EdgeColumn::FromInterconnect,
        EdgeColumn::ToState,
        EdgeColumn::ToFips,
        EdgeColumn::ToCounty,
        EdgeColumn::ToZone,
        EdgeColumn::ToZoneName,
        EdgeColumn::ToInterconnect,
        EdgeColumn::TxCapacityMw,
        EdgeColumn::NCircuits,
        EdgeColumn::NLinks,
        EdgeColumn::SumRateMva,
        EdgeColumn::SumBPu,
        EdgeColumn::XEqPu,
        EdgeColumn::PfUsedMed,
        EdgeColumn::KvMinMed,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EdgeColumn::EdgeType => "edge_type",
            EdgeColumn::FromState => "From_state",
            EdgeColumn::FromFips => "From_fips",
            EdgeColumn::FromCounty => "From_County",
            EdgeColumn::FromZone => "From_zone",
            EdgeColumn::FromZoneName => "From_zone_name",
            EdgeColumn::FromInterconnect => "From_interconnect",
            EdgeColumn::ToState => "To_state",
            EdgeColumn::ToFips => "To_fips",
            EdgeColumn::ToCounty => "To_County",
            EdgeColumn::ToZone => "To_zone",
            EdgeColumn::ToZoneName => "To_zone_name",
            EdgeColumn::ToInterconnect => "To_interconnect",
            EdgeColumn::TxCapacityMw => "Tx_Capacity_MW",
            EdgeColumn::NCircuits => "n_circuits",
            EdgeColumn::NLinks => "n_links",
            EdgeColumn::SumRateMva => "sum_rate_mva",
            EdgeColumn::SumBPu => "sum_B_pu",
            EdgeColumn::XEqPu => "x_eq_pu",
            EdgeColumn::PfUsedMed => "pf_used_med",
            EdgeColumn::KvMinMed => "kv_min_med",
        }
    }

    /// Edge type a column is specific to; `None` for columns shared by both.
    pub fn specific_to(&self) -> Option<EdgeType> {
        match self {
            EdgeColumn::NCircuits
            | EdgeColumn::SumRateMva
            | EdgeColumn::SumBPu
            | EdgeColumn::XEqPu
            | EdgeColumn::PfUsedMed
            | EdgeColumn::KvMinMed => Some(EdgeType::Ac),
            EdgeColumn::NLinks => Some(EdgeType::Hvdc),
            _ => None,
        }
    }
}
