//! Region selection over an edge table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use txcap_core::states::{fips_for_abbreviation, pad_state_fips};
use txcap_core::{CountyEdge, EdgeEndpoint, TxcapError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionType {
    /// Matches `From_zone_name` / `To_zone_name`
    Zone,
    /// Matches a state abbreviation or state FIPS code
    State,
    Interconnect,
}

impl FromStr for RegionType {
    type Err = TxcapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zone" => Ok(RegionType::Zone),
            "state" => Ok(RegionType::State),
            "interconnect" => Ok(RegionType::Interconnect),
            other => Err(TxcapError::InvalidOption(format!(
                "unknown region type '{other}'; use zone, state or interconnect"
            ))),
        }
    }
}

impl fmt::Display for RegionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RegionType::Zone => "zone",
            RegionType::State => "state",
            RegionType::Interconnect => "interconnect",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub kind: RegionType,
    pub name: String,
    /// State FIPS the name stands for (state regions only)
    state_fips: Option<String>,
}

impl Region {
    pub fn new(kind: RegionType, name: impl Into<String>) -> Self {
        let name = name.into();
        let state_fips = match kind {
            RegionType::State => Some(
                fips_for_abbreviation(&name)
                    .map(str::to_string)
                    .unwrap_or_else(|| pad_state_fips(&name)),
            ),
            _ => None,
        };
        Self {
            kind,
            name,
            state_fips,
        }
    }

    pub fn matches(&self, endpoint: &EdgeEndpoint) -> bool {
        match self.kind {
            RegionType::Zone => endpoint.zone_name.as_deref() == Some(self.name.as_str()),
            RegionType::Interconnect => {
                endpoint.interconnect.as_deref() == Some(self.name.as_str())
            }
            RegionType::State => {
                let by_label = endpoint
                    .state
                    .as_deref()
                    .is_some_and(|label| label.eq_ignore_ascii_case(self.name.trim()));
                let by_fips =
                    endpoint.state_fips.is_some() && endpoint.state_fips == self.state_fips;
                by_label || by_fips
            }
        }
    }
}

/// Edges with at least one endpoint inside the region, in input order.
pub fn filter_region(edges: &[CountyEdge], region: &Region) -> Vec<CountyEdge> {
    edges
        .iter()
        .filter(|edge| region.matches(&edge.from) || region.matches(&edge.to))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use txcap_core::{CountyFips, EdgeMetrics, HvdcMetrics, Megawatts};

    fn endpoint(fips: &str, state: &str, zone: &str, interconnect: &str) -> EdgeEndpoint {
        EdgeEndpoint {
            state_fips: Some(fips[..2].to_string()),
            state: Some(state.to_string()),
            zone_name: Some(zone.to_string()),
            interconnect: Some(interconnect.to_string()),
            ..EdgeEndpoint::bare(CountyFips::new(fips))
        }
    }

    fn edges() -> Vec<CountyEdge> {
        let co = endpoint("08031", "CO", "Colorado", "Western");
        let tx = endpoint("48201", "TX", "Texas", "ERCOT");
        let nm = endpoint("35001", "NM", "New Mexico", "Western");
        [(co.clone(), nm.clone()), (nm, tx.clone()), (tx.clone(), tx)]
            .into_iter()
            .map(|(from, to)| CountyEdge {
                from,
                to,
                capacity: Megawatts(100.0),
                metrics: EdgeMetrics::Hvdc(HvdcMetrics { n_links: 1 }),
            })
            .collect()
    }

    #[test]
    fn either_endpoint_may_match() {
        let region = Region::new(RegionType::Interconnect, "ERCOT");
        assert_eq!(filter_region(&edges(), &region).len(), 2);
        let region = Region::new(RegionType::Zone, "Colorado");
        assert_eq!(filter_region(&edges(), &region).len(), 1);
    }

    #[test]
    fn state_accepts_abbreviation_or_fips() {
        let by_abbr = filter_region(&edges(), &Region::new(RegionType::State, "nm"));
        let by_fips = filter_region(&edges(), &Region::new(RegionType::State, "35"));
        assert_eq!(by_abbr.len(), 2);
        assert_eq!(by_abbr, by_fips);
    }

    #[test]
    fn unknown_region_type_is_rejected() {
        assert!("county".parse::<RegionType>().is_err());
        assert_eq!("Zone".parse::<RegionType>().unwrap(), RegionType::Zone);
    }
}
