//! Typed rows of the MATPOWER-style grid tables.
//!
//! Column presence matters for some filters (a missing `status` column means
//! "no filtering", while a present column with a null value means "not in
//! service"), so each table keeps the relevant presence flags next to its rows.

use crate::units::{Kilovolts, MegavoltAmperes, Megawatts, ReactancePu};
use crate::{BusId, CountyFips, SubstationId, ZoneId};
use serde::{Deserialize, Serialize};

/// MATPOWER in-service status value.
pub const IN_SERVICE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bus {
    pub id: BusId,
    pub base_kv: Option<Kilovolts>,
    pub zone: Option<ZoneId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusTable {
    pub rows: Vec<Bus>,
    /// Whether the source table carried a nominal-voltage column
    pub has_base_kv: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substation {
    pub id: SubstationId,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub zone: Option<ZoneId>,
}

impl Substation {
    /// (lon, lat) when both coordinates are present and finite
    pub fn lon_lat(&self) -> Option<(f64, f64)> {
        match (self.lon, self.lat) {
            (Some(lon), Some(lat)) if lon.is_finite() && lat.is_finite() => Some((lon, lat)),
            _ => None,
        }
    }
}

/// One row of the bus -> substation mapping.
///
/// Row order is significant: when a bus is listed with several substations
/// the first row wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusSubstation {
    pub bus: BusId,
    pub substation: SubstationId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: Option<String>,
    pub interconnect: Option<String>,
}

/// An AC circuit between two buses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub from_bus: Option<BusId>,
    pub to_bus: Option<BusId>,
    pub x: Option<ReactancePu>,
    pub rate_a: Option<MegavoltAmperes>,
    pub rate_b: Option<MegavoltAmperes>,
    pub rate_c: Option<MegavoltAmperes>,
    pub status: Option<f64>,
    /// Off-nominal tap ratio; nonzero marks a transformer
    pub ratio: Option<f64>,
}

impl Branch {
    pub fn is_in_service(&self) -> bool {
        self.status == Some(IN_SERVICE)
    }

    pub fn is_transformer(&self) -> bool {
        matches!(self.ratio, Some(ratio) if ratio != 0.0 && !ratio.is_nan())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BranchTable {
    pub rows: Vec<Branch>,
    pub has_status: bool,
    pub has_ratio: bool,
}

/// A point-to-point HVDC link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DcLink {
    pub from_bus: Option<BusId>,
    pub to_bus: Option<BusId>,
    pub pmax: Option<Megawatts>,
    pub status: Option<f64>,
}

impl DcLink {
    pub fn is_in_service(&self) -> bool {
        self.status == Some(IN_SERVICE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DcLinkTable {
    pub rows: Vec<DcLink>,
    pub has_status: bool,
}

/// All grid tables of one dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridTables {
    pub buses: BusTable,
    pub branches: BranchTable,
    pub substations: Vec<Substation>,
    pub bus_substations: Vec<BusSubstation>,
    pub zones: Option<Vec<Zone>>,
    pub dc_links: Option<DcLinkTable>,
    /// Required fields a present dcline table lacked. Such a table is
    /// carried as no HVDC data.
    pub dcline_missing: Vec<String>,
}

/// County attributes attached to a bus through its substation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyAssignment {
    pub fips: CountyFips,
    pub name: Option<String>,
    pub state_fips: Option<String>,
}

/// A bus after geolocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedBus {
    pub id: BusId,
    pub base_kv: Option<Kilovolts>,
    pub substation: Option<SubstationId>,
    pub county: Option<CountyAssignment>,
    pub zone: Option<ZoneId>,
    pub zone_name: Option<String>,
    pub interconnect: Option<String>,
}

impl EnrichedBus {
    pub fn county_fips(&self) -> Option<&CountyFips> {
        self.county.as_ref().map(|c| &c.fips)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_must_equal_in_service_value() {
        let mut branch = Branch {
            status: Some(1.0),
            ..Branch::default()
        };
        assert!(branch.is_in_service());
        branch.status = Some(0.0);
        assert!(!branch.is_in_service());
        branch.status = None;
        assert!(!branch.is_in_service());
    }

    #[test]
    fn transformer_requires_nonzero_ratio() {
        let mut branch = Branch::default();
        assert!(!branch.is_transformer());
        branch.ratio = Some(0.0);
        assert!(!branch.is_transformer());
        branch.ratio = Some(f64::NAN);
        assert!(!branch.is_transformer());
        branch.ratio = Some(1.05);
        assert!(branch.is_transformer());
    }

    #[test]
    fn substation_coordinates_must_be_finite() {
        let sub = Substation {
            id: SubstationId::new("100"),
            lat: Some(39.7),
            lon: Some(-104.9),
            zone: None,
        };
        assert_eq!(sub.lon_lat(), Some((-104.9, 39.7)));

        let missing = Substation {
            lat: Some(f64::NAN),
            ..sub
        };
        assert_eq!(missing.lon_lat(), None);
    }
}
