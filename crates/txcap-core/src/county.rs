//! County polygon layer.

use crate::error::{TxcapError, TxcapResult};
use crate::CountyFips;
use geo::MultiPolygon;

/// Coordinate reference of a polygon layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crs {
    Epsg(u32),
    /// OGC CRS84: WGS84 with lon/lat axis order (the GeoJSON default)
    Crs84,
}

impl Default for Crs {
    /// Layers that do not declare a CRS are taken to be NAD83 (EPSG:4269).
    fn default() -> Self {
        Crs::Epsg(4269)
    }
}

impl Crs {
    /// Parse `EPSG:4326`, `urn:ogc:def:crs:EPSG::4269`,
    /// `urn:ogc:def:crs:OGC:1.3:CRS84` and similar spellings.
    pub fn parse(name: &str) -> TxcapResult<Self> {
        let upper = name.trim().to_ascii_uppercase();
        if upper.ends_with("CRS84") {
            return Ok(Crs::Crs84);
        }
        if let Some(pos) = upper.rfind("EPSG") {
            let code = upper[pos + 4..].trim_start_matches(':');
            return code
                .parse::<u32>()
                .map(Crs::Epsg)
                .map_err(|_| TxcapError::UnsupportedCrs(name.to_string()));
        }
        Err(TxcapError::UnsupportedCrs(name.to_string()))
    }

    /// Whether coordinates are geographic lon/lat degrees compatible with
    /// substation points given in EPSG:4326. NAD83 and WGS84 differ by less
    /// than the precision of county boundaries, so both qualify.
    pub fn is_lon_lat(&self) -> bool {
        matches!(self, Crs::Crs84 | Crs::Epsg(4326) | Crs::Epsg(4269))
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Crs::Epsg(code) => write!(f, "EPSG:{code}"),
            Crs::Crs84 => f.write_str("OGC:CRS84"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct County {
    pub fips: CountyFips,
    pub name: Option<String>,
    pub state_fips: Option<String>,
    pub geometry: MultiPolygon<f64>,
}

/// Counties in source order. Source order breaks ties between overlapping
/// polygons.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountySet {
    pub counties: Vec<County>,
    pub crs: Crs,
}

impl CountySet {
    pub fn new(counties: Vec<County>, crs: Crs) -> Self {
        Self { counties, crs }
    }

    pub fn len(&self) -> usize {
        self.counties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counties.is_empty()
    }

    /// Fail unless the layer can be joined against lon/lat points.
    pub fn ensure_lon_lat(&self) -> TxcapResult<()> {
        if self.crs.is_lon_lat() {
            Ok(())
        } else {
            Err(TxcapError::UnsupportedCrs(format!(
                "county layer is in {}, expected geographic lon/lat (EPSG:4326 or EPSG:4269)",
                self.crs
            )))
        }
    }
}
