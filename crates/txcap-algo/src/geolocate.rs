//! Bus -> substation -> county resolution.
//!
//! The chain is:
//!
//! 1. **bus -> substation** from the `bus2sub` mapping. A bus listed more than
//!    once keeps the first row, so the mapping's row order is part of its
//!    contract.
//! 2. **substation -> county** by strict point-in-polygon ("within") of the
//!    substation's (lon, lat) against the county layer, through a
//!    [`PointLocator`]. Points on a boundary or outside every polygon get no
//!    county.
//! 3. **zone** from the substation, else from the bus; zone name and
//!    interconnect from the zone table.
//!
//! Unresolved buses are kept with a null county and dropped by the
//! aggregation stages.

use std::collections::HashMap;

use tracing::{info, warn};
use txcap_core::{
    BusId, County, CountyAssignment, CountyFips, CountySet, Diagnostics, EnrichedBus, GridTables,
    Substation, SubstationId, TxcapResult, Zone, ZoneId,
};

/// Finds the county polygon containing a point.
pub trait PointLocator {
    /// Index into the county layer of the first polygon (in source order)
    /// that strictly contains `(lon, lat)`.
    fn locate(&self, lon: f64, lat: f64) -> Option<usize>;
}

#[cfg(feature = "spatial")]
mod rtree {
    use geo::{BoundingRect, Contains, Point};
    use rstar::{
        primitives::{GeomWithData, Rectangle},
        RTree,
    };
    use txcap_core::County;

    use super::PointLocator;

    type Entry = GeomWithData<Rectangle<[f64; 2]>, usize>;

    /// Bounding-box R-tree over the county layer with exact containment on
    /// the candidates.
    pub struct RTreeLocator<'a> {
        counties: &'a [County],
        tree: RTree<Entry>,
    }

    impl<'a> RTreeLocator<'a> {
        pub fn new(counties: &'a [County]) -> Self {
            let entries: Vec<Entry> = counties
                .iter()
                .enumerate()
                .filter_map(|(idx, county)| {
                    county.geometry.bounding_rect().map(|rect| {
                        let min = rect.min();
                        let max = rect.max();
                        GeomWithData::new(
                            Rectangle::from_corners([min.x, min.y], [max.x, max.y]),
                            idx,
                        )
                    })
                })
                .collect();
            Self {
                counties,
                tree: RTree::bulk_load(entries),
            }
        }
    }

    impl PointLocator for RTreeLocator<'_> {
        fn locate(&self, lon: f64, lat: f64) -> Option<usize> {
            let point = Point::new(lon, lat);
            let mut candidates: Vec<usize> = self
                .tree
                .locate_all_at_point(&[lon, lat])
                .map(|entry| entry.data)
                .collect();
            candidates.sort_unstable();
            candidates
                .into_iter()
                .find(|idx| self.counties[*idx].geometry.contains(&point))
        }
    }
}

#[cfg(feature = "spatial")]
pub use rtree::RTreeLocator;

/// The point locator compiled into this build.
#[cfg(feature = "spatial")]
pub fn point_locator(counties: &CountySet) -> TxcapResult<Box<dyn PointLocator + '_>> {
    Ok(Box::new(RTreeLocator::new(&counties.counties)))
}

#[cfg(not(feature = "spatial"))]
pub fn point_locator(_counties: &CountySet) -> TxcapResult<Box<dyn PointLocator + '_>> {
    Err(txcap_core::TxcapError::CapabilityUnavailable(
        "point-in-polygon join is disabled; rebuild txcap-algo with the 'spatial' feature".into(),
    ))
}

/// Result of geolocating every bus.
#[derive(Debug, Clone, Default)]
pub struct Geolocation {
    /// One row per bus, in bus table order
    pub buses: Vec<EnrichedBus>,
    pub diagnostics: Diagnostics,
    pub substations_resolved: usize,
}

impl Geolocation {
    /// Bus id -> county FIPS for resolved buses.
    pub fn bus_to_county(&self) -> HashMap<&BusId, &CountyFips> {
        self.buses
            .iter()
            .filter_map(|bus| bus.county_fips().map(|fips| (&bus.id, fips)))
            .collect()
    }

    pub fn resolved_count(&self) -> usize {
        self.buses.iter().filter(|b| b.county.is_some()).count()
    }
}

struct SubstationSite<'a> {
    county: Option<&'a County>,
    zone: Option<&'a ZoneId>,
}

pub fn geolocate_buses(
    grid: &GridTables,
    counties: &CountySet,
    locator: &dyn PointLocator,
) -> TxcapResult<Geolocation> {
    counties.ensure_lon_lat()?;
    let mut diagnostics = Diagnostics::new();

    let bus_to_sub = first_substation_per_bus(grid, &mut diagnostics);

    let mut sites: HashMap<&SubstationId, SubstationSite> = HashMap::new();
    let mut without_coordinates = 0usize;
    let mut outside = 0usize;
    for sub in &grid.substations {
        if sites.contains_key(&sub.id) {
            continue;
        }
        let county = locate_substation(
            sub,
            counties,
            locator,
            &mut without_coordinates,
            &mut outside,
        );
        sites.insert(
            &sub.id,
            SubstationSite {
                county,
                zone: sub.zone.as_ref(),
            },
        );
    }
    let substations_resolved = sites.values().filter(|s| s.county.is_some()).count();
    if without_coordinates > 0 {
        warn!(without_coordinates, "substations without usable coordinates");
    }
    if outside > 0 {
        warn!(outside, "substations outside every county polygon");
    }
    diagnostics.add_warning_count(
        "substation_coordinates",
        "substations without usable lat/lon",
        without_coordinates,
    );
    diagnostics.add_warning_count(
        "substation_outside",
        "substations outside every county polygon",
        outside,
    );

    let zones: HashMap<&ZoneId, &Zone> = match &grid.zones {
        Some(zones) => {
            let mut map = HashMap::with_capacity(zones.len());
            for zone in zones {
                map.entry(&zone.id).or_insert(zone);
            }
            map
        }
        None => HashMap::new(),
    };

    let mut buses = Vec::with_capacity(grid.buses.rows.len());
    let mut unresolved = 0usize;
    for bus in &grid.buses.rows {
        let substation = bus_to_sub.get(&bus.id).copied();
        let site = substation.and_then(|sub| sites.get(sub));
        let county = site.and_then(|s| s.county).map(|county| CountyAssignment {
            fips: county.fips.clone(),
            name: county.name.clone(),
            state_fips: county.state_fips.clone(),
        });
        if county.is_none() {
            unresolved += 1;
        }
        let zone = site
            .and_then(|s| s.zone)
            .or(bus.zone.as_ref())
            .cloned();
        let zone_row = zone.as_ref().and_then(|z| zones.get(z));
        buses.push(EnrichedBus {
            id: bus.id.clone(),
            base_kv: bus.base_kv,
            substation: substation.cloned(),
            county,
            zone_name: zone_row.and_then(|z| z.name.clone()),
            interconnect: zone_row.and_then(|z| z.interconnect.clone()),
            zone,
        });
    }
    if unresolved > 0 {
        warn!(
            unresolved,
            total = buses.len(),
            "buses without a county; their circuits will be dropped"
        );
    }
    diagnostics.add_warning_count("unresolved_bus", "buses without a county", unresolved);
    info!(
        buses = buses.len(),
        resolved = buses.len() - unresolved,
        substations_resolved,
        "bus geolocation complete"
    );

    Ok(Geolocation {
        buses,
        diagnostics,
        substations_resolved,
    })
}

fn first_substation_per_bus<'a>(
    grid: &'a GridTables,
    diagnostics: &mut Diagnostics,
) -> HashMap<&'a BusId, &'a SubstationId> {
    let mut bus_to_sub: HashMap<&BusId, &SubstationId> = HashMap::new();
    let mut listings: HashMap<&BusId, usize> = HashMap::new();
    for row in &grid.bus_substations {
        bus_to_sub.entry(&row.bus).or_insert(&row.substation);
        *listings.entry(&row.bus).or_default() += 1;
    }
    let multi = listings.values().filter(|count| **count > 1).count();
    if multi > 0 {
        info!(
            buses = multi,
            "buses listed with several substations; keeping the first listing"
        );
    } else {
        info!("no multi-substation buses");
    }
    diagnostics.add_info_count(
        "multi_substation",
        "buses listed with several substations (first kept)",
        multi,
    );
    bus_to_sub
}

fn locate_substation<'c>(
    sub: &Substation,
    counties: &'c CountySet,
    locator: &dyn PointLocator,
    without_coordinates: &mut usize,
    outside: &mut usize,
) -> Option<&'c County> {
    let Some((lon, lat)) = sub.lon_lat() else {
        *without_coordinates += 1;
        return None;
    };
    match locator.locate(lon, lat) {
        Some(idx) => counties.counties.get(idx),
        None => {
            *outside += 1;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};
    use txcap_core::{Bus, BusSubstation, BusTable, Crs, TxcapError};

    fn square(x0: f64, y0: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
            (x: x0, y: y0),
        ]])
    }

    fn county(fips: &str, geometry: MultiPolygon<f64>) -> County {
        County {
            fips: CountyFips::new(fips),
            name: Some(format!("County {fips}")),
            state_fips: Some(fips[..2].to_string()),
            geometry,
        }
    }

    fn grid(subs: &[(&str, f64, f64)], mapping: &[(&str, &str)], buses: &[&str]) -> GridTables {
        GridTables {
            buses: BusTable {
                rows: buses
                    .iter()
                    .map(|id| Bus {
                        id: BusId::new(*id),
                        base_kv: None,
                        zone: Some(ZoneId::new("9")),
                    })
                    .collect(),
                has_base_kv: false,
            },
            substations: subs
                .iter()
                .map(|(id, lon, lat)| Substation {
                    id: SubstationId::new(*id),
                    lat: Some(*lat),
                    lon: Some(*lon),
                    zone: None,
                })
                .collect(),
            bus_substations: mapping
                .iter()
                .map(|(bus, sub)| BusSubstation {
                    bus: BusId::new(*bus),
                    substation: SubstationId::new(*sub),
                })
                .collect(),
            ..GridTables::default()
        }
    }

    /// Brute-force locator used to exercise the resolution chain without
    /// the R-tree.
    struct Scan<'a>(&'a CountySet);

    impl PointLocator for Scan<'_> {
        fn locate(&self, lon: f64, lat: f64) -> Option<usize> {
            use geo::{Contains, Point};
            self.0
                .counties
                .iter()
                .position(|c| c.geometry.contains(&Point::new(lon, lat)))
        }
    }

    #[test]
    fn first_listed_substation_wins() {
        let counties = CountySet::new(
            vec![county("08031", square(0.0, 0.0, 1.0)), county("08059", square(1.0, 0.0, 1.0))],
            Crs::default(),
        );
        let grid = grid(
            &[("10", 0.5, 0.5), ("20", 1.5, 0.5)],
            &[("1", "20"), ("1", "10")],
            &["1"],
        );
        let geo = geolocate_buses(&grid, &counties, &Scan(&counties)).unwrap();
        assert_eq!(geo.buses[0].county_fips().unwrap().as_str(), "08059");
        assert_eq!(geo.diagnostics.count_for("multi_substation"), 1);
    }

    #[test]
    fn boundary_points_are_unresolved() {
        let counties = CountySet::new(vec![county("08031", square(0.0, 0.0, 1.0))], Crs::default());
        let grid = grid(&[("10", 1.0, 0.5)], &[("1", "10")], &["1", "2"]);
        let geo = geolocate_buses(&grid, &counties, &Scan(&counties)).unwrap();
        assert_eq!(geo.resolved_count(), 0);
        assert_eq!(geo.diagnostics.count_for("unresolved_bus"), 2);
        assert_eq!(geo.diagnostics.count_for("substation_outside"), 1);
    }

    #[test]
    fn zone_falls_back_to_bus_and_joins_zone_table() {
        let counties = CountySet::new(vec![county("08031", square(0.0, 0.0, 1.0))], Crs::default());
        let mut grid = grid(&[("10", 0.5, 0.5)], &[("1", "10")], &["1"]);
        grid.zones = Some(vec![Zone {
            id: ZoneId::new("9"),
            name: Some("Colorado".into()),
            interconnect: Some("Western".into()),
        }]);
        let geo = geolocate_buses(&grid, &counties, &Scan(&counties)).unwrap();
        let bus = &geo.buses[0];
        assert_eq!(bus.zone.as_ref().unwrap().as_str(), "9");
        assert_eq!(bus.zone_name.as_deref(), Some("Colorado"));
        assert_eq!(bus.interconnect.as_deref(), Some("Western"));
        assert_eq!(bus.county.as_ref().unwrap().state_fips.as_deref(), Some("08"));
    }

    #[test]
    fn projected_county_layer_is_rejected() {
        let counties = CountySet::new(vec![], Crs::Epsg(3857));
        let grid = grid(&[], &[], &[]);
        assert!(matches!(
            geolocate_buses(&grid, &counties, &Scan(&counties)),
            Err(TxcapError::UnsupportedCrs(_))
        ));
    }

    #[cfg(feature = "spatial")]
    #[test]
    fn rtree_prefers_first_overlapping_polygon() {
        let counties = CountySet::new(
            vec![
                county("08001", square(10.0, 10.0, 1.0)),
                county("08031", square(0.0, 0.0, 2.0)),
                county("08059", square(0.5, 0.5, 2.0)),
            ],
            Crs::default(),
        );
        let locator = point_locator(&counties).unwrap();
        assert_eq!(locator.locate(1.0, 1.0), Some(1));
        assert_eq!(locator.locate(2.2, 2.2), Some(2));
        assert_eq!(locator.locate(10.5, 10.5), Some(0));
        assert_eq!(locator.locate(2.0, 0.25), None);
        assert_eq!(locator.locate(-3.0, -3.0), None);
    }
}
