//! Endpoint join, canonical county pairs and per-side metadata shared by the
//! AC and HVDC engines.

use std::collections::{BTreeMap, HashMap};

use txcap_core::{BusId, CountyAssignment, CountyFips, EdgeEndpoint, EnrichedBus, StateLookup};

use crate::mode::mode;

/// Enriched buses keyed by id. A duplicated bus id keeps its first row.
pub struct BusIndex<'a> {
    by_id: HashMap<&'a BusId, &'a EnrichedBus>,
    /// Whether the bus table carried nominal voltages
    pub has_base_kv: bool,
}

impl<'a> BusIndex<'a> {
    pub fn new(buses: &'a [EnrichedBus], has_base_kv: bool) -> Self {
        let mut by_id = HashMap::with_capacity(buses.len());
        for bus in buses {
            by_id.entry(&bus.id).or_insert(bus);
        }
        Self { by_id, has_base_kv }
    }

    pub fn get(&self, id: &BusId) -> Option<&'a EnrichedBus> {
        self.by_id.get(id).copied()
    }

    /// The bus and its county, if both exist.
    fn resolved(&self, id: Option<&BusId>) -> Option<(&'a EnrichedBus, &'a CountyFips)> {
        let bus = id.and_then(|id| self.get(id))?;
        bus.county_fips().map(|fips| (bus, fips))
    }
}

/// One circuit or link with both ends resolved, oriented so that
/// `low.fips <= high.fips`.
#[derive(Debug)]
pub struct PairedRow<'a, P> {
    pub low: &'a EnrichedBus,
    pub high: &'a EnrichedBus,
    low_fips: &'a CountyFips,
    high_fips: &'a CountyFips,
    pub payload: P,
}

impl<'a, P> PairedRow<'a, P> {
    pub fn key(&self) -> (CountyFips, CountyFips) {
        (self.low_fips.clone(), self.high_fips.clone())
    }

    /// Replace the payload, given both (oriented) endpoint buses.
    pub fn map_payload<Q>(
        self,
        f: impl FnOnce(&'a EnrichedBus, &'a EnrichedBus, P) -> Q,
    ) -> PairedRow<'a, Q> {
        PairedRow {
            low: self.low,
            high: self.high,
            low_fips: self.low_fips,
            high_fips: self.high_fips,
            payload: f(self.low, self.high, self.payload),
        }
    }
}

/// Rows removed by the endpoint join.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinDrops {
    pub unresolved: usize,
    pub intra_county: usize,
}

/// Attach endpoint buses, drop rows with an unresolved end and (unless
/// `keep_intra_county`) rows inside one county, then orient each pair.
pub fn pair_rows<'a, 'b, P>(
    rows: impl IntoIterator<Item = (Option<&'b BusId>, Option<&'b BusId>, P)>,
    index: &BusIndex<'a>,
    keep_intra_county: bool,
) -> (Vec<PairedRow<'a, P>>, JoinDrops) {
    let mut drops = JoinDrops::default();
    let mut paired = Vec::new();
    for (from, to, payload) in rows {
        let (Some(origin), Some(dest)) = (index.resolved(from), index.resolved(to)) else {
            drops.unresolved += 1;
            continue;
        };
        if origin.1 == dest.1 && !keep_intra_county {
            drops.intra_county += 1;
            continue;
        }
        // Both sides swap together so metadata follows its county.
        let ((low, low_fips), (high, high_fips)) = if dest.1 < origin.1 {
            (dest, origin)
        } else {
            (origin, dest)
        };
        paired.push(PairedRow {
            low,
            high,
            low_fips,
            high_fips,
            payload,
        });
    }
    (paired, drops)
}

/// Group rows by canonical pair. Keys iterate in (low, high) order and rows
/// keep their input order inside a group.
pub fn group_pairs<'a, P>(
    rows: Vec<PairedRow<'a, P>>,
) -> BTreeMap<(CountyFips, CountyFips), Vec<PairedRow<'a, P>>> {
    let mut groups: BTreeMap<(CountyFips, CountyFips), Vec<PairedRow<'a, P>>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.key()).or_default().push(row);
    }
    groups
}

/// Edge endpoint for one side of a group: every descriptive field is the
/// mode of its non-null values over the group's rows.
pub fn endpoint_metadata(
    fips: CountyFips,
    side: &[&EnrichedBus],
    states: &dyn StateLookup,
) -> EdgeEndpoint {
    let state_fips = mode(
        side.iter()
            .map(|bus| county_of(bus).and_then(|c| c.state_fips.clone())),
    );
    EdgeEndpoint {
        county: mode(side.iter().map(|bus| county_of(bus).and_then(|c| c.name.clone()))),
        state: state_fips.as_deref().map(|sf| states.label(sf)),
        state_fips,
        zone: mode(side.iter().map(|bus| bus.zone.clone())),
        zone_name: mode(side.iter().map(|bus| bus.zone_name.clone())),
        interconnect: mode(side.iter().map(|bus| bus.interconnect.clone())),
        fips,
    }
}

fn county_of(bus: &EnrichedBus) -> Option<&CountyAssignment> {
    bus.county.as_ref()
}

/// Low and high endpoints of a group.
pub fn group_endpoints<P>(
    key: &(CountyFips, CountyFips),
    rows: &[PairedRow<'_, P>],
    states: &dyn StateLookup,
) -> (EdgeEndpoint, EdgeEndpoint) {
    let lows: Vec<&EnrichedBus> = rows.iter().map(|r| r.low).collect();
    let highs: Vec<&EnrichedBus> = rows.iter().map(|r| r.high).collect();
    (
        endpoint_metadata(key.0.clone(), &lows, states),
        endpoint_metadata(key.1.clone(), &highs, states),
    )
}
