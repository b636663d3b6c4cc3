//! HVDC links -> county-pair edges.

use tracing::{info, warn};
use txcap_core::{
    CountyEdge, DcLinkTable, Diagnostics, EdgeMetrics, HvdcMetrics, Megawatts, StateLookup,
};

use crate::options::AggregationOptions;
use crate::pairing::{group_endpoints, group_pairs, pair_rows, BusIndex};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HvdcCounts {
    pub input: usize,
    pub out_of_service: usize,
    pub unresolved: usize,
    pub intra_county: usize,
    pub aggregated: usize,
}

#[derive(Debug, Clone, Default)]
pub struct HvdcAggregation {
    pub edges: Vec<CountyEdge>,
    pub diagnostics: Diagnostics,
    pub counts: HvdcCounts,
}

/// Aggregate DC links. Returns `None` when the dataset has no DC-line table;
/// a table whose links all drop yields an empty edge list.
pub fn aggregate_hvdc(
    links: Option<&DcLinkTable>,
    buses: &BusIndex<'_>,
    options: &AggregationOptions,
    states: &dyn StateLookup,
) -> Option<HvdcAggregation> {
    let Some(links) = links else {
        info!("no HVDC data");
        return None;
    };
    let mut counts = HvdcCounts {
        input: links.rows.len(),
        ..HvdcCounts::default()
    };

    let rows: Vec<_> = links
        .rows
        .iter()
        .filter(|link| {
            let keep = !links.has_status || link.is_in_service();
            if !keep {
                counts.out_of_service += 1;
            }
            keep
        })
        .map(|link| (link.from_bus.as_ref(), link.to_bus.as_ref(), link.pmax))
        .collect();

    let (paired, drops) = pair_rows(rows, buses, options.keep_intra_county);
    counts.unresolved = drops.unresolved;
    counts.intra_county = drops.intra_county;
    counts.aggregated = paired.len();

    let edges: Vec<CountyEdge> = group_pairs(paired)
        .into_iter()
        .map(|(key, group)| {
            let (from, to) = group_endpoints(&key, &group, states);
            CountyEdge {
                from,
                to,
                capacity: group.iter().filter_map(|row| row.payload).sum::<Megawatts>(),
                metrics: EdgeMetrics::Hvdc(HvdcMetrics {
                    n_links: group.len(),
                }),
            }
        })
        .collect();

    let mut diagnostics = Diagnostics::new();
    if counts.unresolved > 0 {
        warn!(
            dropped = counts.unresolved,
            "DC links with an endpoint outside every county dropped"
        );
    }
    diagnostics.add_warning_count(
        "unresolved_dc_link",
        "DC links dropped for an unresolved endpoint",
        counts.unresolved,
    );
    diagnostics.add_info_count(
        "out_of_service",
        "DC links filtered by status",
        counts.out_of_service,
    );
    diagnostics.add_info_count(
        "intra_county",
        "intra-county DC links dropped",
        counts.intra_county,
    );

    if edges.is_empty() {
        info!("no HVDC edges");
    } else {
        info!(links = counts.aggregated, edges = edges.len(), "HVDC aggregation complete");
    }

    Some(HvdcAggregation {
        edges,
        diagnostics,
        counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairing::fixtures::bus;
    use txcap_core::{BusId, DcLink, UsStates};

    fn link(from: &str, to: &str, pmax: Option<f64>, status: f64) -> DcLink {
        DcLink {
            from_bus: Some(BusId::new(from)),
            to_bus: Some(BusId::new(to)),
            pmax: pmax.map(Megawatts),
            status: Some(status),
        }
    }

    #[test]
    fn absent_table_is_not_an_error() {
        let buses = vec![bus("1", Some("08031"), None)];
        let index = BusIndex::new(&buses, false);
        let result = aggregate_hvdc(None, &index, &AggregationOptions::default(), &UsStates);
        assert!(result.is_none());
    }

    #[test]
    fn links_sum_per_pair_and_null_pmax_adds_nothing() {
        let buses = vec![bus("1", Some("08031"), None), bus("3", Some("08013"), None)];
        let index = BusIndex::new(&buses, false);
        let table = DcLinkTable {
            rows: vec![
                link("1", "3", Some(500.0), 1.0),
                link("3", "1", None, 1.0),
                link("1", "3", Some(250.0), 0.0),
            ],
            has_status: true,
        };
        let result =
            aggregate_hvdc(Some(&table), &index, &AggregationOptions::default(), &UsStates)
                .unwrap();
        assert_eq!(result.edges.len(), 1);
        let edge = &result.edges[0];
        assert_eq!(edge.from.fips.as_str(), "08013");
        assert_eq!(edge.to.fips.as_str(), "08031");
        assert_eq!(edge.capacity, Megawatts(500.0));
        assert_eq!(edge.hvdc().unwrap().n_links, 2);
        assert_eq!(result.counts.out_of_service, 1);
    }

    #[test]
    fn all_links_dropped_gives_empty_edges() {
        let buses = vec![bus("1", Some("08031"), None)];
        let index = BusIndex::new(&buses, false);
        let table = DcLinkTable {
            rows: vec![link("1", "99", Some(500.0), 1.0)],
            has_status: true,
        };
        let result =
            aggregate_hvdc(Some(&table), &index, &AggregationOptions::default(), &UsStates)
                .unwrap();
        assert!(result.edges.is_empty());
        assert_eq!(result.counts.unresolved, 1);
    }
}
