//! Final edge table: AC block first, then HVDC, each ordered by FIPS pair.

use txcap_core::CountyEdge;

pub fn assemble_edges(
    ac: impl IntoIterator<Item = CountyEdge>,
    hvdc: impl IntoIterator<Item = CountyEdge>,
) -> Vec<CountyEdge> {
    let mut ac: Vec<CountyEdge> = ac.into_iter().collect();
    let mut hvdc: Vec<CountyEdge> = hvdc.into_iter().collect();
    sort_block(&mut ac);
    sort_block(&mut hvdc);
    ac.extend(hvdc);
    ac
}

fn sort_block(edges: &mut [CountyEdge]) {
    edges.sort_by(|a, b| (&a.from.fips, &a.to.fips).cmp(&(&b.from.fips, &b.to.fips)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use txcap_core::{
        CountyFips, EdgeEndpoint, EdgeMetrics, EdgeType, HvdcMetrics, Megawatts,
    };

    fn hvdc(from: &str, to: &str) -> CountyEdge {
        CountyEdge {
            from: EdgeEndpoint::bare(CountyFips::new(from)),
            to: EdgeEndpoint::bare(CountyFips::new(to)),
            capacity: Megawatts(100.0),
            metrics: EdgeMetrics::Hvdc(HvdcMetrics { n_links: 1 }),
        }
    }

    fn ac(from: &str, to: &str) -> CountyEdge {
        let mut edge = hvdc(from, to);
        edge.metrics = EdgeMetrics::Ac(txcap_core::AcMetrics {
            n_circuits: 1,
            sum_rate_mva: Default::default(),
            sum_b_pu: Default::default(),
            x_eq_pu: None,
            pf_used_med: Some(1.0),
            kv_min_med: None,
        });
        edge
    }

    #[test]
    fn ac_block_precedes_hvdc_and_each_is_sorted() {
        let edges = assemble_edges(
            vec![ac("08059", "08123"), ac("08031", "08059")],
            vec![hvdc("08013", "08031")],
        );
        let order: Vec<(EdgeType, &str)> = edges
            .iter()
            .map(|e| (e.edge_type(), e.from.fips.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (EdgeType::Ac, "08031"),
                (EdgeType::Ac, "08059"),
                (EdgeType::Hvdc, "08013"),
            ]
        );
    }

    #[test]
    fn either_block_may_be_empty() {
        assert!(assemble_edges(Vec::new(), Vec::new()).is_empty());
        assert_eq!(assemble_edges(Vec::new(), vec![hvdc("01001", "01003")]).len(), 1);
    }
}
