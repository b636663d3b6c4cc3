use crate::edge::{CountyEdge, EdgeType};
use crate::units::Megawatts;
use crate::CountyFips;
use anyhow::{anyhow, Result};
use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// Edge weight of the county multigraph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapacityWeight {
    pub edge_type: EdgeType,
    pub capacity: Megawatts,
}

/// Counties as nodes, one graph edge per edge-table row (so an AC and an
/// HVDC row between the same pair become parallel edges).
#[derive(Debug, Default)]
pub struct CountyGraph {
    pub graph: UnGraph<CountyFips, CapacityWeight>,
    index: HashMap<CountyFips, NodeIndex>,
}

impl CountyGraph {
    pub fn from_edges(edges: &[CountyEdge]) -> Self {
        let mut graph = CountyGraph::default();
        for edge in edges {
            let a = graph.node(&edge.from.fips);
            let b = graph.node(&edge.to.fips);
            graph.graph.add_edge(
                a,
                b,
                CapacityWeight {
                    edge_type: edge.edge_type(),
                    capacity: edge.capacity,
                },
            );
        }
        graph
    }

    fn node(&mut self, fips: &CountyFips) -> NodeIndex {
        if let Some(idx) = self.index.get(fips) {
            return *idx;
        }
        let idx = self.graph.add_node(fips.clone());
        self.index.insert(fips.clone(), idx);
        idx
    }

    pub fn node_index(&self, fips: &CountyFips) -> Option<NodeIndex> {
        self.index.get(fips).copied()
    }

    /// Total capacity incident to a county across all edge types.
    pub fn incident_capacity(&self, fips: &CountyFips) -> Megawatts {
        match self.node_index(fips) {
            Some(idx) => self
                .graph
                .edges(idx)
                .map(|edge| edge.weight().capacity)
                .sum(),
            None => Megawatts(0.0),
        }
    }
}

/// Summary statistics of the county graph (density/degree/connected components).
#[derive(Debug)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub ac_edges: usize,
    pub hvdc_edges: usize,
    pub self_loops: usize,
    pub connected_components: usize,
    pub min_degree: usize,
    pub avg_degree: f64,
    pub max_degree: usize,
    pub density: f64,
    pub ac_capacity: Megawatts,
    pub hvdc_capacity: Megawatts,
}

/// Calculates graph-level statistics such as density, degree distribution, and component counts.
pub fn graph_stats(county_graph: &CountyGraph) -> Result<GraphStats> {
    let graph = &county_graph.graph;
    let node_count = graph.node_count();
    let edge_count = graph.edge_count();
    let mut degrees = Vec::with_capacity(node_count);
    for node in graph.node_indices() {
        degrees.push(graph.edges(node).count());
    }
    let min_degree = *degrees.iter().min().unwrap_or(&0);
    let max_degree = *degrees.iter().max().unwrap_or(&0);
    let avg_degree = if node_count == 0 {
        0.0
    } else {
        degrees.iter().copied().sum::<usize>() as f64 / node_count as f64
    };
    let density = if node_count < 2 {
        0.0
    } else {
        2.0 * edge_count as f64 / (node_count as f64 * (node_count as f64 - 1.0))
    };

    let mut ac_edges = 0;
    let mut hvdc_edges = 0;
    let mut self_loops = 0;
    let mut ac_capacity = Megawatts(0.0);
    let mut hvdc_capacity = Megawatts(0.0);
    for edge in graph.edge_references() {
        if edge.source() == edge.target() {
            self_loops += 1;
        }
        let weight = edge.weight();
        match weight.edge_type {
            EdgeType::Ac => {
                ac_edges += 1;
                ac_capacity += weight.capacity;
            }
            EdgeType::Hvdc => {
                hvdc_edges += 1;
                hvdc_capacity += weight.capacity;
            }
        }
    }

    Ok(GraphStats {
        node_count,
        edge_count,
        ac_edges,
        hvdc_edges,
        self_loops,
        connected_components: connected_components(graph),
        min_degree,
        avg_degree,
        max_degree,
        density,
        ac_capacity,
        hvdc_capacity,
    })
}

/// Export the county graph to a DOT string (Graphviz) so external tools can draw it.
pub fn export_graph(county_graph: &CountyGraph, format: &str) -> Result<String> {
    match format.to_ascii_lowercase().as_str() {
        "graphviz" | "dot" => Ok(render_dot(county_graph)),
        other => Err(anyhow!("unsupported graph export format '{other}'")),
    }
}

fn render_dot(county_graph: &CountyGraph) -> String {
    let graph = &county_graph.graph;
    let mut buffer = String::new();
    buffer.push_str("graph county_txcap {\n");
    for node in graph.node_indices() {
        buffer.push_str(&format!(
            "  n{} [label=\"{}\"];\n",
            node.index(),
            sanitize_label(graph[node].as_str())
        ));
    }
    for edge in graph.edge_references() {
        let source = edge.source().index();
        let target = edge.target().index();
        let weight = edge.weight();
        let style = match weight.edge_type {
            EdgeType::Ac => "solid",
            EdgeType::Hvdc => "dashed",
        };
        buffer.push_str(&format!(
            "  n{source} -- n{target} [label=\"{:.0}\", style={style}];\n",
            weight.capacity.value()
        ));
    }
    buffer.push('}');
    buffer
}

fn sanitize_label(label: &str) -> String {
    label.replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::{AcMetrics, EdgeEndpoint, EdgeMetrics, HvdcMetrics};
    use crate::units::{MegavoltAmperes, SusceptancePu};

    fn ac(from: &str, to: &str, mw: f64) -> CountyEdge {
        CountyEdge {
            from: EdgeEndpoint::bare(CountyFips::new(from)),
            to: EdgeEndpoint::bare(CountyFips::new(to)),
            capacity: Megawatts(mw),
            metrics: EdgeMetrics::Ac(AcMetrics {
                n_circuits: 1,
                sum_rate_mva: MegavoltAmperes(mw),
                sum_b_pu: SusceptancePu(10.0),
                x_eq_pu: None,
                pf_used_med: Some(1.0),
                kv_min_med: None,
            }),
        }
    }

    fn hvdc(from: &str, to: &str, mw: f64) -> CountyEdge {
        CountyEdge {
            from: EdgeEndpoint::bare(CountyFips::new(from)),
            to: EdgeEndpoint::bare(CountyFips::new(to)),
            capacity: Megawatts(mw),
            metrics: EdgeMetrics::Hvdc(HvdcMetrics { n_links: 1 }),
        }
    }

    #[test]
    fn parallel_ac_and_hvdc_edges() {
        let edges = vec![
            ac("08031", "08059", 300.0),
            hvdc("08031", "08059", 500.0),
            ac("48201", "48339", 800.0),
        ];
        let graph = CountyGraph::from_edges(&edges);
        let stats = graph_stats(&graph).unwrap();
        assert_eq!(stats.node_count, 4);
        assert_eq!(stats.edge_count, 3);
        assert_eq!(stats.ac_edges, 2);
        assert_eq!(stats.hvdc_edges, 1);
        assert_eq!(stats.connected_components, 2);
        assert_eq!(stats.ac_capacity.value(), 1100.0);
        assert_eq!(stats.hvdc_capacity.value(), 500.0);
        assert_eq!(
            graph.incident_capacity(&CountyFips::new("08031")).value(),
            800.0
        );
    }

    #[test]
    fn self_loops_are_counted() {
        let edges = vec![ac("08031", "08031", 120.0)];
        let stats = graph_stats(&CountyGraph::from_edges(&edges)).unwrap();
        assert_eq!(stats.self_loops, 1);
        assert_eq!(stats.node_count, 1);
    }

    #[test]
    fn dot_export_marks_hvdc_dashed() {
        let edges = vec![hvdc("08013", "08031", 500.0)];
        let dot = export_graph(&CountyGraph::from_edges(&edges), "dot").unwrap();
        assert!(dot.starts_with("graph county_txcap {"));
        assert!(dot.contains("style=dashed"));
        assert!(dot.contains("label=\"08013\""));
        assert!(export_graph(&CountyGraph::from_edges(&edges), "gexf").is_err());
    }
}
