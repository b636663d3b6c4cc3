use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tabwriter::TabWriter;
use txcap_core::graph_utils::{export_graph, graph_stats, CountyGraph};
use txcap_io::read_edges;

pub fn handle(edges: &Path, dot: Option<&Path>) -> Result<()> {
    let all = read_edges(edges).with_context(|| format!("reading edges from {}", edges.display()))?;
    let graph = CountyGraph::from_edges(&all);
    let stats = graph_stats(&graph)?;

    println!("County graph for {}:", edges.display());
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "  Counties\t{}", stats.node_count)?;
    writeln!(
        writer,
        "  Edges\t{} ({} AC, {} HVDC, {} self-loops)",
        stats.edge_count, stats.ac_edges, stats.hvdc_edges, stats.self_loops
    )?;
    writeln!(writer, "  Components\t{}", stats.connected_components)?;
    writeln!(
        writer,
        "  Degree [min/avg/max]\t{}/{:.2}/{}",
        stats.min_degree, stats.avg_degree, stats.max_degree
    )?;
    writeln!(writer, "  Density\t{:.4}", stats.density)?;
    writeln!(writer, "  AC capacity\t{:.0} MW", stats.ac_capacity.value())?;
    writeln!(writer, "  HVDC capacity\t{:.0} MW", stats.hvdc_capacity.value())?;
    writer.flush()?;

    if let Some(path) = dot {
        let rendered = export_graph(&graph, "dot")?;
        fs::write(path, rendered).with_context(|| format!("writing {}", path.display()))?;
        println!("Graph exported to {}", path.display());
    }
    Ok(())
}
