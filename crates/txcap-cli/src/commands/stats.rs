use std::path::Path;

use anyhow::{Context, Result};
use txcap_algo::capacity_stats;
use txcap_io::read_edges;

pub fn handle(edges: &Path, json: bool) -> Result<()> {
    let all = read_edges(edges).with_context(|| format!("reading edges from {}", edges.display()))?;
    let Some(stats) = capacity_stats(&all) else {
        println!("No edges with a capacity in {}", edges.display());
        return Ok(());
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print!("{stats}");
    }
    Ok(())
}
