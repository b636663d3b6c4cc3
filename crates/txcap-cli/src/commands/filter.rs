use std::path::Path;

use anyhow::{Context, Result};
use txcap_algo::{filter_region, Region, RegionType};
use txcap_io::{read_edges, write_edges};

pub fn handle(edges: &Path, name: &str, kind: RegionType, output: &Path) -> Result<()> {
    let all = read_edges(edges).with_context(|| format!("reading edges from {}", edges.display()))?;
    let region = Region::new(kind, name);
    let selected = filter_region(&all, &region);
    if selected.is_empty() {
        tracing::warn!(region = name, %kind, "no edges touch the region");
    }
    write_edges(&selected, output)
        .with_context(|| format!("writing edges to {}", output.display()))?;
    println!(
        "Kept {} of {} edges touching {kind} '{name}' -> {}",
        selected.len(),
        all.len(),
        output.display()
    );
    Ok(())
}
