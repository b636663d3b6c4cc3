//! Grid directory discovery.

use std::{
    fs,
    path::{Path, PathBuf},
};

use polars::prelude::DataFrame;
use tracing::{debug, info};
use txcap_core::{GridTables, TxcapError, TxcapResult};

use crate::format::{lowercase_extension, read_table};
use crate::normalize;

pub const REQUIRED_TABLES: [&str; 4] = ["bus", "branch", "sub", "bus2sub"];
pub const OPTIONAL_TABLES: [&str; 2] = ["zone", "dcline"];

/// Extensions tried for a base name, most preferred first. The empty entry
/// matches an extension-less file.
const EXTENSION_PREFERENCE: [&str; 6] = ["csv", "parquet", "arrow", "ipc", "feather", ""];

/// Frames as read from disk, column names lower-cased.
#[derive(Debug, Clone)]
pub struct RawGridTables {
    pub bus: DataFrame,
    pub branch: DataFrame,
    pub sub: DataFrame,
    pub bus2sub: DataFrame,
    pub zone: Option<DataFrame>,
    pub dcline: Option<DataFrame>,
}

/// Find `<base>.<ext>` in `dir`, matching the base name case-insensitively.
pub fn locate_table(dir: &Path, base: &str) -> TxcapResult<Option<PathBuf>> {
    let mut best: Option<(usize, PathBuf)> = None;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if !stem.eq_ignore_ascii_case(base) {
            continue;
        }
        let ext = lowercase_extension(&path);
        let Some(rank) = EXTENSION_PREFERENCE.iter().position(|e| *e == ext) else {
            continue;
        };
        let better = match &best {
            None => true,
            Some((best_rank, best_path)) => {
                rank < *best_rank || (rank == *best_rank && path < *best_path)
            }
        };
        if better {
            best = Some((rank, path));
        }
    }
    Ok(best.map(|(_, path)| path))
}

/// Read the base and optional tables of a grid directory.
pub fn load_raw_tables(dir: &Path) -> TxcapResult<RawGridTables> {
    let missing_all = || TxcapError::MissingInput {
        dir: dir.display().to_string(),
        missing: REQUIRED_TABLES.iter().map(|s| s.to_string()).collect(),
    };
    if !dir.is_dir() {
        return Err(missing_all());
    }

    let mut found = Vec::with_capacity(REQUIRED_TABLES.len());
    let mut missing = Vec::new();
    for base in REQUIRED_TABLES {
        match locate_table(dir, base)? {
            Some(path) => found.push(path),
            None => missing.push(base.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(TxcapError::MissingInput {
            dir: dir.display().to_string(),
            missing,
        });
    }

    let mut frames = Vec::with_capacity(found.len());
    for path in &found {
        let df = read_table(path)?;
        debug!(table = %path.display(), rows = df.height(), "loaded table");
        frames.push(df);
    }
    let [bus, branch, sub, bus2sub]: [DataFrame; 4] = frames
        .try_into()
        .map_err(|_| TxcapError::Other("grid table count mismatch".into()))?;

    let mut optional = Vec::with_capacity(OPTIONAL_TABLES.len());
    for base in OPTIONAL_TABLES {
        let frame = match locate_table(dir, base)? {
            Some(path) => {
                let df = read_table(&path)?;
                debug!(table = %path.display(), rows = df.height(), "loaded table");
                Some(df)
            }
            None => {
                info!(table = base, "optional table not present");
                None
            }
        };
        optional.push(frame);
    }
    let dcline = optional.pop().flatten();
    let zone = optional.pop().flatten();

    Ok(RawGridTables {
        bus,
        branch,
        sub,
        bus2sub,
        zone,
        dcline,
    })
}

/// Read and normalize a grid directory into typed tables.
pub fn load_grid_tables(dir: &Path) -> TxcapResult<GridTables> {
    let raw = load_raw_tables(dir)?;
    let tables = normalize::grid_tables(&raw)?;
    info!(
        buses = tables.buses.rows.len(),
        branches = tables.branches.rows.len(),
        substations = tables.substations.len(),
        zones = tables.zones.as_ref().map(|z| z.len()),
        dc_links = tables.dc_links.as_ref().map(|d| d.rows.len()),
        "grid tables loaded"
    );
    Ok(tables)
}
