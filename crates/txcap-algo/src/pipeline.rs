//! End-to-end run: grid tables + county polygons -> county edge table.
//!
//! Every stage materializes its full output before the next one starts, and
//! outputs are only written once the whole run has succeeded, so a fatal
//! error leaves no partial files behind.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use txcap_core::{
    CountyEdge, CountySet, EnrichedBus, GridTables, RunDiagnostics, StateLookup, TxcapResult,
    UsStates,
};
use txcap_io::{
    load_grid_tables, write_bus_map, write_edges, CountySource, GeoJsonFile, RemoteCounties,
    DEFAULT_COUNTIES_URL,
};

use crate::ac::aggregate_ac;
use crate::assemble::assemble_edges;
use crate::geolocate::{geolocate_buses, point_locator, PointLocator};
use crate::hvdc::aggregate_hvdc;
use crate::options::AggregationOptions;
use crate::pairing::BusIndex;

pub const DEFAULT_OUTPUT: &str = "county_edges_tx.csv";
pub const DEFAULT_COUNTIES_YEAR: u16 = 2023;

/// Where county polygons come from. A local file takes precedence over the
/// remote download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountiesConfig {
    pub file: Option<PathBuf>,
    pub year: u16,
    /// URL template; `{year}` is substituted when present
    pub url: Option<String>,
    pub cache: Option<PathBuf>,
}

impl Default for CountiesConfig {
    fn default() -> Self {
        Self {
            file: None,
            year: DEFAULT_COUNTIES_YEAR,
            url: None,
            cache: None,
        }
    }
}

impl CountiesConfig {
    pub fn source(&self) -> Box<dyn CountySource> {
        if let Some(file) = &self.file {
            return Box::new(GeoJsonFile::new(file));
        }
        let mut remote = RemoteCounties::new(self.year);
        if let Some(url) = &self.url {
            remote = remote.with_url_template(url);
        }
        if let Some(cache) = &self.cache {
            remote = remote.with_cache(cache);
        }
        Box::new(remote)
    }

    /// True when polygons are downloaded from a URL that does not vary by year.
    pub fn year_ignored(&self) -> bool {
        self.file.is_none()
            && !self
                .url
                .as_deref()
                .unwrap_or(DEFAULT_COUNTIES_URL)
                .contains("{year}")
    }
}

/// A complete run description, as read from a TOML run file.
///
/// ```toml
/// grid_dir = "base_grid"
/// output = "county_edges_tx.parquet"
///
/// [counties]
/// file = "counties.geojson"
///
/// [options]
/// rate = "B"
/// pf = "bykv"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub grid_dir: Option<PathBuf>,
    pub output: PathBuf,
    pub counties: CountiesConfig,
    pub options: AggregationOptions,
    /// Optional bus -> county table
    pub bus_map: Option<PathBuf>,
    /// Optional run diagnostics as JSON
    pub diagnostics: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            grid_dir: None,
            output: PathBuf::from(DEFAULT_OUTPUT),
            counties: CountiesConfig::default(),
            options: AggregationOptions::default(),
            bus_map: None,
            diagnostics: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    pub edges: Vec<CountyEdge>,
    /// Geolocated buses, in bus table order
    pub buses: Vec<EnrichedBus>,
    pub diagnostics: RunDiagnostics,
}

/// Run on loaded tables with the default point locator and state labels.
pub fn run(
    grid: &GridTables,
    counties: &CountySet,
    options: &AggregationOptions,
) -> TxcapResult<RunOutput> {
    let locator = point_locator(counties)?;
    run_with(grid, counties, locator.as_ref(), &UsStates, options)
}

pub fn run_with(
    grid: &GridTables,
    counties: &CountySet,
    locator: &dyn PointLocator,
    states: &dyn StateLookup,
    options: &AggregationOptions,
) -> TxcapResult<RunOutput> {
    let geolocation = geolocate_buses(grid, counties, locator)?;
    let index = BusIndex::new(&geolocation.buses, grid.buses.has_base_kv);

    let ac = aggregate_ac(&grid.branches, &index, options, states);
    let mut diagnostics = RunDiagnostics::new();
    let hvdc = if options.include_hvdc {
        if !grid.dcline_missing.is_empty() {
            warn!(
                missing = ?grid.dcline_missing,
                "dcline table lacks required fields; treating it as no HVDC data"
            );
            diagnostics.diagnostics.add_warning(
                "dcline",
                &format!(
                    "dcline table ignored, missing {}",
                    grid.dcline_missing.join(", ")
                ),
            );
        }
        aggregate_hvdc(grid.dc_links.as_ref(), &index, options, states)
    } else {
        info!("HVDC links excluded by options");
        None
    };

    let stats = &mut diagnostics.stats;
    stats.buses = grid.buses.rows.len();
    stats.buses_resolved = geolocation.resolved_count();
    stats.substations = grid.substations.len();
    stats.substations_resolved = geolocation.substations_resolved;
    stats.branches = ac.counts.input;
    stats.branches_aggregated = ac.counts.aggregated;
    stats.ac_edges = ac.edges.len();
    if let Some(hvdc) = &hvdc {
        stats.dc_links = hvdc.counts.input;
        stats.dc_links_aggregated = hvdc.counts.aggregated;
        stats.hvdc_edges = hvdc.edges.len();
    }

    diagnostics.diagnostics.merge(geolocation.diagnostics);
    diagnostics.diagnostics.merge(ac.diagnostics);
    let hvdc_edges = match hvdc {
        Some(hvdc) => {
            diagnostics.diagnostics.merge(hvdc.diagnostics);
            hvdc.edges
        }
        None => Vec::new(),
    };

    let edges = assemble_edges(ac.edges, hvdc_edges);
    info!("{}", diagnostics.summary());

    Ok(RunOutput {
        edges,
        buses: geolocation.buses,
        diagnostics,
    })
}

/// Load a grid directory and a county source, then run.
pub fn run_from_dir(
    grid_dir: &Path,
    counties: &dyn CountySource,
    options: &AggregationOptions,
) -> TxcapResult<RunOutput> {
    let grid = load_grid_tables(grid_dir)?;
    info!(
        buses = grid.buses.rows.len(),
        branches = grid.branches.rows.len(),
        substations = grid.substations.len(),
        "grid tables loaded from {}",
        grid_dir.display()
    );
    info!("loading counties from {}", counties.describe());
    let counties = counties.load()?;
    info!(counties = counties.len(), crs = %counties.crs, "county polygons loaded");
    run(&grid, &counties, options)
}

/// Run a configured pipeline and write every requested output.
pub fn execute(config: &PipelineConfig) -> anyhow::Result<RunOutput> {
    let grid_dir = config
        .grid_dir
        .as_deref()
        .context("no grid directory configured")?;
    let source = config.counties.source();
    let mut output = run_from_dir(grid_dir, source.as_ref(), &config.options)
        .with_context(|| format!("county aggregation of {} failed", grid_dir.display()))?;
    if config.counties.year_ignored() {
        output.diagnostics.diagnostics.add_warning(
            "counties",
            &format!(
                "counties year {} not applied; the boundary URL has no {{year}} placeholder",
                config.counties.year
            ),
        );
    }

    write_edges(&output.edges, &config.output)
        .with_context(|| format!("failed to write edges to {}", config.output.display()))?;
    info!(
        edges = output.edges.len(),
        "edge table written to {}",
        config.output.display()
    );
    if let Some(path) = &config.bus_map {
        write_bus_map(&output.buses, path)
            .with_context(|| format!("failed to write bus map to {}", path.display()))?;
        info!("bus map written to {}", path.display());
    }
    if let Some(path) = &config.diagnostics {
        write_diagnostics(&output.diagnostics, path)?;
        info!("diagnostics written to {}", path.display());
    }
    Ok(output)
}

pub fn write_diagnostics(diagnostics: &RunDiagnostics, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(diagnostics)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.output, PathBuf::from("county_edges_tx.csv"));
        assert_eq!(config.counties.year, 2023);
        assert!(config.grid_dir.is_none());
        assert!(config.options.include_hvdc);
    }

    #[test]
    fn config_deserializes_partially() {
        let json = r#"{"grid_dir": "base_grid", "options": {"pf": "const:0.95", "keep_intra_county": true}}"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.grid_dir.as_deref(), Some(Path::new("base_grid")));
        assert!(config.options.keep_intra_county);
        assert_eq!(config.output, PathBuf::from(DEFAULT_OUTPUT));
    }

    #[test]
    fn local_county_file_takes_precedence() {
        let counties = CountiesConfig {
            file: Some(PathBuf::from("counties.geojson")),
            url: Some("https://example.invalid/{year}.json".into()),
            ..CountiesConfig::default()
        };
        assert!(counties.source().describe().contains("counties.geojson"));
    }

    #[test]
    fn year_only_matters_for_templated_urls() {
        assert!(CountiesConfig::default().year_ignored());
        let templated = CountiesConfig {
            url: Some("https://example.invalid/counties_{year}.json".into()),
            ..CountiesConfig::default()
        };
        assert!(!templated.year_ignored());
        let local = CountiesConfig {
            file: Some(PathBuf::from("counties.geojson")),
            ..CountiesConfig::default()
        };
        assert!(!local.year_ignored());
    }

    #[test]
    fn execute_requires_grid_dir() {
        let err = execute(&PipelineConfig::default()).unwrap_err();
        assert!(err.to_string().contains("no grid directory"));
    }
}
