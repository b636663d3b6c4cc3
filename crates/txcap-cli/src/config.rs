//! Run configuration: optional TOML file, then command-line overrides.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use txcap_algo::PipelineConfig;

use crate::cli::AggregateArgs;

pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading run file {}", path.display()))?;
    let config: PipelineConfig = toml::from_str(&contents)
        .with_context(|| format!("parsing run file {}", path.display()))?;
    Ok(config)
}

/// Resolve the effective configuration for `txcap aggregate`.
pub fn resolve(args: &AggregateArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => PipelineConfig::default(),
    };
    apply_overrides(&mut config, args);
    Ok(config)
}

pub fn apply_overrides(config: &mut PipelineConfig, args: &AggregateArgs) {
    if let Some(dir) = &args.grid_dir {
        config.grid_dir = Some(dir.clone());
    }
    if let Some(output) = &args.output {
        config.output = output.clone();
    }

    let counties = &mut config.counties;
    if let Some(file) = &args.counties_file {
        counties.file = Some(file.clone());
    }
    // An explicit download request replaces a file named in the run file.
    if args.counties_year.is_some() || args.counties_url.is_some() {
        counties.file = None;
    }
    if let Some(year) = args.counties_year {
        counties.year = year;
    }
    if let Some(url) = &args.counties_url {
        counties.url = Some(url.clone());
    }
    if let Some(cache) = &args.counties_cache {
        counties.cache = Some(cache.clone());
    }

    let options = &mut config.options;
    if let Some(rate) = args.rate {
        options.rate = rate;
    }
    if let Some(pf) = args.pf {
        options.pf = pf;
    }
    if args.include_transformers {
        options.include_transformers = true;
    }
    if args.keep_intra {
        options.keep_intra_county = true;
    }
    if args.no_hvdc {
        options.include_hvdc = false;
    }

    if let Some(path) = &args.bus_map {
        config.bus_map = Some(path.clone());
    }
    if let Some(path) = &args.diagnostics {
        config.diagnostics = Some(path.clone());
    }
}
