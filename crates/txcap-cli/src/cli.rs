use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;
use txcap_algo::{PowerFactorMode, RatingPreference, RegionType};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "County-level transmission capacity from bus/branch grid models",
    long_about = None
)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Aggregate a grid into county-pair AC and HVDC edges
    Aggregate(AggregateArgs),
    /// Keep edges touching a zone, state or interconnect
    Filter {
        /// Edge table produced by `aggregate`
        #[arg(long, value_hint = ValueHint::FilePath)]
        edges: PathBuf,
        /// Region name (zone name, state abbreviation or FIPS, interconnect)
        #[arg(long)]
        region: String,
        /// Region type: zone, state or interconnect
        #[arg(long = "type")]
        region_type: RegionType,
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: PathBuf,
    },
    /// Capacity statistics of an edge table
    Stats {
        #[arg(long, value_hint = ValueHint::FilePath)]
        edges: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// County graph summary of an edge table
    Graph {
        #[arg(long, value_hint = ValueHint::FilePath)]
        edges: PathBuf,
        /// Write the graph in DOT format
        #[arg(long, value_hint = ValueHint::FilePath)]
        dot: Option<PathBuf>,
    },
}

/// Flags of `txcap aggregate`. Every flag overrides the matching value of
/// the `--config` file.
#[derive(Args, Debug, Default, Clone)]
pub struct AggregateArgs {
    /// Directory holding bus, branch, sub, bus2sub (and optional zone, dcline)
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub grid_dir: Option<PathBuf>,
    /// Edge table path; .parquet or .arrow select those formats [default: county_edges_tx.csv]
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
    /// County polygons as a local GeoJSON file
    #[arg(
        long,
        value_hint = ValueHint::FilePath,
        conflicts_with_all = ["counties_year", "counties_url"]
    )]
    pub counties_file: Option<PathBuf>,
    /// Year of the county boundaries to download [default: 2023]
    #[arg(long)]
    pub counties_year: Option<u16>,
    /// Download URL template; `{year}` is substituted
    #[arg(long)]
    pub counties_url: Option<String>,
    /// Read the download from (or save it to) this file
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub counties_cache: Option<PathBuf>,
    /// Preferred thermal rating: A, B or C
    #[arg(long)]
    pub rate: Option<RatingPreference>,
    /// MVA -> MW conversion: none, const:<pf> or bykv
    #[arg(long)]
    pub pf: Option<PowerFactorMode>,
    /// Keep branches with a nonzero tap ratio
    #[arg(long)]
    pub include_transformers: bool,
    /// Keep circuits whose ends lie in the same county
    #[arg(long)]
    pub keep_intra: bool,
    /// Skip HVDC links
    #[arg(long)]
    pub no_hvdc: bool,
    /// Also write the bus -> county mapping
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub bus_map: Option<PathBuf>,
    /// Also write run diagnostics as JSON
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub diagnostics: Option<PathBuf>,
    /// TOML run file
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
}
