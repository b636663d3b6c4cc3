//! # txcap-algo: Bus Geolocation and County Aggregation
//!
//! Turns a MATPOWER-style grid into county-pair transfer capacities.
//!
//! ## Pipeline
//!
//! | Stage | Function | Output |
//! |-------|----------|--------|
//! | Geolocation | [`geolocate_buses`] | bus -> substation -> county, zone, interconnect |
//! | AC aggregation | [`aggregate_ac`] | one AC edge per county pair |
//! | HVDC aggregation | [`aggregate_hvdc`] | one HVDC edge per county pair |
//! | Assembly | [`assemble_edges`] | AC block then HVDC block, FIPS-ordered |
//!
//! [`pipeline::run`] chains the stages; [`pipeline::execute`] also loads the
//! inputs and writes the outputs of a [`PipelineConfig`].
//!
//! ### Capacity conversion
//!
//! Ratings are in MVA. [`PowerFactorMode`] turns them into MW: unchanged
//! (`none`), one scalar (`const:0.95`), or by the voltage class of the lower
//! endpoint (`bykv`).
//!
//! ## Post-processing
//!
//! - [`region`]: keep edges touching a zone, state or interconnect
//! - [`stats`]: capacity summary, percentiles and size classes
//!
//! ## Features
//!
//! - `spatial` (default): R-tree point-in-polygon locator. Without it
//!   [`point_locator`] reports the capability as unavailable.
//! - `fetch`: remote county download through `txcap-io`.

pub mod ac;
pub mod assemble;
pub mod geolocate;
pub mod hvdc;
pub mod mode;
pub mod options;
pub mod pairing;
pub mod pipeline;
pub mod power_factor;
pub mod rating;
pub mod region;
pub mod stats;

pub use ac::{aggregate_ac, AcAggregation, AcCounts};
pub use assemble::assemble_edges;
pub use geolocate::{geolocate_buses, point_locator, Geolocation, PointLocator};
pub use hvdc::{aggregate_hvdc, HvdcAggregation, HvdcCounts};
pub use options::{AggregationOptions, PowerFactorMode, RatingPreference};
pub use pairing::BusIndex;
pub use pipeline::{
    execute, run, run_from_dir, run_with, CountiesConfig, PipelineConfig, RunOutput,
};
pub use region::{filter_region, Region, RegionType};
pub use stats::{capacity_stats, CapacityStats};
