//! # txcap-io: grid tables in, county edges out
//!
//! File-format adapters around the txcap core:
//!
//! - [`tables`] - locate and read the MATPOWER-style tables of a grid
//!   directory (`bus`, `branch`, `sub`, `bus2sub`, optional `zone`, `dcline`)
//! - [`normalize`] - ordered column aliases and lenient cell parsing into the
//!   typed records of `txcap-core`
//! - [`counties`] - county polygon sources (GeoJSON file, remote download)
//! - [`writer`] - edge table and bus map output
//!
//! ## Supported Formats
//!
//! | Format | Extensions | Feature |
//! |--------|------------|---------|
//! | CSV | `.csv`, none | always |
//! | Parquet | `.parquet` | `parquet` |
//! | Arrow IPC | `.arrow`, `.ipc`, `.feather` | `ipc` |
//!
//! ```rust,no_run
//! use std::path::Path;
//! use txcap_io::tables::load_grid_tables;
//!
//! fn main() -> anyhow::Result<()> {
//!     let grid = load_grid_tables(Path::new("base_grid"))?;
//!     println!("{} buses, {} branches", grid.buses.rows.len(), grid.branches.rows.len());
//!     Ok(())
//! }
//! ```

pub mod counties;
pub mod format;
pub mod normalize;
pub mod tables;
pub mod writer;

pub use counties::{parse_geojson, CountySource, GeoJsonFile, RemoteCounties, DEFAULT_COUNTIES_URL};
pub use format::{read_table, write_table, TableFormat};
pub use tables::{load_grid_tables, load_raw_tables, locate_table, RawGridTables};
pub use writer::{edges_to_dataframe, read_edges, write_bus_map, write_edges};
