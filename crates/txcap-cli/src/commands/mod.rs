pub mod aggregate;
pub mod filter;
pub mod graph;
pub mod stats;
