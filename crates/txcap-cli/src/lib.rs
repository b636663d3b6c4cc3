pub mod cli;
pub mod config;

pub use cli::{AggregateArgs, Cli, Commands};
