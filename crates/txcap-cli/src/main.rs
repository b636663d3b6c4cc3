use clap::Parser;
use tracing::error;
use tracing_subscriber::FmtSubscriber;
use txcap_cli::cli::{Cli, Commands};

mod commands;

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install log subscriber: {err}");
    }

    let result = match &cli.command {
        Commands::Aggregate(args) => commands::aggregate::handle(args),
        Commands::Filter {
            edges,
            region,
            region_type,
            output,
        } => commands::filter::handle(edges, region, *region_type, output),
        Commands::Stats { edges, json } => commands::stats::handle(edges, *json),
        Commands::Graph { edges, dot } => commands::graph::handle(edges, dot.as_deref()),
    };

    if let Err(err) = result {
        error!("{:?}", err);
        std::process::exit(1);
    }
}
