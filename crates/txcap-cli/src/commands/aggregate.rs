use anyhow::Result;
use tracing::info;
use txcap_cli::{cli::AggregateArgs, config};

pub fn handle(args: &AggregateArgs) -> Result<()> {
    let config = config::resolve(args)?;
    info!(
        rate = %config.options.rate,
        pf = %config.options.pf,
        include_transformers = config.options.include_transformers,
        keep_intra_county = config.options.keep_intra_county,
        include_hvdc = config.options.include_hvdc,
        "aggregation options"
    );
    let output = txcap_algo::execute(&config)?;
    println!(
        "Wrote {} edges to {}",
        output.edges.len(),
        config.output.display()
    );
    println!("{}", output.diagnostics.summary());
    Ok(())
}
