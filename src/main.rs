use anyhow::Result;
use clap::Parser;
use invoicedash::cli::Cli;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "invoicedash=debug"
    } else {
        "invoicedash=warn"
    };
    let env_filter = EnvFilter::from_default_env()
        .add_directive(level.parse()?)
        .add_directive("sqlx=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    cli.run().await
}
