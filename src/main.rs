//! Command-line entry point for the retrieval-augmented chat demo.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ragcore_rs::cli::{Cli, commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    commands::run(cli).await
}
