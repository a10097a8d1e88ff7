//! docvendor CLI: vendor, sanitize, and rehydrate third-party documentation.
//!
//! Each subcommand runs one stage of the pipeline against the current
//! project; `all` runs the three in order.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
