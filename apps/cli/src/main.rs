//! DocIntel CLI — document-intelligence analysis tool.
//!
//! Ingests business documents, runs the multi-stage analysis pipeline
//! (entities, sentiment, risk, quality), and prints a structured report.

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
