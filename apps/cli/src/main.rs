//! Boardsmith CLI: turn a whiteboard into an agent system specification.
//!
//! Fetches a Miro board, builds its structural graph, and runs the staged
//! model pipeline that writes the agent spec and its markdown report.

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
