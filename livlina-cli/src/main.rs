//! ## livlina-cli
//! **Terminal front end for the emergency intake service**
//!
//! - `run`: interactive wizard on stdin/stdout
//! - `replay`: scripted session from a YAML file
//! - `check-config`: validate and print the effective configuration

use clap::Parser;

mod commands;
mod error;
mod replay;
mod wizard;

use commands::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    commands::run_command(cli).await?;
    Ok(())
}
