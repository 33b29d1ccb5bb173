mod commands;
mod config;
mod main_lib;

use clap::Parser;
use commands::Cli;
use config::Config;
use main_lib::{build_state, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(&config.log_format);
    let cli = Cli::parse();

    let state = build_state(&config)?;
    let output = commands::run(&state, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
