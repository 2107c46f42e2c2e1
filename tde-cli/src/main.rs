//! TDE CLI - Command line tool for aggregating and forecasting UN Comtrade data.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "tde-cli",
    version,
    about = "Trade data explorer: paced Comtrade aggregation and unit-price forecasting"
)]
struct Cli {
    #[command(subcommand)]
    command: tde_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let cli = Cli::parse();
    let config = tde_cmd::config::Config::from_env()?;
    tde_cmd::run(cli.command, &config).await
}
