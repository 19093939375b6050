use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use stockroom_cli::{Cli, exit_code, require_database, run};
use stockroom_infra::{AppConfig, InventoryServices, with_deadline};
use stockroom_observability::LogFormat;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    stockroom_observability::init(stockroom_observability::format_from_env(LogFormat::Compact));

    let (config, services) = match setup().await {
        Ok(v) => v,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::from(1);
        }
    };

    let operation = cli.command.operation();
    tracing::debug!(operation, json = cli.json, "running command");
    match with_deadline(Some(config.request_timeout), operation, run(cli, &services)).await {
        Ok(out) => {
            println!("{out}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {}", err.message());
            ExitCode::from(exit_code(&err))
        }
    }
}

async fn setup() -> anyhow::Result<(AppConfig, InventoryServices)> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    require_database(&config)?;
    let services = InventoryServices::connect(&config)
        .await
        .context("failed to open inventory store")?;
    Ok((config, services))
}
