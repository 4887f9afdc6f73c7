mod cli;

use clap::Parser;
use cli::Cli;
use std::process::ExitCode;
use tempmail_confirm::{Config, TempMailClient};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tempmail_confirm=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let client = match cli
        .apply(Config::builder())
        .build()
        .and_then(TempMailClient::new)
    {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, category = %e.category(), "Invalid configuration");
            return ExitCode::from(2);
        }
    };

    info!(client = ?client, "Starting confirmation run");
    let result = client.run().await;

    match result.to_json_pretty() {
        Ok(json) => println!("{json}"),
        Err(e) => {
            error!(error = %e, "Failed to serialize result");
            return ExitCode::FAILURE;
        }
    }

    if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
