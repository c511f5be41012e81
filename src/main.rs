//! blobcli - Azure Blob Storage command-line client

use blobcli::cli::Cli;
use blobcli::config::{load_settings, resolve_config_path, Settings};
use blobcli::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    let settings = match load_configuration(&cli).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(cli.debug || settings.debug);

    // Execute the command
    if let Err(e) = run(cli, settings).await {
        error!("Error: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn load_configuration(cli: &Cli) -> Result<Settings> {
    let explicit = cli.config.is_some();
    let path = resolve_config_path(cli.config.clone())?;
    load_settings(&path, explicit).await
}

async fn run(cli: Cli, settings: Settings) -> Result<()> {
    info!("Starting blobcli");
    cli.execute(settings).await
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "blobcli=debug" } else { "blobcli=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
