use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use carpool::backend::config::BackendConfig;
use carpool::backend::initialize_backend;
use carpool::backend::io::{run_command, Cli};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let source = cli.config_source().context("Failed to read configuration")?;
    let config = BackendConfig::from_source(&source).context("Invalid storage configuration")?;
    info!("Using {} storage at {}", config.storage_type(), config.location());

    let state = initialize_backend(&config)
        .await
        .context("Failed to initialize storage backend")?;

    let output = run_command(cli.entity, &state).await?;
    println!("{}", output);

    Ok(())
}
