use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use linea_airdrop_checker::address::split_address_text;
use linea_airdrop_checker::cli::{Cli, Command};
use linea_airdrop_checker::config::Config;
use linea_airdrop_checker::handlers::create_router;
use linea_airdrop_checker::resolver::AllocationResolver;
use linea_airdrop_checker::transport::ProviderTransport;

fn init_tracing(json_logs: bool) {
    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
    );

    if json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn build_resolver(config: &Config) -> Result<Arc<AllocationResolver>> {
    let settings = config.resolver_settings()?;
    let transport = ProviderTransport::new(&config.rpc_url()?, settings.timeout)?;

    info!(
        "Aggregator {}, target {}, chunk size {}, timeout {:?}",
        settings.aggregator, settings.target, settings.chunk_size, settings.timeout
    );

    Ok(Arc::new(AllocationResolver::new(
        Arc::new(settings),
        Arc::new(transport),
    )))
}

async fn read_address_file(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        return Ok(text);
    }

    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

async fn serve(config: Config, bind: Option<String>) -> Result<()> {
    let resolver = build_resolver(&config)?;
    let app = create_router(resolver);

    let bind_address = bind.unwrap_or(config.server.bind_address);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Server running on {}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn check(
    config: Config,
    mut addresses: Vec<String>,
    file: Option<&Path>,
    decimals: Option<u8>,
) -> Result<()> {
    if let Some(path) = file {
        addresses.extend(split_address_text(&read_address_file(path).await?));
    }

    let resolver = build_resolver(&config)?;
    let result = resolver.resolve(&addresses, decimals).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = Config::load(&cli.config)?;
    info!("Configuration loaded from {}", cli.config);

    match cli.command {
        None => serve(config, None).await,
        Some(Command::Serve { bind }) => serve(config, bind).await,
        Some(Command::Check {
            addresses,
            file,
            decimals,
        }) => check(config, addresses, file.as_deref(), decimals).await,
    }
}
