use balance_change_scanner::{api, config, service::BalanceChangeService};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stdout)
        .with_target(false)
        .init();

    info!("Balance change scanner starting...");

    let cfg = config::load()?;
    info!("  API URL: {}", cfg.api_url);
    info!("  Blocks per query: {}", cfg.number_of_blocks);
    info!("  Fetch concurrency: {}", cfg.fetch_concurrency);
    info!("  Port: {}", cfg.port);

    let service = BalanceChangeService::from_config(&cfg)?;
    api::serve(&cfg, service).await?;

    info!("Balance change scanner stopped.");
    Ok(())
}
