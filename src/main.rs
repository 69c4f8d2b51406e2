use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};

use evm_portfolio_tracker::utils::helper::format_address;
use evm_portfolio_tracker::{
    BalanceSource, CoinGeckoPriceSource, Config, ConsoleEventHandler, EtherscanBalanceSource,
    PortfolioAggregator, PortfolioEventHandler,
};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Invalid configuration")?;

    // Initialize logging
    let level = LevelFilter::from_str(&config.log_level).unwrap_or(LevelFilter::INFO);
    tracing_subscriber::fmt()
        .with_level(true)
        .with_target(false)
        .with_max_level(level)
        .with_file(true)
        .with_line_number(true)
        .init();

    tokio::runtime::Runtime::new()?.block_on(run(config))
}

/// Aggregate the configured wallet once and report the result
async fn run(config: Config) -> anyhow::Result<()> {
    info!("Initializing portfolio aggregator...");
    info!("Balance API: {} (chain {})", config.etherscan_api_url, config.chain_id);
    info!("Price API: {}", config.coingecko_api_url);
    info!("Wallet Address: {}", format_address(&config.wallet_address));

    let balance_source = Arc::new(EtherscanBalanceSource::new(
        config.etherscan_api_url.clone(),
        config.etherscan_api_key.clone(),
        config.chain_id.clone(),
        config.fetch_timeout,
    )?);
    let price_source = Arc::new(CoinGeckoPriceSource::new(
        config.coingecko_api_url.clone(),
        config.coingecko_api_key.clone(),
        config.fetch_timeout,
    )?);

    if !balance_source
        .validate_address(&config.wallet_address)
        .await
        .context("Address validation request failed")?
    {
        anyhow::bail!(
            "Invalid address or API error: provider rejected {}",
            config.wallet_address
        );
    }

    let aggregator = PortfolioAggregator::new(balance_source, price_source)
        .with_fetch_timeout(config.fetch_timeout);
    let handler = ConsoleEventHandler::new();

    match aggregator
        .aggregate(&config.wallet_address, &config.assets, &config.fiat_currency)
        .await
    {
        Ok(snapshot) => {
            handler.handle_snapshot(&snapshot).await;
            Ok(())
        }
        Err(e) => {
            handler.handle_error(&e).await;
            warn!("No snapshot produced for {}", format_address(&config.wallet_address));
            Err(e.into())
        }
    }
}
