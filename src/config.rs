use std::time::Duration;

use anyhow::Context;

use crate::models::asset::{default_tracked_assets, ensure_unique, AssetDescriptor};
use crate::providers::{coingecko::DEFAULT_COINGECKO_URL, etherscan::DEFAULT_ETHERSCAN_URL};
use crate::utils::helper::parse_address;
use crate::Result;

const DEFAULT_CHAIN_ID: &str = "1";
const DEFAULT_FIAT_CURRENCY: &str = "usd";
const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Runtime configuration, read from the environment
#[derive(Debug, Clone)]
pub struct Config {
    pub wallet_address: String,
    pub etherscan_api_key: String,
    pub etherscan_api_url: String,
    pub chain_id: String,
    pub coingecko_api_url: String,
    pub coingecko_api_key: Option<String>,
    pub fiat_currency: String,
    pub fetch_timeout: Duration,
    pub log_level: String,
    pub assets: Vec<AssetDescriptor>,
}

impl Config {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let wallet_address = var("WALLET_ADDRESS").context("WALLET_ADDRESS is not set")?;
        let wallet_address = parse_address(&wallet_address)?;

        let etherscan_api_key = var("ETHERSCAN_API_KEY").context("ETHERSCAN_API_KEY is not set")?;

        let fetch_timeout_ms = match var("FETCH_TIMEOUT_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("FETCH_TIMEOUT_MS must be a whole number of milliseconds, got {}", raw))?,
            None => DEFAULT_FETCH_TIMEOUT_MS,
        };
        if fetch_timeout_ms == 0 {
            anyhow::bail!("FETCH_TIMEOUT_MS must be greater than zero");
        }

        let assets = default_tracked_assets();
        ensure_unique(&assets)?;

        Ok(Self {
            wallet_address,
            etherscan_api_key,
            etherscan_api_url: var("ETHERSCAN_API_URL").unwrap_or_else(|| DEFAULT_ETHERSCAN_URL.to_string()),
            chain_id: var("CHAIN_ID").unwrap_or_else(|| DEFAULT_CHAIN_ID.to_string()),
            coingecko_api_url: var("COINGECKO_API_URL").unwrap_or_else(|| DEFAULT_COINGECKO_URL.to_string()),
            coingecko_api_key: var("COINGECKO_API_KEY"),
            fiat_currency: var("FIAT_CURRENCY")
                .unwrap_or_else(|| DEFAULT_FIAT_CURRENCY.to_string())
                .to_ascii_lowercase(),
            fetch_timeout: Duration::from_millis(fetch_timeout_ms),
            log_level: var("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            assets,
        })
    }
}
