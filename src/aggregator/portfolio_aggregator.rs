use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use bigdecimal::{BigDecimal, Zero};
use futures_util::future::{join, join_all};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::AggregationError;
use crate::models::{
    asset::AssetDescriptor,
    balance::RawBalance,
    portfolio::{AssetValuation, PortfolioSnapshot},
    price::PriceTable,
};
use crate::traits::{balance_source::BalanceSource, price_source::PriceSource};
use crate::utils::decimal::to_decimal;

/// Upper bound on a single balance or price fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Joins balances and prices for a list of tracked assets into a snapshot.
///
/// Holds no state between calls; every [`aggregate`](Self::aggregate) fetches
/// everything afresh.
pub struct PortfolioAggregator {
    balance_source: Arc<dyn BalanceSource>,
    price_source: Arc<dyn PriceSource>,
    fetch_timeout: Duration,
}

impl PortfolioAggregator {
    /// Create a new aggregator
    pub fn new(balance_source: Arc<dyn BalanceSource>, price_source: Arc<dyn PriceSource>) -> Self {
        Self {
            balance_source,
            price_source,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Set the timeout applied to each individual fetch
    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Get the timeout applied to each individual fetch
    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    /// Value every asset in `assets` held by `address`, in `fiat_currency`.
    ///
    /// One balance fetch per asset and one batched price fetch run
    /// concurrently. Any failed balance aborts the whole snapshot; missing
    /// prices only zero the affected fiat value. Valuations come back in the
    /// order of `assets`.
    pub async fn aggregate(
        &self,
        address: &str,
        assets: &[AssetDescriptor],
        fiat_currency: &str,
    ) -> Result<PortfolioSnapshot, AggregationError> {
        let fiat_currency = fiat_currency.to_ascii_lowercase();
        let price_ids: BTreeSet<String> = assets.iter().map(|a| a.price_id.clone()).collect();

        debug!(
            "Aggregating {} assets for {} in {}",
            assets.len(),
            address,
            fiat_currency
        );

        // Polled in place rather than spawned: dropping this future drops every
        // outstanding request with it.
        let balance_fetches = join_all(assets.iter().map(|asset| self.fetch_balance(address, asset)));
        let (balances, prices) =
            join(balance_fetches, self.fetch_prices(&price_ids, &fiat_currency)).await;

        let mut valuations = Vec::with_capacity(assets.len());

        for (asset, balance) in assets.iter().zip(balances) {
            let raw = match balance {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Aborting snapshot for {}: {}", address, e);
                    return Err(e);
                }
            };

            let balance = to_decimal(&raw.value, asset.decimals);
            let fiat_value = match prices.get(&asset.price_id, &fiat_currency) {
                Some(price) => &balance * price,
                None => {
                    debug!("No {} price for {}, valuing at zero", fiat_currency, asset.price_id);
                    BigDecimal::zero()
                }
            };

            valuations.push(AssetValuation {
                display_name: asset.display_name.clone(),
                symbol: asset.symbol.clone(),
                balance,
                fiat_value,
            });
        }

        let snapshot = PortfolioSnapshot::new(address.to_string(), fiat_currency, valuations);
        info!(
            "Snapshot for {}: {} assets, total {} {}",
            address,
            snapshot.asset_count(),
            snapshot.total_fiat_value,
            snapshot.fiat_currency
        );

        Ok(snapshot)
    }

    /// Fetch one balance, folding transport errors, timeouts and provider
    /// rejections into [`AggregationError`].
    async fn fetch_balance(
        &self,
        address: &str,
        asset: &AssetDescriptor,
    ) -> Result<RawBalance, AggregationError> {
        let fetch = self.balance_source.get_balance(address, asset);

        match timeout(self.fetch_timeout, fetch).await {
            Ok(Ok(raw)) if raw.success => {
                debug!("Fetched {} balance: {}", asset.symbol, raw.value);
                Ok(raw)
            }
            Ok(Ok(raw)) => Err(AggregationError::new(&asset.symbol, raw.provider_message)),
            Ok(Err(e)) => Err(AggregationError::new(&asset.symbol, format!("{:#}", e))),
            Err(_) => Err(AggregationError::new(
                &asset.symbol,
                format!("timed out after {}ms", self.fetch_timeout.as_millis()),
            )),
        }
    }

    /// Fetch all prices; any failure degrades to an empty table.
    async fn fetch_prices(&self, price_ids: &BTreeSet<String>, fiat_currency: &str) -> PriceTable {
        let fetch = self.price_source.get_prices(price_ids, fiat_currency);

        match timeout(self.fetch_timeout, fetch).await {
            Ok(Ok(table)) => table,
            Ok(Err(e)) => {
                warn!("Price fetch failed, valuing all assets at zero: {:#}", e);
                PriceTable::new()
            }
            Err(_) => {
                warn!(
                    "Price fetch timed out after {}ms, valuing all assets at zero",
                    self.fetch_timeout.as_millis()
                );
                PriceTable::new()
            }
        }
    }
}
