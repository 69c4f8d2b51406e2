use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::models::price::PriceTable;

/// Source of current fiat prices
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Get prices for all `price_ids` in one request.
    ///
    /// Ids the provider does not know are simply absent from the table.
    async fn get_prices(
        &self,
        price_ids: &BTreeSet<String>,
        fiat_currency: &str,
    ) -> anyhow::Result<PriceTable>;
}
