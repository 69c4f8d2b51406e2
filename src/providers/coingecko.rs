use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use bigdecimal::{BigDecimal, Zero};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::price::PriceTable;
use crate::traits::price_source::PriceSource;
use crate::Result;

pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3/simple/price";

/// Header carrying a CoinGecko demo API key
const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// `{ "<price id>": { "<fiat>": <number> } }`
type SimplePriceResponse = HashMap<String, HashMap<String, Value>>;

/// CoinGecko simple-price provider
pub struct CoinGeckoPriceSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoPriceSource {
    /// Create a new provider with its own HTTP client
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build CoinGecko HTTP client")?;

        Ok(Self::with_client(client, base_url, api_key))
    }

    /// Create a provider on top of an existing client
    pub fn with_client(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }
}

/// Build a table from a decoded response, dropping anything that is not a
/// non-negative number.
fn into_price_table(response: SimplePriceResponse) -> PriceTable {
    let mut table = PriceTable::new();

    for (price_id, quotes) in response {
        for (fiat, quote) in quotes {
            // With arbitrary_precision the number keeps the provider's literal text
            let parsed = match &quote {
                Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
                _ => None,
            };
            match parsed {
                Some(price) if price >= BigDecimal::zero() => table.insert(price_id.clone(), &fiat, price),
                _ => warn!("Ignoring unusable {} price for {}: {}", fiat, price_id, quote),
            }
        }
    }

    table
}

#[async_trait]
impl PriceSource for CoinGeckoPriceSource {
    async fn get_prices(
        &self,
        price_ids: &BTreeSet<String>,
        fiat_currency: &str,
    ) -> anyhow::Result<PriceTable> {
        if price_ids.is_empty() {
            return Ok(PriceTable::new());
        }

        let ids = price_ids.iter().map(String::as_str).collect::<Vec<_>>().join(",");
        let vs_currencies = fiat_currency.to_ascii_lowercase();
        debug!("CoinGecko price request for [{}] in {}", ids, vs_currencies);

        let mut request = self
            .client
            .get(&self.base_url)
            .query(&[("ids", ids.as_str()), ("vs_currencies", vs_currencies.as_str())]);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response: SimplePriceResponse = request
            .send()
            .await
            .context("CoinGecko price request failed")?
            .error_for_status()
            .context("CoinGecko price request rejected")?
            .json()
            .await
            .context("Malformed CoinGecko price response")?;

        let table = into_price_table(response);
        debug!("Received prices for {}/{} ids", table.len(), price_ids.len());
        Ok(table)
    }
}
