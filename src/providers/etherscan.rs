use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::models::balance::RawBalance;
use crate::traits::balance_source::BalanceSource;
use crate::Result;

pub const DEFAULT_ETHERSCAN_URL: &str = "https://api.etherscan.io/v2/api";

/// Envelope shared by the `balance` and `tokenbalance` actions
#[derive(Debug, Deserialize)]
struct EtherscanBalanceResponse {
    status: String,
    message: String,
    result: String,
}

/// Etherscan-compatible balance provider
pub struct EtherscanBalanceSource {
    client: Client,
    base_url: String,
    api_key: String,
    chain_id: String,
}

impl EtherscanBalanceSource {
    /// Create a new provider with its own HTTP client
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        chain_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Etherscan HTTP client")?;

        Ok(Self::with_client(client, base_url, api_key, chain_id))
    }

    /// Create a provider on top of an existing client
    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        chain_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            chain_id: chain_id.into(),
        }
    }

    async fn fetch(
        &self,
        action: &str,
        address: &str,
        contract_address: Option<&str>,
    ) -> Result<RawBalance> {
        let mut query: Vec<(&str, &str)> = vec![
            ("chainid", self.chain_id.as_str()),
            ("module", "account"),
            ("action", action),
        ];
        if let Some(contract) = contract_address {
            query.push(("contractaddress", contract));
        }
        query.push(("address", address));
        query.push(("tag", "latest"));
        query.push(("apikey", self.api_key.as_str()));

        debug!("Etherscan {} request for {} (contract: {:?})", action, address, contract_address);

        let response = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .with_context(|| format!("Etherscan {} request failed", action))?
            .error_for_status()
            .with_context(|| format!("Etherscan {} request rejected", action))?;

        let body: EtherscanBalanceResponse = response
            .json()
            .await
            .with_context(|| format!("Malformed Etherscan {} response", action))?;

        Ok(into_raw_balance(body, contract_address))
    }
}

fn into_raw_balance(body: EtherscanBalanceResponse, contract_address: Option<&str>) -> RawBalance {
    let contract_address = contract_address.map(str::to_string);

    if body.status == "1" {
        return RawBalance::ok(contract_address, body.result);
    }

    // On failure `result` carries the provider's explanation
    let message = if body.result.is_empty() || body.result == body.message {
        body.message
    } else {
        format!("{}: {}", body.message, body.result)
    };
    RawBalance::failed(contract_address, message)
}

#[async_trait]
impl BalanceSource for EtherscanBalanceSource {
    async fn get_native_balance(&self, address: &str) -> anyhow::Result<RawBalance> {
        self.fetch("balance", address, None).await
    }

    async fn get_token_balance(
        &self,
        address: &str,
        contract_address: &str,
    ) -> anyhow::Result<RawBalance> {
        self.fetch("tokenbalance", address, Some(contract_address)).await
    }
}
