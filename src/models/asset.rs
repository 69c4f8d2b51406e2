use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Key used for the native asset wherever a contract address would go.
pub const NATIVE_KEY: &str = "native";

/// Static description of one tracked asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    pub display_name: String,
    pub symbol: String,
    /// `None` for the chain's native asset
    pub contract_address: Option<String>,
    pub price_id: String,
    pub decimals: u32,
}

impl AssetDescriptor {
    /// Describe the chain's native asset
    pub fn native(
        display_name: impl Into<String>,
        symbol: impl Into<String>,
        price_id: impl Into<String>,
        decimals: u32,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            symbol: symbol.into(),
            contract_address: None,
            price_id: price_id.into(),
            decimals,
        }
    }

    /// Describe a contract token
    pub fn token(
        display_name: impl Into<String>,
        symbol: impl Into<String>,
        contract_address: impl Into<String>,
        price_id: impl Into<String>,
        decimals: u32,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            symbol: symbol.into(),
            contract_address: Some(contract_address.into()),
            price_id: price_id.into(),
            decimals,
        }
    }

    pub fn is_native(&self) -> bool {
        self.contract_address.is_none()
    }

    /// Contract address, or [`NATIVE_KEY`] for the native asset
    pub fn balance_key(&self) -> String {
        match &self.contract_address {
            Some(address) => address.to_ascii_lowercase(),
            None => NATIVE_KEY.to_string(),
        }
    }
}

/// The assets tracked when no other list is supplied: ETH and the two ether.fi tokens.
pub fn default_tracked_assets() -> Vec<AssetDescriptor> {
    vec![
        AssetDescriptor::native("Ethereum", "ETH", "ethereum", 18),
        AssetDescriptor::token(
            "weETH (Wrapped Ether.fi)",
            "weETH",
            "0x35fA164735182de50811E8e2E824cFb9B6118ac2",
            "ether-fi-staked-eth",
            18,
        ),
        AssetDescriptor::token(
            "eETH (Ether.fi ETH)",
            "eETH",
            "0xFe2e637202056d30016725477c5da089Ab0A043A",
            "ether-fi",
            18,
        ),
    ]
}

/// Reject lists where a price id or a contract (or the native asset) appears twice.
pub fn ensure_unique(assets: &[AssetDescriptor]) -> anyhow::Result<()> {
    let mut price_ids = HashSet::new();
    let mut balance_keys = HashSet::new();

    for asset in assets {
        if !price_ids.insert(asset.price_id.as_str()) {
            anyhow::bail!("Duplicate price id {} for {}", asset.price_id, asset.symbol);
        }
        if !balance_keys.insert(asset.balance_key()) {
            anyhow::bail!("Duplicate balance key {} for {}", asset.balance_key(), asset.symbol);
        }
    }

    Ok(())
}
