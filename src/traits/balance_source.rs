use async_trait::async_trait;

use crate::models::{asset::AssetDescriptor, balance::RawBalance};

/// Source of raw on-chain balances.
///
/// Transport failures are returned as `Err`. A provider that answered but
/// rejected the request returns `Ok` with `success == false`.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Fetch the native-asset balance of `address`
    async fn get_native_balance(&self, address: &str) -> anyhow::Result<RawBalance>;

    /// Fetch the balance `address` holds in the token at `contract_address`
    async fn get_token_balance(
        &self,
        address: &str,
        contract_address: &str,
    ) -> anyhow::Result<RawBalance>;

    /// Fetch whichever balance `asset` describes
    async fn get_balance(
        &self,
        address: &str,
        asset: &AssetDescriptor,
    ) -> anyhow::Result<RawBalance> {
        match &asset.contract_address {
            Some(contract) => self.get_token_balance(address, contract).await,
            None => self.get_native_balance(address).await,
        }
    }

    /// Ask the provider whether it accepts `address`.
    ///
    /// Costs one native-balance request; callers run it before aggregating a
    /// newly entered address.
    async fn validate_address(&self, address: &str) -> anyhow::Result<bool> {
        Ok(self.get_native_balance(address).await?.success)
    }
}
