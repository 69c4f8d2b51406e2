//! HTTP providers for balances and prices

pub mod etherscan;
pub mod coingecko;

// Re-export for convenience
pub use etherscan::EtherscanBalanceSource;
pub use coingecko::CoinGeckoPriceSource;
