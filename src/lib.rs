//! EVM Portfolio Tracker Library
//!
//! Fetches on-chain balances and fiat prices for a fixed list of tracked
//! assets and joins them into an ordered, exactly-valued portfolio snapshot.

// Public modules - these are the API surface
pub mod aggregator;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod providers;
pub mod traits;
pub mod utils;

// Re-export commonly used items for easier access
pub use aggregator::PortfolioAggregator;
pub use config::Config;
pub use error::AggregationError;
pub use handlers::ConsoleEventHandler;
pub use models::{
    asset::{default_tracked_assets, AssetDescriptor},
    balance::RawBalance,
    portfolio::{AssetValuation, PortfolioSnapshot},
    price::PriceTable,
};
pub use providers::{CoinGeckoPriceSource, EtherscanBalanceSource};
pub use traits::{BalanceSource, PortfolioEventHandler, PriceSource};
pub use utils::to_decimal;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type alias for library functions
pub type Result<T> = std::result::Result<T, anyhow::Error>;
