//! Data models for the portfolio aggregator

pub mod asset;
pub mod balance;
pub mod price;
pub mod portfolio;

// Re-export for convenience
pub use asset::{default_tracked_assets, AssetDescriptor};
pub use balance::RawBalance;
pub use price::PriceTable;
pub use portfolio::{AssetValuation, PortfolioSnapshot};
