//! Core traits for the portfolio aggregator

pub mod balance_source;
pub mod price_source;
pub mod event_handler;

// Re-export for convenience
pub use balance_source::BalanceSource;
pub use price_source::PriceSource;
pub use event_handler::PortfolioEventHandler;
