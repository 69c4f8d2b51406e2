//! Balance and price aggregation

pub mod portfolio_aggregator;

pub use portfolio_aggregator::PortfolioAggregator;
