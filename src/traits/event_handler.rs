use async_trait::async_trait;

use crate::error::AggregationError;
use crate::models::portfolio::PortfolioSnapshot;

/// Consumer of aggregation results
#[async_trait]
pub trait PortfolioEventHandler: Send + Sync {
    /// Handle a completed snapshot
    async fn handle_snapshot(&self, snapshot: &PortfolioSnapshot);

    /// Handle an aborted aggregation
    async fn handle_error(&self, error: &AggregationError);
}
