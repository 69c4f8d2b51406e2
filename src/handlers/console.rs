use async_trait::async_trait;
use tracing::{error, info};

use crate::error::AggregationError;
use crate::models::portfolio::PortfolioSnapshot;
use crate::traits::event_handler::PortfolioEventHandler;

/// Console logging event handler
pub struct ConsoleEventHandler;

impl ConsoleEventHandler {
    /// Create a new console event handler
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleEventHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PortfolioEventHandler for ConsoleEventHandler {
    async fn handle_snapshot(&self, snapshot: &PortfolioSnapshot) {
        info!("{}", "=".repeat(80));
        info!(
            "Timestamp: {}",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        );
        for line in snapshot.format_report().lines() {
            info!("{}", line);
        }
        info!("{}", "=".repeat(80));
    }

    async fn handle_error(&self, error: &AggregationError) {
        error!("Error loading portfolio: {}", error);
    }
}
