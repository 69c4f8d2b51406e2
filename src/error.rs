use thiserror::Error;

/// Terminal failure of one aggregation attempt.
///
/// Transport errors, timeouts and provider-level rejections all collapse into
/// this one shape; `asset` is the symbol of the tracked asset whose balance
/// could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to fetch balance for {asset}: {message}")]
pub struct AggregationError {
    pub asset: String,
    pub message: String,
}

impl AggregationError {
    pub fn new(asset: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            message: message.into(),
        }
    }
}
