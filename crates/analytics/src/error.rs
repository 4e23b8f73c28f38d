//! Analytics error types.

use thiserror::Error;

/// Errors that can occur while computing statistics.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// An error occurred in the operations store.
    #[error("store error: {0}")]
    Store(#[from] order_store::StoreError),

    /// Failed to deserialize an order document.
    #[error("deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

/// Result type for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
