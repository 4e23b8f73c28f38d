//! Domain error types.

use order_store::StoreError;
use thiserror::Error;

use common::OrderId;

use crate::order::OrderError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A validation error from the order state machine. Terminal for this
    /// operation: retrying with the same input fails identically.
    #[error("order error: {0}")]
    Order(#[from] OrderError),

    /// An error surfaced from the operations store. Covers the retryable
    /// cases (lost compare-and-commit race, store unavailable) as well as
    /// lookups and stock shortfalls.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A bulk operation referenced orders that do not exist. Checked before
    /// any state is touched.
    #[error("orders not found: {missing_ids:?}")]
    OrdersNotFound { missing_ids: Vec<OrderId> },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Returns true if retrying the whole logical operation from scratch
    /// (re-read current state, re-validate, re-attempt the commit) can
    /// succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::Store(e) if e.is_retryable())
    }
}
