use thiserror::Error;

use common::{OrderId, ProductId};

use crate::Version;

/// Errors that can occur when interacting with the operations store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The order's version did not match the expected version at commit time.
    /// Another writer won the compare-and-commit race; the caller may re-read
    /// and retry the whole operation.
    #[error(
        "concurrent modification of order {order_id}: expected version {expected}, found {actual}"
    )]
    VersionConflict {
        order_id: OrderId,
        expected: Version,
        actual: Version,
    },

    /// The order was not found in the store.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// An order with this ID or order number already exists.
    #[error("order already exists: {0}")]
    DuplicateOrder(OrderId),

    /// The product was not found in the catalog.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// A product with this SKU already exists.
    #[error("product already exists: {0}")]
    DuplicateProduct(ProductId),

    /// A reservation asked for more stock than is available.
    #[error(
        "insufficient stock for product {product_id}: {available} available, {requested} requested"
    )]
    InsufficientStock {
        product_id: ProductId,
        available: i64,
        requested: i64,
    },

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns true if retrying the whole logical operation from scratch
    /// (re-read, re-validate, re-commit) can succeed. Validation failures
    /// are terminal and will fail identically on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::VersionConflict { .. } | StoreError::Database(_) | StoreError::Migration(_)
        )
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
