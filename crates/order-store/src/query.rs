use chrono::{DateTime, Utc};

use common::CustomerId;

/// Filter criteria for querying order documents.
///
/// Timestamp bounds are half-open: `placed_from` is inclusive and
/// `placed_until` is exclusive, so adjacent ranges never double-count an
/// order on the boundary.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    /// Only orders placed at or after this instant.
    pub placed_from: Option<DateTime<Utc>>,

    /// Only orders placed strictly before this instant.
    pub placed_until: Option<DateTime<Utc>>,

    /// Only orders currently in this status.
    pub status: Option<String>,

    /// Only orders for this customer.
    pub customer_id: Option<CustomerId>,

    /// Include soft-deleted orders. Defaults to false.
    pub include_deleted: bool,

    /// Maximum number of orders to return.
    pub limit: Option<usize>,

    /// Number of orders to skip.
    pub offset: Option<usize>,
}

impl OrderQuery {
    /// Creates an empty query matching all live (non-deleted) orders.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters to orders placed at or after the given instant.
    pub fn placed_from(mut self, from: DateTime<Utc>) -> Self {
        self.placed_from = Some(from);
        self
    }

    /// Filters to orders placed strictly before the given instant.
    pub fn placed_until(mut self, until: DateTime<Utc>) -> Self {
        self.placed_until = Some(until);
        self
    }

    /// Filters to orders in the given status.
    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Filters to orders for the given customer.
    pub fn customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    /// Includes soft-deleted orders in the results.
    pub fn with_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    /// Limits the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips the first `offset` results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}
