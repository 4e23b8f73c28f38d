//! Order aggregate, state machine, and the executors that drive it.

mod bulk;
mod commands;
mod executor;
mod model;
mod plan;
mod status;

pub use bulk::{BulkCoordinator, BulkOutcome, TransitionOutcome};
pub use commands::{
    ApplyTransition, BulkApplyTransition, CreateOrder, DeleteOrder, NewOrderItem, OrderOrigin,
};
pub use executor::TransitionExecutor;
pub use model::{
    Address, CustomerRef, FulfillmentEntry, Order, OrderItem, OrderNumber, StatusChange,
};
pub use plan::TransitionPlan;
pub use status::{OrderStatus, PaymentStatus};

use thiserror::Error;

use common::{OrderId, ProductId};

/// Validation errors from the order state machine. Terminal for the
/// operation that produced them: retrying the same command fails the same
/// way.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The source/target pair is not in the transition table. The message
    /// names both statuses so the caller can see what was attempted.
    #[error("invalid transition: cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Shipping requires a tracking number and carrier.
    #[error("missing fulfillment details: shipping requires a tracking number and carrier")]
    MissingFulfillmentDetails,

    /// An order must contain at least one item.
    #[error("order has no items")]
    EmptyOrder,

    /// Item quantities must be positive.
    #[error("invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: ProductId, quantity: u32 },

    /// Soft-deleted orders accept no further transitions.
    #[error("order {0} has been deleted")]
    OrderDeleted(OrderId),

    /// The order is already soft-deleted.
    #[error("order {0} is already deleted")]
    AlreadyDeleted(OrderId),
}
