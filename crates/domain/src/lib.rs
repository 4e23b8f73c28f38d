//! Order lifecycle domain for the store-operations backend.
//!
//! The heart of the system: the order status state machine, the transition
//! executor that couples every status change to its inventory side effects,
//! all-or-nothing reservation at order creation, and the bulk coordinator
//! that applies one transition across many orders with per-order atomicity.

pub mod config;
pub mod error;
pub mod notification;
pub mod order;

pub use common::{CustomerId, Money, OrderId, ProductId};
pub use config::PricingConfig;
pub use error::DomainError;
pub use notification::{
    NoopNotifier, NotificationError, NotificationSink, OrderNotification, RecordingNotifier,
};
pub use order::{
    Address, ApplyTransition, BulkApplyTransition, BulkCoordinator, BulkOutcome, CreateOrder,
    CustomerRef, DeleteOrder, FulfillmentEntry, NewOrderItem, Order, OrderError, OrderItem,
    OrderNumber, OrderOrigin, OrderStatus, PaymentStatus, StatusChange, TransitionExecutor,
    TransitionOutcome, TransitionPlan,
};
