//! Typed commands accepted by the transition executor and bulk coordinator.
//!
//! Each command is decoded once at the boundary; the core never re-guesses
//! field shapes from raw payloads.

use common::{Money, OrderId, ProductId};

use super::model::{Address, CustomerRef};
use super::status::OrderStatus;

/// Where an order was created, which determines its initial status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderOrigin {
    /// Customer checkout: starts `pending` with payment outstanding.
    Checkout,

    /// Admin-entered order, already paid: starts `processing`.
    Manual,
}

/// A requested line at order creation; the name and price are frozen from
/// the catalog, not supplied by the caller.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    /// The product to order.
    pub product_id: ProductId,

    /// Units requested.
    pub quantity: u32,
}

impl NewOrderItem {
    /// Creates a new requested line.
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Command to create a new order, reserving stock for every line.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    /// The customer placing the order.
    pub customer: CustomerRef,

    /// Requested lines.
    pub items: Vec<NewOrderItem>,

    /// Shipping address.
    pub shipping_address: Address,

    /// Billing address.
    pub billing_address: Address,

    /// Payment method label.
    pub payment_method: String,

    /// Checkout or admin-entered.
    pub origin: OrderOrigin,

    /// Discount subtracted from the total.
    pub discount: Money,

    /// Optional note stored on the order.
    pub note: Option<String>,

    /// Who is creating the order, for the audit history.
    pub actor: String,
}

impl CreateOrder {
    /// Creates a checkout order command with default addresses and payment
    /// method; callers fill in the rest as needed.
    pub fn checkout(customer: CustomerRef, items: Vec<NewOrderItem>) -> Self {
        Self {
            customer,
            items,
            shipping_address: Address::default(),
            billing_address: Address::default(),
            payment_method: "card".to_string(),
            origin: OrderOrigin::Checkout,
            discount: Money::zero(),
            note: None,
            actor: "storefront".to_string(),
        }
    }

    /// Creates an admin-entered order command (already paid, starts
    /// `processing`).
    pub fn manual(customer: CustomerRef, items: Vec<NewOrderItem>, actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            origin: OrderOrigin::Manual,
            ..Self::checkout(customer, items)
        }
    }

    /// Sets the payment method.
    pub fn with_payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = method.into();
        self
    }

    /// Sets the discount.
    pub fn with_discount(mut self, discount: Money) -> Self {
        self.discount = discount;
        self
    }

    /// Sets the note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Command to apply a single status transition to one order.
#[derive(Debug, Clone)]
pub struct ApplyTransition {
    /// The order to transition.
    pub order_id: OrderId,

    /// The status to move to.
    pub target: OrderStatus,

    /// Who is applying the transition, for the audit history.
    pub actor: String,

    /// Optional operator note recorded in the status history.
    pub note: Option<String>,

    /// Tracking number; required when the target is `shipped`.
    pub tracking_number: Option<String>,

    /// Carrier name; required when the target is `shipped`.
    pub carrier: Option<String>,
}

impl ApplyTransition {
    /// Creates a transition command.
    pub fn new(order_id: OrderId, target: OrderStatus, actor: impl Into<String>) -> Self {
        Self {
            order_id,
            target,
            actor: actor.into(),
            note: None,
            tracking_number: None,
            carrier: None,
        }
    }

    /// Attaches an operator note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Attaches the fulfillment details required for shipping.
    pub fn with_fulfillment(
        mut self,
        tracking_number: impl Into<String>,
        carrier: impl Into<String>,
    ) -> Self {
        self.tracking_number = Some(tracking_number.into());
        self.carrier = Some(carrier.into());
        self
    }
}

/// Command to apply one transition to a set of orders.
///
/// Fulfillment details are deliberately absent: a shared tracking number
/// across many orders would be meaningless, so bulk shipping is rejected
/// per-order with `MissingFulfillmentDetails`.
#[derive(Debug, Clone)]
pub struct BulkApplyTransition {
    /// The orders to transition.
    pub order_ids: Vec<OrderId>,

    /// The status to move every order to.
    pub target: OrderStatus,

    /// Who is applying the transitions.
    pub actor: String,

    /// Optional note recorded on each applied order.
    pub note: Option<String>,
}

impl BulkApplyTransition {
    /// Creates a bulk transition command.
    pub fn new(order_ids: Vec<OrderId>, target: OrderStatus, actor: impl Into<String>) -> Self {
        Self {
            order_ids,
            target,
            actor: actor.into(),
            note: None,
        }
    }

    /// Attaches an operator note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Command to soft-delete an order.
#[derive(Debug, Clone)]
pub struct DeleteOrder {
    /// The order to delete.
    pub order_id: OrderId,

    /// Who is deleting it.
    pub actor: String,
}

impl DeleteOrder {
    /// Creates a delete command.
    pub fn new(order_id: OrderId, actor: impl Into<String>) -> Self {
        Self {
            order_id,
            actor: actor.into(),
        }
    }
}
