//! The order aggregate: an immutable identity plus mutable status, frozen
//! line items, addresses, and append-only history logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::{CustomerId, Money, OrderId, ProductId};
use order_store::StockLine;

use super::status::{OrderStatus, PaymentStatus};

/// Human-facing order number, globally unique.
///
/// Combines the placement date with a UUID-derived suffix, so regenerating
/// on a retried create command cannot collide with a previous attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generates a fresh order number for an order placed at `at`.
    pub fn generate(at: DateTime<Utc>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!(
            "SO-{}-{}",
            at.format("%Y%m%d"),
            suffix[..8].to_uppercase()
        ))
    }

    /// Returns the order number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Customer identity frozen onto the order at placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRef {
    /// The customer's ID.
    pub id: CustomerId,

    /// Display name at order time.
    pub name: String,

    /// Contact email for notifications.
    pub email: String,
}

impl CustomerRef {
    /// Creates a customer reference.
    pub fn new(id: CustomerId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Postal address attached to an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
}

/// A line item: a frozen snapshot of the product at purchase time.
///
/// Name and unit price are copied out of the catalog when the order is
/// placed; later catalog edits never change what this order recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// The product's SKU.
    pub product_id: ProductId,

    /// Product name at purchase time.
    pub name: String,

    /// Units ordered.
    pub quantity: u32,

    /// Price per unit at purchase time.
    pub unit_price: Money,
}

impl OrderItem {
    /// Creates a new line item snapshot.
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns the line total (quantity * unit_price).
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// One entry in the append-only status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    /// The status the order entered.
    pub status: OrderStatus,

    /// When the change happened.
    pub at: DateTime<Utc>,

    /// Who triggered the change.
    pub actor: String,

    /// Optional operator note.
    pub note: Option<String>,
}

/// One entry in the append-only fulfillment history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentEntry {
    /// Carrier tracking number.
    pub tracking_number: String,

    /// Carrier name.
    pub carrier: String,

    /// When the shipment was recorded.
    pub at: DateTime<Utc>,

    /// Who recorded it.
    pub actor: String,
}

/// An order document.
///
/// Created once at placement and mutated only through the transition
/// executor; never physically deleted. The version used for
/// compare-and-commit lives next to the document in the store, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Primary key.
    pub id: OrderId,

    /// Globally unique order number, generated at creation.
    pub order_number: OrderNumber,

    /// The customer who placed the order.
    pub customer: CustomerRef,

    /// Frozen line item snapshots.
    pub items: Vec<OrderItem>,

    /// Where the order ships.
    pub shipping_address: Address,

    /// Billing address.
    pub billing_address: Address,

    /// How the customer pays (e.g. "card", "cash").
    pub payment_method: String,

    /// Payment state.
    pub payment_status: PaymentStatus,

    /// Sum of line totals.
    pub subtotal: Money,

    /// Flat shipping charge.
    pub shipping: Money,

    /// Flat tax applied to the subtotal.
    pub tax: Money,

    /// Discount subtracted from the total.
    pub discount: Money,

    /// subtotal + shipping + tax - discount.
    pub total: Money,

    /// Current lifecycle status.
    pub status: OrderStatus,

    /// When the order was placed.
    pub placed_at: DateTime<Utc>,

    /// Stamped when the order entered processing.
    pub processing_at: Option<DateTime<Utc>>,

    /// Stamped when the order was shipped.
    pub shipped_at: Option<DateTime<Utc>>,

    /// Stamped when the order was delivered.
    pub delivered_at: Option<DateTime<Utc>>,

    /// Stamped when the order was cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,

    /// Stamped when the order was refunded.
    pub refunded_at: Option<DateTime<Utc>>,

    /// Append-only log of every status change.
    pub status_history: Vec<StatusChange>,

    /// Append-only log of shipments.
    pub fulfillment_history: Vec<FulfillmentEntry>,

    /// Soft-delete flag.
    pub deleted: bool,

    /// Optional note captured at creation.
    pub note: Option<String>,
}

impl Order {
    /// Returns the order number.
    pub fn order_number(&self) -> &OrderNumber {
        &self.order_number
    }

    /// Sums line totals across all items.
    pub fn computed_subtotal(&self) -> Money {
        self.items.iter().map(|item| item.line_total()).sum()
    }

    /// Total units of `product_id` across the order's items.
    pub fn item_quantity_for(&self, product_id: &ProductId) -> u32 {
        self.items
            .iter()
            .filter(|item| &item.product_id == product_id)
            .map(|item| item.quantity)
            .sum()
    }

    /// The stock movements this order's own snapshots record, aggregated
    /// per product. These exact amounts were reserved at creation and are
    /// what any restoration gives back, regardless of catalog edits made
    /// since.
    pub fn stock_lines(&self) -> Vec<StockLine> {
        let mut lines: Vec<StockLine> = Vec::new();
        for item in &self.items {
            match lines
                .iter_mut()
                .find(|line| line.product_id == item.product_id)
            {
                Some(line) => line.quantity += item.quantity as i64,
                None => lines.push(StockLine::new(item.product_id.clone(), item.quantity as i64)),
            }
        }
        lines
    }

    /// Returns true if the order is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns true if soft-deleting this order should restore its stock.
    ///
    /// Cancellation is the one transition that already restored, and a
    /// refund leaves the sale standing (no inventory effect), so neither is
    /// restored again at deletion.
    pub fn delete_restores_stock(&self) -> bool {
        !matches!(self.status, OrderStatus::Cancelled | OrderStatus::Refunded)
    }

    /// Returns true if this order's reservation is still reflected in the
    /// ledger (used by the inventory audit).
    pub fn holds_stock(&self) -> bool {
        if self.status == OrderStatus::Cancelled {
            return false;
        }
        // A deletion restored unless the order had already been refunded.
        !(self.deleted && self.status != OrderStatus::Refunded)
    }

    /// Appends a status-history entry without changing the status; used by
    /// soft deletion.
    pub fn mark_deleted(&mut self, actor: impl Into<String>, at: DateTime<Utc>) {
        self.deleted = true;
        self.status_history.push(StatusChange {
            status: self.status,
            at,
            actor: actor.into(),
            note: Some("order soft-deleted".to_string()),
        });
    }
}
