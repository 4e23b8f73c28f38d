use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::{Money, ProductId};

/// A product entry in the inventory ledger.
///
/// The two counters (`quantity`, `total_sold`) are derived solely from
/// order commits: reservation at order creation decrements `quantity` and
/// increments `total_sold` by the same amount; restoration on cancellation
/// or deletion does the exact inverse. Catalog edits go through
/// [`ProductDetailsUpdate`] and cannot reach the counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    /// The product SKU.
    pub id: ProductId,

    /// Display name, frozen into order items at purchase time.
    pub name: String,

    /// Category used by the analytics breakdowns.
    pub category: String,

    /// Current unit price, frozen into order items at purchase time.
    pub unit_price: Money,

    /// Units available. May go negative only for products that allow
    /// out-of-stock purchase.
    pub quantity: i64,

    /// Lifetime units sold, moving in lock-step with `quantity`.
    pub total_sold: i64,

    /// When false, availability is not enforced at reservation time.
    pub track_quantity: bool,

    /// When true, a tracked product may be reserved past zero.
    pub allow_out_of_stock: bool,

    /// When the product was first added to the catalog.
    pub created_at: DateTime<Utc>,

    /// Last catalog edit or ledger movement.
    pub updated_at: DateTime<Utc>,
}

impl ProductRecord {
    /// Creates a new catalog entry with zeroed sales counters.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        category: impl Into<String>,
        unit_price: Money,
        quantity: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            unit_price,
            quantity,
            total_sold: 0,
            track_quantity: true,
            allow_out_of_stock: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Disables stock enforcement for this product.
    pub fn untracked(mut self) -> Self {
        self.track_quantity = false;
        self
    }

    /// Allows reservations past zero stock.
    pub fn allowing_out_of_stock(mut self) -> Self {
        self.allow_out_of_stock = true;
        self
    }

    /// Returns true if a reservation of `requested` units must be rejected.
    pub fn rejects_reservation(&self, requested: i64) -> bool {
        self.track_quantity && !self.allow_out_of_stock && self.quantity < requested
    }
}

/// Per-product stock movement attached to an order commit.
///
/// The direction is determined by the store operation it rides on:
/// reservations (order insert) decrement `quantity` and increment
/// `total_sold`; restorations (cancellation/deletion update) do the
/// inverse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLine {
    /// The product being moved.
    pub product_id: ProductId,

    /// Units moved; always positive.
    pub quantity: i64,
}

impl StockLine {
    /// Creates a new stock line.
    pub fn new(product_id: impl Into<ProductId>, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// A partial catalog edit.
///
/// Deliberately has no `quantity`/`total_sold` fields: the ledger counters
/// are unreachable from this path.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductDetailsUpdate {
    /// New display name.
    pub name: Option<String>,

    /// New category.
    pub category: Option<String>,

    /// New unit price. Does not affect already-placed orders, which carry
    /// their own frozen price snapshots.
    pub unit_price: Option<Money>,

    /// Toggle stock enforcement.
    pub track_quantity: Option<bool>,

    /// Toggle overselling.
    pub allow_out_of_stock: Option<bool>,
}

impl ProductDetailsUpdate {
    /// Applies the edit to a record, stamping `updated_at`.
    pub fn apply_to(&self, record: &mut ProductRecord) {
        if let Some(ref name) = self.name {
            record.name = name.clone();
        }
        if let Some(ref category) = self.category {
            record.category = category.clone();
        }
        if let Some(unit_price) = self.unit_price {
            record.unit_price = unit_price;
        }
        if let Some(track) = self.track_quantity {
            record.track_quantity = track;
        }
        if let Some(allow) = self.allow_out_of_stock {
            record.allow_out_of_stock = allow;
        }
        record.updated_at = Utc::now();
    }
}
