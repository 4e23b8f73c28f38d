use std::collections::BTreeMap;

use async_trait::async_trait;

use common::{OrderId, ProductId};

use crate::{
    OrderQuery, OrderUpdate, ProductDetailsUpdate, ProductRecord, Result, StockLine, StoredOrder,
    Version,
};

/// Sums stock lines per product so duplicate lines for one SKU are
/// validated and applied against the combined amount.
pub fn totals_per_product(lines: &[StockLine]) -> BTreeMap<ProductId, i64> {
    let mut totals: BTreeMap<ProductId, i64> = BTreeMap::new();
    for line in lines {
        *totals.entry(line.product_id.clone()).or_insert(0) += line.quantity;
    }
    totals
}

/// Core trait for the operations store.
///
/// An operations store persists order documents and the inventory ledger
/// and is the single place where the atomicity guarantees live:
///
/// - `insert_order` reserves stock and creates the order as one unit; if
///   any product in the batch fails its availability check, no counter is
///   touched and no order exists afterwards.
/// - `update_order` applies a compare-and-commit write of the document
///   together with any stock restorations; either the new document version
///   and all restorations are durable, or none of it is.
///
/// Product counters move only through those two operations. All
/// implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OperationsStore: Send + Sync {
    /// Inserts a new order, atomically reserving stock for every line.
    ///
    /// For each reservation, a tracked product that does not allow
    /// out-of-stock purchase must have `quantity >= requested`, otherwise
    /// the whole insert fails with `InsufficientStock` and nothing is
    /// committed. On success every reserved product's `quantity` is
    /// decremented and `total_sold` incremented by the reserved amount, and
    /// the order is stored at [`Version::first`].
    async fn insert_order(
        &self,
        order: StoredOrder,
        reservations: &[StockLine],
    ) -> Result<Version>;

    /// Applies a compare-and-commit update of an order document, together
    /// with the given stock restorations, as one atomic unit.
    ///
    /// Fails with `VersionConflict` if the stored version no longer equals
    /// `update.expected_version`; in that case no restoration is applied.
    /// Each restoration increments the product's `quantity` and decrements
    /// its `total_sold` by the line amount.
    ///
    /// Returns the new version of the document.
    async fn update_order(
        &self,
        update: OrderUpdate,
        restorations: &[StockLine],
    ) -> Result<Version>;

    /// Retrieves an order by ID, including soft-deleted ones.
    async fn get_order(&self, id: OrderId) -> Result<Option<StoredOrder>>;

    /// Retrieves the orders whose IDs appear in `ids`.
    ///
    /// Missing IDs are simply absent from the result; callers that need a
    /// fail-fast existence check compare lengths themselves.
    async fn get_orders(&self, ids: &[OrderId]) -> Result<Vec<StoredOrder>>;

    /// Retrieves orders matching a query, ordered by `placed_at` ascending.
    async fn query_orders(&self, query: OrderQuery) -> Result<Vec<StoredOrder>>;

    /// Adds a product to the catalog.
    async fn insert_product(&self, product: ProductRecord) -> Result<()>;

    /// Retrieves a product by SKU.
    async fn get_product(&self, id: &ProductId) -> Result<Option<ProductRecord>>;

    /// Retrieves the products whose SKUs appear in `ids`.
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<ProductRecord>>;

    /// Retrieves the full catalog.
    async fn list_products(&self) -> Result<Vec<ProductRecord>>;

    /// Applies a catalog edit. The ledger counters are not reachable from
    /// this path.
    async fn update_product_details(
        &self,
        id: &ProductId,
        update: ProductDetailsUpdate,
    ) -> Result<ProductRecord>;
}
