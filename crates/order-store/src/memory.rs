use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use common::{OrderId, ProductId};

use crate::{
    OrderQuery, OrderUpdate, ProductDetailsUpdate, ProductRecord, Result, StockLine, StoreError,
    StoredOrder, Version,
    store::{OperationsStore, totals_per_product},
};

#[derive(Default)]
struct StoreState {
    orders: HashMap<OrderId, StoredOrder>,
    order_numbers: HashSet<String>,
    products: HashMap<ProductId, ProductRecord>,
}

/// In-memory operations store for testing and development.
///
/// All commits happen under a single write lock, which makes every
/// order-plus-ledger mutation naturally atomic: validation runs first and
/// nothing is applied unless every check passes.
#[derive(Clone, Default)]
pub struct InMemoryOperationsStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryOperationsStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored, including deleted ones.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Clears all orders and products.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.orders.clear();
        state.order_numbers.clear();
        state.products.clear();
    }
}

#[async_trait]
impl OperationsStore for InMemoryOperationsStore {
    async fn insert_order(
        &self,
        order: StoredOrder,
        reservations: &[StockLine],
    ) -> Result<Version> {
        let mut state = self.state.write().await;

        if state.orders.contains_key(&order.id) || state.order_numbers.contains(&order.order_number)
        {
            return Err(StoreError::DuplicateOrder(order.id));
        }

        // Validate every reservation before touching any counter.
        let totals = totals_per_product(reservations);
        for (product_id, requested) in &totals {
            let product = state
                .products
                .get(product_id)
                .ok_or_else(|| StoreError::ProductNotFound(product_id.clone()))?;
            if product.rejects_reservation(*requested) {
                return Err(StoreError::InsufficientStock {
                    product_id: product_id.clone(),
                    available: product.quantity,
                    requested: *requested,
                });
            }
        }

        // All checks passed; apply under the same write guard.
        let now = Utc::now();
        for (product_id, requested) in &totals {
            if let Some(product) = state.products.get_mut(product_id) {
                product.quantity -= requested;
                product.total_sold += requested;
                product.updated_at = now;
            }
        }

        let mut order = order;
        order.version = Version::first();
        state.order_numbers.insert(order.order_number.clone());
        state.orders.insert(order.id, order);

        Ok(Version::first())
    }

    async fn update_order(
        &self,
        update: OrderUpdate,
        restorations: &[StockLine],
    ) -> Result<Version> {
        let mut state = self.state.write().await;

        let current_version = match state.orders.get(&update.id) {
            Some(order) => order.version,
            None => return Err(StoreError::OrderNotFound(update.id)),
        };

        if current_version != update.expected_version {
            return Err(StoreError::VersionConflict {
                order_id: update.id,
                expected: update.expected_version,
                actual: current_version,
            });
        }

        // Restorations go to products that must still exist; the catalog
        // has no delete path, so a miss is a caller bug worth surfacing.
        let totals = totals_per_product(restorations);
        for product_id in totals.keys() {
            if !state.products.contains_key(product_id) {
                return Err(StoreError::ProductNotFound(product_id.clone()));
            }
        }

        let now = Utc::now();
        for (product_id, restored) in &totals {
            if let Some(product) = state.products.get_mut(product_id) {
                product.quantity += restored;
                product.total_sold -= restored;
                product.updated_at = now;
            }
        }

        let new_version = current_version.next();
        if let Some(order) = state.orders.get_mut(&update.id) {
            order.status = update.status;
            order.deleted = update.deleted;
            order.body = update.body;
            order.version = new_version;
        }

        Ok(new_version)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<StoredOrder>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn get_orders(&self, ids: &[OrderId]) -> Result<Vec<StoredOrder>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.orders.get(id).cloned())
            .collect())
    }

    async fn query_orders(&self, query: OrderQuery) -> Result<Vec<StoredOrder>> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .orders
            .values()
            .filter(|o| {
                if !query.include_deleted && o.deleted {
                    return false;
                }
                if let Some(from) = query.placed_from
                    && o.placed_at < from
                {
                    return false;
                }
                if let Some(until) = query.placed_until
                    && o.placed_at >= until
                {
                    return false;
                }
                if let Some(ref status) = query.status
                    && &o.status != status
                {
                    return false;
                }
                if let Some(customer_id) = query.customer_id
                    && o.customer_id != customer_id
                {
                    return false;
                }
                true
            })
            .cloned()
            .collect();

        orders.sort_by(|a, b| {
            a.placed_at
                .cmp(&b.placed_at)
                .then(a.order_number.cmp(&b.order_number))
        });

        let offset = query.offset.unwrap_or(0);
        let orders: Vec<_> = orders.into_iter().skip(offset).collect();

        let orders = if let Some(limit) = query.limit {
            orders.into_iter().take(limit).collect()
        } else {
            orders
        };

        Ok(orders)
    }

    async fn insert_product(&self, product: ProductRecord) -> Result<()> {
        let mut state = self.state.write().await;
        if state.products.contains_key(&product.id) {
            return Err(StoreError::DuplicateProduct(product.id));
        }
        state.products.insert(product.id.clone(), product);
        Ok(())
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<ProductRecord>> {
        Ok(self.state.read().await.products.get(id).cloned())
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<ProductRecord>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.products.get(id).cloned())
            .collect())
    }

    async fn list_products(&self) -> Result<Vec<ProductRecord>> {
        let state = self.state.read().await;
        let mut products: Vec<_> = state.products.values().cloned().collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(products)
    }

    async fn update_product_details(
        &self,
        id: &ProductId,
        update: ProductDetailsUpdate,
    ) -> Result<ProductRecord> {
        let mut state = self.state.write().await;
        let product = state
            .products
            .get_mut(id)
            .ok_or_else(|| StoreError::ProductNotFound(id.clone()))?;
        update.apply_to(product);
        Ok(product.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;

    fn test_order(number: &str) -> StoredOrder {
        StoredOrder {
            id: OrderId::new(),
            order_number: number.to_string(),
            customer_id: common::CustomerId::new(),
            status: "pending".to_string(),
            placed_at: Utc::now(),
            deleted: false,
            version: Version::first(),
            body: serde_json::json!({"order_number": number}),
        }
    }

    fn widget(quantity: i64) -> ProductRecord {
        ProductRecord::new("SKU-001", "Widget", "tools", Money::from_cents(1000), quantity)
    }

    #[tokio::test]
    async fn insert_order_reserves_stock() {
        let store = InMemoryOperationsStore::new();
        store.insert_product(widget(10)).await.unwrap();

        let order = test_order("SO-1");
        let version = store
            .insert_order(order, &[StockLine::new("SKU-001", 3)])
            .await
            .unwrap();
        assert_eq!(version, Version::first());

        let product = store
            .get_product(&ProductId::new("SKU-001"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.quantity, 7);
        assert_eq!(product.total_sold, 3);
    }

    #[tokio::test]
    async fn insert_order_rejects_insufficient_stock() {
        let store = InMemoryOperationsStore::new();
        store.insert_product(widget(2)).await.unwrap();

        let order = test_order("SO-1");
        let result = store
            .insert_order(order, &[StockLine::new("SKU-001", 3)])
            .await;

        assert!(matches!(
            result,
            Err(StoreError::InsufficientStock {
                available: 2,
                requested: 3,
                ..
            })
        ));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn failed_multi_line_reservation_touches_nothing() {
        let store = InMemoryOperationsStore::new();
        store.insert_product(widget(10)).await.unwrap();
        store
            .insert_product(ProductRecord::new(
                "SKU-002",
                "Gadget",
                "tools",
                Money::from_cents(500),
                1,
            ))
            .await
            .unwrap();

        let order = test_order("SO-1");
        let result = store
            .insert_order(
                order,
                &[StockLine::new("SKU-001", 2), StockLine::new("SKU-002", 5)],
            )
            .await;
        assert!(matches!(result, Err(StoreError::InsufficientStock { .. })));

        // The first product must be untouched even though it was listed first.
        let product = store
            .get_product(&ProductId::new("SKU-001"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.quantity, 10);
        assert_eq!(product.total_sold, 0);
    }

    #[tokio::test]
    async fn duplicate_lines_for_one_product_are_summed() {
        let store = InMemoryOperationsStore::new();
        store.insert_product(widget(5)).await.unwrap();

        let order = test_order("SO-1");
        let result = store
            .insert_order(
                order,
                &[StockLine::new("SKU-001", 3), StockLine::new("SKU-001", 3)],
            )
            .await;
        assert!(matches!(
            result,
            Err(StoreError::InsufficientStock { requested: 6, .. })
        ));
    }

    #[tokio::test]
    async fn untracked_product_reserves_past_zero() {
        let store = InMemoryOperationsStore::new();
        store.insert_product(widget(1).untracked()).await.unwrap();

        let order = test_order("SO-1");
        store
            .insert_order(order, &[StockLine::new("SKU-001", 5)])
            .await
            .unwrap();

        let product = store
            .get_product(&ProductId::new("SKU-001"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.quantity, -4);
        assert_eq!(product.total_sold, 5);
    }

    #[tokio::test]
    async fn duplicate_order_number_is_rejected() {
        let store = InMemoryOperationsStore::new();
        store.insert_order(test_order("SO-1"), &[]).await.unwrap();

        let result = store.insert_order(test_order("SO-1"), &[]).await;
        assert!(matches!(result, Err(StoreError::DuplicateOrder(_))));
    }

    #[tokio::test]
    async fn update_order_bumps_version() {
        let store = InMemoryOperationsStore::new();
        let order = test_order("SO-1");
        let id = order.id;
        store.insert_order(order, &[]).await.unwrap();

        let update = OrderUpdate {
            id,
            expected_version: Version::first(),
            status: "processing".to_string(),
            deleted: false,
            body: serde_json::json!({"status": "processing"}),
        };
        let version = store.update_order(update, &[]).await.unwrap();
        assert_eq!(version, Version::new(2));

        let stored = store.get_order(id).await.unwrap().unwrap();
        assert_eq!(stored.status, "processing");
        assert_eq!(stored.version, Version::new(2));
    }

    #[tokio::test]
    async fn update_order_with_stale_version_conflicts() {
        let store = InMemoryOperationsStore::new();
        let order = test_order("SO-1");
        let id = order.id;
        store.insert_order(order, &[]).await.unwrap();

        let update = OrderUpdate {
            id,
            expected_version: Version::first(),
            status: "processing".to_string(),
            deleted: false,
            body: serde_json::json!({}),
        };
        store.update_order(update.clone(), &[]).await.unwrap();

        // Second writer still holds version 1.
        let result = store.update_order(update, &[]).await;
        assert!(matches!(result, Err(StoreError::VersionConflict { .. })));
    }

    #[tokio::test]
    async fn conflicting_update_applies_no_restoration() {
        let store = InMemoryOperationsStore::new();
        store.insert_product(widget(10)).await.unwrap();

        let order = test_order("SO-1");
        let id = order.id;
        store
            .insert_order(order, &[StockLine::new("SKU-001", 4)])
            .await
            .unwrap();

        let stale = OrderUpdate {
            id,
            expected_version: Version::new(9),
            status: "cancelled".to_string(),
            deleted: false,
            body: serde_json::json!({}),
        };
        let result = store
            .update_order(stale, &[StockLine::new("SKU-001", 4)])
            .await;
        assert!(matches!(result, Err(StoreError::VersionConflict { .. })));

        let product = store
            .get_product(&ProductId::new("SKU-001"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.quantity, 6);
        assert_eq!(product.total_sold, 4);
    }

    #[tokio::test]
    async fn restoration_moves_counters_in_lock_step() {
        let store = InMemoryOperationsStore::new();
        store.insert_product(widget(10)).await.unwrap();

        let order = test_order("SO-1");
        let id = order.id;
        store
            .insert_order(order, &[StockLine::new("SKU-001", 4)])
            .await
            .unwrap();

        let update = OrderUpdate {
            id,
            expected_version: Version::first(),
            status: "cancelled".to_string(),
            deleted: false,
            body: serde_json::json!({}),
        };
        store
            .update_order(update, &[StockLine::new("SKU-001", 4)])
            .await
            .unwrap();

        let product = store
            .get_product(&ProductId::new("SKU-001"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.quantity, 10);
        assert_eq!(product.total_sold, 0);
    }

    #[tokio::test]
    async fn query_orders_filters_by_time_window() {
        use chrono::TimeZone;

        let store = InMemoryOperationsStore::new();
        let mut early = test_order("SO-1");
        early.placed_at = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        let mut late = test_order("SO-2");
        late.placed_at = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        store.insert_order(early, &[]).await.unwrap();
        store.insert_order(late, &[]).await.unwrap();

        let query = OrderQuery::new()
            .placed_from(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
            .placed_until(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        let results = store.query_orders(query).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].order_number, "SO-1");
    }

    #[tokio::test]
    async fn query_orders_excludes_deleted_by_default() {
        let store = InMemoryOperationsStore::new();
        let mut order = test_order("SO-1");
        order.deleted = true;
        store.insert_order(order, &[]).await.unwrap();

        assert!(store.query_orders(OrderQuery::new()).await.unwrap().is_empty());
        assert_eq!(
            store
                .query_orders(OrderQuery::new().with_deleted())
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn get_orders_skips_missing_ids() {
        let store = InMemoryOperationsStore::new();
        let order = test_order("SO-1");
        let id = order.id;
        store.insert_order(order, &[]).await.unwrap();

        let results = store.get_orders(&[id, OrderId::new()]).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, id);
    }

    #[tokio::test]
    async fn product_details_update_preserves_counters() {
        let store = InMemoryOperationsStore::new();
        store.insert_product(widget(10)).await.unwrap();
        store
            .insert_order(test_order("SO-1"), &[StockLine::new("SKU-001", 2)])
            .await
            .unwrap();

        let updated = store
            .update_product_details(
                &ProductId::new("SKU-001"),
                ProductDetailsUpdate {
                    name: Some("Widget Deluxe".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Widget Deluxe");
        assert_eq!(updated.quantity, 8);
        assert_eq!(updated.total_sold, 2);
    }
}
