//! Inventory audit sweep: recomputes `total_sold` from order history and
//! reports any drift in the ledger.
//!
//! Not part of the correctness path (the ledger is only ever mutated inside
//! order commits); this is a periodic safety net an operator can run.

use std::collections::HashMap;

use common::ProductId;
use domain::Order;
use order_store::{OperationsStore, OrderQuery};

use crate::Result;

/// A product whose ledger counter disagrees with the order history.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StockDiscrepancy {
    /// The product.
    pub product_id: ProductId,

    /// Catalog name.
    pub product_name: String,

    /// `total_sold` as recorded in the ledger.
    pub recorded_total_sold: i64,

    /// `total_sold` derived from orders that still hold stock.
    pub derived_total_sold: i64,
}

/// Read-only sweep over all orders and the product ledger.
pub struct InventoryAuditor<S> {
    store: S,
}

impl<S: OperationsStore> InventoryAuditor<S> {
    /// Creates an auditor over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Recomputes each product's expected `total_sold` from every order
    /// whose reservation is still reflected in the ledger, and returns the
    /// products where the recorded counter disagrees.
    #[tracing::instrument(skip(self))]
    pub async fn audit(&self) -> Result<Vec<StockDiscrepancy>> {
        let products = self.store.list_products().await?;
        let stored = self.store.query_orders(OrderQuery::new().with_deleted()).await?;

        let mut derived: HashMap<ProductId, i64> =
            products.iter().map(|p| (p.id.clone(), 0)).collect();

        for doc in stored {
            let order: Order = serde_json::from_value(doc.body)?;
            if !order.holds_stock() {
                continue;
            }
            for line in order.stock_lines() {
                *derived.entry(line.product_id).or_insert(0) += line.quantity;
            }
        }

        let discrepancies: Vec<StockDiscrepancy> = products
            .into_iter()
            .filter_map(|p| {
                let expected = derived.get(&p.id).copied().unwrap_or(0);
                (p.total_sold != expected).then_some(StockDiscrepancy {
                    product_id: p.id,
                    product_name: p.name,
                    recorded_total_sold: p.total_sold,
                    derived_total_sold: expected,
                })
            })
            .collect();

        if !discrepancies.is_empty() {
            tracing::warn!(count = discrepancies.len(), "inventory drift detected");
        }
        metrics::gauge!("inventory_audit_discrepancies").set(discrepancies.len() as f64);

        Ok(discrepancies)
    }
}
