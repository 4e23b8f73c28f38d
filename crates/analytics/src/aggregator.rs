//! The statistics aggregator: time-bucketed revenue, top-N breakdowns, and
//! period-over-period growth, derived from committed order state.

use std::collections::{BTreeMap, HashMap};

use chrono::Duration;

use common::{CustomerId, Money, ProductId};
use domain::{Order, OrderStatus};
use order_store::{OperationsStore, OrderQuery};

use crate::Result;
use crate::range::{ReportRange, TimeBucket};
use crate::report::{
    CategorySlice, CustomerRevenue, GrowthReport, PaymentMethodSlice, ProductRevenue,
    RevenuePoint, RevenueTotals, growth_rate,
};

/// Returns true if an order in this status counts toward revenue.
///
/// Cancelled orders were never fulfilled and refunded orders returned the
/// money, so neither contributes.
pub fn counts_toward_revenue(status: OrderStatus) -> bool {
    !matches!(status, OrderStatus::Cancelled | OrderStatus::Refunded)
}

/// Read-only statistics over the operations store.
///
/// Each report method fetches the orders in range exactly once and derives
/// everything from that snapshot; it never mutates order or product state,
/// and only sees committed documents.
pub struct StatsAggregator<S> {
    store: S,
}

impl<S: OperationsStore> StatsAggregator<S> {
    /// Creates an aggregator over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Fetches the revenue orders placed in the range, excluding
    /// soft-deleted, cancelled, and refunded orders.
    async fn revenue_orders(&self, range: &ReportRange) -> Result<Vec<Order>> {
        if range.is_empty() {
            return Ok(Vec::new());
        }
        let stored = self
            .store
            .query_orders(
                OrderQuery::new()
                    .placed_from(range.start)
                    .placed_until(range.end),
            )
            .await?;

        let mut orders = Vec::with_capacity(stored.len());
        for doc in stored {
            let order: Order = serde_json::from_value(doc.body)?;
            if counts_toward_revenue(order.status) {
                orders.push(order);
            }
        }
        Ok(orders)
    }

    fn totals_of(orders: &[Order]) -> RevenueTotals {
        let revenue: Money = orders.iter().map(|o| o.total).sum();
        let count = orders.len() as u64;
        let distinct_customers = orders
            .iter()
            .map(|o| o.customer.id)
            .collect::<std::collections::HashSet<CustomerId>>()
            .len() as u64;
        let average_order_value = if count == 0 {
            Money::zero()
        } else {
            Money::from_cents(revenue.cents() / count as i64)
        };
        RevenueTotals {
            revenue,
            orders: count,
            distinct_customers,
            average_order_value,
        }
    }

    /// Single-value totals for a range.
    #[tracing::instrument(skip(self))]
    pub async fn totals(&self, range: ReportRange) -> Result<RevenueTotals> {
        let orders = self.revenue_orders(&range).await?;
        Ok(Self::totals_of(&orders))
    }

    /// Revenue and order-count time series, zero-filled across the range.
    ///
    /// Summing the buckets always equals [`totals`](Self::totals) for the
    /// same range: both are derived from the same fetch with the same
    /// revenue predicate, and the half-open range bounds leave no seam for
    /// an order to fall into twice or not at all.
    #[tracing::instrument(skip(self))]
    pub async fn revenue_series(
        &self,
        range: ReportRange,
        bucket: TimeBucket,
    ) -> Result<Vec<RevenuePoint>> {
        let orders = self.revenue_orders(&range).await?;

        let mut buckets: BTreeMap<chrono::NaiveDate, (Money, u64)> = BTreeMap::new();
        if !range.is_empty() {
            // Pre-fill every bucket the range touches so quiet periods
            // appear as zeros rather than gaps.
            let last_day = (range.end - Duration::nanoseconds(1)).date_naive();
            let last_bucket = bucket.floor(last_day);
            let mut cursor = bucket.floor(range.start.date_naive());
            while cursor <= last_bucket {
                buckets.insert(cursor, (Money::zero(), 0));
                cursor = bucket.next(cursor);
            }
        }

        for order in &orders {
            let key = bucket.floor(order.placed_at.date_naive());
            let entry = buckets.entry(key).or_insert((Money::zero(), 0));
            entry.0 += order.total;
            entry.1 += 1;
        }

        Ok(buckets
            .into_iter()
            .map(|(period_start, (revenue, orders))| RevenuePoint {
                period_start,
                revenue,
                orders,
            })
            .collect())
    }

    /// Top products by merchandise revenue in the range.
    #[tracing::instrument(skip(self))]
    pub async fn top_products(
        &self,
        range: ReportRange,
        limit: usize,
    ) -> Result<Vec<ProductRevenue>> {
        let orders = self.revenue_orders(&range).await?;

        let mut by_product: HashMap<ProductId, ProductRevenue> = HashMap::new();
        for order in &orders {
            for item in &order.items {
                let entry = by_product
                    .entry(item.product_id.clone())
                    .or_insert_with(|| ProductRevenue {
                        product_id: item.product_id.clone(),
                        name: item.name.clone(),
                        units: 0,
                        revenue: Money::zero(),
                    });
                entry.units += item.quantity as u64;
                entry.revenue += item.line_total();
            }
        }

        let mut products: Vec<_> = by_product.into_values().collect();
        products.sort_by(|a, b| b.revenue.cents().cmp(&a.revenue.cents()));
        products.truncate(limit);
        Ok(products)
    }

    /// Top customers by revenue in the range.
    #[tracing::instrument(skip(self))]
    pub async fn top_customers(
        &self,
        range: ReportRange,
        limit: usize,
    ) -> Result<Vec<CustomerRevenue>> {
        let orders = self.revenue_orders(&range).await?;

        let mut by_customer: HashMap<CustomerId, CustomerRevenue> = HashMap::new();
        for order in &orders {
            let entry = by_customer
                .entry(order.customer.id)
                .or_insert_with(|| CustomerRevenue {
                    customer_id: order.customer.id,
                    name: order.customer.name.clone(),
                    email: order.customer.email.clone(),
                    orders: 0,
                    revenue: Money::zero(),
                });
            entry.orders += 1;
            entry.revenue += order.total;
        }

        let mut customers: Vec<_> = by_customer.into_values().collect();
        customers.sort_by(|a, b| b.revenue.cents().cmp(&a.revenue.cents()));
        customers.truncate(limit);
        Ok(customers)
    }

    /// Merchandise revenue per category, with percent-of-total.
    ///
    /// Categories come from the current catalog; items whose product has
    /// left the catalog fall into "uncategorized". Percentages sum to 100
    /// (within float rounding) whenever any merchandise revenue exists.
    #[tracing::instrument(skip(self))]
    pub async fn category_breakdown(&self, range: ReportRange) -> Result<Vec<CategorySlice>> {
        let orders = self.revenue_orders(&range).await?;
        let categories: HashMap<ProductId, String> = self
            .store
            .list_products()
            .await?
            .into_iter()
            .map(|p| (p.id, p.category))
            .collect();

        let mut by_category: BTreeMap<String, Money> = BTreeMap::new();
        for order in &orders {
            for item in &order.items {
                let category = categories
                    .get(&item.product_id)
                    .cloned()
                    .unwrap_or_else(|| "uncategorized".to_string());
                *by_category.entry(category).or_insert(Money::zero()) += item.line_total();
            }
        }

        let total: i64 = by_category.values().map(|m| m.cents()).sum();
        let mut slices: Vec<_> = by_category
            .into_iter()
            .map(|(category, revenue)| CategorySlice {
                category,
                percent: percent_of(revenue.cents(), total),
                revenue,
            })
            .collect();
        slices.sort_by(|a, b| b.revenue.cents().cmp(&a.revenue.cents()));
        Ok(slices)
    }

    /// Order revenue per payment method, with percent-of-total.
    #[tracing::instrument(skip(self))]
    pub async fn payment_method_breakdown(
        &self,
        range: ReportRange,
    ) -> Result<Vec<PaymentMethodSlice>> {
        let orders = self.revenue_orders(&range).await?;

        let mut by_method: BTreeMap<String, Money> = BTreeMap::new();
        for order in &orders {
            *by_method
                .entry(order.payment_method.clone())
                .or_insert(Money::zero()) += order.total;
        }

        let total: i64 = by_method.values().map(|m| m.cents()).sum();
        let mut slices: Vec<_> = by_method
            .into_iter()
            .map(|(payment_method, revenue)| PaymentMethodSlice {
                payment_method,
                percent: percent_of(revenue.cents(), total),
                revenue,
            })
            .collect();
        slices.sort_by(|a, b| b.revenue.cents().cmp(&a.revenue.cents()));
        Ok(slices)
    }

    /// Period-over-period growth of the range against the equal-length
    /// range immediately before it.
    #[tracing::instrument(skip(self))]
    pub async fn growth(&self, range: ReportRange) -> Result<GrowthReport> {
        let current = self.totals(range).await?;
        let previous = self.totals(range.previous()).await?;

        Ok(GrowthReport {
            revenue_growth_pct: growth_rate(previous.revenue.cents(), current.revenue.cents()),
            order_growth_pct: growth_rate(previous.orders as i64, current.orders as i64),
            current,
            previous,
        })
    }
}

fn percent_of(part: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_and_refunded_do_not_count() {
        assert!(counts_toward_revenue(OrderStatus::Pending));
        assert!(counts_toward_revenue(OrderStatus::Processing));
        assert!(counts_toward_revenue(OrderStatus::Shipped));
        assert!(counts_toward_revenue(OrderStatus::Delivered));
        assert!(!counts_toward_revenue(OrderStatus::Cancelled));
        assert!(!counts_toward_revenue(OrderStatus::Refunded));
    }

    #[test]
    fn percent_of_zero_total_is_zero() {
        assert_eq!(percent_of(0, 0), 0.0);
        assert_eq!(percent_of(50, 200), 25.0);
    }
}
