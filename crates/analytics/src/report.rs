//! Report structures returned by the statistics aggregator.

use chrono::NaiveDate;
use serde::Serialize;

use common::{CustomerId, Money, ProductId};

/// One bucket of the revenue time series.
#[derive(Debug, Clone, Serialize)]
pub struct RevenuePoint {
    /// First day of the bucket.
    pub period_start: NaiveDate,

    /// Revenue from orders placed in the bucket.
    pub revenue: Money,

    /// Number of orders placed in the bucket.
    pub orders: u64,
}

/// Single-value aggregates for a range.
#[derive(Debug, Clone, Serialize)]
pub struct RevenueTotals {
    /// Total revenue in the range.
    pub revenue: Money,

    /// Number of revenue orders in the range.
    pub orders: u64,

    /// Distinct customers who placed those orders.
    pub distinct_customers: u64,

    /// revenue / orders, zero when there are no orders.
    pub average_order_value: Money,
}

/// Per-product revenue summary.
#[derive(Debug, Clone, Serialize)]
pub struct ProductRevenue {
    /// The product's SKU.
    pub product_id: ProductId,

    /// Name as frozen on the contributing orders.
    pub name: String,

    /// Units sold in range.
    pub units: u64,

    /// Merchandise revenue (sum of line totals) in range.
    pub revenue: Money,
}

/// Per-customer revenue summary.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerRevenue {
    /// The customer.
    pub customer_id: CustomerId,

    /// Customer name as recorded on their latest order in range.
    pub name: String,

    /// Contact email.
    pub email: String,

    /// Orders placed in range.
    pub orders: u64,

    /// Revenue across those orders.
    pub revenue: Money,
}

/// One category's share of merchandise revenue.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySlice {
    /// Category name from the current catalog.
    pub category: String,

    /// Merchandise revenue attributed to the category.
    pub revenue: Money,

    /// Percent of total merchandise revenue; all slices sum to 100 when
    /// revenue is non-zero, and are 0 otherwise.
    pub percent: f64,
}

/// One payment method's share of order revenue.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentMethodSlice {
    /// Payment method label as recorded on the orders.
    pub payment_method: String,

    /// Revenue across orders paid this way.
    pub revenue: Money,

    /// Percent of total revenue.
    pub percent: f64,
}

/// Period-over-period comparison of two ranges.
#[derive(Debug, Clone, Serialize)]
pub struct GrowthReport {
    /// Totals for the current range.
    pub current: RevenueTotals,

    /// Totals for the comparison range.
    pub previous: RevenueTotals,

    /// Revenue growth percentage.
    pub revenue_growth_pct: f64,

    /// Order-count growth percentage.
    pub order_growth_pct: f64,
}

/// Period-over-period growth: `(current - previous) / previous * 100`.
///
/// Defined as 100 when the previous period was zero and the current one is
/// positive, and 0 when both are zero.
pub fn growth_rate(previous: i64, current: i64) -> f64 {
    if previous == 0 {
        if current > 0 { 100.0 } else { 0.0 }
    } else {
        (current - previous) as f64 / previous as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_with_nonzero_previous() {
        assert_eq!(growth_rate(100, 150), 50.0);
        assert_eq!(growth_rate(200, 100), -50.0);
        assert_eq!(growth_rate(100, 100), 0.0);
        assert_eq!(growth_rate(100, 0), -100.0);
    }

    #[test]
    fn growth_from_zero_previous_is_capped_at_100() {
        assert_eq!(growth_rate(0, 500), 100.0);
    }

    #[test]
    fn growth_with_no_activity_is_zero() {
        assert_eq!(growth_rate(0, 0), 0.0);
    }
}
