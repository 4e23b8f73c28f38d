//! Read-only statistics for the admin dashboard.
//!
//! The aggregator never mutates order or product state. Every report is
//! derived from a single committed snapshot of the orders in range, so the
//! time-series buckets and the single-value totals for the same range can
//! never disagree.

pub mod aggregator;
pub mod audit;
pub mod error;
pub mod range;
pub mod report;

pub use aggregator::StatsAggregator;
pub use audit::{InventoryAuditor, StockDiscrepancy};
pub use error::{AnalyticsError, Result};
pub use range::{ReportRange, TimeBucket};
pub use report::{
    CategorySlice, CustomerRevenue, GrowthReport, PaymentMethodSlice, ProductRevenue,
    RevenuePoint, RevenueTotals, growth_rate,
};
