//! Statistics endpoints for the admin dashboard.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use analytics::{
    CategorySlice, CustomerRevenue, GrowthReport, PaymentMethodSlice, ProductRevenue,
    ReportRange, RevenuePoint, RevenueTotals, StockDiscrepancy, TimeBucket,
};
use order_store::OperationsStore;

use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl RangeQuery {
    fn range(&self) -> ReportRange {
        ReportRange::new(self.from, self.to)
    }
}

#[derive(Debug, Deserialize)]
pub struct SeriesQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub bucket: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub limit: Option<usize>,
}

/// GET /stats/summary — totals for a range.
#[tracing::instrument(skip(state))]
pub async fn summary<S: OperationsStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<RangeQuery>,
) -> Result<Json<RevenueTotals>, ApiError> {
    Ok(Json(state.stats.totals(params.range()).await?))
}

/// GET /stats/revenue — zero-filled revenue time series.
#[tracing::instrument(skip(state))]
pub async fn revenue_series<S: OperationsStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<SeriesQuery>,
) -> Result<Json<Vec<RevenuePoint>>, ApiError> {
    let bucket = match params.bucket.as_deref() {
        None => TimeBucket::Day,
        Some(name) => TimeBucket::parse(name)
            .ok_or_else(|| ApiError::BadRequest(format!("unknown bucket: {name}")))?,
    };
    let range = ReportRange::new(params.from, params.to);
    Ok(Json(state.stats.revenue_series(range, bucket).await?))
}

/// GET /stats/top-products — top products by revenue.
#[tracing::instrument(skip(state))]
pub async fn top_products<S: OperationsStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<TopQuery>,
) -> Result<Json<Vec<ProductRevenue>>, ApiError> {
    let range = ReportRange::new(params.from, params.to);
    let limit = params.limit.unwrap_or(10);
    Ok(Json(state.stats.top_products(range, limit).await?))
}

/// GET /stats/top-customers — top customers by revenue.
#[tracing::instrument(skip(state))]
pub async fn top_customers<S: OperationsStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<TopQuery>,
) -> Result<Json<Vec<CustomerRevenue>>, ApiError> {
    let range = ReportRange::new(params.from, params.to);
    let limit = params.limit.unwrap_or(10);
    Ok(Json(state.stats.top_customers(range, limit).await?))
}

/// GET /stats/categories — category revenue breakdown.
#[tracing::instrument(skip(state))]
pub async fn categories<S: OperationsStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<RangeQuery>,
) -> Result<Json<Vec<CategorySlice>>, ApiError> {
    Ok(Json(state.stats.category_breakdown(params.range()).await?))
}

/// GET /stats/payment-methods — payment method revenue breakdown.
#[tracing::instrument(skip(state))]
pub async fn payment_methods<S: OperationsStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<RangeQuery>,
) -> Result<Json<Vec<PaymentMethodSlice>>, ApiError> {
    Ok(Json(
        state.stats.payment_method_breakdown(params.range()).await?,
    ))
}

/// GET /stats/growth — period-over-period growth for a range.
#[tracing::instrument(skip(state))]
pub async fn growth<S: OperationsStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<RangeQuery>,
) -> Result<Json<GrowthReport>, ApiError> {
    Ok(Json(state.stats.growth(params.range()).await?))
}

/// GET /stats/inventory-audit — recompute ledger counters and report drift.
#[tracing::instrument(skip(state))]
pub async fn inventory_audit<S: OperationsStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<StockDiscrepancy>>, ApiError> {
    Ok(Json(state.auditor.audit().await?))
}
