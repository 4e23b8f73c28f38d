//! HTTP API server with observability for the store-operations backend.
//!
//! Thin adapter over the domain: each endpoint decodes one typed command,
//! delegates to the executor / bulk coordinator / aggregator, and maps the
//! typed error back to an HTTP status. Structured logging via tracing,
//! Prometheus metrics via metrics-exporter-prometheus.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, patch, post};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use analytics::{InventoryAuditor, StatsAggregator};
use domain::{BulkCoordinator, PricingConfig, TransitionExecutor};
use order_store::OperationsStore;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: OperationsStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/bulk/status", post(routes::orders::bulk_transition::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}", delete(routes::orders::delete::<S>))
        .route("/orders/{id}/status", post(routes::orders::transition::<S>))
        .route("/products", post(routes::products::create::<S>))
        .route("/products", get(routes::products::list::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .route("/products/{id}", patch(routes::products::update::<S>))
        .route("/stats/summary", get(routes::stats::summary::<S>))
        .route("/stats/revenue", get(routes::stats::revenue_series::<S>))
        .route("/stats/top-products", get(routes::stats::top_products::<S>))
        .route("/stats/top-customers", get(routes::stats::top_customers::<S>))
        .route("/stats/categories", get(routes::stats::categories::<S>))
        .route(
            "/stats/payment-methods",
            get(routes::stats::payment_methods::<S>),
        )
        .route("/stats/growth", get(routes::stats::growth::<S>))
        .route(
            "/stats/inventory-audit",
            get(routes::stats::inventory_audit::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state around a store and pricing configuration.
pub fn create_state<S: OperationsStore + Clone + 'static>(
    store: S,
    pricing: PricingConfig,
) -> Arc<AppState<S>> {
    let executor = TransitionExecutor::new(store.clone(), pricing);
    let bulk = BulkCoordinator::new(executor.clone());
    let stats = StatsAggregator::new(store.clone());
    let auditor = InventoryAuditor::new(store.clone());

    Arc::new(AppState {
        executor,
        bulk,
        stats,
        auditor,
        store,
    })
}
