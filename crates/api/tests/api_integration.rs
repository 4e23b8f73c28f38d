//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceExt;

use domain::PricingConfig;
use order_store::InMemoryOperationsStore;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> axum::Router {
    let store = InMemoryOperationsStore::new();
    let state = api::create_state(store, PricingConfig::free());
    api::create_app(state, get_metrics_handle())
}

fn setup_with_state() -> (
    axum::Router,
    Arc<api::routes::orders::AppState<InMemoryOperationsStore>>,
) {
    let store = InMemoryOperationsStore::new();
    let state = api::create_state(store, PricingConfig::free());
    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn seed_widget(app: &axum::Router, quantity: i64) {
    let response = app
        .clone()
        .oneshot(post_json(
            "/products",
            serde_json::json!({
                "id": "SKU-001",
                "name": "Widget",
                "category": "tools",
                "unit_price_cents": 1000,
                "quantity": quantity
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

fn order_request(quantity: u32) -> serde_json::Value {
    serde_json::json!({
        "customer": { "name": "Ada", "email": "ada@example.com" },
        "items": [{ "product_id": "SKU-001", "quantity": quantity }]
    })
}

async fn create_order(app: &axum::Router, quantity: u32) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(post_json("/orders", order_request(quantity)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_create_order() {
    let app = setup();
    seed_widget(&app, 10).await;

    let order = create_order(&app, 2).await;
    assert_eq!(order["status"], "pending");
    assert_eq!(order["items"][0]["name"], "Widget");
    assert_eq!(order["subtotal"]["cents"], 2000);

    // Stock was reserved.
    let response = app.oneshot(get("/products/SKU-001")).await.unwrap();
    let product = body_json(response).await;
    assert_eq!(product["quantity"], 8);
    assert_eq!(product["total_sold"], 2);
}

#[tokio::test]
async fn test_insufficient_stock_is_conflict() {
    let app = setup();
    seed_widget(&app, 1).await;

    let response = app
        .clone()
        .oneshot(post_json("/orders", order_request(5)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let json = body_json(response).await;
    let message = json["error"].as_str().unwrap();
    assert!(message.contains("1 available"), "error: {message}");
    assert!(message.contains("5 requested"), "error: {message}");
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let app = setup();

    let response = app
        .oneshot(post_json("/orders", order_request(1)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_transition_flow() {
    let app = setup();
    seed_widget(&app, 10).await;
    let order = create_order(&app, 2).await;
    let id = order["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/orders/{id}/status"),
            serde_json::json!({ "status": "processing", "actor": "ops" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "processing");
    assert!(json["processing_at"].is_string());

    // Shipping without details is rejected.
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/orders/{id}/status"),
            serde_json::json!({ "status": "shipped", "actor": "ops" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/orders/{id}/status"),
            serde_json::json!({
                "status": "shipped",
                "actor": "ops",
                "tracking_number": "TRACK-1",
                "carrier": "UPS"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["fulfillment_history"][0]["tracking_number"], "TRACK-1");
}

#[tokio::test]
async fn test_invalid_transition_is_conflict() {
    let app = setup();
    seed_widget(&app, 10).await;
    let order = create_order(&app, 1).await;
    let id = order["id"].as_str().unwrap();

    // pending -> delivered is not in the table.
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/orders/{id}/status"),
            serde_json::json!({ "status": "delivered", "actor": "ops" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let json = body_json(response).await;
    let message = json["error"].as_str().unwrap();
    assert!(message.contains("pending"), "error: {message}");
    assert!(message.contains("delivered"), "error: {message}");
}

#[tokio::test]
async fn test_unknown_status_is_bad_request() {
    let app = setup();
    seed_widget(&app, 10).await;
    let order = create_order(&app, 1).await;
    let id = order["id"].as_str().unwrap();

    let response = app
        .oneshot(post_json(
            &format!("/orders/{id}/status"),
            serde_json::json!({ "status": "teleported", "actor": "ops" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_restores_stock() {
    let app = setup();
    seed_widget(&app, 10).await;
    let order = create_order(&app, 4).await;
    let id = order["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/orders/{id}/status"),
            serde_json::json!({ "status": "cancelled", "actor": "ops" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/products/SKU-001")).await.unwrap();
    let product = body_json(response).await;
    assert_eq!(product["quantity"], 10);
    assert_eq!(product["total_sold"], 0);
}

#[tokio::test]
async fn test_bulk_transition_partial_success() {
    let app = setup();
    seed_widget(&app, 30).await;

    let a = create_order(&app, 1).await;
    let b = create_order(&app, 1).await;
    let a_id = a["id"].as_str().unwrap();
    let b_id = b["id"].as_str().unwrap();

    // Move order B to processing so that B -> processing is invalid below...
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/orders/{b_id}/status"),
            serde_json::json!({ "status": "processing", "actor": "ops" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post_json(
            "/orders/bulk/status",
            serde_json::json!({
                "order_ids": [a_id, b_id],
                "status": "processing",
                "actor": "ops"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["modified"], 1);
    assert_eq!(json["outcomes"][0]["result"], "applied");
    assert_eq!(json["outcomes"][1]["result"], "skipped");
}

#[tokio::test]
async fn test_bulk_with_missing_order_fails_fast() {
    let app = setup();
    seed_widget(&app, 10).await;
    let order = create_order(&app, 1).await;
    let id = order["id"].as_str().unwrap();

    let response = app
        .oneshot(post_json(
            "/orders/bulk/status",
            serde_json::json!({
                "order_ids": [id, uuid::Uuid::new_v4()],
                "status": "cancelled",
                "actor": "ops"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_soft_delete() {
    let app = setup();
    seed_widget(&app, 10).await;
    let order = create_order(&app, 3).await;
    let id = order["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/orders/{id}?actor=admin"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["deleted"], true);

    // Deleted orders disappear from the list but stay readable by ID.
    let response = app.clone().oneshot(get("/orders")).await.unwrap();
    let list = body_json(response).await;
    assert_eq!(list.as_array().unwrap().len(), 0);

    let response = app.clone().oneshot(get(&format!("/orders/{id}"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // And their stock came back.
    let response = app.oneshot(get("/products/SKU-001")).await.unwrap();
    let product = body_json(response).await;
    assert_eq!(product["quantity"], 10);
}

#[tokio::test]
async fn test_stats_summary_and_series_agree() {
    let (app, _state) = setup_with_state();
    seed_widget(&app, 100).await;

    for quantity in [1u32, 2, 3] {
        create_order(&app, quantity).await;
    }

    let from = "2000-01-01T00:00:00Z";
    let to = "2100-01-01T00:00:00Z";

    let response = app
        .clone()
        .oneshot(get(&format!("/stats/summary?from={from}&to={to}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summary = body_json(response).await;
    assert_eq!(summary["orders"], 3);
    assert_eq!(summary["revenue"]["cents"], 6000);

    let response = app
        .clone()
        .oneshot(get(&format!(
            "/stats/revenue?from={from}&to={to}&bucket=month"
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let series = body_json(response).await;
    let sum: i64 = series
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["revenue"]["cents"].as_i64().unwrap())
        .sum();
    assert_eq!(sum, 6000);
}

#[tokio::test]
async fn test_stats_growth_endpoint() {
    let app = setup();
    seed_widget(&app, 10).await;
    create_order(&app, 5).await;

    let response = app
        .oneshot(get(
            "/stats/growth?from=2000-01-01T00:00:00Z&to=2100-01-01T00:00:00Z",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["revenue_growth_pct"], 100.0);
}

#[tokio::test]
async fn test_inventory_audit_is_clean() {
    let app = setup();
    seed_widget(&app, 10).await;
    let order = create_order(&app, 2).await;
    let id = order["id"].as_str().unwrap();

    app.clone()
        .oneshot(post_json(
            &format!("/orders/{id}/status"),
            serde_json::json!({ "status": "cancelled", "actor": "ops" }),
        ))
        .await
        .unwrap();

    let response = app.oneshot(get("/stats/inventory-audit")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_product_patch_cannot_touch_counters() {
    let app = setup();
    seed_widget(&app, 10).await;
    create_order(&app, 2).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/products/SKU-001")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_string(&serde_json::json!({
                        "name": "Widget Pro",
                        "unit_price_cents": 1500
                    }))
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let product = body_json(response).await;
    assert_eq!(product["name"], "Widget Pro");
    // Counters still reflect the reservation.
    assert_eq!(product["quantity"], 8);
    assert_eq!(product["total_sold"], 2);
}
