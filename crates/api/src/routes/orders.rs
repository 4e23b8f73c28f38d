//! Order endpoints: creation, transitions, bulk transitions, soft delete.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use analytics::{InventoryAuditor, StatsAggregator};
use common::{CustomerId, Money, OrderId};
use domain::{
    Address, ApplyTransition, BulkApplyTransition, BulkCoordinator, BulkOutcome, CreateOrder,
    CustomerRef, DeleteOrder, NewOrderItem, Order, OrderOrigin, OrderStatus, TransitionExecutor,
};
use order_store::{OperationsStore, OrderQuery};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: OperationsStore + Clone> {
    pub executor: TransitionExecutor<S>,
    pub bulk: BulkCoordinator<S>,
    pub stats: StatsAggregator<S>,
    pub auditor: InventoryAuditor<S>,
    pub store: S,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CustomerPayload {
    pub id: Option<uuid::Uuid>,
    pub name: String,
    pub email: String,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub customer: CustomerPayload,
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    pub shipping_address: Address,
    #[serde(default)]
    pub billing_address: Address,
    pub payment_method: Option<String>,
    /// Admin-entered order: starts `processing`, already paid.
    #[serde(default)]
    pub manual: bool,
    #[serde(default)]
    pub discount_cents: i64,
    pub note: Option<String>,
    pub actor: Option<String>,
}

#[derive(Deserialize)]
pub struct TransitionRequest {
    pub status: String,
    pub actor: String,
    pub note: Option<String>,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
}

#[derive(Deserialize)]
pub struct BulkTransitionRequest {
    pub order_ids: Vec<uuid::Uuid>,
    pub status: String,
    pub actor: String,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub customer_id: Option<uuid::Uuid>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub actor: Option<String>,
}

// -- Response types --

#[derive(serde::Serialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub order_number: String,
    pub customer_name: String,
    pub status: OrderStatus,
    pub placed_at: DateTime<Utc>,
    pub total_cents: i64,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number.as_str().to_string(),
            customer_name: order.customer.name.clone(),
            status: order.status,
            placed_at: order.placed_at,
            total_cents: order.total.cents(),
        }
    }
}

fn parse_status(s: &str) -> Result<OrderStatus, ApiError> {
    OrderStatus::parse(s).ok_or_else(|| ApiError::BadRequest(format!("unknown status: {s}")))
}

// -- Handlers --

/// POST /orders — decode the request once into a typed command and create
/// the order.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: OperationsStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let customer_id = req
        .customer
        .id
        .map(CustomerId::from_uuid)
        .unwrap_or_default();

    let cmd = CreateOrder {
        customer: CustomerRef::new(customer_id, req.customer.name, req.customer.email),
        items: req
            .items
            .iter()
            .map(|i| NewOrderItem::new(i.product_id.as_str(), i.quantity))
            .collect(),
        shipping_address: req.shipping_address,
        billing_address: req.billing_address,
        payment_method: req.payment_method.unwrap_or_else(|| "card".to_string()),
        origin: if req.manual {
            OrderOrigin::Manual
        } else {
            OrderOrigin::Checkout
        },
        discount: Money::from_cents(req.discount_cents),
        note: req.note,
        actor: req.actor.unwrap_or_else(|| "storefront".to_string()),
    };

    let order = state.executor.create_order(cmd).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders — list order summaries, filterable by window and status.
#[tracing::instrument(skip(state))]
pub async fn list<S: OperationsStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<OrderSummary>>, ApiError> {
    let mut query = OrderQuery::new();
    if let Some(from) = params.from {
        query = query.placed_from(from);
    }
    if let Some(to) = params.to {
        query = query.placed_until(to);
    }
    if let Some(ref status) = params.status {
        // Validate early so typos return 400, not an empty list.
        parse_status(status)?;
        query = query.status(status.clone());
    }
    if let Some(customer_id) = params.customer_id {
        query = query.customer(CustomerId::from_uuid(customer_id));
    }
    if let Some(limit) = params.limit {
        query = query.limit(limit);
    }
    if let Some(offset) = params.offset {
        query = query.offset(offset);
    }

    let stored = state.store.query_orders(query).await?;
    let mut summaries = Vec::with_capacity(stored.len());
    for doc in stored {
        let order: Order = serde_json::from_value(doc.body)
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        summaries.push(OrderSummary::from(&order));
    }
    Ok(Json(summaries))
}

/// GET /orders/{id} — load an order by ID.
#[tracing::instrument(skip(state))]
pub async fn get<S: OperationsStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<uuid::Uuid>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .executor
        .get_order(OrderId::from_uuid(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))?;
    Ok(Json(order))
}

/// POST /orders/{id}/status — apply a single status transition.
#[tracing::instrument(skip(state, req))]
pub async fn transition<S: OperationsStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<Order>, ApiError> {
    let target = parse_status(&req.status)?;

    let cmd = ApplyTransition {
        order_id: OrderId::from_uuid(id),
        target,
        actor: req.actor,
        note: req.note,
        tracking_number: req.tracking_number,
        carrier: req.carrier,
    };

    let order = state.executor.apply_transition(cmd).await?;
    Ok(Json(order))
}

/// POST /orders/bulk/status — apply one transition to a set of orders.
#[tracing::instrument(skip(state, req))]
pub async fn bulk_transition<S: OperationsStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<BulkTransitionRequest>,
) -> Result<Json<BulkOutcome>, ApiError> {
    let target = parse_status(&req.status)?;

    let cmd = BulkApplyTransition {
        order_ids: req.order_ids.into_iter().map(OrderId::from_uuid).collect(),
        target,
        actor: req.actor,
        note: req.note,
    };

    let outcome = state.bulk.apply(cmd).await?;
    Ok(Json(outcome))
}

/// DELETE /orders/{id} — soft-delete an order.
#[tracing::instrument(skip(state))]
pub async fn delete<S: OperationsStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<uuid::Uuid>,
    Query(params): Query<DeleteQuery>,
) -> Result<Json<Order>, ApiError> {
    let cmd = DeleteOrder::new(
        OrderId::from_uuid(id),
        params.actor.unwrap_or_else(|| "admin".to_string()),
    );
    let order = state.executor.delete_order(cmd).await?;
    Ok(Json(order))
}
