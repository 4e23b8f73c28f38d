//! Product catalog endpoints.
//!
//! Catalog edits cannot reach the stock counters; those move only through
//! order commits.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;

use common::{Money, ProductId};
use order_store::{OperationsStore, ProductDetailsUpdate, ProductRecord};

use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub id: String,
    pub name: String,
    pub category: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    #[serde(default = "default_true")]
    pub track_quantity: bool,
    #[serde(default)]
    pub allow_out_of_stock: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit_price_cents: Option<i64>,
    pub track_quantity: Option<bool>,
    pub allow_out_of_stock: Option<bool>,
}

/// POST /products — add a product to the catalog.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: OperationsStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductRecord>), ApiError> {
    let mut product = ProductRecord::new(
        req.id.as_str(),
        req.name,
        req.category,
        Money::from_cents(req.unit_price_cents),
        req.quantity,
    );
    product.track_quantity = req.track_quantity;
    product.allow_out_of_stock = req.allow_out_of_stock;

    state.store.insert_product(product.clone()).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /products — full catalog.
#[tracing::instrument(skip(state))]
pub async fn list<S: OperationsStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ProductRecord>>, ApiError> {
    Ok(Json(state.store.list_products().await?))
}

/// GET /products/{id} — one product with its live counters.
#[tracing::instrument(skip(state))]
pub async fn get<S: OperationsStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductRecord>, ApiError> {
    let product = state
        .store
        .get_product(&ProductId::new(id.as_str()))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product {id} not found")))?;
    Ok(Json(product))
}

/// PATCH /products/{id} — catalog edit; counters are untouchable here.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: OperationsStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<ProductRecord>, ApiError> {
    let update = ProductDetailsUpdate {
        name: req.name,
        category: req.category,
        unit_price: req.unit_price_cents.map(Money::from_cents),
        track_quantity: req.track_quantity,
        allow_out_of_stock: req.allow_out_of_stock,
    };

    let product = state
        .store
        .update_product_details(&ProductId::new(id.as_str()), update)
        .await?;
    Ok(Json(product))
}
