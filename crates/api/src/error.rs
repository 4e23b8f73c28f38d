//! API error types with HTTP response mapping.

use analytics::AnalyticsError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, OrderError};
use order_store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Statistics error.
    Analytics(AnalyticsError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Analytics(err) => analytics_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::Order(order_err) => match order_err {
            OrderError::InvalidTransition { .. }
            | OrderError::OrderDeleted(_)
            | OrderError::AlreadyDeleted(_) => (StatusCode::CONFLICT, err.to_string()),
            OrderError::MissingFulfillmentDetails => {
                (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            OrderError::EmptyOrder | OrderError::InvalidQuantity { .. } => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
        },
        DomainError::Store(store_err) => match store_err {
            StoreError::OrderNotFound(_) | StoreError::ProductNotFound(_) => {
                (StatusCode::NOT_FOUND, err.to_string())
            }
            StoreError::InsufficientStock { .. }
            | StoreError::VersionConflict { .. }
            | StoreError::DuplicateOrder(_)
            | StoreError::DuplicateProduct(_) => (StatusCode::CONFLICT, err.to_string()),
            StoreError::Database(_) | StoreError::Migration(_) | StoreError::Serialization(_) => {
                tracing::error!(error = %err, "store failure");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        },
        DomainError::OrdersNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::Serialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

fn analytics_error_to_response(err: AnalyticsError) -> (StatusCode, String) {
    tracing::error!(error = %err, "analytics failure");
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(err: AnalyticsError) -> Self {
        ApiError::Analytics(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Domain(DomainError::Store(err))
    }
}
