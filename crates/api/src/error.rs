//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use orchestration::OrchestrationError;
use store::StoreError;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
///
/// Rendered as `{"error": message, "code": CODE}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request that never reached a use case.
    #[error("{0}")]
    BadRequest(String),

    /// The caller did not identify itself.
    #[error("{0}")]
    Unauthorized(String),

    /// Use case error.
    #[error(transparent)]
    Orchestration(#[from] OrchestrationError),
}

impl ApiError {
    /// Returns the HTTP status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Orchestration(err) => orchestration_status(err),
        }
    }
}

fn orchestration_status(err: &OrchestrationError) -> (StatusCode, &'static str) {
    match err {
        OrchestrationError::Domain(err) => domain_status(err),
        OrchestrationError::Store(err) => match err {
            StoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            StoreError::Duplicate { .. } => (StatusCode::CONFLICT, "DUPLICATE"),
            StoreError::ConcurrencyConflict { .. } => {
                (StatusCode::CONFLICT, "CONCURRENCY_CONFLICT")
            }
        },
        OrchestrationError::Gateway(_) => (StatusCode::BAD_GATEWAY, "GATEWAY_ERROR"),
        OrchestrationError::ShipmentAlreadyExists { .. } => {
            (StatusCode::CONFLICT, "SHIPMENT_ALREADY_EXISTS")
        }
    }
}

fn domain_status(err: &DomainError) -> (StatusCode, &'static str) {
    match err {
        DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        DomainError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
        DomainError::InvalidQuantity { .. } => (StatusCode::BAD_REQUEST, "INVALID_QUANTITY"),
        DomainError::CurrencyMismatch { .. } => (StatusCode::BAD_REQUEST, "CURRENCY_MISMATCH"),
        DomainError::EmptyOrder => (StatusCode::BAD_REQUEST, "EMPTY_ORDER"),
        DomainError::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
        DomainError::InvalidOrderStatus { .. } => (StatusCode::CONFLICT, "INVALID_ORDER_STATUS"),
        DomainError::CannotRefund { .. } => (StatusCode::CONFLICT, "CANNOT_REFUND"),
        DomainError::PaymentFailed { .. } => (StatusCode::PAYMENT_REQUIRED, "PAYMENT_FAILED"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(error = %message, code, "request failed");
        } else {
            tracing::debug!(error = %message, code, "request rejected");
        }
        metrics::counter!("http_errors_total", "code" => code).increment(1);

        let body = serde_json::json!({ "error": message, "code": code });
        (status, axum::Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Orchestration(err.into())
    }
}
