//! Payment endpoints nested under an order.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use domain::{Aggregate, Payment, PaymentMethod};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::orders::{AppState, parse_aggregate_id};
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct ProcessPaymentRequest {
    /// One of `credit_card`, `debit_card`, `paypal`, `stripe`, `cash`.
    pub method: String,
}

#[derive(Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub order_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub method: PaymentMethod,
    pub status: String,
    pub transaction_id: Option<String>,
    pub gateway_response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id().to_string(),
            order_id: payment.order_id().to_string(),
            amount: payment.amount().amount(),
            currency: payment.amount().currency().to_string(),
            method: payment.method(),
            status: payment.status().to_string(),
            transaction_id: payment.transaction_id().map(String::from),
            gateway_response: payment.gateway_response().map(String::from),
            created_at: payment.created_at(),
            updated_at: payment.updated_at(),
        }
    }
}

/// POST /orders/{id}/payment: Charge the order total.
#[tracing::instrument(skip(state, req))]
pub async fn process(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ProcessPaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError> {
    let order_id = parse_aggregate_id(&id)?;
    let method: PaymentMethod = req.method.parse()?;

    let payment = state
        .orchestrator
        .process_payment(order_id, method)
        .await?;
    Ok((StatusCode::CREATED, Json(payment.into())))
}

/// GET /orders/{id}/payment: Latest payment attempt.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let order_id = parse_aggregate_id(&id)?;
    let payment = state.orchestrator.get_payment(order_id).await?;
    Ok(Json(payment.into()))
}

/// POST /orders/{id}/refund
#[tracing::instrument(skip(state))]
pub async fn refund(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let order_id = parse_aggregate_id(&id)?;
    let payment = state.orchestrator.refund_payment(order_id).await?;
    Ok(Json(payment.into()))
}
