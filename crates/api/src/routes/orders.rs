//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::{Aggregate, Currency, Money, Order, OrderItem};
use orchestration::{InMemoryPaymentGateway, OrderLine, OrderOrchestrator};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use store::{
    InMemoryOrderRepository, InMemoryPaymentRepository, InMemoryShipmentRepository, Page,
    PageRequest,
};

use crate::error::ApiError;

/// Header carrying the authenticated caller's user id.
pub const USER_ID_HEADER: &str = "x-user-id";

pub type Orchestrator = OrderOrchestrator<
    InMemoryOrderRepository,
    InMemoryPaymentRepository,
    InMemoryShipmentRepository,
    InMemoryPaymentGateway,
>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub gateway: InMemoryPaymentGateway,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    #[serde(default)]
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub currency: Option<String>,
}

impl OrderItemRequest {
    fn into_line(self) -> Result<OrderLine, ApiError> {
        let currency = match self.currency.as_deref() {
            Some(code) => Currency::new(code)?,
            None => Currency::default(),
        };
        Ok(OrderLine::new(
            self.product_id,
            self.product_name,
            self.quantity,
            Money::new(self.unit_price, currency),
        ))
    }
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub order_number: String,
    pub user_id: String,
    pub status: String,
    pub items: Vec<OrderItemResponse>,
    pub total_amount: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            id: item.id().to_string(),
            product_id: item.product_id().to_string(),
            product_name: item.product_name().to_string(),
            quantity: item.quantity(),
            unit_price: item.unit_price().amount(),
            subtotal: item.subtotal().amount(),
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id().to_string(),
            order_number: order.order_number().to_string(),
            user_id: order.user_id().to_string(),
            status: order.status().to_string(),
            items: order.items().iter().map(OrderItemResponse::from).collect(),
            total_amount: order.total_amount().amount(),
            currency: order.total_amount().currency().to_string(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

// -- Handlers --

/// POST /orders: Place a new order for the calling user.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let user_id = user_id(&headers)?;
    let lines = req
        .items
        .into_iter()
        .map(OrderItemRequest::into_line)
        .collect::<Result<Vec<_>, _>>()?;

    let order = state.orchestrator.create_order(&user_id, lines).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /orders: List the calling user's orders one page at a time.
#[tracing::instrument(skip(state, headers))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<OrderResponse>>, ApiError> {
    let user_id = user_id(&headers)?;
    let orders = state.orchestrator.list_orders(&user_id, page).await?;
    Ok(Json(orders.map(OrderResponse::from)))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_aggregate_id(&id)?;
    let order = state.orchestrator.get_order(order_id).await?;
    Ok(Json(order.into()))
}

/// GET /orders/by-number/{number}
#[tracing::instrument(skip(state))]
pub async fn get_by_number(
    State(state): State<Arc<AppState>>,
    Path(number): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orchestrator.get_order_by_number(&number).await?;
    Ok(Json(order.into()))
}

/// POST /orders/{id}/cancel
#[tracing::instrument(skip(state))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_aggregate_id(&id)?;
    let order = state.orchestrator.cancel_order(order_id).await?;
    Ok(Json(order.into()))
}

pub(crate) fn parse_aggregate_id(id: &str) -> Result<AggregateId, ApiError> {
    AggregateId::parse(id).map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}

fn user_id(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::Unauthorized(format!("missing {USER_ID_HEADER} header")))
}
