//! Shipment endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use domain::{Address, Aggregate, Shipment, ShippingMethod};
use serde::{Deserialize, Serialize};

use super::orders::{AppState, parse_aggregate_id};
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct AddressRequest {
    pub street: String,
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
    pub country: String,
}

#[derive(Deserialize)]
pub struct CreateShipmentRequest {
    pub address: AddressRequest,
    /// `express`, `standard`, `economy` or any other carrier tag.
    pub shipping_method: String,
}

#[derive(Deserialize)]
pub struct UpdateShipmentRequest {
    pub tracking_number: String,
    pub carrier: String,
}

#[derive(Serialize)]
pub struct ShipmentResponse {
    pub id: String,
    pub order_id: String,
    pub status: String,
    pub shipping_method: ShippingMethod,
    pub address: Address,
    pub full_address: String,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub estimated_date: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Shipment> for ShipmentResponse {
    fn from(shipment: Shipment) -> Self {
        Self {
            id: shipment.id().to_string(),
            order_id: shipment.order_id().to_string(),
            status: shipment.status().to_string(),
            shipping_method: shipment.shipping_method().clone(),
            full_address: shipment.address().full_address(),
            address: shipment.address().clone(),
            tracking_number: shipment.tracking_number().map(String::from),
            carrier: shipment.carrier().map(String::from),
            estimated_date: shipment.estimated_date(),
            shipped_at: shipment.shipped_at(),
            delivered_at: shipment.delivered_at(),
            created_at: shipment.created_at(),
        }
    }
}

/// POST /orders/{id}/shipment: Create a shipment for a paid order.
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CreateShipmentRequest>,
) -> Result<(StatusCode, Json<ShipmentResponse>), ApiError> {
    let order_id = parse_aggregate_id(&id)?;
    let AddressRequest {
        street,
        city,
        state: region,
        postal_code,
        country,
    } = req.address;
    let address = Address::new(street, city, region, postal_code, country)?;

    let shipment = state
        .orchestrator
        .create_shipment(order_id, address, ShippingMethod::from(req.shipping_method))
        .await?;
    Ok((StatusCode::CREATED, Json(shipment.into())))
}

/// GET /orders/{id}/shipment: Latest shipment for the order.
#[tracing::instrument(skip(state))]
pub async fn get_for_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ShipmentResponse>, ApiError> {
    let order_id = parse_aggregate_id(&id)?;
    let shipment = state.orchestrator.get_shipment(order_id).await?;
    Ok(Json(shipment.into()))
}

/// PUT /shipments/{id}: Hand the shipment to a carrier.
#[tracing::instrument(skip(state, req))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateShipmentRequest>,
) -> Result<Json<ShipmentResponse>, ApiError> {
    let shipment_id = parse_aggregate_id(&id)?;
    let shipment = state
        .orchestrator
        .update_shipment(shipment_id, &req.tracking_number, &req.carrier)
        .await?;
    Ok(Json(shipment.into()))
}

/// POST /shipments/{id}/deliver
#[tracing::instrument(skip(state))]
pub async fn deliver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ShipmentResponse>, ApiError> {
    let shipment_id = parse_aggregate_id(&id)?;
    let shipment = state.orchestrator.confirm_delivery(shipment_id).await?;
    Ok(Json(shipment.into()))
}

/// POST /shipments/{id}/cancel
#[tracing::instrument(skip(state))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ShipmentResponse>, ApiError> {
    let shipment_id = parse_aggregate_id(&id)?;
    let shipment = state.orchestrator.cancel_shipment(shipment_id).await?;
    Ok(Json(shipment.into()))
}

/// GET /shipments/tracking/{tracking_number}
#[tracing::instrument(skip(state))]
pub async fn by_tracking_number(
    State(state): State<Arc<AppState>>,
    Path(tracking_number): Path<String>,
) -> Result<Json<ShipmentResponse>, ApiError> {
    let shipment = state
        .orchestrator
        .get_shipment_by_tracking_number(&tracking_number)
        .await?;
    Ok(Json(shipment.into()))
}
