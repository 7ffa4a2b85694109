//! HTTP surface of the order lifecycle engine.
//!
//! Exposes orders, payments and shipments as REST resources on top of
//! [`orchestration::OrderOrchestrator`], with structured logging through
//! `tracing` and Prometheus metrics on `/metrics`.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use orchestration::{InMemoryPaymentGateway, OrderOrchestrator};
use store::{InMemoryOrderRepository, InMemoryPaymentRepository, InMemoryShipmentRepository};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use routes::orders::{AppState, Orchestrator, USER_ID_HEADER};

/// Builds the router with every resource route and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/orders",
            post(routes::orders::create).get(routes::orders::list),
        )
        .route("/orders/{id}", get(routes::orders::get))
        .route(
            "/orders/by-number/{number}",
            get(routes::orders::get_by_number),
        )
        .route("/orders/{id}/cancel", post(routes::orders::cancel))
        .route(
            "/orders/{id}/payment",
            post(routes::payments::process).get(routes::payments::get),
        )
        .route("/orders/{id}/refund", post(routes::payments::refund))
        .route(
            "/orders/{id}/shipment",
            post(routes::shipments::create).get(routes::shipments::get_for_order),
        )
        .route("/shipments/{id}", put(routes::shipments::update))
        .route("/shipments/{id}/deliver", post(routes::shipments::deliver))
        .route("/shipments/{id}/cancel", post(routes::shipments::cancel))
        .route(
            "/shipments/tracking/{tracking_number}",
            get(routes::shipments::by_tracking_number),
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

/// Creates application state backed by in-memory repositories and gateway.
///
/// The gateway handle in the returned state shares its ledger with the one
/// the orchestrator charges through.
pub fn create_default_state() -> Arc<AppState> {
    let gateway = InMemoryPaymentGateway::new();
    let orchestrator = OrderOrchestrator::new(
        InMemoryOrderRepository::new(),
        InMemoryPaymentRepository::new(),
        InMemoryShipmentRepository::new(),
        gateway.clone(),
    );

    Arc::new(AppState {
        orchestrator,
        gateway,
    })
}
