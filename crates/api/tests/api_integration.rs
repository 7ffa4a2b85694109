//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;

const USER: &str = "user-42";

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

fn setup() -> Router {
    setup_with_state().0
}

fn setup_with_state() -> (Router, Arc<api::AppState>) {
    let state = api::create_default_state();
    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .header(api::USER_ID_HEADER, USER)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn post_json(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header(api::USER_ID_HEADER, USER)
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap();
    send(app, request).await
}

async fn post(app: &Router, uri: &str) -> (StatusCode, Value) {
    post_json(app, "POST", uri, json!({})).await
}

fn widget_order() -> Value {
    json!({
        "items": [
            { "product_id": "SKU-001", "product_name": "Widget", "quantity": 2, "unit_price": "10.00" },
            { "product_id": "SKU-002", "product_name": "Gadget", "quantity": 1, "unit_price": "5.00" }
        ]
    })
}

fn shipping_request() -> Value {
    json!({
        "address": {
            "street": "1 Main St",
            "city": "Springfield",
            "state": "IL",
            "postal_code": "62701",
            "country": "US"
        },
        "shipping_method": "express"
    })
}

async fn create_order(app: &Router) -> String {
    let (status, json) = post_json(app, "POST", "/orders", widget_order()).await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

async fn create_paid_order(app: &Router) -> String {
    let order_id = create_order(app).await;
    let (status, _) = post_json(
        app,
        "POST",
        &format!("/orders/{order_id}/payment"),
        json!({ "method": "credit_card" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    order_id
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let (status, json) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();

    // Trigger at least one recorded error so the registry is non-empty.
    let _ = get(&app, &format!("/orders/{}", common::AggregateId::new())).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

mod orders {
    use super::*;

    #[tokio::test]
    async fn test_create_order() {
        let app = setup();

        let (status, json) = post_json(&app, "POST", "/orders", widget_order()).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["status"], "pending");
        assert_eq!(json["user_id"], USER);
        assert_eq!(json["total_amount"], "25.00");
        assert_eq!(json["currency"], "USD");
        assert_eq!(json["items"].as_array().unwrap().len(), 2);
        assert!(json["order_number"].as_str().unwrap().starts_with("ORD-"));
    }

    #[tokio::test]
    async fn test_create_order_without_user_is_unauthorized() {
        let app = setup();

        let request = Request::builder()
            .method("POST")
            .uri("/orders")
            .header("content-type", "application/json")
            .body(Body::from(widget_order().to_string()))
            .unwrap();
        let (status, json) = send(&app, request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_create_order_with_zero_quantity() {
        let app = setup();

        let body = json!({
            "items": [{ "product_id": "SKU-001", "quantity": 0, "unit_price": "10.00" }]
        });
        let (status, json) = post_json(&app, "POST", "/orders", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "INVALID_QUANTITY");
    }

    #[tokio::test]
    async fn test_create_order_with_overflowing_amount() {
        let app = setup();

        let body = json!({
            "items": [{
                "product_id": "SKU-001",
                "quantity": 2,
                "unit_price": rust_decimal::Decimal::MAX.to_string()
            }]
        });
        let (status, json) = post_json(&app, "POST", "/orders", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "INVALID_ARGUMENT");

        let (_, listed) = get(&app, "/orders").await;
        assert_eq!(listed["total"], 0);
    }

    #[tokio::test]
    async fn test_create_order_with_mixed_currencies() {
        let app = setup();

        let body = json!({
            "items": [
                { "product_id": "SKU-001", "quantity": 1, "unit_price": "10.00", "currency": "USD" },
                { "product_id": "SKU-002", "quantity": 1, "unit_price": "10.00", "currency": "EUR" }
            ]
        });
        let (status, json) = post_json(&app, "POST", "/orders", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "CURRENCY_MISMATCH");
    }

    #[tokio::test]
    async fn test_get_order_round_trip() {
        let app = setup();
        let order_id = create_order(&app).await;

        let (status, json) = get(&app, &format!("/orders/{order_id}")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["id"], order_id.as_str());
        assert_eq!(json["total_amount"], "25.00");
    }

    #[tokio::test]
    async fn test_get_order_by_number() {
        let app = setup();
        let (_, created) = post_json(&app, "POST", "/orders", widget_order()).await;
        let number = created["order_number"].as_str().unwrap();

        let (status, json) = get(&app, &format!("/orders/by-number/{number}")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["id"], created["id"]);
    }

    #[tokio::test]
    async fn test_get_order_with_invalid_id() {
        let app = setup();

        let (status, json) = get(&app, "/orders/not-a-uuid").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_get_unknown_order() {
        let app = setup();

        let (status, json) = get(&app, &format!("/orders/{}", common::AggregateId::new())).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_list_orders_paginates() {
        let app = setup();
        for _ in 0..3 {
            create_order(&app).await;
        }

        let (status, json) = get(&app, "/orders?page=2&page_size=2").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total"], 3);
        assert_eq!(json["page"], 2);
        assert_eq!(json["total_pages"], 2);
        assert_eq!(json["items"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_orders_only_returns_callers_orders() {
        let app = setup();
        create_order(&app).await;

        let request = Request::builder()
            .uri("/orders")
            .header(api::USER_ID_HEADER, "someone-else")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(&app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total"], 0);
    }

    #[tokio::test]
    async fn test_cancel_pending_order() {
        let app = setup();
        let order_id = create_order(&app).await;

        let (status, json) = post(&app, &format!("/orders/{order_id}/cancel")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "cancelled");

        let (status, json) = post_json(
            &app,
            "POST",
            &format!("/orders/{order_id}/payment"),
            json!({ "method": "cash" }),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "INVALID_ORDER_STATUS");
    }
}

mod payments {
    use super::*;

    #[tokio::test]
    async fn test_process_payment() {
        let app = setup();
        let order_id = create_order(&app).await;

        let (status, json) = post_json(
            &app,
            "POST",
            &format!("/orders/{order_id}/payment"),
            json!({ "method": "paypal" }),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["status"], "completed");
        assert_eq!(json["method"], "paypal");
        assert_eq!(json["amount"], "25.00");
        assert!(json["transaction_id"].as_str().is_some());

        let (_, order) = get(&app, &format!("/orders/{order_id}")).await;
        assert_eq!(order["status"], "paid");

        let (status, payment) = get(&app, &format!("/orders/{order_id}/payment")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payment["id"], json["id"]);
    }

    #[tokio::test]
    async fn test_unknown_payment_method() {
        let app = setup();
        let order_id = create_order(&app).await;

        let (status, json) = post_json(
            &app,
            "POST",
            &format!("/orders/{order_id}/payment"),
            json!({ "method": "barter" }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "INVALID_ARGUMENT");
    }

    #[tokio::test]
    async fn test_declined_payment() {
        let (app, state) = setup_with_state();
        let order_id = create_order(&app).await;
        state.gateway.set_fail_on_charge(true);

        let (status, json) = post_json(
            &app,
            "POST",
            &format!("/orders/{order_id}/payment"),
            json!({ "method": "credit_card" }),
        )
        .await;

        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(json["code"], "PAYMENT_FAILED");

        let (_, order) = get(&app, &format!("/orders/{order_id}")).await;
        assert_eq!(order["status"], "pending");

        let (_, payment) = get(&app, &format!("/orders/{order_id}/payment")).await;
        assert_eq!(payment["status"], "failed");
    }

    #[tokio::test]
    async fn test_paying_twice_is_rejected() {
        let (app, state) = setup_with_state();
        let order_id = create_paid_order(&app).await;

        let (status, json) = post_json(
            &app,
            "POST",
            &format!("/orders/{order_id}/payment"),
            json!({ "method": "credit_card" }),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "INVALID_ORDER_STATUS");
        assert_eq!(state.gateway.charge_count(), 1);
    }

    #[tokio::test]
    async fn test_refund_paid_order() {
        let (app, state) = setup_with_state();
        let order_id = create_paid_order(&app).await;

        let (status, json) = post(&app, &format!("/orders/{order_id}/refund")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "refunded");
        assert_eq!(state.gateway.refund_count(), 1);

        let (_, order) = get(&app, &format!("/orders/{order_id}")).await;
        assert_eq!(order["status"], "refunded");
    }

    #[tokio::test]
    async fn test_refund_unpaid_order() {
        let app = setup();
        let order_id = create_order(&app).await;

        let (status, json) = post(&app, &format!("/orders/{order_id}/refund")).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "INVALID_ORDER_STATUS");
    }
}

mod shipments {
    use super::*;

    #[tokio::test]
    async fn test_shipment_requires_paid_order() {
        let app = setup();
        let order_id = create_order(&app).await;

        let (status, json) = post_json(
            &app,
            "POST",
            &format!("/orders/{order_id}/shipment"),
            shipping_request(),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "INVALID_ORDER_STATUS");
    }

    #[tokio::test]
    async fn test_shipment_rejects_blank_address() {
        let app = setup();
        let order_id = create_paid_order(&app).await;

        let body = json!({
            "address": { "street": "", "city": "Springfield", "country": "US" },
            "shipping_method": "standard"
        });
        let (status, json) =
            post_json(&app, "POST", &format!("/orders/{order_id}/shipment"), body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "INVALID_ARGUMENT");
    }

    #[tokio::test]
    async fn test_full_fulfilment_flow() {
        let app = setup();
        let order_id = create_paid_order(&app).await;

        let (status, shipment) = post_json(
            &app,
            "POST",
            &format!("/orders/{order_id}/shipment"),
            shipping_request(),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(shipment["status"], "pending");
        assert_eq!(shipment["shipping_method"], "express");
        assert_eq!(
            shipment["full_address"],
            "1 Main St, Springfield, IL 62701, US"
        );
        assert!(shipment["estimated_date"].as_str().is_some());
        let shipment_id = shipment["id"].as_str().unwrap().to_string();

        let (status, shipped) = post_json(
            &app,
            "PUT",
            &format!("/shipments/{shipment_id}"),
            json!({ "tracking_number": "TRACK-123", "carrier": "UPS" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(shipped["status"], "shipped");
        assert_eq!(shipped["carrier"], "UPS");

        let (_, order) = get(&app, &format!("/orders/{order_id}")).await;
        assert_eq!(order["status"], "completed");

        let (status, tracked) = get(&app, "/shipments/tracking/TRACK-123").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tracked["id"], shipment_id.as_str());

        let (status, delivered) = post(&app, &format!("/shipments/{shipment_id}/deliver")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(delivered["status"], "delivered");
        assert!(delivered["delivered_at"].as_str().is_some());

        let (_, latest) = get(&app, &format!("/orders/{order_id}/shipment")).await;
        assert_eq!(latest["status"], "delivered");
    }

    #[tokio::test]
    async fn test_duplicate_shipment_is_conflict() {
        let app = setup();
        let order_id = create_paid_order(&app).await;
        let uri = format!("/orders/{order_id}/shipment");

        let (status, _) = post_json(&app, "POST", &uri, shipping_request()).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, json) = post_json(&app, "POST", &uri, shipping_request()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "SHIPMENT_ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn test_cancel_shipment() {
        let app = setup();
        let order_id = create_paid_order(&app).await;
        let (_, shipment) = post_json(
            &app,
            "POST",
            &format!("/orders/{order_id}/shipment"),
            shipping_request(),
        )
        .await;
        let shipment_id = shipment["id"].as_str().unwrap();

        let (status, json) = post(&app, &format!("/shipments/{shipment_id}/cancel")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "cancelled");

        let (status, json) = post(&app, &format!("/shipments/{shipment_id}/deliver")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "INVALID_TRANSITION");
    }

    #[tokio::test]
    async fn test_unknown_tracking_number() {
        let app = setup();

        let (status, json) = get(&app, "/shipments/tracking/NOPE").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "NOT_FOUND");
    }
}
