mod common;

use assert_matches::assert_matches;
use common::{product, TestApp};
use localstore_client::errors::StorefrontError;
use localstore_client::models::{DeliveryType, OrderStatus};
use localstore_client::storage::{keys, SnapshotStorage};
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn order_body(id: Uuid, total: &str) -> serde_json::Value {
    json!({
        "success": true,
        "data": {
            "id": id,
            "orderNumber": "#K9F2A1",
            "customerName": "Asha",
            "items": [],
            "total": total,
            "status": "PENDING",
            "deliveryAddress": "SW1A 1AA",
            "createdAt": "2025-11-02T10:15:00Z"
        }
    })
}

#[tokio::test]
async fn successful_checkout_clears_cart_and_tracks_the_order() {
    let server = MockServer::start().await;
    let order_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(order_body(order_id, "5.39")))
        .expect(1)
        .mount(&server)
        .await;

    let app = TestApp::with_base_url(&server.uri());
    let p = product("Milk", dec!(1.20), 5);
    let id = p.id;
    app.seed_catalog(vec![p]);
    app.state.cart.add_to_cart(id).unwrap();
    app.state.cart.add_to_cart(id).unwrap();

    let tracked = app.state.checkout.place_order("sw1a 1aa").await.unwrap();

    assert_eq!(tracked.order.id, order_id);
    assert_eq!(tracked.order.status, OrderStatus::Pending);
    assert_eq!(tracked.estimated_delivery_time, "30-45");
    assert_eq!(tracked.delivery_type, DeliveryType::Delivery);

    // Cart cleared, reservations refunded.
    assert!(app.state.cart.is_empty());
    assert_eq!(app.stock_of(id), 5);

    // Tracked order persisted for the tracking page.
    assert!(app
        .storage
        .get(keys::CURRENT_ORDER)
        .unwrap()
        .expect("current order persisted")
        .contains(&order_id.to_string()));
    assert_eq!(app.state.orders.current_order().unwrap().order.id, order_id);

    // Payload carried the cart lines, the fee-inclusive total, and the
    // normalized postcode.
    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = requests[0].body_json().unwrap();
    assert_eq!(body["deliveryAddress"], "SW1A 1AA");
    assert_eq!(body["total"], "5.39");
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], json!(id));
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(items[0]["price"], "1.20");
}

#[tokio::test]
async fn server_rejection_leaves_the_cart_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let app = TestApp::with_base_url(&server.uri());
    let p = product("Milk", dec!(1.20), 5);
    let id = p.id;
    app.seed_catalog(vec![p]);
    app.state.cart.add_to_cart(id).unwrap();

    let err = app.state.checkout.place_order("SW1A 1AA").await.unwrap_err();
    assert_matches!(err, StorefrontError::Api { status: 500, .. });

    assert_eq!(app.state.cart.total_items(), 1);
    assert_eq!(app.stock_of(id), 4);
    assert!(app.state.orders.current_order().is_none());
    assert_eq!(app.storage.get(keys::CURRENT_ORDER).unwrap(), None);
}

#[tokio::test]
async fn envelope_failure_counts_as_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "stock changed while you were shopping"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = TestApp::with_base_url(&server.uri());
    let p = product("Milk", dec!(1.20), 5);
    let id = p.id;
    app.seed_catalog(vec![p]);
    app.state.cart.add_to_cart(id).unwrap();

    let err = app.state.checkout.place_order("SW1A 1AA").await.unwrap_err();
    assert_matches!(
        err,
        StorefrontError::Api { message, .. } if message.contains("stock changed")
    );
    assert_eq!(app.state.cart.total_items(), 1);
}

#[tokio::test]
async fn invalid_postcode_aborts_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let app = TestApp::with_base_url(&server.uri());
    let p = product("Milk", dec!(1.20), 5);
    let id = p.id;
    app.seed_catalog(vec![p]);
    app.state.cart.add_to_cart(id).unwrap();

    let err = app.state.checkout.place_order("1234").await.unwrap_err();
    assert_matches!(err, StorefrontError::ValidationError(_));
    assert_eq!(app.state.cart.total_items(), 1);
}

#[tokio::test]
async fn uncovered_area_aborts_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let app = TestApp::with_base_url(&server.uri());
    let p = product("Milk", dec!(1.20), 5);
    let id = p.id;
    app.seed_catalog(vec![p]);
    app.state.cart.add_to_cart(id).unwrap();

    // Valid postcode, area outside the delivery allow-list.
    let err = app.state.checkout.place_order("YO1 7HH").await.unwrap_err();
    assert_matches!(err, StorefrontError::DeliveryUnavailable(_));
    assert_eq!(app.state.cart.total_items(), 1);
}

#[tokio::test]
async fn empty_cart_cannot_be_checked_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let app = TestApp::with_base_url(&server.uri());
    let err = app.state.checkout.place_order("SW1A 1AA").await.unwrap_err();
    assert_matches!(err, StorefrontError::InvalidOperation(_));
}
