mod common;

use common::TestApp;
use localstore_client::models::Role;
use localstore_client::storage::{keys, SnapshotStorage};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn bootstrap_restores_session_and_reconciles_the_cart() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{
                "id": id,
                "name": "Milk",
                "category": "Dairy",
                "price": "1.20",
                "stock": 2
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = TestApp::with_base_url(&server.uri());
    // State left behind by a previous session: a signed-in customer with
    // three units of milk in the cart.
    app.storage.set(keys::TOKEN, "jwt-token").unwrap();
    app.storage
        .set(
            keys::USER,
            r#"{"name":"Asha","email":"asha@example.com","role":"customer"}"#,
        )
        .unwrap();
    app.storage
        .set(
            keys::CART,
            &format!(
                r#"[{{"productId":"{id}","name":"Milk","price":"1.20","image":"🥛","quantity":3}}]"#
            ),
        )
        .unwrap();

    let app = app.reload();
    let report = app.state.bootstrap().await.unwrap();

    assert!(app.state.session.is_authenticated());
    assert_eq!(app.state.session.role(), Some(Role::Customer));

    // Only two units are left on the shelf; the desired three were clamped.
    assert_eq!(report.kept, 1);
    assert_eq!(report.clamped, 1);
    assert_eq!(app.reserved(id), 2);
    assert_eq!(app.stock_of(id), 0);
}

#[tokio::test]
async fn bootstrap_surfaces_a_failed_catalog_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let app = TestApp::with_base_url(&server.uri());
    assert!(app.state.bootstrap().await.is_err());
    assert!(app.state.inventory.last_error().is_some());
    assert!(app.state.inventory.all().is_empty());
}

#[tokio::test]
async fn polling_starts_only_with_a_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/orders/my-orders"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": []})),
        )
        .mount(&server)
        .await;

    let app = TestApp::with_base_url(&server.uri());
    assert!(app.state.start_order_polling().is_none());

    app.storage.set(keys::TOKEN, "jwt-token").unwrap();
    app.storage
        .set(
            keys::USER,
            r#"{"name":"Asha","email":"asha@example.com","role":"customer"}"#,
        )
        .unwrap();
    app.state.session.restore();

    let poller = app.state.start_order_polling().expect("poller starts");
    assert_eq!(poller.role(), Role::Customer);
    poller.stop();
}
