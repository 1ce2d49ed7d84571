//! End-to-end checkout flow against a running server.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - Seeded demo data (cargo run -p madrona-cli -- seed)
//! - The storefront server running (cargo run -p madrona-storefront)

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use madrona_integration_tests::{address_pair, base_url, customer_client};

/// Find the seeded Linen Shirt and its XL option (base 100.00, extra 25.00).
async fn shirt_and_xl(client: &Client) -> (Value, Value) {
    let products: Vec<Value> = client
        .get(format!("{}/api/products", base_url()))
        .send()
        .await
        .expect("list products")
        .json()
        .await
        .expect("products JSON");

    let shirt = products
        .into_iter()
        .find(|p| p["title"] == "Linen Shirt")
        .expect("seeded Linen Shirt present");

    let options: Vec<Value> = client
        .get(format!(
            "{}/api/products/{}/options",
            base_url(),
            shirt["id"].as_str().expect("product id")
        ))
        .send()
        .await
        .expect("list options")
        .json()
        .await
        .expect("options JSON");

    let xl = options
        .into_iter()
        .find(|o| o["value"] == "XL")
        .expect("seeded XL option present");

    (shirt, xl)
}

async fn clear_cart(client: &Client) {
    let resp = client
        .put(format!("{}/api/cart", base_url()))
        .json(&json!({ "items": [] }))
        .send()
        .await
        .expect("clear cart");
    assert!(resp.status().is_success());
}

async fn add_to_cart(client: &Client, shirt: &Value, xl: &Value, quantity: i32) -> Value {
    let resp = client
        .post(format!("{}/api/cart/items", base_url()))
        .json(&json!({
            "product_id": shirt["id"],
            "product_option_id": xl["id"],
            "quantity": quantity,
        }))
        .send()
        .await
        .expect("add to cart");
    assert!(resp.status().is_success(), "add to cart: {}", resp.status());
    resp.json().await.expect("cart JSON")
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn repeated_adds_merge_into_one_cart_line() {
    let client = customer_client().await;
    let (shirt, xl) = shirt_and_xl(&client).await;
    clear_cart(&client).await;

    add_to_cart(&client, &shirt, &xl, 1).await;
    let cart = add_to_cart(&client, &shirt, &xl, 2).await;

    let items = cart["items"].as_array().expect("items array");
    assert_eq!(items.len(), 1, "same product+option must merge");
    assert_eq!(items[0]["quantity"], 3);
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn checkout_creates_a_pending_order_with_a_preparing_shipment() {
    let client = customer_client().await;
    let (shirt, xl) = shirt_and_xl(&client).await;
    clear_cart(&client).await;
    add_to_cart(&client, &shirt, &xl, 2).await;

    // 2 × (100.00 + 25.00)
    let resp = client
        .post(format!("{}/api/checkout", base_url()))
        .json(&json!({ "total": "250.00", "addresses": address_pair() }))
        .send()
        .await
        .expect("checkout");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let order: Value = resp.json().await.expect("order JSON");
    assert_eq!(order["status"], "Pending");
    assert_eq!(order["total"], "250.00");
    assert_eq!(order["items"].as_array().expect("items").len(), 1);

    // The cart was cleared by the checkout transaction
    let cart: Value = client
        .get(format!("{}/api/cart", base_url()))
        .send()
        .await
        .expect("get cart")
        .json()
        .await
        .expect("cart JSON");
    assert_eq!(cart["items"].as_array().expect("items").len(), 0);

    // The linked shipment exists in preparing with nothing set yet
    let shipment: Value = client
        .get(format!(
            "{}/api/orders/{}/shipment",
            base_url(),
            order["id"].as_str().expect("order id")
        ))
        .send()
        .await
        .expect("get shipment")
        .json()
        .await
        .expect("shipment JSON");
    assert_eq!(shipment["status"], "preparing");
    assert_eq!(shipment["tracking_number"], Value::Null);
    assert_eq!(shipment["carrier"], Value::Null);
    assert_eq!(shipment["shipped_at"], Value::Null);
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn checkout_beyond_stock_is_rejected_with_named_violations() {
    let client = customer_client().await;
    let (shirt, xl) = shirt_and_xl(&client).await;
    clear_cart(&client).await;
    add_to_cart(&client, &shirt, &xl, 9999).await;

    let resp = client
        .post(format!("{}/api/checkout", base_url()))
        .json(&json!({ "total": "1249875.00", "addresses": address_pair() }))
        .send()
        .await
        .expect("checkout");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = resp.json().await.expect("rejection JSON");
    let violations = body["violations"].as_array().expect("violations array");
    assert!(
        violations
            .iter()
            .any(|v| v["kind"] == "insufficient_stock" && v["title"] == "Linen Shirt"),
        "expected an insufficient_stock violation naming the line: {body}"
    );

    clear_cart(&client).await;
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn checkout_with_one_address_fails_the_count_rule() {
    let client = customer_client().await;
    let (shirt, xl) = shirt_and_xl(&client).await;
    clear_cart(&client).await;
    add_to_cart(&client, &shirt, &xl, 1).await;

    let only_billing = json!([address_pair()[0]]);
    let resp = client
        .post(format!("{}/api/checkout", base_url()))
        .json(&json!({ "total": "125.00", "addresses": only_billing }))
        .send()
        .await
        .expect("checkout");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = resp.json().await.expect("rejection JSON");
    let violations = body["violations"].as_array().expect("violations array");
    assert!(violations.iter().any(|v| v["kind"] == "address_count"));

    clear_cart(&client).await;
}
