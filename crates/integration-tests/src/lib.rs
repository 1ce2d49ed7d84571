//! Integration tests for Madrona.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database, migrate, seed
//! cargo run -p madrona-cli -- migrate
//! cargo run -p madrona-cli -- seed
//!
//! # Start the server
//! cargo run -p madrona-storefront
//!
//! # Run the ignored integration tests
//! cargo test -p madrona-integration-tests -- --ignored
//! ```
//!
//! Tests talk to a running server over HTTP with cookie-backed sessions,
//! using the demo accounts the seed command creates.

use reqwest::Client;
use serde_json::{Value, json};

/// Base URL for the storefront API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("MADRONA_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned())
}

/// A cookie-carrying client, not yet logged in.
///
/// # Panics
///
/// Panics if the client cannot be constructed.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Log a client in with the given demo credentials.
///
/// # Panics
///
/// Panics if the request fails or the credentials are rejected.
pub async fn login(client: &Client, email: &str, password: &str) -> Value {
    let resp = client
        .post(format!("{}/auth/login", base_url()))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("login request failed");
    assert!(
        resp.status().is_success(),
        "login rejected for {email}: {}",
        resp.status()
    );
    resp.json().await.expect("login response was not JSON")
}

/// A client logged in as the seeded customer account.
pub async fn customer_client() -> Client {
    let c = client();
    login(&c, "user@user.com", "password").await;
    c
}

/// A client logged in as the seeded admin account.
pub async fn admin_client() -> Client {
    let c = client();
    login(&c, "admin@admin.com", "password").await;
    c
}

/// Two well-formed checkout addresses.
#[must_use]
pub fn address_pair() -> Value {
    json!([
        {
            "type": "BillingAddress",
            "full_name": "Test Customer",
            "address_line1": "1 High Street",
            "city": "Hobart",
            "state": "TAS",
            "postcode": "7000",
            "country": "Australia"
        },
        {
            "type": "DeliveryAddress",
            "full_name": "Test Customer",
            "address_line1": "1 High Street",
            "city": "Hobart",
            "state": "TAS",
            "postcode": "7000",
            "country": "Australia"
        }
    ])
}
