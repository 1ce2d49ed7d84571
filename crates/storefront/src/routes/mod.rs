//! HTTP route handlers for the storefront JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (pings the database)
//!
//! # Auth (identity glue; everything else reads the session)
//! POST /auth/login                      - Credential login, writes the session
//! POST /auth/register                   - Create a customer account
//! POST /auth/logout                     - Drop the session
//!
//! # Catalogue
//! GET  /api/products                    - Product listing
//! POST /api/products                    - Create product (admin)
//! GET  /api/products/{id}               - Product detail
//! PUT  /api/products/{id}               - Update product (admin)
//! DELETE /api/products/{id}             - Delete product (admin)
//! GET  /api/products/{id}/options       - Options of a product
//! POST /api/products/{id}/options       - Create option (admin)
//! GET  /api/options/{id}                - Option detail
//! DELETE /api/options/{id}              - Delete option (admin)
//!
//! # Cart (session identity, last-write-wins persistence)
//! GET  /api/cart                        - The user's cart (created on first access)
//! PUT  /api/cart                        - Replace the whole cart
//! POST /api/cart/items                  - Add a line (merges by product+option)
//! DELETE /api/cart/items/{id}           - Remove a line (?quantity=n decrements)
//!
//! # Checkout
//! POST /api/checkout                    - Validate cart + addresses into an order
//!
//! # Orders
//! GET  /api/orders                      - Own orders (admin: all, or ?user_id=)
//! GET  /api/orders/{id}                 - Order detail (owner or admin)
//! POST /api/orders/{id}/transition      - Rule-driven transition (admin)
//! PUT  /api/orders/{id}/status          - Status override, audit-logged (admin)
//! GET  /api/orders/{id}/shipment        - Lazy-created shipment (owner or admin)
//! GET  /api/orders/{id}/invoice         - Ensure-issued invoice (owner or admin)
//!
//! # Shipments (fulfillment staff)
//! GET  /api/shipments                   - All shipments (admin)
//! GET  /api/shipments/{id}              - Shipment detail (admin)
//! PUT  /api/shipments/{id}              - Update carrier/tracking/eta/status (admin)
//!
//! # Addresses
//! GET  /api/addresses                   - Own addresses, current first
//! POST /api/addresses                   - Save a new current pair (demotes prior)
//! GET  /api/users/{id}/addresses        - A user's addresses (admin)
//! ```

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;
pub mod shipments;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create the catalogue routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route(
            "/{id}/options",
            get(products::options).post(products::create_option),
        )
}

/// Create the option routes router (top-level option lookup).
pub fn option_routes() -> Router<AppState> {
    Router::new().route(
        "/{id}",
        get(products::show_option).delete(products::delete_option),
    )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).put(cart::replace))
        .route("/items", post(cart::add_item))
        .route("/items/{id}", delete(cart::remove_item))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/transition", post(orders::transition))
        .route("/{id}/status", put(orders::override_status))
        .route("/{id}/shipment", get(orders::shipment))
        .route("/{id}/invoice", get(orders::invoice))
}

/// Create the shipment routes router.
pub fn shipment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(shipments::index))
        .route("/{id}", get(shipments::show).put(shipments::update))
}

/// Create the address routes router.
pub fn address_routes() -> Router<AppState> {
    Router::new().route("/", get(addresses::index).post(addresses::create))
}

/// Assemble the full application router (sans health endpoints, which live
/// in `main`).
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/products", product_routes())
        .nest("/options", option_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", post(checkout::checkout))
        .nest("/orders", order_routes())
        .nest("/shipments", shipment_routes())
        .nest("/addresses", address_routes())
        .route("/users/{id}/addresses", get(addresses::for_user));

    Router::new()
        .nest("/auth", auth_routes())
        .nest("/api", api)
}
