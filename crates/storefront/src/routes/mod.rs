//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page (active banners, products)
//!
//! # Products
//! GET  /products                  - Product listing
//! GET  /products/{id}             - Product detail
//!
//! # Cart (HTMX fragments when HX-Request is set, redirects otherwise)
//! GET  /cart                      - Cart page
//! POST /cart/add                  - Add to cart
//! POST /cart/increment            - +1 on a line
//! POST /cart/decrement            - -1 on a line
//! POST /cart/remove               - Remove a line
//! POST /cart/clear                - Empty the cart
//! GET  /cart/count                - Cart count badge (fragment)
//!
//! # Checkout
//! GET  /checkout                  - Current step
//! POST /checkout/start            - Begin from the cart
//! POST /checkout/name             - Submit name
//! POST /checkout/email            - Submit email (sends OTP)
//! POST /checkout/otp              - Submit OTP
//! POST /checkout/shipping         - Submit shipping (creates order)
//! POST /checkout/payment/verify   - Widget success callback (JSON)
//! POST /checkout/payment/failed   - Widget failure or dismissal (JSON)
//! POST /checkout/cancel           - Abandon checkout
//! ```

pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;

use axum::{
    Router,
    http::HeaderMap,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::services::CartStore;
use crate::state::AppState;

/// Data every page's layout needs.
#[derive(Clone)]
pub struct Layout {
    pub store_name: String,
    pub cart_count: u32,
}

impl Layout {
    /// Build the layout for the current visitor.
    pub async fn load(state: &AppState, session: &Session) -> Self {
        let cart = CartStore::load(session.clone()).await;
        Self {
            store_name: state.config().store_name.clone(),
            cart_count: cart.cart().total_quantity(),
        }
    }
}

/// Whether the request was made by HTMX.
fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("hx-request")
        .is_some_and(|v| v.as_bytes() == b"true")
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/increment", post(cart::increment))
        .route("/decrement", post(cart::decrement))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/start", post(checkout::start))
        .route("/name", post(checkout::submit_name))
        .route("/email", post(checkout::submit_email))
        .route("/otp", post(checkout::submit_otp))
        .route("/shipping", post(checkout::submit_shipping))
        .route("/payment/verify", post(checkout::verify_payment))
        .route("/payment/failed", post(checkout::payment_failed))
        .route("/cancel", post(checkout::cancel))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
}
