//! Integration test harness for Navdana.
//!
//! Each test starts a fake merchant backend on an ephemeral port, points a
//! storefront or admin app at it, and drives the app over HTTP with a
//! cookie-keeping client.
//!
//! ```rust,ignore
//! let backend = FakeMerchant::spawn().await;
//! let storefront = spawn_storefront(&backend).await;
//! let client = client();
//! let resp = client.get(format!("{storefront}/health")).send().await?;
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde_json::{Value, json};

/// The one code the fake backend accepts.
pub const VALID_OTP: &str = "123456";

/// Bearer token issued on a successful sign-in.
pub const ISSUED_TOKEN: &str = "tok-integration";

/// Order id the fake backend assigns.
pub const ORDER_ID: &str = "ORD-1001";

/// Body of the fake gateway script.
pub const WIDGET_SCRIPT: &str = "window.Razorpay = function () {};";

/// Everything the fake backend was asked to do.
#[derive(Debug, Default)]
pub struct Recorded {
    pub otp_emails: Vec<String>,
    pub orders: Vec<Value>,
    /// `Authorization` header of each order request.
    pub order_auth: Vec<Option<String>>,
    pub payment_checks: Vec<Value>,
    pub banners: Vec<Value>,
    pub uploads: Vec<(String, String, usize)>,
    /// Whether `/order/verify` should accept the proof.
    pub accept_payments: bool,
}

/// An in-process stand-in for the merchant REST API.
#[derive(Clone)]
pub struct FakeMerchant {
    pub addr: SocketAddr,
    state: Arc<Mutex<Recorded>>,
}

impl FakeMerchant {
    /// Start the backend with one product and two banners.
    pub async fn spawn() -> Self {
        let state = Arc::new(Mutex::new(Recorded {
            banners: vec![
                json!({"_id": "B1", "title": "Diwali Sale", "url": "https://cdn.example.com/b1.jpg", "isActive": true}),
                json!({"_id": "B2", "title": "Monsoon", "url": "https://cdn.example.com/b2.jpg", "isActive": false}),
            ],
            accept_payments: true,
            ..Recorded::default()
        }));

        let app = Router::new()
            .route("/user/send-otp", post(send_otp))
            .route("/user/verify", post(verify_otp))
            .route("/order", post(create_order))
            .route("/order/verify", post(verify_payment))
            .route("/product", get(list_products))
            .route("/product/{id}", get(product))
            .route("/banner", get(list_banners))
            .route("/banner/upload", post(upload_banner))
            .route("/banner/{id}", put(update_banner).delete(delete_banner))
            .route("/checkout.js", get(|| async { WIDGET_SCRIPT }))
            .with_state(state.clone());

        let addr = serve(app).await;
        Self { addr, state }
    }

    /// Base URL of the API.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// What the backend has seen so far.
    pub fn recorded(&self) -> MutexGuard<'_, Recorded> {
        self.state.lock().unwrap()
    }
}

type Shared = State<Arc<Mutex<Recorded>>>;

fn product_json() -> Value {
    json!({
        "_id": "P1",
        "name": "Chikankari Kurta",
        "price": 1499,
        "description": "Hand-embroidered cotton kurta",
        "images": ["https://cdn.example.com/p1.jpg"],
        "sizes": ["S", "M", "L"],
        "colors": [],
        "sku": "KUR-001"
    })
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "message": message }))).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {ISSUED_TOKEN}"))
}

async fn send_otp(State(state): Shared, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    state.lock().unwrap().otp_emails.push(email);
    Json(json!({ "message": "OTP sent" })).into_response()
}

async fn verify_otp(Json(body): Json<Value>) -> Response {
    if body["otp"] != VALID_OTP {
        return bad_request("Invalid or expired OTP");
    }
    Json(json!({
        "data": {
            "user": {"_id": "U1", "name": body["name"], "email": body["email"]},
            "token": ISSUED_TOKEN
        }
    }))
    .into_response()
}

async fn create_order(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let mut recorded = state.lock().unwrap();
    recorded.orders.push(body);
    recorded.order_auth.push(auth);

    Json(json!({
        "data": {
            "order": {"_id": ORDER_ID},
            "razorpayOrder": {"id": "order_gw_1", "amount": 149_900, "currency": "INR"},
            "key": "rzp_test_key"
        }
    }))
    .into_response()
}

async fn verify_payment(State(state): Shared, Json(body): Json<Value>) -> Response {
    let mut recorded = state.lock().unwrap();
    recorded.payment_checks.push(body);
    if recorded.accept_payments {
        Json(json!({ "success": true })).into_response()
    } else {
        Json(json!({ "success": false, "message": "Signature mismatch" })).into_response()
    }
}

async fn list_products() -> Json<Value> {
    Json(json!({ "data": [product_json()] }))
}

async fn product(Path(id): Path<String>) -> Response {
    if id == "P1" {
        Json(json!({ "data": product_json() })).into_response()
    } else {
        (StatusCode::NOT_FOUND, "Product not found").into_response()
    }
}

async fn list_banners(State(state): Shared) -> Json<Value> {
    Json(json!({ "data": state.lock().unwrap().banners }))
}

async fn upload_banner(State(state): Shared, headers: HeaderMap, mut multipart: Multipart) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Token missing"}))).into_response();
    }

    let mut title = String::new();
    let mut active = String::new();
    let mut file = (String::new(), 0);
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.unwrap_or_default();
        match name.as_str() {
            "title" => title = String::from_utf8_lossy(&bytes).into_owned(),
            "isActive" => active = String::from_utf8_lossy(&bytes).into_owned(),
            "url" => file = (file_name, bytes.len()),
            _ => {}
        }
    }

    let mut recorded = state.lock().unwrap();
    if recorded.banners.iter().any(|b| b["title"] == title.as_str()) {
        return bad_request("Banner title already exists");
    }
    let id = format!("B{}", recorded.banners.len() + 1);
    recorded.banners.push(json!({
        "_id": id,
        "title": title,
        "url": format!("https://cdn.example.com/{}", file.0),
        "isActive": active == "true",
    }));
    recorded.uploads.push((title, file.0, file.1));
    (StatusCode::CREATED, Json(json!({ "message": "created" }))).into_response()
}

async fn update_banner(
    State(state): Shared,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Token missing"}))).into_response();
    }
    let mut recorded = state.lock().unwrap();
    match recorded.banners.iter_mut().find(|b| b["_id"] == id.as_str()) {
        Some(banner) => {
            banner["isActive"] = body["isActive"].clone();
            Json(json!({ "data": banner })).into_response()
        }
        None => (StatusCode::NOT_FOUND, "Banner not found").into_response(),
    }
}

async fn delete_banner(State(state): Shared, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Token missing"}))).into_response();
    }
    state.lock().unwrap().banners.retain(|b| b["_id"] != id.as_str());
    StatusCode::NO_CONTENT.into_response()
}

/// Serve `app` on an ephemeral localhost port.
async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Start a storefront against `backend`; returns its base URL.
pub async fn spawn_storefront(backend: &FakeMerchant) -> String {
    use navdana_storefront::config::{MerchantConfig, PaymentConfig, StorefrontConfig};

    let config = StorefrontConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        store_name: "Navdana Store".to_string(),
        merchant: MerchantConfig {
            api_url: backend.api_url(),
        },
        payment: PaymentConfig {
            widget_url: format!("{}/checkout.js", backend.api_url()),
            gateway_origins: vec![backend.api_url()],
            pin_integrity: true,
            theme_color: "#000000".to_string(),
        },
        sentry_dsn: None,
        sentry_environment: None,
    };

    let app = navdana_storefront::app(navdana_storefront::state::AppState::new(config));
    format!("http://{}", serve(app).await)
}

/// Start an admin panel against `backend`; returns its base URL.
pub async fn spawn_admin(backend: &FakeMerchant) -> String {
    use navdana_admin::config::AdminConfig;

    let config = AdminConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        api_url: backend.api_url(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    };

    let app = navdana_admin::app(navdana_admin::state::AppState::new(config));
    format!("http://{}", serve(app).await)
}

/// A client that keeps cookies and follows redirects.
#[must_use]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap()
}
