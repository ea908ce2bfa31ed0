//! Cart route handlers.
//!
//! Every mutation goes through [`CartStore::dispatch`]. HTMX requests get a
//! fragment back plus an `HX-Trigger: cart-updated` header; plain form posts
//! are redirected to the cart page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use navdana_core::{Cart, CartAction, CartLine, CheckoutStage, LineKey, NewLine, Price, ProductId};

use super::{Layout, is_htmx};
use crate::backend::MerchantBackend;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::services::{CartStore, CheckoutFlow, Notice};
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub product_id: String,
    pub name: String,
    pub image: String,
    pub size: String,
    pub color: String,
    pub sku: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        let key = line.key();
        Self {
            product_id: key.product_id().to_string(),
            name: line.name.clone(),
            image: line.image.clone(),
            size: key.size().to_string(),
            color: key.color().to_string(),
            sku: key.sku().to_string(),
            quantity: line.quantity,
            price: line.unit_price().display(),
            line_price: Price::inr(line.line_total()).display(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart.lines().iter().map(CartLineView::from).collect(),
            subtotal: Price::inr(cart.subtotal()).display(),
            item_count: cart.total_quantity(),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub size: Option<String>,
    pub color: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub quantity: Option<u32>,
}

/// Parse an optional number field, treating an empty value as absent.
fn blank_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Identifies one cart line.
#[derive(Debug, Deserialize)]
pub struct LineForm {
    pub product_id: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub sku: Option<String>,
}

impl LineForm {
    fn key(&self) -> LineKey {
        LineKey::new(
            self.product_id.as_str(),
            self.size.as_deref(),
            self.color.as_deref(),
            self.sku.as_deref(),
        )
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: CartView,
    pub notice: Option<Notice>,
    pub checkout_in_progress: bool,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Treat a blank form field as absent.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Answer a line mutation: the items fragment for HTMX, a redirect otherwise.
fn line_response(headers: &HeaderMap, cart: &Cart) -> Response {
    if is_htmx(headers) {
        (
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            CartItemsTemplate {
                cart: CartView::from(cart),
            },
        )
            .into_response()
    } else {
        Redirect::to("/cart").into_response()
    }
}

/// Display cart page.
///
/// A checkout that ended without payment leaves its message on the session;
/// it is shown here once.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let store = CartStore::load(session.clone()).await;
    let mut checkout = CheckoutFlow::load(session.clone()).await;

    let (notice, checkout_in_progress) = match checkout.stage() {
        CheckoutStage::Idle => (checkout.take_notice().await, false),
        CheckoutStage::Completed(_) => (None, false),
        _ => (None, true),
    };

    CartShowTemplate {
        layout: Layout::load(&state, &session).await,
        cart: CartView::from(store.cart()),
        notice,
        checkout_in_progress,
    }
}

/// Add item to cart.
///
/// Name, price and image come from the catalog, never from the form. A
/// product with sizes or colors requires one of each to be chosen.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product = state
        .backend()
        .product(&ProductId::new(form.product_id.as_str()))
        .await?;

    let size = non_blank(form.size);
    let color = non_blank(form.color);

    for (name, options, choice) in [
        ("size", &product.sizes, &size),
        ("color", &product.colors, &color),
    ] {
        match choice {
            None if !options.is_empty() => {
                return Ok(
                    Redirect::to(&format!("/products/{}?missing={name}", product.id))
                        .into_response(),
                );
            }
            Some(value) if !options.contains(value) => {
                return Err(AppError::BadRequest(format!("Unknown {name}: {value}")));
            }
            _ => {}
        }
    }

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", product.id.as_str())]),
    );

    let mut store = CartStore::load(session).await;
    let cart = store
        .dispatch(CartAction::Add {
            line: NewLine {
                product_id: product.id.clone(),
                size,
                color,
                sku: product.sku.clone(),
                name: product.name.clone(),
                price: product.price,
                image: product.primary_image().to_string(),
            },
            quantity: form.quantity,
        })
        .await;

    if is_htmx(&headers) {
        Ok((
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            CartCountTemplate {
                count: cart.total_quantity(),
            },
        )
            .into_response())
    } else {
        Ok(Redirect::to("/cart").into_response())
    }
}

/// +1 on a line.
#[instrument(skip(session, headers))]
pub async fn increment(session: Session, headers: HeaderMap, Form(form): Form<LineForm>) -> Response {
    let mut store = CartStore::load(session).await;
    let cart = store.dispatch(CartAction::Increment(form.key())).await;
    line_response(&headers, cart)
}

/// -1 on a line; a line at 1 is removed.
#[instrument(skip(session, headers))]
pub async fn decrement(session: Session, headers: HeaderMap, Form(form): Form<LineForm>) -> Response {
    let mut store = CartStore::load(session).await;
    let cart = store.dispatch(CartAction::Decrement(form.key())).await;
    line_response(&headers, cart)
}

/// Remove a line.
#[instrument(skip(session, headers))]
pub async fn remove(session: Session, headers: HeaderMap, Form(form): Form<LineForm>) -> Response {
    let mut store = CartStore::load(session).await;
    let cart = store.dispatch(CartAction::Remove(form.key())).await;
    line_response(&headers, cart)
}

/// Empty the cart.
#[instrument(skip(session, headers))]
pub async fn clear(session: Session, headers: HeaderMap) -> Response {
    let mut store = CartStore::load(session).await;
    let cart = store.dispatch(CartAction::Clear).await;
    line_response(&headers, cart)
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> impl IntoResponse {
    let store = CartStore::load(session).await;
    CartCountTemplate {
        count: store.cart().total_quantity(),
    }
}
