//! Orders panel route handlers.

use askama::Template;
use axum::{
    Form, Router,
    extract::Path,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::settings::ChoiceView;
use super::{AdminUserView, render, set_flash, take_flash};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::{Flash, session_keys};
use crate::services::{AdminOrder, OrderBook, OrderNotFound, OrderStatus};
use crate::state::AppState;

/// One table row.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: String,
    pub customer: String,
    pub total: String,
    pub statuses: Vec<ChoiceView>,
    pub is_paid: bool,
    pub paid_at: String,
    pub is_delivered: bool,
    pub delivered_at: String,
}

fn stamp(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

impl From<&AdminOrder> for OrderView {
    fn from(order: &AdminOrder) -> Self {
        Self {
            id: order.id.clone(),
            customer: order.customer.clone(),
            total: format!("₹{}", order.total),
            statuses: OrderStatus::ALL
                .iter()
                .map(|&s| ChoiceView {
                    value: s.value(),
                    label: s.label(),
                    selected: s == order.status,
                })
                .collect(),
            is_paid: order.is_paid,
            paid_at: stamp(order.paid_at),
            is_delivered: order.is_delivered,
            delivered_at: stamp(order.delivered_at),
        }
    }
}

/// Orders page template.
#[derive(Template)]
#[template(path = "orders/index.html")]
pub struct OrdersTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub orders: Vec<OrderView>,
    pub flash: Option<Flash>,
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    #[serde(default)]
    pub status: String,
}

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(index))
        .route("/orders/{id}/status", post(update_status))
        .route("/orders/{id}/paid", post(mark_paid))
        .route("/orders/{id}/delivered", post(toggle_delivered))
}

async fn load_orders(session: &Session) -> OrderBook {
    session
        .get::<OrderBook>(session_keys::ORDERS)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Apply one edit, store the book when it succeeded and flash the outcome.
async fn apply(
    session: &Session,
    edit: impl FnOnce(&mut OrderBook) -> std::result::Result<String, OrderNotFound>,
) -> Result<Response> {
    let mut book = load_orders(session).await;
    let flash = match edit(&mut book) {
        Ok(message) => {
            session.insert(session_keys::ORDERS, &book).await?;
            Flash::success(message)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Order edit refused");
            Flash::error("Order not found!")
        }
    };
    set_flash(session, flash).await?;
    Ok(Redirect::to("/orders").into_response())
}

/// List orders.
///
/// GET /orders
#[instrument(skip_all)]
async fn index(RequireAdminAuth(admin): RequireAdminAuth, session: Session) -> Result<Response> {
    let flash = take_flash(&session).await;
    let book = load_orders(&session).await;

    render(&OrdersTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/orders".to_string(),
        orders: book.orders().iter().map(OrderView::from).collect(),
        flash,
    })
}

/// Set an order's status.
///
/// POST /orders/{id}/status
#[instrument(skip(_admin, session))]
async fn update_status(
    RequireAdminAuth(_admin): RequireAdminAuth,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Result<Response> {
    let Ok(status) = form.status.parse::<OrderStatus>() else {
        set_flash(&session, Flash::error("Unknown order status.")).await?;
        return Ok(Redirect::to("/orders").into_response());
    };
    apply(&session, |book| {
        book.update_status(&id, status)?;
        Ok(format!("Order {id} is now {}.", status.label()))
    })
    .await
}

/// Mark an order paid.
///
/// POST /orders/{id}/paid
#[instrument(skip(_admin, session))]
async fn mark_paid(
    RequireAdminAuth(_admin): RequireAdminAuth,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response> {
    apply(&session, |book| {
        book.mark_paid(&id, Utc::now())?;
        Ok(format!("Order {id} marked as paid."))
    })
    .await
}

/// Flip an order's delivered flag.
///
/// POST /orders/{id}/delivered
#[instrument(skip(_admin, session))]
async fn toggle_delivered(
    RequireAdminAuth(_admin): RequireAdminAuth,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response> {
    apply(&session, |book| {
        let delivered = book.toggle_delivered(&id, Utc::now())?;
        Ok(if delivered {
            format!("Order {id} marked as delivered.")
        } else {
            format!("Order {id} marked as not delivered.")
        })
    })
    .await
}
