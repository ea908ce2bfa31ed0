//! Checkout route handlers.
//!
//! Each step is a form post that drives [`CheckoutFlow`] and then redirects
//! back to `GET /checkout`, which renders whatever step the session is on.
//! Step failures are not HTTP errors: the flow records a notice and the
//! same step is shown again with it.
//!
//! The payment step is the exception. `payment.js` opens the gateway widget
//! and reports back as JSON, then navigates to `/checkout`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use navdana_core::{CheckoutStage, ShippingInfo};

use super::Layout;
use super::cart::CartView;
use crate::backend::PaymentProof;
use crate::error::{AppError, Result};
use crate::filters;
use crate::services::{CartStore, CheckoutError, CheckoutFlow, Notice, WidgetOutcome};
use crate::state::AppState;

/// What `payment.js` needs to open the widget.
#[derive(Clone)]
pub struct PaymentView {
    /// Widget options as JSON, passed to the constructor untouched.
    pub options_json: String,
    pub script_src: String,
    /// SRI value, or empty when pinning is disabled.
    pub integrity: String,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub layout: Layout,
    /// Stage name, e.g. `need_email`.
    pub step: &'static str,
    pub name: String,
    pub email: String,
    pub shipping: ShippingInfo,
    pub notice: Option<Notice>,
    pub cart: CartView,
    pub payment: Option<PaymentView>,
    pub order_id: String,
}

/// Name step form data.
#[derive(Debug, Deserialize)]
pub struct NameForm {
    #[serde(default)]
    pub name: String,
}

/// Email step form data.
#[derive(Debug, Deserialize)]
pub struct EmailForm {
    #[serde(default)]
    pub email: String,
}

/// OTP step form data.
#[derive(Debug, Deserialize)]
pub struct OtpForm {
    #[serde(default)]
    pub otp: String,
}

/// Widget failure report from `payment.js`.
#[derive(Debug, Deserialize)]
pub struct FailedPayment {
    pub outcome: WidgetOutcome,
}

/// Answer to a widget callback.
#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub success: bool,
    /// Where the browser should go next.
    pub redirect: &'static str,
}

/// Log a step failure. The flow has already recorded the notice.
fn log_step_error(step: &str, error: &CheckoutError) {
    match error {
        CheckoutError::Validation(_) | CheckoutError::InvalidTransition { .. } => {
            tracing::debug!(step, error = %error, "Checkout step rejected");
        }
        _ => tracing::warn!(step, error = %error, "Checkout step failed"),
    }
}

fn to_checkout() -> Response {
    Redirect::to("/checkout").into_response()
}

/// Render the current checkout step.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Response> {
    let mut flow = CheckoutFlow::load(session.clone()).await;

    let (step, order_id) = match flow.stage().clone() {
        CheckoutStage::Idle => return Ok(Redirect::to("/cart").into_response()),
        CheckoutStage::Completed(order_id) => ("completed", order_id.to_string()),
        stage => (stage.name(), String::new()),
    };

    let notice = flow.take_notice().await;
    let snapshot = flow.session().clone();
    if step == "completed" {
        flow.acknowledge().await;
    }

    let payment = match (&snapshot.stage, &snapshot.pending) {
        (CheckoutStage::PaymentInFlight(_), Some(pending)) => Some(PaymentView {
            options_json: serde_json::to_string(&pending.options)
                .map_err(|e| AppError::Internal(format!("widget options: {e}")))?,
            script_src: pending.script.src.clone(),
            integrity: if state.config().payment.pin_integrity {
                pending.script.integrity.clone()
            } else {
                String::new()
            },
        }),
        _ => None,
    };

    let cart = CartStore::load(session.clone()).await;

    Ok(CheckoutTemplate {
        layout: Layout::load(&state, &session).await,
        step,
        name: snapshot.name,
        email: snapshot.email,
        shipping: snapshot.shipping,
        notice,
        cart: CartView::from(cart.cart()),
        payment,
        order_id,
    }
    .into_response())
}

/// Begin checkout from the cart.
#[instrument(skip(session))]
pub async fn start(session: Session) -> Response {
    let mut flow = CheckoutFlow::load(session).await;
    match flow.begin().await {
        Ok(()) => to_checkout(),
        // Already under way: resume it.
        Err(CheckoutError::InvalidTransition { .. }) => to_checkout(),
        Err(e) => {
            log_step_error("start", &e);
            Redirect::to("/cart").into_response()
        }
    }
}

/// Submit the buyer's name.
#[instrument(skip_all)]
pub async fn submit_name(session: Session, Form(form): Form<NameForm>) -> Response {
    let mut flow = CheckoutFlow::load(session).await;
    if let Err(e) = flow.submit_name(&form.name).await {
        log_step_error("name", &e);
    }
    to_checkout()
}

/// Submit the email and send a one-time code.
#[instrument(skip_all)]
pub async fn submit_email(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<EmailForm>,
) -> Response {
    let mut flow = CheckoutFlow::load(session).await;
    if let Err(e) = flow.submit_email(state.backend(), &form.email).await {
        log_step_error("email", &e);
    }
    to_checkout()
}

/// Submit the one-time code.
#[instrument(skip_all)]
pub async fn submit_otp(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<OtpForm>,
) -> Response {
    let mut flow = CheckoutFlow::load(session).await;
    if let Err(e) = flow.submit_otp(state.backend(), &form.otp).await {
        log_step_error("otp", &e);
    }
    to_checkout()
}

/// Submit shipping details and create the order.
#[instrument(skip_all)]
pub async fn submit_shipping(
    State(state): State<AppState>,
    session: Session,
    Form(shipping): Form<ShippingInfo>,
) -> Response {
    let mut flow = CheckoutFlow::load(session).await;
    if let Err(e) = flow.submit_shipping(state.payments(), shipping).await {
        log_step_error("shipping", &e);
    }
    to_checkout()
}

/// Widget success callback: verify the payment proof.
#[instrument(skip_all)]
pub async fn verify_payment(
    State(state): State<AppState>,
    session: Session,
    Json(proof): Json<PaymentProof>,
) -> Json<CallbackResponse> {
    let mut flow = CheckoutFlow::load(session).await;
    let success = match flow.confirm_payment(state.payments(), proof).await {
        Ok(_) => true,
        Err(e) => {
            log_step_error("verify", &e);
            false
        }
    };

    Json(CallbackResponse {
        success,
        redirect: if success { "/checkout" } else { "/cart" },
    })
}

/// Widget failure or dismissal.
#[instrument(skip_all)]
pub async fn payment_failed(session: Session, Json(report): Json<FailedPayment>) -> Json<CallbackResponse> {
    let mut flow = CheckoutFlow::load(session).await;
    if let Err(e) = flow.payment_failed(report.outcome).await {
        log_step_error("payment_failed", &e);
    }

    Json(CallbackResponse {
        success: false,
        redirect: "/cart",
    })
}

/// Abandon checkout.
#[instrument(skip_all)]
pub async fn cancel(session: Session) -> Response {
    let mut flow = CheckoutFlow::load(session).await;
    flow.cancel().await;
    Redirect::to("/cart").into_response()
}
