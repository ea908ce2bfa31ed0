//! Authentication route handlers for admin.
//!
//! Sign-in is two form posts: request a one-time code by email, then trade
//! the code for the merchant backend's bearer token. The token and account
//! go into the session under `token` and `user`.

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use navdana_core::Email;

use super::{render, set_flash, take_flash};
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::OptionalAdminAuth;
use crate::models::{Flash, PendingLogin, session_keys};
use crate::state::AppState;

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    /// Set once a code has been sent.
    pub pending: Option<PendingLogin>,
    pub flash: Option<Flash>,
}

/// Code request form data.
#[derive(Debug, Deserialize)]
pub struct SendCodeForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Code entry form data.
#[derive(Debug, Deserialize)]
pub struct VerifyForm {
    #[serde(default)]
    pub otp: String,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page))
        .route("/login/send-code", post(send_code))
        .route("/login/verify", post(verify))
        .route("/logout", post(logout))
}

fn to_login() -> Response {
    Redirect::to("/login").into_response()
}

/// Render the login page.
///
/// GET /login
#[instrument(skip_all)]
async fn login_page(OptionalAdminAuth(admin): OptionalAdminAuth, session: Session) -> Result<Response> {
    if admin.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let pending = session
        .get::<PendingLogin>(session_keys::PENDING_LOGIN)
        .await?;

    render(&LoginTemplate {
        pending,
        flash: take_flash(&session).await,
    })
}

/// Email a one-time code.
///
/// POST /login/send-code
#[instrument(skip_all)]
async fn send_code(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SendCodeForm>,
) -> Result<Response> {
    let name = form.name.trim();
    if name.is_empty() {
        set_flash(&session, Flash::error("Please enter your name")).await?;
        return Ok(to_login());
    }

    let email = match Email::parse(&form.email) {
        Ok(email) => email,
        Err(e) => {
            set_flash(&session, Flash::error(e.to_string())).await?;
            return Ok(to_login());
        }
    };

    if let Err(e) = state.api().send_otp(&email).await {
        tracing::warn!(error = %e, "Failed to send admin sign-in code");
        set_flash(&session, Flash::error(e.user_message("Failed to send OTP"))).await?;
        return Ok(to_login());
    }

    session
        .insert(
            session_keys::PENDING_LOGIN,
            PendingLogin {
                name: name.to_string(),
                email: email.to_string(),
            },
        )
        .await?;
    set_flash(&session, Flash::success(format!("We sent a code to {email}"))).await?;

    Ok(to_login())
}

/// Trade the code for a bearer token.
///
/// POST /login/verify
#[instrument(skip_all)]
async fn verify(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<VerifyForm>,
) -> Result<Response> {
    let Some(pending) = session
        .get::<PendingLogin>(session_keys::PENDING_LOGIN)
        .await?
    else {
        set_flash(&session, Flash::error("Please request a code first.")).await?;
        return Ok(to_login());
    };

    let otp = form.otp.trim();
    if otp.is_empty() {
        set_flash(&session, Flash::error("Please enter OTP")).await?;
        return Ok(to_login());
    }

    let email = match Email::parse(&pending.email) {
        Ok(email) => email,
        Err(e) => {
            session.remove::<PendingLogin>(session_keys::PENDING_LOGIN).await?;
            set_flash(&session, Flash::error(e.to_string())).await?;
            return Ok(to_login());
        }
    };

    let sign_in = match state.api().verify_otp(&pending.name, &email, otp).await {
        Ok(sign_in) => sign_in,
        Err(e) => {
            tracing::warn!(error = %e, "Admin sign-in code rejected");
            set_flash(&session, Flash::error(e.user_message("Invalid OTP, try again"))).await?;
            return Ok(to_login());
        }
    };

    // New identity, new session id.
    session.cycle_id().await?;
    session.remove::<PendingLogin>(session_keys::PENDING_LOGIN).await?;
    session.insert(session_keys::USER, &sign_in.user).await?;
    session.insert(session_keys::TOKEN, &sign_in.token).await?;

    set_sentry_user(sign_in.user.id.as_str(), Some(sign_in.user.email.as_str()));
    tracing::info!(user_id = %sign_in.user.id, "Admin signed in");

    Ok(Redirect::to("/").into_response())
}

/// Logout and clear the session.
///
/// POST /logout
async fn logout(session: Session) -> Result<Response> {
    session.flush().await?;
    clear_sentry_user();
    Ok(to_login())
}
