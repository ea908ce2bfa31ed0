//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! # Auth (OTP through the merchant backend)
//! GET  /login                  - Login page
//! POST /login/send-code        - Email a one-time code
//! POST /login/verify           - Exchange the code for a token
//! POST /logout                 - Logout
//!
//! # Dashboard
//! GET  /                       - Overview
//!
//! # Banners (merchant backend, bearer token)
//! GET  /banners                - Banner list and upload form
//! POST /banners                - Upload (multipart)
//! POST /banners/{id}/toggle    - Switch on or off
//! POST /banners/{id}/delete    - Delete
//!
//! # Orders (session only)
//! GET  /orders                 - Order list
//! POST /orders/{id}/status     - Set fulfilment status
//! POST /orders/{id}/paid       - Mark paid
//! POST /orders/{id}/delivered  - Toggle delivered
//!
//! # Categories (session only)
//! GET  /categories             - Category list and add form
//! POST /categories             - Add
//! POST /categories/{id}        - Update
//! POST /categories/{id}/delete - Delete
//! POST /categories/clear       - Delete all
//!
//! # Reports
//! GET  /reports?tab=           - Report tabs
//! GET  /reports/{tab}/csv      - CSV download
//!
//! # Settings (session only)
//! GET  /settings               - Settings page
//! POST /settings/profile       - Save profile
//! POST /settings/preferences   - Save preferences
//! POST /settings/password      - Change password
//!
//! # Calendar
//! GET  /calendar?year=&month=&day=
//! ```
//!
//! Form posts redirect back to their page; the outcome travels in a session
//! flash and is shown once.

pub mod auth;
pub mod banners;
pub mod calendar;
pub mod categories;
pub mod dashboard;
pub mod orders;
pub mod reports;
pub mod settings;

use askama::Template;
use axum::{
    Router,
    response::{Html, IntoResponse, Response},
};
use tower_sessions::Session;

use crate::error::{AppError, Result};
use crate::models::{CurrentAdmin, Flash, session_keys};
use crate::state::AppState;

/// Data the admin layout needs on every signed-in page.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub email: String,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            name: admin.display_name().to_string(),
            email: admin.user.email.clone(),
        }
    }
}

/// Queue a message for the next page render.
pub async fn set_flash(session: &Session, flash: Flash) -> Result<()> {
    session.insert(session_keys::FLASH, flash).await?;
    Ok(())
}

/// Take the queued message, if any.
pub async fn take_flash(session: &Session) -> Option<Flash> {
    session
        .remove::<Flash>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
}

/// Render a template into an HTML response.
fn render(template: &impl Template) -> Result<Response> {
    template
        .render()
        .map(|html| Html(html).into_response())
        .map_err(|e| AppError::Internal(format!("template: {e}")))
}

/// Build all admin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(banners::router())
        .merge(orders::router())
        .merge(categories::router())
        .merge(reports::router())
        .merge(settings::router())
        .merge(calendar::router())
}
