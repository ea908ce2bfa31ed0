//! Category route handlers.

use askama::Template;
use axum::{
    Form, Router,
    extract::Path,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_sessions::Session;
use tracing::instrument;

use super::{AdminUserView, render, set_flash, take_flash};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::{Flash, session_keys};
use crate::services::{Category, CategoryError, CategoryForm, CategoryList};
use crate::state::AppState;

/// Categories page template.
#[derive(Template)]
#[template(path = "categories/index.html")]
pub struct CategoriesTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub categories: Vec<Category>,
    pub flash: Option<Flash>,
}

/// Build the categories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(index).post(add))
        .route("/categories/clear", post(clear))
        .route("/categories/{id}", post(update))
        .route("/categories/{id}/delete", post(delete))
}

async fn load_categories(session: &Session) -> CategoryList {
    session
        .get::<CategoryList>(session_keys::CATEGORIES)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Apply one change, store the list when it succeeded and flash the outcome.
async fn apply(
    session: &Session,
    change: impl FnOnce(&mut CategoryList) -> std::result::Result<&'static str, CategoryError>,
) -> Result<Response> {
    let mut list = load_categories(session).await;
    let flash = match change(&mut list) {
        Ok(message) => {
            session.insert(session_keys::CATEGORIES, &list).await?;
            Flash::success(message)
        }
        Err(e) => Flash::error(e.to_string()),
    };
    set_flash(session, flash).await?;
    Ok(Redirect::to("/categories").into_response())
}

/// List categories.
///
/// GET /categories
#[instrument(skip_all)]
async fn index(RequireAdminAuth(admin): RequireAdminAuth, session: Session) -> Result<Response> {
    let flash = take_flash(&session).await;
    let list = load_categories(&session).await;

    render(&CategoriesTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/categories".to_string(),
        categories: list.categories().to_vec(),
        flash,
    })
}

/// Add a category.
///
/// POST /categories
#[instrument(skip_all)]
async fn add(
    RequireAdminAuth(_admin): RequireAdminAuth,
    session: Session,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    apply(&session, |list| list.add(&form)).await
}

/// Rename or redescribe a category.
///
/// POST /categories/{id}
#[instrument(skip(_admin, session, form))]
async fn update(
    RequireAdminAuth(_admin): RequireAdminAuth,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    apply(&session, |list| list.update(&id, &form)).await
}

/// Delete a category.
///
/// POST /categories/{id}/delete
#[instrument(skip(_admin, session))]
async fn delete(
    RequireAdminAuth(_admin): RequireAdminAuth,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response> {
    apply(&session, |list| list.delete(&id)).await
}

/// Delete every category.
///
/// POST /categories/clear
#[instrument(skip_all)]
async fn clear(RequireAdminAuth(_admin): RequireAdminAuth, session: Session) -> Result<Response> {
    apply(&session, |list| Ok(list.clear())).await
}
