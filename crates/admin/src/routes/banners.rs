//! Banner management route handlers.
//!
//! Every call to the merchant backend carries the operator's bearer token.
//! Outcomes are reported with the backend's own message when it sent one.

use askama::Template;
use axum::{
    Form, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use navdana_core::{Banner, BannerId};

use super::{AdminUserView, render, set_flash, take_flash};
use crate::error::{AppError, Result};
use crate::filters;
use crate::merchant::{ApiError, BannerAction, BannerImage, NewBanner};
use crate::middleware::RequireAdminAuth;
use crate::models::Flash;
use crate::state::AppState;

/// Largest accepted upload.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Banners page template.
#[derive(Template)]
#[template(path = "banners/index.html")]
pub struct BannersTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub banners: Vec<Banner>,
    pub flash: Option<Flash>,
}

/// Toggle form data: the flag as currently shown.
#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub active: bool,
}

/// Build the banners router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/banners",
            get(index)
                .post(upload)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/banners/{id}/toggle", post(toggle))
        .route("/banners/{id}/delete", post(delete))
}

fn to_banners() -> Response {
    Redirect::to("/banners").into_response()
}

/// Record the outcome of a banner call as a flash.
async fn report_outcome(
    session: &Session,
    action: BannerAction,
    outcome: std::result::Result<(), ApiError>,
) -> Result<()> {
    let flash = match outcome {
        Ok(()) => Flash::success(action.success_message()),
        Err(e) => {
            tracing::warn!(?action, error = %e, "Banner operation failed");
            Flash::error(e.user_message(action.failure_message()))
        }
    };
    set_flash(session, flash).await
}

/// List banners.
///
/// GET /banners
#[instrument(skip_all)]
async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response> {
    let mut flash = take_flash(&session).await;

    let banners = match state.api().list_banners(&admin.token).await {
        Ok(banners) => banners,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch banners");
            flash = Some(Flash::error(
                e.user_message(BannerAction::List.failure_message()),
            ));
            Vec::new()
        }
    };

    render(&BannersTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/banners".to_string(),
        banners,
        flash,
    })
}

/// Read the upload form: `title`, `isActive` and the image file `url`.
async fn read_upload(mut multipart: Multipart) -> Result<NewBanner> {
    let mut banner = NewBanner {
        title: String::new(),
        is_active: false,
        image: None,
    };

    let bad_request = |e: axum::extract::multipart::MultipartError| AppError::BadRequest(e.to_string());

    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => banner.title = field.text().await.map_err(bad_request)?,
            "isActive" => {
                let value = field.text().await.map_err(bad_request)?;
                banner.is_active = matches!(value.as_str(), "true" | "on" | "1");
            }
            "url" => {
                let file_name = field.file_name().unwrap_or("banner").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(bad_request)?;
                // Browsers send an empty part when no file was chosen.
                if !bytes.is_empty() {
                    banner.image = Some(BannerImage {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(banner)
}

/// Upload a banner.
///
/// POST /banners
#[instrument(skip_all)]
async fn upload(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Response> {
    let banner = read_upload(multipart).await?;
    let outcome = state.api().upload_banner(&admin.token, &banner).await;
    report_outcome(&session, BannerAction::Upload, outcome).await?;
    Ok(to_banners())
}

/// Flip a banner's active flag.
///
/// POST /banners/{id}/toggle
#[instrument(skip(admin, state, session))]
async fn toggle(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<ToggleForm>,
) -> Result<Response> {
    let outcome = state
        .api()
        .set_banner_active(&admin.token, &BannerId::new(id), !form.active)
        .await;
    report_outcome(&session, BannerAction::Toggle, outcome).await?;
    Ok(to_banners())
}

/// Delete a banner.
///
/// POST /banners/{id}/delete
#[instrument(skip(admin, state, session))]
async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response> {
    let outcome = state
        .api()
        .delete_banner(&admin.token, &BannerId::new(id))
        .await;
    report_outcome(&session, BannerAction::Delete, outcome).await?;
    Ok(to_banners())
}
