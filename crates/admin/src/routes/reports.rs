//! Reports route handlers.

use askama::Template;
use axum::{
    Router,
    extract::{Path, Query},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use super::{AdminUserView, render};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::services::{Report, ReportTab, report};
use crate::state::AppState;

/// A tab link.
#[derive(Debug, Clone)]
pub struct TabView {
    pub key: &'static str,
    pub label: &'static str,
    pub active: bool,
}

/// Reports page template.
#[derive(Template)]
#[template(path = "reports/index.html")]
pub struct ReportsTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub tabs: Vec<TabView>,
    pub report: Report,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ReportsQuery {
    pub tab: Option<String>,
}

/// Build the reports router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reports", get(index))
        .route("/reports/{tab}/csv", get(download_csv))
}

fn parse_tab(raw: &str) -> Result<ReportTab> {
    raw.parse::<ReportTab>()
        .map_err(|e| AppError::NotFound(e.to_string()))
}

/// Show one report tab (sales by default).
///
/// GET /reports?tab=
#[instrument(skip(admin))]
async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(query): Query<ReportsQuery>,
) -> Result<Response> {
    let tab = match query.tab.as_deref() {
        Some(raw) if !raw.is_empty() => parse_tab(raw)?,
        _ => ReportTab::Sales,
    };

    let report = report(tab);
    render(&ReportsTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/reports".to_string(),
        tabs: ReportTab::ALL
            .iter()
            .map(|&t| TabView {
                key: t.key(),
                label: t.label(),
                active: t == tab,
            })
            .collect(),
        rows: report.table_rows(),
        report,
    })
}

/// Download a report as CSV.
///
/// GET /reports/{tab}/csv
#[instrument(skip(_admin))]
async fn download_csv(
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(tab): Path<String>,
) -> Result<Response> {
    let tab = parse_tab(&tab)?;
    let disposition = format!("attachment; filename=\"{}\"", tab.file_name());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report(tab).to_csv(),
    )
        .into_response())
}
