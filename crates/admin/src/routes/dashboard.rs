//! Admin dashboard route handler.

use askama::Template;
use axum::{
    Router,
    extract::State,
    response::Response,
    routing::get,
};
use tracing::instrument;

use super::{AdminUserView, render};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::services::{ReportTab, report};
use crate::state::AppState;

/// Headline numbers for the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardMetrics {
    /// `None` when the backend could not be reached.
    pub banners_total: Option<usize>,
    pub banners_active: Option<usize>,
    pub sales_total: String,
    pub order_count: usize,
}

/// Dashboard page template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub metrics: DashboardMetrics,
}

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}

/// Sum of a numeric report column.
fn column_sum(tab: ReportTab, field: &str) -> u64 {
    let report = report(tab);
    let Some(index) = report.fields.iter().position(|f| *f == field) else {
        return 0;
    };
    report
        .rows
        .iter()
        .filter_map(|row| row.get(index)?.parse::<u64>().ok())
        .sum()
}

/// Dashboard page handler.
#[instrument(skip_all)]
async fn dashboard(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Response> {
    let (banners_total, banners_active) = match state.api().list_banners(&admin.token).await {
        Ok(banners) => (
            Some(banners.len()),
            Some(banners.iter().filter(|b| b.is_active).count()),
        ),
        Err(e) => {
            tracing::error!("Failed to fetch banners: {e}");
            (None, None)
        }
    };

    let metrics = DashboardMetrics {
        banners_total,
        banners_active,
        sales_total: format!("₹{}", column_sum(ReportTab::Sales, "total")),
        order_count: report(ReportTab::Orders).rows.len(),
    };

    render(&DashboardTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/".to_string(),
        metrics,
    })
}
