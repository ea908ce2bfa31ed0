//! Calendar route handler.

use askama::Template;
use axum::{Router, extract::Query, response::Response, routing::get};
use chrono::{Datelike, Local, NaiveDate};
use serde::Deserialize;
use tracing::instrument;

use super::{AdminUserView, render};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::services::{MonthGrid, WEEKDAYS};
use crate::state::AppState;

/// Calendar page template.
#[derive(Template)]
#[template(path = "calendar.html")]
pub struct CalendarTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub grid: MonthGrid,
    pub weekdays: [&'static str; 7],
    pub prev: (i32, u32),
    pub next: (i32, u32),
    /// e.g. "Saturday, 1 June 2024".
    pub selected_label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl CalendarQuery {
    /// First of the requested month, or of `today`'s month when the query
    /// names no valid month.
    fn month_start(&self, today: NaiveDate) -> NaiveDate {
        self.year
            .zip(self.month)
            .and_then(|(y, m)| NaiveDate::from_ymd_opt(y, m, 1))
            .or_else(|| today.with_day(1))
            .unwrap_or(today)
    }

    fn selected(&self, month_start: NaiveDate) -> Option<NaiveDate> {
        let day = self.day?;
        NaiveDate::from_ymd_opt(month_start.year(), month_start.month(), day)
    }
}

/// Build the calendar router.
pub fn router() -> Router<AppState> {
    Router::new().route("/calendar", get(calendar))
}

/// Month view.
///
/// GET /calendar?year=&month=&day=
#[instrument(skip(admin))]
async fn calendar(
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(query): Query<CalendarQuery>,
) -> Result<Response> {
    let today = Local::now().date_naive();
    let start = query.month_start(today);
    let selected = query.selected(start);
    let grid = MonthGrid::new(start, today, selected);

    render(&CalendarTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/calendar".to_string(),
        prev: grid.previous(),
        next: grid.next(),
        selected_label: selected.map(|d| d.format("%A, %-d %B %Y").to_string()),
        weekdays: WEEKDAYS,
        grid,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_query_defaults_to_current_month() {
        let query = CalendarQuery {
            year: None,
            month: Some(3),
            day: None,
        };
        assert_eq!(query.month_start(date(2026, 10, 16)), date(2026, 10, 1));
    }

    #[test]
    fn test_invalid_month_falls_back() {
        let query = CalendarQuery {
            year: Some(2024),
            month: Some(13),
            day: Some(5),
        };
        let start = query.month_start(date(2026, 10, 16));
        assert_eq!(start, date(2026, 10, 1));
        assert_eq!(query.selected(start), Some(date(2026, 10, 5)));
    }

    #[test]
    fn test_day_out_of_range_selects_nothing() {
        let query = CalendarQuery {
            year: Some(2024),
            month: Some(2),
            day: Some(30),
        };
        let start = query.month_start(date(2026, 10, 16));
        assert_eq!(start, date(2024, 2, 1));
        assert_eq!(query.selected(start), None);
    }
}
