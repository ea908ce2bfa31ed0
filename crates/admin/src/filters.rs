//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Label for a banner's on/off flag.
///
/// Usage in templates: `{{ banner.is_active|status_label }}`
#[askama::filter_fn]
pub fn status_label(value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(if value.to_string() == "true" {
        "Active"
    } else {
        "Inactive"
    })
}
