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

/// Names a hex color (`#000` becomes `black`). Values that are not hex
/// colors are passed through unchanged.
///
/// Usage in templates: `{{ line.color|color_name }}`
#[askama::filter_fn]
pub fn color_name(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let value = value.to_string();
    Ok(navdana_core::color::basic_name(&value).map_or(value, str::to_string))
}

/// Returns the content hash for main.css.
///
/// The hash is computed at build time from the CSS file content.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// Returns the content hash for payment.js.
///
/// Usage in templates: `{{ ""|payment_js_hash }}`
#[askama::filter_fn]
pub fn payment_js_hash(
    _value: impl Display,
    _env: &dyn askama::Values,
) -> askama::Result<&'static str> {
    Ok(env!("PAYMENT_JS_HASH"))
}
