//! Admin settings routes.
//!
//! Profile and preferences are kept in the operator's session. The password
//! form only checks that the new password was entered twice alike; there is
//! no password store behind it.

use askama::Template;
use axum::{
    Form, Router,
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
use crate::services::settings::LANGUAGES;
use crate::services::{PasswordForm, Preferences, PreferencesForm, Profile, Settings, Theme};
use crate::state::AppState;

/// Settings page template.
#[derive(Template)]
#[template(path = "settings/index.html")]
pub struct SettingsTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub settings: Settings,
    pub themes: Vec<ChoiceView>,
    pub languages: Vec<ChoiceView>,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

/// One `<option>` of a select.
#[derive(Debug, Clone)]
pub struct ChoiceView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn theme_choices(current: Theme) -> Vec<ChoiceView> {
    Theme::ALL
        .iter()
        .map(|&t| ChoiceView {
            value: t.value(),
            label: t.label(),
            selected: t == current,
        })
        .collect()
}

fn language_choices(current: &str) -> Vec<ChoiceView> {
    LANGUAGES
        .iter()
        .map(|&l| ChoiceView {
            value: l,
            label: l,
            selected: l == current,
        })
        .collect()
}

/// Build the settings router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(settings_page))
        .route("/settings/profile", post(update_profile))
        .route("/settings/preferences", post(update_preferences))
        .route("/settings/password", post(update_password))
}

async fn load_settings(session: &Session) -> Settings {
    session
        .get::<Settings>(session_keys::SETTINGS)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

async fn save_settings(session: &Session, settings: &Settings) -> Result<()> {
    session.insert(session_keys::SETTINGS, settings).await?;
    Ok(())
}

fn to_settings() -> Response {
    Redirect::to("/settings").into_response()
}

/// Settings page.
///
/// GET /settings
#[instrument(skip_all)]
async fn settings_page(RequireAdminAuth(admin): RequireAdminAuth, session: Session) -> Result<Response> {
    let flash = take_flash(&session).await;
    let (success_message, error_message) = match flash {
        Some(f) if f.is_error() => (None, Some(f.message)),
        Some(f) => (Some(f.message), None),
        None => (None, None),
    };

    let settings = load_settings(&session).await;

    render(&SettingsTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/settings".to_string(),
        themes: theme_choices(settings.preferences.theme),
        languages: language_choices(&settings.preferences.language),
        settings,
        success_message,
        error_message,
    })
}

/// Save the profile.
///
/// POST /settings/profile
#[instrument(skip_all)]
async fn update_profile(
    RequireAdminAuth(_admin): RequireAdminAuth,
    session: Session,
    Form(profile): Form<Profile>,
) -> Result<Response> {
    let mut settings = load_settings(&session).await;
    settings.profile = Profile {
        name: profile.name.trim().to_string(),
        email: profile.email.trim().to_string(),
        phone: profile.phone.trim().to_string(),
    };
    save_settings(&session, &settings).await?;
    set_flash(&session, Flash::success("Profile updated successfully!")).await?;
    Ok(to_settings())
}

/// Save preferences.
///
/// POST /settings/preferences
#[instrument(skip_all)]
async fn update_preferences(
    RequireAdminAuth(_admin): RequireAdminAuth,
    session: Session,
    Form(form): Form<PreferencesForm>,
) -> Result<Response> {
    let mut settings = load_settings(&session).await;
    settings.preferences = Preferences::from_form(&form, &settings.preferences);
    save_settings(&session, &settings).await?;
    set_flash(&session, Flash::success("Preferences saved!")).await?;
    Ok(to_settings())
}

/// Change the password.
///
/// POST /settings/password
#[instrument(skip_all)]
async fn update_password(
    RequireAdminAuth(_admin): RequireAdminAuth,
    session: Session,
    Form(form): Form<PasswordForm>,
) -> Result<Response> {
    let flash = match form.validate() {
        Ok(()) => Flash::success("Password updated successfully!"),
        Err(message) => Flash::error(message),
    };
    set_flash(&session, flash).await?;
    Ok(to_settings())
}
