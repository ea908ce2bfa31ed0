//! Authentication extractors for admin.
//!
//! An operator counts as signed in when the session holds both the `user`
//! and `token` keys written by a successful OTP verification.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use tower_sessions::Session;

use crate::merchant::AccountUser;
use crate::models::{CurrentAdmin, session_keys};

/// Extractor that requires a signed-in operator.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.display_name())
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Error returned when an operator must sign in first.
pub enum AdminAuthRejection {
    /// Redirect to the login page.
    RedirectToLogin,
    /// No session layer in front of the handler.
    MissingSession,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::MissingSession => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

/// Read the operator from the session, if both keys are present.
async fn current_admin(session: &Session) -> Option<CurrentAdmin> {
    let user: AccountUser = session.get(session_keys::USER).await.ok().flatten()?;
    let token: String = session
        .get(session_keys::TOKEN)
        .await
        .ok()
        .flatten()
        .filter(|t: &String| !t.is_empty())?;

    Some(CurrentAdmin {
        user,
        token: SecretString::from(token),
    })
}

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminAuthRejection::MissingSession)?;

        current_admin(session)
            .await
            .map(Self)
            .ok_or(AdminAuthRejection::RedirectToLogin)
    }
}

/// Extractor that optionally gets the current operator.
///
/// Unlike `RequireAdminAuth`, this does not reject the request.
pub struct OptionalAdminAuth(pub Option<CurrentAdmin>);

impl<S> FromRequestParts<S> for OptionalAdminAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = match parts.extensions.get::<Session>() {
            Some(session) => current_admin(session).await,
            None => None,
        };

        Ok(Self(admin))
    }
}
