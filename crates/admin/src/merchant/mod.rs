//! Merchant backend client for the admin panel.
//!
//! The admin signs in through the backend's OTP endpoints and then manages
//! banners with the bearer token it was issued. Nothing is cached: every
//! panel shows what the backend has right now.
//!
//! # Endpoints
//!
//! ```text
//! POST   /user/send-otp   {email}
//! POST   /user/verify     {name, email, otp, token}  -> {user, token}
//! GET    /banner                                     -> {data: [..]} | [..]
//! POST   /banner/upload   multipart title, isActive, url
//! PUT    /banner/{id}     {isActive}
//! DELETE /banner/{id}
//! ```

mod banners;

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::instrument;

use navdana_core::{Email, UserId};

pub use banners::{BannerAction, BannerImage, NewBanner};

/// Shown whenever the backend says the bearer token is absent.
pub const TOKEN_MISSING_MESSAGE: &str = "Token missing. Please login again.";

/// The backend's `error` value for a request without a bearer token.
const TOKEN_MISSING_ERROR: &str = "Token missing";

/// Errors from merchant backend calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Input rejected before any request was made.
    #[error("{0}")]
    Validation(String),

    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {}", message.as_deref().or(error.as_deref()).unwrap_or("no message"))]
    Status {
        status: u16,
        message: Option<String>,
        error: Option<String>,
    },

    /// The response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ApiError {
    /// The message to show an operator.
    ///
    /// Prefers the backend's own `message`, then the token-missing hint,
    /// then `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Status {
                message: Some(message),
                ..
            } if !message.is_empty() => message.clone(),
            Self::Status {
                error: Some(error), ..
            } if error == TOKEN_MISSING_ERROR => TOKEN_MISSING_MESSAGE.to_string(),
            _ => fallback.to_string(),
        }
    }

    /// Whether the backend rejected the bearer token.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
    }
}

/// Error body the backend sends with non-2xx responses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Responses may arrive bare or wrapped as `{ "data": ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

/// The signed-in account, as the backend returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUser {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Body of `POST /user/verify`.
#[derive(Debug, Serialize)]
struct VerifyOtpRequest<'a> {
    name: &'a str,
    email: &'a str,
    otp: &'a str,
    token: Option<&'a str>,
}

/// A verified sign-in.
#[derive(Debug, Deserialize)]
pub struct SignIn {
    pub user: AccountUser,
    pub token: String,
}

/// Client for the merchant backend REST API.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct MerchantApi {
    inner: Arc<MerchantApiInner>,
}

struct MerchantApiInner {
    client: reqwest::Client,
    base_url: String,
}

impl MerchantApi {
    /// Create a client for `base_url` (e.g. `https://host/api/v1`).
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            inner: Arc::new(MerchantApiInner {
                client: reqwest::Client::new(),
                base_url: base_url.trim_end_matches('/').to_string(),
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    fn client(&self) -> &reqwest::Client {
        &self.inner.client
    }

    /// Send a request and return the body, mapping non-2xx to
    /// [`ApiError::Status`].
    async fn send_raw(
        &self,
        request: reqwest::RequestBuilder,
        token: Option<&SecretString>,
    ) -> Result<String, ApiError> {
        let request = match token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let error: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
            tracing::warn!(
                status = %status,
                message = error.message.as_deref().unwrap_or(""),
                "Merchant backend returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error.message,
                error: error.error,
            });
        }

        Ok(body)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        token: Option<&SecretString>,
    ) -> Result<T, ApiError> {
        let body = self.send_raw(request, token).await?;
        serde_json::from_str::<Envelope<T>>(&body)
            .map(Envelope::into_inner)
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    body = %body.chars().take(500).collect::<String>(),
                    "Failed to parse merchant backend response"
                );
                ApiError::Parse(e)
            })
    }

    /// Ask the backend to email a one-time code.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend refuses.
    #[instrument(skip(self, email))]
    pub async fn send_otp(&self, email: &Email) -> Result<(), ApiError> {
        let request = self
            .client()
            .post(self.url("/user/send-otp"))
            .json(&serde_json::json!({ "email": email.as_str() }));
        self.send_raw(request, None).await?;
        Ok(())
    }

    /// Exchange a one-time code for an account and bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is rejected or the request fails.
    #[instrument(skip_all)]
    pub async fn verify_otp(&self, name: &str, email: &Email, otp: &str) -> Result<SignIn, ApiError> {
        let request = self
            .client()
            .post(self.url("/user/verify"))
            .json(&VerifyOtpRequest {
                name,
                email: email.as_str(),
                otp,
                token: None,
            });
        self.send(request, None).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn status(message: Option<&str>, error: Option<&str>) -> ApiError {
        ApiError::Status {
            status: 400,
            message: message.map(String::from),
            error: error.map(String::from),
        }
    }

    #[test]
    fn test_backend_message_wins() {
        let err = status(Some("Banner title exists"), Some("Token missing"));
        assert_eq!(err.user_message("fallback"), "Banner title exists");
    }

    #[test]
    fn test_token_missing_hint() {
        let err = status(None, Some("Token missing"));
        assert_eq!(err.user_message("fallback"), TOKEN_MISSING_MESSAGE);
        let err = status(Some(""), Some("Token missing"));
        assert_eq!(err.user_message("fallback"), TOKEN_MISSING_MESSAGE);
    }

    #[test]
    fn test_fallback_otherwise() {
        assert_eq!(status(None, Some("Nope")).user_message("Failed to delete banner."), "Failed to delete banner.");
        let parse = serde_json::from_str::<u8>("x").unwrap_err();
        assert_eq!(ApiError::Parse(parse).user_message("Failed"), "Failed");
    }

    #[test]
    fn test_envelope_accepts_both_shapes() {
        let wrapped: Envelope<Vec<u8>> = serde_json::from_str(r#"{"data":[1,2]}"#).unwrap();
        let bare: Envelope<Vec<u8>> = serde_json::from_str("[1,2]").unwrap();
        assert_eq!(wrapped.into_inner(), bare.into_inner());
    }

    #[test]
    fn test_verify_request_sends_null_token() {
        let body = serde_json::to_value(VerifyOtpRequest {
            name: "Ops",
            email: "ops@navdana.in",
            otp: "123456",
            token: None,
        })
        .unwrap();
        assert_eq!(body["token"], serde_json::Value::Null);
        assert_eq!(body["otp"], "123456");
    }
}
