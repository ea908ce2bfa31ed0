//! Gateway widget script loading.
//!
//! The gateway's checkout script is fetched once per process. The first
//! checkout that needs it triggers the fetch; concurrent checkouts wait on
//! the same in-flight fetch. A failed fetch is not cached, so the next
//! checkout tries again.

use std::future::Future;

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha384};
use tokio::sync::OnceCell;
use tracing::instrument;

use super::PaymentError;

/// Where the browser loads the widget from, and the digest it must match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetScript {
    pub src: String,
    /// Subresource Integrity value, e.g. `sha384-...`.
    pub integrity: String,
}

impl WidgetScript {
    fn from_bytes(src: &str, bytes: &[u8]) -> Self {
        Self {
            src: src.to_string(),
            integrity: format!("sha384-{}", STANDARD.encode(Sha384::digest(bytes))),
        }
    }
}

/// Fetches the raw widget script.
pub trait ScriptFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, PaymentError>> + Send;
}

/// Fetches over HTTPS with reqwest.
#[derive(Debug, Clone, Default)]
pub struct HttpScriptFetcher {
    client: reqwest::Client,
}

impl HttpScriptFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScriptFetcher for HttpScriptFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PaymentError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PaymentError::WidgetUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PaymentError::WidgetUnavailable(format!("HTTP {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PaymentError::WidgetUnavailable(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Process-wide, single-flight loader for the widget script.
pub struct WidgetLoader<F> {
    fetcher: F,
    url: String,
    script: OnceCell<WidgetScript>,
}

impl<F: ScriptFetcher> WidgetLoader<F> {
    #[must_use]
    pub fn new(fetcher: F, url: impl Into<String>) -> Self {
        Self {
            fetcher,
            url: url.into(),
            script: OnceCell::new(),
        }
    }

    /// Load the script if it has not been loaded yet.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::WidgetUnavailable`] if the fetch fails or the
    /// body is empty. The failure is not remembered.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn ensure_loaded(&self) -> Result<&WidgetScript, PaymentError> {
        self.script
            .get_or_try_init(|| async {
                let bytes = self.fetcher.fetch(&self.url).await?;
                if bytes.is_empty() {
                    return Err(PaymentError::WidgetUnavailable(
                        "empty script body".to_string(),
                    ));
                }
                tracing::info!(bytes = bytes.len(), "Payment widget script loaded");
                Ok(WidgetScript::from_bytes(&self.url, &bytes))
            })
            .await
    }

    #[must_use]
    pub const fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Whether a load has already succeeded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.script.initialized()
    }
}
