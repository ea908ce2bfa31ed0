//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AdminConfig;
use crate::merchant::MerchantApi;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    api: MerchantApi,
}

impl AppState {
    #[must_use]
    pub fn new(config: AdminConfig) -> Self {
        let api = MerchantApi::new(&config.api_url);
        Self {
            inner: Arc::new(AppStateInner { config, api }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Merchant backend client.
    #[must_use]
    pub fn api(&self) -> &MerchantApi {
        &self.inner.api
    }
}
