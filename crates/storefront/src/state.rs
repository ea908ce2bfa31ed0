//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::MerchantClient;
use crate::config::StorefrontConfig;
use crate::payment::{Branding, HttpScriptFetcher, PaymentAdapter, WidgetLoader};

/// The payment adapter as wired in production.
pub type Payments = PaymentAdapter<MerchantClient, HttpScriptFetcher>;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The widget loader inside [`Payments`] lives
/// here so the gateway script is fetched at most once per process.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: MerchantClient,
    payments: Payments,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let backend = MerchantClient::new(&config.merchant);
        let payments = PaymentAdapter::new(
            backend.clone(),
            WidgetLoader::new(HttpScriptFetcher::new(), config.payment.widget_url.clone()),
            Branding {
                store_name: config.store_name.clone(),
                theme_color: config.payment.theme_color.clone(),
            },
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                payments,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the merchant backend client.
    #[must_use]
    pub fn backend(&self) -> &MerchantClient {
        &self.inner.backend
    }

    /// Get a reference to the payment adapter.
    #[must_use]
    pub fn payments(&self) -> &Payments {
        &self.inner.payments
    }
}
