//! Payment adapter around the hosted gateway widget.
//!
//! Payment is a three-party handshake:
//!
//! 1. [`PaymentAdapter::initiate`] creates a pending order on the merchant
//!    backend, which opens a gateway session and returns its public key.
//! 2. The payment page loads the gateway widget (see [`widget`]) with the
//!    [`WidgetOptions`] produced here. The buyer pays inside the widget.
//! 3. The widget hands back a signed [`PaymentProof`], which
//!    [`PaymentAdapter::confirm`] forwards to the backend for verification.
//!
//! Only an explicit `success: true` from the backend counts as paid.

pub mod widget;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use navdana_core::{CartLine, OrderId, ShippingInfo};

use crate::backend::{
    BackendError, CreateOrderRequest, MerchantBackend, OrderItem, PaymentProof,
    VerifyPaymentRequest,
};
use crate::models::StoredUser;

pub use widget::{HttpScriptFetcher, ScriptFetcher, WidgetLoader, WidgetScript};

/// Errors from the payment handshake.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The merchant backend call failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// The order was created but came back without a gateway session or key.
    #[error("order response is missing the gateway session")]
    MissingGatewaySession,

    /// The widget script could not be loaded.
    #[error("payment widget unavailable: {0}")]
    WidgetUnavailable(String),

    /// The backend did not confirm the payment.
    #[error("payment not verified")]
    NotVerified {
        /// The backend's reason, if any.
        message: Option<String>,
    },
}

/// Everything the browser needs to open the widget.
///
/// Serialized into a `data-options` attribute and passed as-is to the
/// widget constructor by `payment.js`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetOptions {
    pub key: String,
    pub amount: u64,
    pub currency: String,
    pub name: String,
    pub description: String,
    pub order_id: String,
    pub prefill: Prefill,
    pub notes: Notes,
    pub theme: Theme,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prefill {
    pub name: String,
    pub email: String,
    pub contact: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notes {
    #[serde(rename = "orderId")]
    pub order_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub color: String,
}

/// A pending order, ready to be paid in the widget.
#[derive(Debug, Clone)]
pub struct PaymentLaunch {
    /// Merchant-side order id.
    pub order_id: OrderId,
    pub options: WidgetOptions,
    pub script: WidgetScript,
}

/// Store-wide widget presentation.
#[derive(Debug, Clone)]
pub struct Branding {
    pub store_name: String,
    pub theme_color: String,
}

/// Drives order creation, widget preparation and payment verification.
pub struct PaymentAdapter<B, F> {
    backend: B,
    loader: WidgetLoader<F>,
    branding: Branding,
}

impl<B: MerchantBackend, F: ScriptFetcher> PaymentAdapter<B, F> {
    #[must_use]
    pub const fn new(backend: B, loader: WidgetLoader<F>, branding: Branding) -> Self {
        Self {
            backend,
            loader,
            branding,
        }
    }

    /// The backend this adapter talks to.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// The widget loader.
    #[must_use]
    pub const fn loader(&self) -> &WidgetLoader<F> {
        &self.loader
    }

    /// Create the order and prepare the widget launch.
    ///
    /// # Errors
    ///
    /// - [`PaymentError::Backend`] if order creation fails.
    /// - [`PaymentError::MissingGatewaySession`] if the backend omits the
    ///   gateway order or key.
    /// - [`PaymentError::WidgetUnavailable`] if the widget script cannot be
    ///   loaded. The order stays pending on the backend.
    #[instrument(skip_all, fields(lines = lines.len()))]
    pub async fn initiate(
        &self,
        lines: &[CartLine],
        shipping: &ShippingInfo,
        user: Option<&StoredUser>,
        token: Option<&SecretString>,
    ) -> Result<PaymentLaunch, PaymentError> {
        let request = CreateOrderRequest {
            items: lines.iter().map(OrderItem::from).collect(),
            shipping_address: shipping.clone(),
        };

        let response = self.backend.create_order(&request, token).await?;

        let (Some(gateway), Some(key)) = (response.razorpay_order, response.key) else {
            tracing::warn!("Order response is missing the gateway session or key");
            return Err(PaymentError::MissingGatewaySession);
        };
        let order_id = response.order.map(|o| o.id).unwrap_or_default();

        let script = self.loader.ensure_loaded().await?.clone();

        let options = WidgetOptions {
            key,
            amount: gateway.amount,
            currency: gateway.currency,
            name: self.branding.store_name.clone(),
            description: format!("Order #{order_id}"),
            order_id: gateway.id,
            prefill: prefill(shipping, user),
            notes: Notes {
                order_id: order_id.to_string(),
            },
            theme: Theme {
                color: self.branding.theme_color.clone(),
            },
        };

        tracing::info!(order_id = %order_id, "Payment initiated");

        Ok(PaymentLaunch {
            order_id,
            options,
            script,
        })
    }

    /// Forward the widget's proof to the backend.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::NotVerified`] unless the backend answers
    /// `success: true`, or [`PaymentError::Backend`] if the call fails.
    #[instrument(skip_all, fields(order_id = %order_id))]
    pub async fn confirm(
        &self,
        proof: PaymentProof,
        order_id: &OrderId,
        token: Option<&SecretString>,
    ) -> Result<(), PaymentError> {
        let request = VerifyPaymentRequest {
            proof,
            order_id: order_id.clone(),
        };

        let response = self.backend.verify_payment(&request, token).await?;
        if response.success {
            tracing::info!("Payment verified");
            Ok(())
        } else {
            tracing::warn!(message = ?response.message, "Payment verification rejected");
            Err(PaymentError::NotVerified {
                message: response.message,
            })
        }
    }
}

/// Buyer details pre-filled in the widget. Shipping details win over the
/// stored profile.
fn prefill(shipping: &ShippingInfo, user: Option<&StoredUser>) -> Prefill {
    let pick = |preferred: &str, fallback: Option<&str>| {
        let preferred = preferred.trim();
        if preferred.is_empty() {
            fallback.unwrap_or_default().to_string()
        } else {
            preferred.to_string()
        }
    };

    Prefill {
        name: pick(&shipping.full_name, user.map(|u| u.name.as_str())),
        email: user.map(|u| u.email.clone()).unwrap_or_default(),
        contact: pick(&shipping.phone, user.and_then(|u| u.phone.as_deref())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::Ordering;

    use navdana_core::{ProductId, UserId};
    use rust_decimal::Decimal;

    use super::widget::fake::FakeFetcher;
    use super::*;
    use crate::backend::fake::FakeBackend;

    fn adapter(backend: FakeBackend) -> PaymentAdapter<FakeBackend, FakeFetcher> {
        PaymentAdapter::new(
            backend,
            WidgetLoader::new(FakeFetcher::default(), "https://gw.example.com/checkout.js"),
            Branding {
                store_name: "Navdana Store".to_string(),
                theme_color: "#000000".to_string(),
            },
        )
    }

    fn lines() -> Vec<CartLine> {
        vec![CartLine {
            product_id: ProductId::new("P1"),
            size: Some("M".to_string()),
            color: None,
            sku: None,
            name: "Kurta".to_string(),
            price: Decimal::new(500, 0),
            quantity: 2,
            image: String::new(),
        }]
    }

    fn shipping() -> ShippingInfo {
        ShippingInfo {
            full_name: "Asha Rao".to_string(),
            address: "12 MG Road".to_string(),
            city: "Pune".to_string(),
            postal_code: "411001".to_string(),
            country: "India".to_string(),
            ..ShippingInfo::default()
        }
    }

    fn user() -> StoredUser {
        StoredUser {
            id: UserId::new("u1"),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            phone: Some("9999999999".to_string()),
        }
    }

    fn proof() -> PaymentProof {
        PaymentProof {
            razorpay_payment_id: "pay_1".to_string(),
            razorpay_order_id: "order_rzp_1".to_string(),
            razorpay_signature: "sig".to_string(),
        }
    }

    #[tokio::test]
    async fn test_initiate_builds_widget_options() {
        let adapter = adapter(FakeBackend::new());
        let launch = adapter
            .initiate(&lines(), &shipping(), Some(&user()), None)
            .await
            .unwrap();

        assert_eq!(launch.order_id.as_str(), "ord_1");
        assert_eq!(launch.options.key, "rzp_test_key");
        assert_eq!(launch.options.amount, 100_000);
        assert_eq!(launch.options.order_id, "order_rzp_1");
        assert_eq!(launch.options.description, "Order #ord_1");
        assert_eq!(launch.options.notes.order_id, "ord_1");
        assert_eq!(launch.options.prefill.name, "Asha Rao");
        assert_eq!(launch.options.prefill.email, "asha@example.com");
        assert_eq!(launch.options.prefill.contact, "9999999999");

        let orders = adapter.backend().orders.lock().unwrap();
        assert_eq!(orders[0].items[0].quantity, 2);
        assert_eq!(orders[0].items[0].color, "");
    }

    #[tokio::test]
    async fn test_widget_script_loaded_once_across_checkouts() {
        let adapter = adapter(FakeBackend::new());
        for _ in 0..3 {
            adapter
                .initiate(&lines(), &shipping(), None, None)
                .await
                .unwrap();
        }
        assert_eq!(adapter.loader().fetcher().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_gateway_session_is_an_error() {
        let backend = FakeBackend::new();
        *backend.order_response.lock().unwrap() = Some(crate::backend::CreateOrderResponse {
            key: None,
            ..FakeBackend::good_order()
        });
        let adapter = adapter(backend);
        assert!(matches!(
            adapter.initiate(&lines(), &shipping(), None, None).await,
            Err(PaymentError::MissingGatewaySession)
        ));
        assert_eq!(adapter.loader().fetcher().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_widget_failure_fails_only_this_attempt() {
        let adapter = adapter(FakeBackend::new());
        adapter.loader().fetcher().fail.store(true, Ordering::SeqCst);
        assert!(matches!(
            adapter.initiate(&lines(), &shipping(), None, None).await,
            Err(PaymentError::WidgetUnavailable(_))
        ));

        adapter.loader().fetcher().fail.store(false, Ordering::SeqCst);
        adapter
            .initiate(&lines(), &shipping(), None, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_confirm_requires_explicit_success() {
        let adapter = adapter(FakeBackend::new());
        let order = OrderId::new("ord_1");
        adapter.confirm(proof(), &order, None).await.unwrap();

        let rejecting = self::adapter(FakeBackend {
            payment_success: false,
            ..FakeBackend::new()
        });
        assert!(matches!(
            rejecting.confirm(proof(), &order, None).await,
            Err(PaymentError::NotVerified { .. })
        ));

        let failing = self::adapter(FakeBackend {
            fail_verify_payment: true,
            ..FakeBackend::new()
        });
        assert!(matches!(
            failing.confirm(proof(), &order, None).await,
            Err(PaymentError::Backend(_))
        ));
    }

    #[test]
    fn test_prefill_falls_back_to_profile() {
        let shipping = ShippingInfo {
            full_name: "  ".to_string(),
            ..shipping()
        };
        let filled = prefill(&shipping, Some(&user()));
        assert_eq!(filled.name, "Asha");
        assert_eq!(filled.contact, "9999999999");

        let anonymous = prefill(&shipping, None);
        assert_eq!(anonymous.email, "");
    }

    #[test]
    fn test_widget_script_reports_failure_only_on_close() {
        let script = include_str!("../../static/js/payment.js");
        let (_, on_failed) = script.split_once(r#"widget.on("payment.failed""#).unwrap();
        let (on_failed, _) = on_failed.split_once("});").unwrap();
        assert!(!on_failed.contains("report("));
        assert!(script.contains(r#"report(failed ? "failed" : "dismissed")"#));
    }
}
