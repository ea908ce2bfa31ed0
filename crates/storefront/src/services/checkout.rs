//! Guest checkout state machine.
//!
//! ```text
//! Idle -> NeedName -> NeedEmail -> NeedOtp -> NeedShipping -> PaymentInFlight -> Completed
//!   ^        |            |           |            |                |
//!   +--------+------------+-----------+------------+----------------+  (cancel / payment failure)
//! ```
//!
//! A buyer who has already verified in this session starts at
//! `NeedShipping`. Every step validates its input, performs at most one
//! backend call, and either advances or stays put with a [`Notice`]
//! explaining why. The whole [`CheckoutSession`] is written back to the
//! `checkout` session key after each step; it is removed on cancel and once
//! a completed checkout has been shown.

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use navdana_core::{CheckoutStage, OrderId, ShippingInfo};

use crate::backend::{BackendError, MerchantBackend, PaymentProof, VerifyOtpRequest};
use crate::error::add_breadcrumb;
use crate::models::session_keys;
use crate::payment::{PaymentAdapter, PaymentError, ScriptFetcher, WidgetOptions, WidgetScript};
use crate::services::cart::CartStore;
use crate::services::identity::SessionIdentity;
use crate::services::storage::{ClientStorage, StorageError};

/// Errors that stop a checkout step from advancing.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The buyer's input was rejected.
    #[error("{0}")]
    Validation(String),

    /// A merchant backend call failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// The payment handshake failed.
    #[error("payment error: {0}")]
    Payment(#[from] PaymentError),

    /// The verified identity could not be saved.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The action does not apply to the current stage.
    #[error("cannot {action} while checkout is {stage}")]
    InvalidTransition {
        stage: &'static str,
        action: &'static str,
    },
}

/// Tone of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// A message shown above the current checkout step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

/// A created order waiting for the buyer to pay in the widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPayment {
    pub options: WidgetOptions,
    pub script: WidgetScript,
}

/// Transient checkout state for one visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub stage: CheckoutStage,
    pub name: String,
    pub email: String,
    pub otp_code: String,
    pub shipping: ShippingInfo,
    pub notice: Option<Notice>,
    pub pending: Option<PendingPayment>,
}

/// How the widget ended without a payment proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetOutcome {
    /// The gateway reported `payment.failed`.
    Failed,
    /// The buyer closed the widget.
    Dismissed,
}

/// One visitor's checkout, bound to their storage.
pub struct CheckoutFlow<S> {
    storage: S,
    session: CheckoutSession,
}

impl<S: ClientStorage + Clone> CheckoutFlow<S> {
    /// Load the visitor's checkout, or an idle one.
    pub async fn load(storage: S) -> Self {
        let session = match storage
            .get_item::<CheckoutSession>(session_keys::CHECKOUT)
            .await
        {
            Ok(session) => session.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable checkout session");
                CheckoutSession::default()
            }
        };

        Self { storage, session }
    }

    #[must_use]
    pub const fn session(&self) -> &CheckoutSession {
        &self.session
    }

    #[must_use]
    pub const fn stage(&self) -> &CheckoutStage {
        &self.session.stage
    }

    fn identity(&self) -> SessionIdentity<S> {
        SessionIdentity::new(self.storage.clone())
    }

    /// Start checkout from the cart.
    ///
    /// Goes to `NeedShipping` when the buyer has already verified in this
    /// session, otherwise to `NeedName`.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::InvalidTransition`] if a checkout is already under
    /// way, [`CheckoutError::Validation`] if the cart is empty.
    #[instrument(skip(self), fields(stage = %self.session.stage))]
    pub async fn begin(&mut self) -> Result<(), CheckoutError> {
        if !matches!(
            self.session.stage,
            CheckoutStage::Idle | CheckoutStage::Completed(_)
        ) {
            return Err(self.illegal("start checkout"));
        }

        let cart = CartStore::load(self.storage.clone()).await;
        if cart.cart().is_empty() {
            self.session.notice = None;
            return Err(self.invalid("Your cart is empty").await);
        }

        // Keep any shipping draft from an earlier attempt.
        let shipping = std::mem::take(&mut self.session.shipping);
        self.session = CheckoutSession {
            shipping,
            ..CheckoutSession::default()
        };

        match self.identity().user().await {
            Some(user) => {
                if self.session.shipping.full_name.trim().is_empty() {
                    self.session.shipping.full_name.clone_from(&user.name);
                }
                self.session.name = user.name;
                self.session.email = user.email;
                self.advance(CheckoutStage::NeedShipping).await;
            }
            None => self.advance(CheckoutStage::NeedName).await,
        }
        Ok(())
    }

    /// Record the buyer's name.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::Validation`] if the name is blank.
    #[instrument(skip_all)]
    pub async fn submit_name(&mut self, name: &str) -> Result<(), CheckoutError> {
        self.expect_stage(&CheckoutStage::NeedName, "submit a name")?;

        let name = name.trim();
        if name.is_empty() {
            return Err(self.invalid("Please enter your name").await);
        }

        self.session.name = name.to_string();
        self.session.notice = None;
        self.advance(CheckoutStage::NeedEmail).await;
        Ok(())
    }

    /// Record the email and ask the backend to send a one-time code.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::Validation`] for a blank address,
    /// [`CheckoutError::Backend`] if the code could not be sent.
    #[instrument(skip_all)]
    pub async fn submit_email<B: MerchantBackend>(
        &mut self,
        backend: &B,
        email: &str,
    ) -> Result<(), CheckoutError> {
        self.expect_stage(&CheckoutStage::NeedEmail, "submit an email")?;

        let email = email.trim().to_string();
        self.session.email.clone_from(&email);
        if email.is_empty() {
            return Err(self.invalid("Please enter your email").await);
        }

        if let Err(e) = backend.send_otp(&email).await {
            tracing::warn!(error = %e, "Failed to send OTP");
            return Err(self.reject("Failed to send OTP", e.into()).await);
        }

        self.session.notice = Some(Notice::info(format!("We sent a code to {email}")));
        self.advance(CheckoutStage::NeedOtp).await;
        Ok(())
    }

    /// Verify the one-time code and store the returned identity.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::Validation`] for a blank code,
    /// [`CheckoutError::Backend`] if verification fails,
    /// [`CheckoutError::Storage`] if the identity cannot be saved.
    #[instrument(skip_all)]
    pub async fn submit_otp<B: MerchantBackend>(
        &mut self,
        backend: &B,
        otp: &str,
    ) -> Result<(), CheckoutError> {
        self.expect_stage(&CheckoutStage::NeedOtp, "submit a code")?;

        let otp = otp.trim();
        self.session.otp_code = otp.to_string();
        if otp.is_empty() {
            return Err(self.invalid("Please enter OTP").await);
        }

        let identity = self.identity();
        let token = identity.token().await;
        let request = VerifyOtpRequest {
            name: self.session.name.clone(),
            email: self.session.email.clone(),
            otp: otp.to_string(),
            token: token.as_ref().map(|t| t.expose_secret().to_string()),
        };

        let verified = match backend.verify_otp(&request, token.as_ref()).await {
            Ok(verified) => verified,
            Err(e) => {
                tracing::warn!(error = %e, "OTP verification failed");
                return Err(self.reject("Invalid OTP, try again", e.into()).await);
            }
        };

        if let Err(e) = identity.set_identity(&verified.user, &verified.token).await {
            tracing::error!(error = %e, "Failed to store verified identity");
            return Err(self
                .reject("Could not save your sign-in. Please try again.", e.into())
                .await);
        }
        crate::error::set_sentry_user(&verified.user.id, Some(&verified.user.email));

        self.session.otp_code.clear();
        if self.session.shipping.full_name.trim().is_empty() {
            self.session.shipping.full_name.clone_from(&self.session.name);
        }
        self.session.notice = None;
        self.advance(CheckoutStage::NeedShipping).await;
        Ok(())
    }

    /// Validate the shipping address, create the order and prepare the
    /// payment widget.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::Validation`] if a required field is blank or the cart
    /// is empty, [`CheckoutError::Payment`] if the order or widget could not
    /// be prepared.
    #[instrument(skip_all)]
    pub async fn submit_shipping<B: MerchantBackend, F: ScriptFetcher>(
        &mut self,
        payment: &PaymentAdapter<B, F>,
        shipping: ShippingInfo,
    ) -> Result<(), CheckoutError> {
        self.expect_stage(&CheckoutStage::NeedShipping, "submit shipping details")?;

        self.session.shipping = shipping.trimmed();
        if !self.session.shipping.is_complete() {
            return Err(self
                .invalid("Please fill all required shipping details")
                .await);
        }

        let cart = CartStore::load(self.storage.clone()).await;
        if cart.cart().is_empty() {
            return Err(self.invalid("Your cart is empty").await);
        }

        let identity = self.identity();
        let user = identity.user().await;
        let token = identity.token().await;

        let launch = match payment
            .initiate(
                cart.cart().lines(),
                &self.session.shipping,
                user.as_ref(),
                token.as_ref(),
            )
            .await
        {
            Ok(launch) => launch,
            Err(e) => {
                let message = match &e {
                    PaymentError::Backend(inner) => inner.backend_message().map_or_else(
                        || "Checkout failed, try again.".to_string(),
                        |m| format!("Checkout failed: {m}"),
                    ),
                    PaymentError::MissingGatewaySession => {
                        "Failed to initialize payment. Try again.".to_string()
                    }
                    PaymentError::WidgetUnavailable(_) => {
                        "Payment gateway failed to load. Please try again.".to_string()
                    }
                    PaymentError::NotVerified { .. } => "Checkout failed, try again.".to_string(),
                };
                tracing::warn!(error = %e, "Failed to initiate payment");
                return Err(self.reject(message, e.into()).await);
            }
        };

        self.session.pending = Some(PendingPayment {
            options: launch.options,
            script: launch.script,
        });
        self.session.notice = None;
        self.advance(CheckoutStage::PaymentInFlight(launch.order_id))
            .await;
        Ok(())
    }

    /// Handle the widget's success callback.
    ///
    /// Clears the cart only when the backend confirms the payment.
    /// Otherwise checkout returns to `Idle` with the cart, identity and
    /// shipping draft intact.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::Payment`] when verification is rejected or fails.
    #[instrument(skip_all)]
    pub async fn confirm_payment<B: MerchantBackend, F: ScriptFetcher>(
        &mut self,
        payment: &PaymentAdapter<B, F>,
        proof: PaymentProof,
    ) -> Result<OrderId, CheckoutError> {
        let CheckoutStage::PaymentInFlight(order_id) = self.session.stage.clone() else {
            return Err(self.illegal("confirm a payment"));
        };

        let token = self.identity().token().await;
        match payment.confirm(proof, &order_id, token.as_ref()).await {
            Ok(()) => {
                let mut cart = CartStore::load(self.storage.clone()).await;
                cart.clear().await;

                self.session.pending = None;
                self.session.shipping = ShippingInfo::default();
                self.session.notice = Some(Notice::success("Payment Successful & Order Placed!"));
                self.advance(CheckoutStage::Completed(order_id.clone()))
                    .await;
                Ok(order_id)
            }
            Err(e) => {
                let message = match &e {
                    PaymentError::NotVerified { .. } => {
                        "Payment verification failed! If amount was charged, contact support."
                    }
                    _ => "Payment verification failed. Please try again or contact support.",
                };
                tracing::warn!(error = %e, order_id = %order_id, "Payment not confirmed");
                self.session.pending = None;
                self.session.notice = Some(Notice::error(message));
                self.advance(CheckoutStage::Idle).await;
                Err(e.into())
            }
        }
    }

    /// Handle the widget failing or being closed without payment.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::InvalidTransition`] if no payment is in flight.
    #[instrument(skip(self))]
    pub async fn payment_failed(&mut self, outcome: WidgetOutcome) -> Result<(), CheckoutError> {
        if !matches!(self.session.stage, CheckoutStage::PaymentInFlight(_)) {
            return Err(self.illegal("report a payment failure"));
        }

        let message = match outcome {
            WidgetOutcome::Failed => "Payment failed. Please try again.",
            WidgetOutcome::Dismissed => "Payment cancelled. Your cart has been kept.",
        };
        self.session.pending = None;
        self.session.notice = Some(Notice::error(message));
        self.advance(CheckoutStage::Idle).await;
        Ok(())
    }

    /// Abandon checkout. The verified identity and the cart are kept.
    #[instrument(skip(self), fields(stage = %self.session.stage))]
    pub async fn cancel(&mut self) {
        add_breadcrumb("checkout", "Checkout cancelled", None);
        self.session = CheckoutSession::default();
        self.discard().await;
    }

    /// Take the order id of a completed checkout and drop the session.
    pub async fn acknowledge(&mut self) -> Option<OrderId> {
        let CheckoutStage::Completed(order_id) = self.session.stage.clone() else {
            return None;
        };
        self.session = CheckoutSession::default();
        self.discard().await;
        Some(order_id)
    }

    /// Drop the notice after it has been shown once.
    pub async fn take_notice(&mut self) -> Option<Notice> {
        let notice = self.session.notice.take();
        if notice.is_some() {
            self.persist().await;
        }
        notice
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn expect_stage(
        &self,
        expected: &CheckoutStage,
        action: &'static str,
    ) -> Result<(), CheckoutError> {
        if &self.session.stage == expected {
            Ok(())
        } else {
            Err(self.illegal(action))
        }
    }

    fn illegal(&self, action: &'static str) -> CheckoutError {
        tracing::debug!(stage = %self.session.stage, action, "Rejected checkout action");
        CheckoutError::InvalidTransition {
            stage: self.session.stage.name(),
            action,
        }
    }

    async fn invalid(&mut self, message: impl Into<String>) -> CheckoutError {
        let message = message.into();
        self.reject(message.clone(), CheckoutError::Validation(message))
            .await
    }

    async fn reject(&mut self, message: impl Into<String>, error: CheckoutError) -> CheckoutError {
        self.session.notice = Some(Notice::error(message));
        self.persist().await;
        error
    }

    async fn advance(&mut self, stage: CheckoutStage) {
        add_breadcrumb(
            "checkout",
            "Checkout stage changed",
            Some(&[("from", self.session.stage.name()), ("to", stage.name())]),
        );
        self.session.stage = stage;
        self.persist().await;
    }

    async fn persist(&self) {
        if let Err(e) = self
            .storage
            .set_item(session_keys::CHECKOUT, &self.session)
            .await
        {
            tracing::warn!(error = %e, "Failed to persist checkout session");
        }
    }

    async fn discard(&self) {
        if let Err(e) = self.storage.remove_item(session_keys::CHECKOUT).await {
            tracing::warn!(error = %e, "Failed to remove checkout session");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use navdana_core::{CartAction, NewLine, ProductId};
    use rust_decimal::Decimal;

    use super::*;
    use crate::backend::fake::FakeBackend;
    use crate::payment::widget::fake::FakeFetcher;
    use crate::payment::{Branding, WidgetLoader};
    use crate::services::storage::MemoryStorage;

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

    async fn storage_with_cart() -> MemoryStorage {
        let storage = MemoryStorage::new();
        let mut cart = CartStore::load(storage.clone()).await;
        cart.dispatch(CartAction::Add {
            line: NewLine {
                product_id: ProductId::new("P1"),
                size: Some("M".to_string()),
                color: Some("#000".to_string()),
                sku: None,
                name: "Kurta".to_string(),
                price: Decimal::new(500, 0),
                image: String::new(),
            },
            quantity: Some(2),
        })
        .await;
        storage
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

    fn proof() -> PaymentProof {
        PaymentProof {
            razorpay_payment_id: "pay_1".to_string(),
            razorpay_order_id: "order_rzp_1".to_string(),
            razorpay_signature: "sig".to_string(),
        }
    }

    /// Walk a fresh visitor up to `NeedShipping`.
    async fn verified_flow(
        storage: &MemoryStorage,
        backend: &FakeBackend,
    ) -> CheckoutFlow<MemoryStorage> {
        let mut flow = CheckoutFlow::load(storage.clone()).await;
        flow.begin().await.unwrap();
        flow.submit_name("Asha").await.unwrap();
        flow.submit_email(backend, "asha@example.com").await.unwrap();
        flow.submit_otp(backend, "123456").await.unwrap();
        flow
    }

    async fn cart_quantity(storage: &MemoryStorage) -> u32 {
        CartStore::load(storage.clone())
            .await
            .cart()
            .total_quantity()
    }

    #[tokio::test]
    async fn test_new_visitor_walks_every_step() {
        let storage = storage_with_cart().await;
        let backend = FakeBackend::new();
        let mut flow = CheckoutFlow::load(storage.clone()).await;

        flow.begin().await.unwrap();
        assert_eq!(flow.stage(), &CheckoutStage::NeedName);

        flow.submit_name("  Asha ").await.unwrap();
        assert_eq!(flow.stage(), &CheckoutStage::NeedEmail);
        assert_eq!(flow.session().name, "Asha");

        flow.submit_email(&backend, "asha@example.com").await.unwrap();
        assert_eq!(flow.stage(), &CheckoutStage::NeedOtp);
        assert_eq!(*backend.otp_sent_to.lock().unwrap(), ["asha@example.com"]);

        flow.submit_otp(&backend, "123456").await.unwrap();
        assert_eq!(flow.stage(), &CheckoutStage::NeedShipping);
        assert!(SessionIdentity::new(storage.clone()).is_known().await);

        // First verification has no token yet.
        let calls = backend.verify_calls.lock().unwrap();
        assert!(calls[0].0.token.is_none());
        assert!(!calls[0].1);
    }

    #[tokio::test]
    async fn test_known_buyer_skips_to_shipping() {
        let storage = storage_with_cart().await;
        let backend = FakeBackend::new();
        let mut flow = verified_flow(&storage, &backend).await;
        flow.cancel().await;

        let mut again = CheckoutFlow::load(storage).await;
        assert_eq!(again.stage(), &CheckoutStage::Idle);
        again.begin().await.unwrap();
        assert_eq!(again.stage(), &CheckoutStage::NeedShipping);
        assert_eq!(again.session().shipping.full_name, "Asha");
    }

    #[tokio::test]
    async fn test_blank_name_stays_with_notice() {
        let storage = storage_with_cart().await;
        let mut flow = CheckoutFlow::load(storage).await;
        flow.begin().await.unwrap();

        let err = flow.submit_name("   ").await.unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));
        assert_eq!(flow.stage(), &CheckoutStage::NeedName);
        assert_eq!(
            flow.session().notice.as_ref().unwrap().message,
            "Please enter your name"
        );
    }

    #[tokio::test]
    async fn test_send_otp_failure_stays_on_email() {
        let storage = storage_with_cart().await;
        let backend = FakeBackend {
            fail_send_otp: true,
            ..FakeBackend::new()
        };
        let mut flow = CheckoutFlow::load(storage).await;
        flow.begin().await.unwrap();
        flow.submit_name("Asha").await.unwrap();

        assert!(flow.submit_email(&backend, "").await.is_err());
        assert_eq!(
            flow.session().notice.as_ref().unwrap().message,
            "Please enter your email"
        );

        let err = flow
            .submit_email(&backend, "asha@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Backend(_)));
        assert_eq!(flow.stage(), &CheckoutStage::NeedEmail);
        assert_eq!(
            flow.session().notice.as_ref().unwrap().message,
            "Failed to send OTP"
        );
    }

    #[tokio::test]
    async fn test_unusual_email_is_left_to_the_backend() {
        let storage = storage_with_cart().await;
        let backend = FakeBackend::new();
        let mut flow = CheckoutFlow::load(storage).await;
        flow.begin().await.unwrap();
        flow.submit_name("Asha").await.unwrap();

        flow.submit_email(&backend, "  asha ").await.unwrap();
        assert_eq!(flow.stage(), &CheckoutStage::NeedOtp);
        assert_eq!(*backend.otp_sent_to.lock().unwrap(), ["asha"]);
        assert_eq!(flow.session().email, "asha");
    }

    #[tokio::test]
    async fn test_rejected_otp_changes_nothing_else() {
        let storage = storage_with_cart().await;
        let backend = FakeBackend::new();
        let mut flow = CheckoutFlow::load(storage.clone()).await;
        flow.begin().await.unwrap();
        flow.submit_name("Asha").await.unwrap();
        flow.submit_email(&backend, "asha@example.com").await.unwrap();

        let err = flow.submit_otp(&backend, "000000").await.unwrap_err();
        assert!(matches!(err, CheckoutError::Backend(_)));
        assert_eq!(flow.stage(), &CheckoutStage::NeedOtp);
        assert_eq!(
            flow.session().notice.as_ref().unwrap().message,
            "Invalid OTP, try again"
        );
        assert!(!SessionIdentity::new(storage.clone()).is_known().await);
        assert_eq!(cart_quantity(&storage).await, 2);
    }

    #[tokio::test]
    async fn test_blank_shipping_field_blocks_payment() {
        let storage = storage_with_cart().await;
        let backend = FakeBackend::new();
        let payment = adapter(FakeBackend::new());
        let mut flow = verified_flow(&storage, &backend).await;

        for blank in 0..5 {
            let mut info = shipping();
            match blank {
                0 => info.full_name = " ".to_string(),
                1 => info.address.clear(),
                2 => info.city.clear(),
                3 => info.postal_code.clear(),
                _ => info.country.clear(),
            }
            let err = flow.submit_shipping(&payment, info).await.unwrap_err();
            assert!(matches!(err, CheckoutError::Validation(_)));
            assert_eq!(flow.stage(), &CheckoutStage::NeedShipping);
        }
        assert!(payment.backend().orders.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_order_failure_surfaces_backend_message() {
        let storage = storage_with_cart().await;
        let backend = FakeBackend::new();
        let payment = adapter(FakeBackend {
            order_error: Some("Product out of stock".to_string()),
            ..FakeBackend::new()
        });
        let mut flow = verified_flow(&storage, &backend).await;

        let err = flow.submit_shipping(&payment, shipping()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Payment(_)));
        assert_eq!(flow.stage(), &CheckoutStage::NeedShipping);
        assert_eq!(
            flow.session().notice.as_ref().unwrap().message,
            "Checkout failed: Product out of stock"
        );
        // The draft survives for the retry.
        assert_eq!(flow.session().shipping.city, "Pune");
    }

    #[tokio::test]
    async fn test_successful_payment_clears_cart() {
        let storage = storage_with_cart().await;
        let backend = FakeBackend::new();
        let payment = adapter(FakeBackend::new());
        let mut flow = verified_flow(&storage, &backend).await;

        flow.submit_shipping(&payment, shipping()).await.unwrap();
        assert_eq!(
            flow.stage(),
            &CheckoutStage::PaymentInFlight(OrderId::new("ord_1"))
        );
        assert!(flow.session().pending.is_some());

        let order = flow.confirm_payment(&payment, proof()).await.unwrap();
        assert_eq!(order.as_str(), "ord_1");
        assert_eq!(flow.stage(), &CheckoutStage::Completed(order.clone()));
        assert_eq!(cart_quantity(&storage).await, 0);
        assert!(storage.raw(session_keys::CART).is_none());

        assert_eq!(flow.acknowledge().await, Some(order));
        assert!(storage.raw(session_keys::CHECKOUT).is_none());
    }

    #[tokio::test]
    async fn test_unverified_payment_keeps_cart_and_reopens_at_shipping() {
        let storage = storage_with_cart().await;
        let backend = FakeBackend::new();
        let payment = adapter(FakeBackend {
            payment_success: false,
            ..FakeBackend::new()
        });
        let mut flow = verified_flow(&storage, &backend).await;
        flow.submit_shipping(&payment, shipping()).await.unwrap();

        let err = flow.confirm_payment(&payment, proof()).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Payment(PaymentError::NotVerified { .. })
        ));
        assert_eq!(flow.stage(), &CheckoutStage::Idle);
        assert_eq!(cart_quantity(&storage).await, 2);

        flow.begin().await.unwrap();
        assert_eq!(flow.stage(), &CheckoutStage::NeedShipping);
        assert_eq!(flow.session().shipping.address, "12 MG Road");
    }

    #[tokio::test]
    async fn test_widget_dismissal_returns_to_idle() {
        let storage = storage_with_cart().await;
        let backend = FakeBackend::new();
        let payment = adapter(FakeBackend::new());
        let mut flow = verified_flow(&storage, &backend).await;
        flow.submit_shipping(&payment, shipping()).await.unwrap();

        flow.payment_failed(WidgetOutcome::Dismissed).await.unwrap();
        assert_eq!(flow.stage(), &CheckoutStage::Idle);
        assert!(flow.session().pending.is_none());
        assert_eq!(cart_quantity(&storage).await, 2);
        assert!(SessionIdentity::new(storage).is_known().await);
    }

    #[tokio::test]
    async fn test_out_of_order_actions_are_rejected() {
        let storage = storage_with_cart().await;
        let backend = FakeBackend::new();
        let mut flow = CheckoutFlow::load(storage).await;
        flow.begin().await.unwrap();

        let err = flow.submit_otp(&backend, "123456").await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::InvalidTransition {
                stage: "need_name",
                ..
            }
        ));
        assert_eq!(flow.stage(), &CheckoutStage::NeedName);
        assert!(backend.verify_calls.lock().unwrap().is_empty());

        assert!(matches!(
            flow.begin().await,
            Err(CheckoutError::InvalidTransition { .. })
        ));
        assert!(matches!(
            flow.payment_failed(WidgetOutcome::Failed).await,
            Err(CheckoutError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancel_discards_transient_state() {
        let storage = storage_with_cart().await;
        let backend = FakeBackend::new();
        let mut flow = CheckoutFlow::load(storage.clone()).await;
        flow.begin().await.unwrap();
        flow.submit_name("Asha").await.unwrap();
        flow.submit_email(&backend, "asha@example.com").await.unwrap();

        flow.cancel().await;
        assert_eq!(flow.session(), &CheckoutSession::default());
        assert!(storage.raw(session_keys::CHECKOUT).is_none());
        assert_eq!(cart_quantity(&storage).await, 2);
    }

    #[tokio::test]
    async fn test_empty_cart_cannot_start() {
        let mut flow = CheckoutFlow::load(MemoryStorage::new()).await;
        let err = flow.begin().await.unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));
        assert_eq!(flow.stage(), &CheckoutStage::Idle);
    }

    #[tokio::test]
    async fn test_state_survives_reload() {
        let storage = storage_with_cart().await;
        let mut flow = CheckoutFlow::load(storage.clone()).await;
        flow.begin().await.unwrap();
        flow.submit_name("Asha").await.unwrap();

        let reloaded = CheckoutFlow::load(storage).await;
        assert_eq!(reloaded.stage(), &CheckoutStage::NeedEmail);
        assert_eq!(reloaded.session().name, "Asha");
    }
}
