//! Merchant backend REST client.
//!
//! The merchant backend owns OTP delivery, orders and payment verification.
//! The storefront talks to it through [`MerchantBackend`], implemented over
//! HTTP by [`MerchantClient`]. Catalog reads are cached for 5 minutes.
//!
//! # Endpoints
//!
//! ```text
//! POST /user/send-otp   {email}
//! POST /user/verify     {name, email, otp, token?}  -> {user, token}
//! POST /order           {items, shippingAddress}    -> {order, razorpayOrder, key}
//! POST /order/verify    {razorpay_*, orderId}       -> {success}
//! GET  /product
//! GET  /product/{id}
//! GET  /banner
//! ```

mod client;
pub mod types;

use std::future::Future;

use secrecy::SecretString;
use thiserror::Error;

use navdana_core::{Banner, ProductId};

pub use client::MerchantClient;
pub use types::{
    CreateOrderRequest, CreateOrderResponse, GatewayOrder, OrderItem, PaymentProof, Product,
    VerifyOtpRequest, VerifyOtpResponse, VerifyPaymentRequest, VerifyPaymentResponse,
};

/// Errors that can occur when calling the merchant backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {}", message.as_deref().unwrap_or("no message"))]
    Status {
        status: u16,
        /// The backend's `message` field, if it sent one.
        message: Option<String>,
    },

    /// The response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl BackendError {
    /// The backend's own explanation, suitable for showing to the buyer.
    #[must_use]
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref().filter(|m| !m.is_empty()),
            _ => None,
        }
    }
}

/// Operations the storefront needs from the merchant backend.
///
/// `token` is the buyer's bearer token; it is attached as an
/// `Authorization: Bearer` header when present.
pub trait MerchantBackend: Send + Sync {
    /// Ask the backend to email a one-time code. The address is passed
    /// through as typed; the backend decides whether it is deliverable.
    fn send_otp(&self, email: &str) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Exchange a one-time code for a user and token.
    fn verify_otp(
        &self,
        request: &VerifyOtpRequest,
        token: Option<&SecretString>,
    ) -> impl Future<Output = Result<VerifyOtpResponse, BackendError>> + Send;

    /// Create a pending order and its gateway session.
    fn create_order(
        &self,
        request: &CreateOrderRequest,
        token: Option<&SecretString>,
    ) -> impl Future<Output = Result<CreateOrderResponse, BackendError>> + Send;

    /// Forward the widget's payment proof for signature verification.
    fn verify_payment(
        &self,
        request: &VerifyPaymentRequest,
        token: Option<&SecretString>,
    ) -> impl Future<Output = Result<VerifyPaymentResponse, BackendError>> + Send;

    /// All products.
    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, BackendError>> + Send;

    /// One product by id.
    fn product(&self, id: &ProductId)
    -> impl Future<Output = Result<Product, BackendError>> + Send;

    /// All banners, active or not.
    fn list_banners(&self) -> impl Future<Output = Result<Vec<Banner>, BackendError>> + Send;
}

#[cfg(test)]
pub mod fake {
    //! Scriptable in-memory backend for service tests.

    use std::sync::Mutex;

    use navdana_core::{OrderId, UserId};

    use super::*;
    use crate::models::StoredUser;

    /// A backend whose answers are set per test.
    #[derive(Default)]
    pub struct FakeBackend {
        pub otp_sent_to: Mutex<Vec<String>>,
        pub fail_send_otp: bool,
        /// The code `verify_otp` accepts.
        pub valid_otp: String,
        pub verify_calls: Mutex<Vec<(VerifyOtpRequest, bool)>>,
        pub orders: Mutex<Vec<CreateOrderRequest>>,
        pub order_response: Mutex<Option<CreateOrderResponse>>,
        pub order_error: Option<String>,
        pub payment_success: bool,
        pub fail_verify_payment: bool,
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self {
                valid_otp: "123456".to_string(),
                payment_success: true,
                order_response: Mutex::new(Some(Self::good_order())),
                ..Self::default()
            }
        }

        pub fn good_order() -> CreateOrderResponse {
            CreateOrderResponse {
                order: Some(types::OrderRef {
                    id: OrderId::new("ord_1"),
                }),
                razorpay_order: Some(GatewayOrder {
                    id: "order_rzp_1".to_string(),
                    amount: 100_000,
                    currency: "INR".to_string(),
                }),
                key: Some("rzp_test_key".to_string()),
            }
        }
    }

    fn status(message: &str) -> BackendError {
        BackendError::Status {
            status: 400,
            message: Some(message.to_string()),
        }
    }

    impl MerchantBackend for FakeBackend {
        async fn send_otp(&self, email: &str) -> Result<(), BackendError> {
            if self.fail_send_otp {
                return Err(status("mailer down"));
            }
            self.otp_sent_to
                .lock()
                .map_err(|_| BackendError::NotFound("poisoned".to_string()))?
                .push(email.to_string());
            Ok(())
        }

        async fn verify_otp(
            &self,
            request: &VerifyOtpRequest,
            token: Option<&SecretString>,
        ) -> Result<VerifyOtpResponse, BackendError> {
            if let Ok(mut calls) = self.verify_calls.lock() {
                calls.push((request.clone(), token.is_some()));
            }
            if request.otp != self.valid_otp {
                return Err(status("Invalid OTP"));
            }
            Ok(VerifyOtpResponse {
                user: StoredUser {
                    id: UserId::new("u1"),
                    name: request.name.clone(),
                    email: request.email.clone(),
                    phone: None,
                },
                token: "tok_1".to_string(),
            })
        }

        async fn create_order(
            &self,
            request: &CreateOrderRequest,
            _token: Option<&SecretString>,
        ) -> Result<CreateOrderResponse, BackendError> {
            if let Some(message) = &self.order_error {
                return Err(status(message));
            }
            if let Ok(mut orders) = self.orders.lock() {
                orders.push(request.clone());
            }
            self.order_response
                .lock()
                .ok()
                .and_then(|r| r.clone())
                .ok_or_else(|| BackendError::NotFound("order".to_string()))
        }

        async fn verify_payment(
            &self,
            _request: &VerifyPaymentRequest,
            _token: Option<&SecretString>,
        ) -> Result<VerifyPaymentResponse, BackendError> {
            if self.fail_verify_payment {
                return Err(BackendError::Status {
                    status: 502,
                    message: None,
                });
            }
            Ok(VerifyPaymentResponse {
                success: self.payment_success,
                message: None,
            })
        }

        async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
            Ok(Vec::new())
        }

        async fn product(&self, id: &ProductId) -> Result<Product, BackendError> {
            Err(BackendError::NotFound(id.to_string()))
        }

        async fn list_banners(&self) -> Result<Vec<Banner>, BackendError> {
            Ok(Vec::new())
        }
    }
}
