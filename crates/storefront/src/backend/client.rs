//! HTTP implementation of [`MerchantBackend`].

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument};

use navdana_core::{Banner, ProductId};

use super::types::{Envelope, ErrorBody, SendOtpRequest};
use super::{
    BackendError, CreateOrderRequest, CreateOrderResponse, MerchantBackend, Product,
    VerifyOtpRequest, VerifyOtpResponse, VerifyPaymentRequest, VerifyPaymentResponse,
};
use crate::config::MerchantConfig;

/// Cached catalog responses.
#[derive(Debug, Clone)]
enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
}

/// Client for the merchant backend REST API.
///
/// Cheap to clone. Products are cached for 5 minutes; nothing else is.
#[derive(Clone)]
pub struct MerchantClient {
    inner: Arc<MerchantClientInner>,
}

struct MerchantClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<String, CacheValue>,
}

impl MerchantClient {
    /// Create a new client.
    #[must_use]
    pub fn new(config: &MerchantConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(MerchantClientInner {
                client: reqwest::Client::new(),
                base_url: config.api_url.trim_end_matches('/').to_string(),
                cache,
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Send a request and return the body, mapping non-2xx to
    /// [`BackendError::Status`] with the backend's `message`.
    async fn send_raw(
        &self,
        request: reqwest::RequestBuilder,
        token: Option<&SecretString>,
    ) -> Result<String, BackendError> {
        let request = match token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(
                body.chars().take(200).collect::<String>(),
            ));
        }

        if !status.is_success() {
            let error: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
            tracing::warn!(
                status = %status,
                message = error.message.as_deref().unwrap_or(""),
                "Merchant backend returned non-success status"
            );
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: error.message.or(error.error),
            });
        }

        Ok(body)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        token: Option<&SecretString>,
    ) -> Result<T, BackendError> {
        let body = self.send_raw(request, token).await?;
        serde_json::from_str::<T>(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse merchant backend response"
            );
            BackendError::Parse(e)
        })
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        token: Option<&SecretString>,
    ) -> Result<T, BackendError> {
        let request = self.inner.client.post(self.url(path)).json(body);
        self.send(request, token).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let request = self.inner.client.get(self.url(path));
        self.send(request, None).await
    }
}

impl MerchantBackend for MerchantClient {
    #[instrument(skip(self, email))]
    async fn send_otp(&self, email: &str) -> Result<(), BackendError> {
        let request = self
            .inner
            .client
            .post(self.url("/user/send-otp"))
            .json(&SendOtpRequest { email });
        self.send_raw(request, None).await?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn verify_otp(
        &self,
        request: &VerifyOtpRequest,
        token: Option<&SecretString>,
    ) -> Result<VerifyOtpResponse, BackendError> {
        let response: Envelope<VerifyOtpResponse> =
            self.post("/user/verify", request, token).await?;
        Ok(response.into_inner())
    }

    #[instrument(skip_all, fields(items = request.items.len()))]
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
        token: Option<&SecretString>,
    ) -> Result<CreateOrderResponse, BackendError> {
        let response: Envelope<CreateOrderResponse> = self.post("/order", request, token).await?;
        Ok(response.into_inner())
    }

    #[instrument(skip_all, fields(order_id = %request.order_id))]
    async fn verify_payment(
        &self,
        request: &VerifyPaymentRequest,
        token: Option<&SecretString>,
    ) -> Result<VerifyPaymentResponse, BackendError> {
        self.post("/order/verify", request, token).await
    }

    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        let cache_key = "products".to_string();

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products = self.get::<Envelope<Vec<Product>>>("/product").await?.into_inner();

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn product(&self, id: &ProductId) -> Result<Product, BackendError> {
        let cache_key = format!("product:{id}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product = self
            .get::<Envelope<Product>>(&format!("/product/{id}"))
            .await?
            .into_inner();

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    #[instrument(skip(self))]
    async fn list_banners(&self) -> Result<Vec<Banner>, BackendError> {
        Ok(self.get::<Envelope<Vec<Banner>>>("/banner").await?.into_inner())
    }
}
