//! # Nosh Cart Remote
//!
//! HTTP implementation of [`RemoteCartStore`] against the Nosh backend
//! REST API, plus the customer-address listing the cart screens use.

pub mod wire;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use url::Url;

use address::Address;
use cart_sync::{FetchedCart, RemoteCartStore, StoreError};
use nosh_core::CartItemId;

use crate::wire::CartPayload;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api/v1/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Backend connection configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API root; endpoint paths are joined onto it, so it must end with `/`
    pub base_url: Url,
    /// Bearer token added to every request when present
    pub access_token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            access_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Read `NOSH_API_BASE_URL` and `NOSH_ACCESS_TOKEN` from the
    /// environment, falling back to defaults for anything unset
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("NOSH_API_BASE_URL") {
            config.base_url = Url::parse(&raw)
                .map_err(|e| anyhow::anyhow!("invalid NOSH_API_BASE_URL {raw:?}: {e}"))?;
        }
        if let Ok(token) = std::env::var("NOSH_ACCESS_TOKEN") {
            config.access_token = Some(token);
        }

        Ok(config)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        // The constant is known-good; parse cannot fail here
        Self::new(Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"))
    }
}

/// [`RemoteCartStore`] over the backend REST API
pub struct HttpCartStore {
    client: Client,
    config: ApiConfig,
}

impl HttpCartStore {
    pub fn new(config: ApiConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// List the customer's saved addresses
    pub async fn fetch_addresses(&self) -> Result<Vec<Address>, StoreError> {
        let url = self.endpoint("customer/addresses/")?;
        let response = self.authorize(self.client.get(url)).send().await;
        let response = check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// The customer's default address, if one is flagged
    pub async fn fetch_default_address(&self) -> Result<Option<Address>, StoreError> {
        let addresses = self.fetch_addresses().await?;
        Ok(addresses.into_iter().find(|addr| addr.is_default))
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.config
            .base_url
            .join(path)
            .map_err(|e| StoreError::Transport(format!("bad endpoint {path:?}: {e}")))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl RemoteCartStore for HttpCartStore {
    async fn fetch_cart(&self) -> Result<FetchedCart, StoreError> {
        let url = self.endpoint("customer/cart/")?;
        tracing::debug!(%url, "fetching cart");

        let response = self.authorize(self.client.get(url)).send().await;
        let response = check_status(response).await?;

        let payload: CartPayload = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        Ok(payload.into_fetched())
    }

    async fn remove_item(&self, id: CartItemId) -> Result<(), StoreError> {
        let url = self.endpoint(&format!("customer/cart/{id}/remove_item/"))?;
        tracing::debug!(%id, "removing cart item");

        let response = self.authorize(self.client.delete(url)).send().await;
        check_status(response).await?;
        Ok(())
    }

    async fn update_quantity(&self, id: CartItemId, quantity: u32) -> Result<(), StoreError> {
        let url = self.endpoint(&format!("customer/cart/{id}/update_item/"))?;
        tracing::debug!(%id, quantity, "updating cart item quantity");

        let body = serde_json::json!({ "quantity": quantity });
        let response = self
            .authorize(self.client.patch(url))
            .json(&body)
            .send()
            .await;
        check_status(response).await?;
        Ok(())
    }
}

/// Fold transport errors and non-2xx statuses into [`StoreError`]
async fn check_status(result: Result<Response, reqwest::Error>) -> Result<Response, StoreError> {
    let response = result.map_err(|e| StoreError::Transport(e.to_string()))?;
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        message,
    })
}
