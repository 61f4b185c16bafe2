//! Bearer-token REST client for the LocalStore API.
//!
//! All store modules go through [`ApiClient`]; nothing else in the crate
//! touches HTTP. Responses use the server's `{success, data, message}`
//! envelope except for login, which returns its payload bare.

use std::sync::RwLock;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::errors::StorefrontError;

mod auth;
mod orders;
mod products;

pub use auth::{Location, LoginResponse, ManagerDetails, RegisterInput, RegisterOutcome};
pub use orders::{CreateOrderRequest, OrderItemInput};
pub use products::{CreateProductInput, UpdateProductInput};

/// Standard response envelope used by every `/api/*` endpoint.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

pub struct ApiClient {
    http: Client,
    base_url: Url,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    /// Builds a client against `base_url`. No request timeout is applied
    /// unless one is configured; a stuck request only ever blocks its own
    /// caller.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, StorefrontError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StorefrontError::ValidationError(format!("invalid API base URL: {e}")))?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base_url,
            token: RwLock::new(None),
        })
    }

    /// Installs the bearer token attached to all subsequent requests.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().expect("token lock poisoned") = token;
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().expect("token lock poisoned").clone()
    }

    pub fn has_token(&self) -> bool {
        self.token().is_some()
    }

    fn endpoint(&self, path: &str) -> Result<Url, StorefrontError> {
        self.base_url
            .join(path)
            .map_err(|e| StorefrontError::ValidationError(format!("invalid API path {path}: {e}")))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, StorefrontError> {
        let url = self.endpoint(path)?;
        debug!(%method, %url, "api request");
        let mut builder = self.http.request(method, url);
        if let Some(token) = self.token() {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    /// Sends the request and unwraps the `{success, data}` envelope,
    /// mapping HTTP failures and `success: false` onto [`StorefrontError::Api`].
    async fn send_enveloped<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, StorefrontError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(api_error(status, &body));
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&body)?;
        if !envelope.success {
            return Err(StorefrontError::Api {
                status: status.as_u16(),
                message: envelope
                    .message
                    .unwrap_or_else(|| "request rejected".to_string()),
            });
        }
        envelope.data.ok_or_else(|| StorefrontError::Api {
            status: status.as_u16(),
            message: "response envelope missing data".to_string(),
        })
    }

    /// Variant for endpoints whose success answer carries no data payload.
    async fn send_ack(&self, builder: RequestBuilder) -> Result<(), StorefrontError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(api_error(status, &body));
        }

        let envelope: ApiEnvelope<serde_json::Value> = serde_json::from_str(&body)?;
        if !envelope.success {
            return Err(StorefrontError::Api {
                status: status.as_u16(),
                message: envelope
                    .message
                    .unwrap_or_else(|| "request rejected".to_string()),
            });
        }
        Ok(())
    }

    pub(crate) async fn get_enveloped<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, StorefrontError> {
        self.send_enveloped(self.request(Method::GET, path)?).await
    }

    pub(crate) async fn post_enveloped<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, StorefrontError> {
        self.send_enveloped(self.request(Method::POST, path)?.json(body))
            .await
    }

    pub(crate) async fn put_enveloped<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, StorefrontError> {
        self.send_enveloped(self.request(Method::PUT, path)?.json(body))
            .await
    }

    pub(crate) async fn patch_enveloped<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, StorefrontError> {
        self.send_enveloped(self.request(Method::PATCH, path)?.json(body))
            .await
    }

    pub(crate) async fn patch_ack<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), StorefrontError> {
        self.send_ack(self.request(Method::PATCH, path)?.json(body))
            .await
    }

    pub(crate) async fn delete_ack(&self, path: &str) -> Result<(), StorefrontError> {
        self.send_ack(self.request(Method::DELETE, path)?).await
    }

    pub(crate) async fn post_bare<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, StorefrontError> {
        let response = self.request(Method::POST, path)?.json(body).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(api_error(status, &body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

/// Pulls a human message out of an error body when the server sent one.
fn api_error(status: StatusCode, body: &str) -> StorefrontError {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        message: Option<String>,
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

    StorefrontError::Api {
        status: status.as_u16(),
        message,
    }
}
