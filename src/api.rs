//! Order API client.
//!
//! Talks to the backend order service over plain HTTP/JSON. Four routes are
//! used: list orders, fetch an order's line items, delete an order's details,
//! and release an order. Nothing is retried here; callers decide what a
//! failure means for their flow.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use crate::config::ApiSettings;
use crate::error::DeskError;
use crate::models::{parse_order_details, parse_orders, OrderLineItem, OrderSummary};

#[async_trait]
pub trait OrderApi: Send + Sync {
    /// `GET /order`: every order the backend knows about, any status.
    async fn list_orders(&self) -> Result<Vec<OrderSummary>, DeskError>;

    /// `GET /order-detail/order/{id}`
    async fn get_order_details(&self, order_id: &str) -> Result<Vec<OrderLineItem>, DeskError>;

    /// `DELETE /order/{id}/details`; true on 200. Never fails loudly.
    async fn delete_order_details(&self, order_id: &str) -> bool;

    /// `POST /order/{id}/release`; true only on 201.
    async fn release_order(&self, order_id: &str) -> bool;
}

// ---------------------------------------------------------------------------
// URL normalisation
// ---------------------------------------------------------------------------

/// Normalise the backend base URL:
/// - ensure a scheme is present (http for localhost, https otherwise)
/// - strip trailing slashes
pub fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    while url.ends_with('/') {
        url.pop();
    }

    url
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn network_error(url: &str, err: &reqwest::Error) -> DeskError {
    if err.is_connect() {
        return DeskError::Network(format!("cannot reach order service at {url}"));
    }
    if err.is_timeout() {
        return DeskError::Network(format!("request to {url} timed out"));
    }
    if err.is_builder() {
        return DeskError::Network(format!("invalid order service URL: {url}"));
    }
    DeskError::Network(format!("error communicating with {url}: {err}"))
}

fn status_error(url: &str, status: StatusCode) -> DeskError {
    if status == StatusCode::NOT_FOUND {
        return DeskError::NotFound(url.to_string());
    }
    DeskError::HttpStatus {
        status: status.as_u16(),
        url: url.to_string(),
    }
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

pub struct HttpOrderApi {
    base_url: String,
    client: Client,
}

impl HttpOrderApi {
    pub fn new(settings: &ApiSettings) -> Result<Self, DeskError> {
        let mut builder = Client::builder();
        if let Some(secs) = settings.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        } else {
            debug!("No request timeout configured; a hung backend will stall polling");
        }
        let client = builder
            .build()
            .map_err(|e| DeskError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            base_url: normalize_base_url(&settings.base_url),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_body(&self, path: &str) -> Result<String, DeskError> {
        let url = self.url(path);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| network_error(&self.base_url, &e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(status_error(&url, status));
        }
        resp.text()
            .await
            .map_err(|e| network_error(&self.base_url, &e))
    }
}

#[async_trait]
impl OrderApi for HttpOrderApi {
    async fn list_orders(&self) -> Result<Vec<OrderSummary>, DeskError> {
        let body = self.get_body("/order").await?;
        parse_orders(&body)
    }

    async fn get_order_details(&self, order_id: &str) -> Result<Vec<OrderLineItem>, DeskError> {
        let body = self
            .get_body(&format!("/order-detail/order/{order_id}"))
            .await?;
        parse_order_details(&body)
    }

    async fn delete_order_details(&self, order_id: &str) -> bool {
        let url = self.url(&format!("/order/{order_id}/details"));
        match self.client.delete(&url).send().await {
            Ok(resp) if resp.status() == StatusCode::OK => {
                info!(order_id, "Order details deleted");
                true
            }
            Ok(resp) => {
                warn!(order_id, status = resp.status().as_u16(), "Failed to delete order details");
                false
            }
            Err(e) => {
                warn!(order_id, error = %network_error(&self.base_url, &e), "Delete order details request failed");
                false
            }
        }
    }

    async fn release_order(&self, order_id: &str) -> bool {
        let url = self.url(&format!("/order/{order_id}/release"));
        match self.client.post(&url).send().await {
            Ok(resp) if resp.status() == StatusCode::CREATED => {
                info!(order_id, "Order released");
                true
            }
            Ok(resp) => {
                warn!(order_id, status = resp.status().as_u16(), "Failed to release order");
                false
            }
            Err(e) => {
                warn!(order_id, error = %network_error(&self.base_url, &e), "Release order request failed");
                false
            }
        }
    }
}
