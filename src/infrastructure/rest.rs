use crate::domain::ports::LedgerGateway;
use crate::error::{Result, ShipmentError};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as b64};
use reqwest::{Client, StatusCode, header::CONTENT_TYPE};
use serde::Deserialize;
use tracing::debug;

/// Body of `GET /state/{address}`.
#[derive(Debug, Deserialize)]
struct StateResponse {
    data: String,
}

/// Talks to the ledger platform's REST API.
#[derive(Debug, Clone)]
pub struct RestGateway {
    base_url: String,
    client: Client,
}

impl RestGateway {
    /// Creates a gateway for `base_url`; `http://` is assumed when no scheme is given.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_url(base_url),
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/{}", self.base_url, suffix)
    }
}

fn normalize_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

#[async_trait]
impl LedgerGateway for RestGateway {
    async fn submit_batches(&self, batch_list: Vec<u8>) -> Result<()> {
        let url = self.url("batches");
        debug!(%url, bytes = batch_list.len(), "submitting batch list");

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(batch_list)
            .send()
            .await
            .map_err(|e| ShipmentError::GatewayError(format!("Failed to connect to {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ShipmentError::GatewayError(format!(
                "Error {}: {}",
                status, body
            )));
        }
        Ok(())
    }

    async fn fetch_state(&self, address: &str) -> Result<Option<Vec<u8>>> {
        let url = self.url(&format!("state/{}", address));
        debug!(%url, "fetching state");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ShipmentError::GatewayError(format!("Failed to connect to {}: {}", url, e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ShipmentError::GatewayError(format!(
                "Error {}: {}",
                status, body
            )));
        }

        let state: StateResponse = response.json().await?;
        let bytes = b64.decode(state.data.as_bytes()).map_err(|e| {
            ShipmentError::GatewayError(format!("state data is not valid base64: {}", e))
        })?;
        Ok(Some(bytes))
    }
}
