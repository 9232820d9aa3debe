//! HTTP client for the prediction service.

use reqwest::Client;
use tracing::debug;

use crate::config::ServiceConfig;
use crate::error::CollarError;
use crate::types::PredictionRequest;

/// Client for the remote prediction endpoint.
pub struct PredictionClient {
    url: url::Url,
    http_client: Client,
}

impl PredictionClient {
    /// Build a client for the configured endpoint.
    pub fn new(config: &ServiceConfig) -> Result<Self, CollarError> {
        let url = config.url()?;
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| CollarError::ConfigError(format!("http client: {}", e)))?;

        Ok(Self { url, http_client })
    }

    pub fn url(&self) -> &url::Url {
        &self.url
    }

    /// POST the request and return the raw response body.
    ///
    /// Transport failures and non-2xx statuses are `NetworkError`.
    pub async fn fetch(&self, request: &PredictionRequest) -> Result<String, CollarError> {
        debug!(url = %self.url, activity = %request.current_activity, "requesting predictions");

        let resp = self
            .http_client
            .post(self.url.clone())
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CollarError::NetworkError(format!(
                "prediction service returned {}",
                status
            )));
        }

        let body = resp.text().await?;
        debug!(bytes = body.len(), "prediction response received");
        Ok(body)
    }
}
