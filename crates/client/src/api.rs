//! REST client for the share gateway.

use pinboard_core::error::CoreError;
use pinboard_core::share::{ShareCreated, SharePayload};
use serde::Deserialize;

/// HTTP client for a single share gateway.
#[derive(Clone)]
pub struct ShareClient {
    client: reqwest::Client,
    base_url: String,
}

/// Errors from the share gateway client.
#[derive(Debug, thiserror::Error)]
pub enum ShareClientError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway returned a non-2xx status code.
    #[error("Share gateway error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the body, or the raw body if it was not JSON.
        body: String,
    },

    /// No live share exists under this id.
    #[error("Share {0} not found")]
    NotFound(String),

    /// The fetched share could not be opened.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ShareClientError {
    /// Text shown in the share popup when creation fails. Empty when the
    /// popup should fall back to its generic message.
    pub fn user_message(&self) -> String {
        match self {
            ShareClientError::Api { status, body } if *status < 500 => body.clone(),
            _ => String::new(),
        }
    }
}

/// Error body produced by the gateway.
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl ShareClient {
    /// * `base_url` - Gateway origin, e.g. `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Store an image and its annotations. Returns the new share id.
    pub async fn create_share(
        &self,
        payload: &SharePayload,
    ) -> Result<ShareCreated, ShareClientError> {
        let response = self
            .client
            .post(format!("{}/api/share", self.base_url))
            .json(payload)
            .send()
            .await?;

        let created: ShareCreated = Self::parse_response(response).await?;
        tracing::debug!(share_id = %created.id, annotations = payload.annotations.len(), "Share created");
        Ok(created)
    }

    /// Fetch a stored share.
    pub async fn fetch_share(&self, id: &str) -> Result<SharePayload, ShareClientError> {
        let response = self
            .client
            .get(format!("{}/api/share/{}", self.base_url, id))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ShareClientError::NotFound(id.to_string()));
        }
        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Returns the response unchanged on success, or a
    /// [`ShareClientError::Api`] carrying the gateway's error message.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ShareClientError> {
        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            let body = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.error)
                .unwrap_or(text);
            tracing::warn!(status = status.as_u16(), %body, "Share gateway request failed");
            return Err(ShareClientError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ShareClientError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}
