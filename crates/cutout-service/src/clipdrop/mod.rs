//! ClipDrop integration: the metered background-removal transform.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;

/// Error type for ClipDrop operations.
#[derive(Debug, thiserror::Error)]
pub enum ClipdropError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// ClipDrop API returned a non-success status.
    #[error("ClipDrop API error: status {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, if readable.
        message: String,
    },
}

/// ClipDrop API client.
#[derive(Debug, Clone)]
pub struct ClipdropClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ClipdropClient {
    /// Upload and transform can take a while for large images; still
    /// bounded so a stuck upstream cannot pin a reservation forever.
    const TRANSFORM_TIMEOUT: Duration = Duration::from_secs(60);

    /// Create a new ClipDrop client.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Self::TRANSFORM_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Remove the background from an image. Returns the transformed image
    /// bytes.
    ///
    /// # Errors
    ///
    /// Returns `ClipdropError` on transport failure or a non-success
    /// status.
    pub async fn remove_background(
        &self,
        image: Vec<u8>,
        file_name: &str,
    ) -> Result<Vec<u8>, ClipdropError> {
        let part = Part::bytes(image).file_name(file_name.to_string());
        let form = Form::new().part("image_file", part);

        let response = self
            .client
            .post(format!("{}/remove-background/v1", self.base_url))
            .header("x-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClipdropError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}
