use super::client::OpenAiHttpClient;
use super::types::{ImageGenerationRequest, ImageGenerationResponse};
use crate::ai::ImageGenerationService;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Renders transparent PNG illustrations through the OpenAI images API.
pub struct OpenAiImageClient {
    http: OpenAiHttpClient,
    model: String,
}

impl OpenAiImageClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        Self {
            http: OpenAiHttpClient::new(api_key, timeout),
            model,
        }
    }

    pub fn new_with_client(
        api_key: String,
        model: String,
        client: Client,
        timeout: Duration,
    ) -> Self {
        Self {
            http: OpenAiHttpClient::new_with_client(api_key, client, timeout),
            model,
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl ImageGenerationService for OpenAiImageClient {
    async fn render(&self, prompt: &str) -> Result<Vec<u8>> {
        let request = ImageGenerationRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            n: 1,
            size: "auto".to_string(),
            background: "transparent".to_string(),
            output_format: "png".to_string(),
        };

        tracing::debug!("Sending image generation request (model: {})", self.model);
        let response: ImageGenerationResponse =
            self.http.post("/v1/images/generations", &request).await?;

        let b64_json = response
            .data
            .first()
            .and_then(|image| image.b64_json.as_deref())
            .ok_or_else(|| Error::AiProvider("No image data in OpenAI response".to_string()))?;

        use base64::Engine as _;
        base64::engine::general_purpose::STANDARD
            .decode(b64_json)
            .map_err(|e| Error::Generic(format!("Failed to decode base64 image: {}", e)))
    }
}
