//! Gemini `generateContent` image editor

use async_trait::async_trait;
use playmeter_api::ImagePayload;
use playmeter_config::ImagingConfig;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{ImageEditError, ImageEditRequest, ImageEditResult, ImageEditor};

/// MIME type assumed when the service omits one
const DEFAULT_OUTPUT_MIME: &str = "image/png";

pub struct GeminiImageEditor {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiImageEditor {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> ImageEditResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ImageEditError::Request(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    /// Build from config, reading the API key from the configured variable
    pub fn from_config(config: &ImagingConfig) -> ImageEditResult<Self> {
        if !config.enabled {
            return Err(ImageEditError::Unavailable("disabled in config".into()));
        }

        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ImageEditError::Unavailable(format!("{} is not set", config.api_key_env))
            })?;

        Self::new(&config.endpoint, &config.model, api_key, config.timeout)
    }

    fn request_body(request: &ImageEditRequest) -> serde_json::Value {
        serde_json::json!({
            "contents": [{
                "parts": [
                    {
                        "inlineData": {
                            "data": request.image.data,
                            "mimeType": request.image.mime_type,
                        }
                    },
                    { "text": request.instruction },
                ]
            }]
        })
    }

    /// First inline image of the first candidate
    fn extract_image(response: &serde_json::Value) -> ImageEditResult<ImagePayload> {
        let candidates = response
            .get("candidates")
            .and_then(|c| c.as_array())
            .ok_or(ImageEditError::NoImageGenerated)?;

        let parts = candidates
            .first()
            .and_then(|c| c.pointer("/content/parts"))
            .and_then(|p| p.as_array())
            .ok_or(ImageEditError::NoImageGenerated)?;

        for part in parts {
            let Some(inline) = part.get("inlineData") else {
                continue;
            };
            let data = inline
                .get("data")
                .and_then(|d| d.as_str())
                .ok_or_else(|| ImageEditError::InvalidResponse("inlineData without data".into()))?;
            let mime_type = inline
                .get("mimeType")
                .and_then(|m| m.as_str())
                .unwrap_or(DEFAULT_OUTPUT_MIME);

            return Ok(ImagePayload::new(mime_type, data));
        }

        Err(ImageEditError::NoImageGenerated)
    }
}

#[async_trait]
impl ImageEditor for GeminiImageEditor {
    async fn edit(&self, request: ImageEditRequest) -> ImageEditResult<ImagePayload> {
        request.validate()?;

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        );

        debug!(
            model = %self.model,
            mime_type = %request.image.mime_type,
            bytes = request.image.data.len(),
            "Sending image edit request"
        );

        let response = self
            .client
            .post(&url)
            .json(&Self::request_body(&request))
            .send()
            .await
            .map_err(|e| ImageEditError::Request(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Image service returned an error");
            return Err(ImageEditError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ImageEditError::InvalidResponse(e.without_url().to_string()))?;

        let image = Self::extract_image(&body)?;
        info!(
            model = %self.model,
            mime_type = %image.mime_type,
            bytes = image.data.len(),
            "Image edit completed"
        );
        Ok(image)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
