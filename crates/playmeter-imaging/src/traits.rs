//! Image editor trait and request/error types

use async_trait::async_trait;
use playmeter_api::ImagePayload;
use thiserror::Error;

use crate::decode;

/// Errors from image edit operations
#[derive(Debug, Error)]
pub enum ImageEditError {
    #[error("Image editing unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid image edit request: {0}")]
    InvalidRequest(String),

    #[error("Image service request failed: {0}")]
    Request(String),

    #[error("Image service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Unexpected image service response: {0}")]
    InvalidResponse(String),

    #[error("No image was generated, try describing the edit differently")]
    NoImageGenerated,
}

pub type ImageEditResult<T> = Result<T, ImageEditError>;

/// An image plus the free-text instruction describing the edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEditRequest {
    pub image: ImagePayload,
    pub instruction: String,
}

impl ImageEditRequest {
    pub fn new(image: ImagePayload, instruction: impl Into<String>) -> Self {
        Self {
            image,
            instruction: instruction.into(),
        }
    }

    /// Reject requests the service could never satisfy. Bytes are checked to
    /// be valid base64 only.
    pub fn validate(&self) -> ImageEditResult<()> {
        if self.instruction.trim().is_empty() {
            return Err(ImageEditError::InvalidRequest(
                "instruction must not be empty".into(),
            ));
        }
        if !self.image.mime_type.starts_with("image/") {
            return Err(ImageEditError::InvalidRequest(format!(
                "unsupported MIME type: {}",
                self.image.mime_type
            )));
        }
        if decode(&self.image)?.is_empty() {
            return Err(ImageEditError::InvalidRequest("image is empty".into()));
        }
        Ok(())
    }
}

/// Collaborator that turns an image and an instruction into a new image
#[async_trait]
pub trait ImageEditor: Send + Sync {
    async fn edit(&self, request: ImageEditRequest) -> ImageEditResult<ImagePayload>;

    /// Short label for logs
    fn name(&self) -> &str;
}
