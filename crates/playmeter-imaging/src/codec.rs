//! Base64 helpers for image payloads

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use playmeter_api::ImagePayload;

use crate::{ImageEditError, ImageEditResult};

/// Build a payload from raw bytes
pub fn encode(mime_type: impl Into<String>, bytes: &[u8]) -> ImagePayload {
    ImagePayload::new(mime_type, BASE64_STANDARD.encode(bytes))
}

/// Raw bytes of a payload
pub fn decode(payload: &ImagePayload) -> ImageEditResult<Vec<u8>> {
    BASE64_STANDARD
        .decode(payload.data.as_bytes())
        .map_err(|e| ImageEditError::InvalidRequest(format!("invalid base64 image data: {}", e)))
}
