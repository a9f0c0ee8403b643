//! Mock image editor for testing

use async_trait::async_trait;
use playmeter_api::ImagePayload;
use std::sync::{Arc, Mutex};

use crate::{ImageEditError, ImageEditRequest, ImageEditResult, ImageEditor};

/// What the mock answers with
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Echo the input image back unchanged
    Echo,
    Image(ImagePayload),
    NoImage,
    Fail(String),
}

/// Mock image editor for unit/integration testing
#[derive(Clone)]
pub struct MockImageEditor {
    outcome: Arc<Mutex<MockOutcome>>,
    requests: Arc<Mutex<Vec<ImageEditRequest>>>,
}

impl Default for MockImageEditor {
    fn default() -> Self {
        Self::new(MockOutcome::Echo)
    }
}

impl MockImageEditor {
    pub fn new(outcome: MockOutcome) -> Self {
        Self {
            outcome: Arc::new(Mutex::new(outcome)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_outcome(&self, outcome: MockOutcome) {
        if let Ok(mut current) = self.outcome.lock() {
            *current = outcome;
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<ImageEditRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ImageEditor for MockImageEditor {
    async fn edit(&self, request: ImageEditRequest) -> ImageEditResult<ImagePayload> {
        request.validate()?;

        let outcome = self
            .outcome
            .lock()
            .map(|o| o.clone())
            .map_err(|_| ImageEditError::Request("mock lock poisoned".into()))?;

        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        match outcome {
            MockOutcome::Echo => Ok(request.image),
            MockOutcome::Image(image) => Ok(image),
            MockOutcome::NoImage => Err(ImageEditError::NoImageGenerated),
            MockOutcome::Fail(message) => Err(ImageEditError::Request(message)),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_requests() {
        let editor = MockImageEditor::default();
        let image = ImagePayload::new("image/png", "iVBORw0KGgo=");

        let result = editor
            .edit(ImageEditRequest::new(image.clone(), "brighter"))
            .await
            .unwrap();
        assert_eq!(result, image);
        assert_eq!(editor.requests()[0].instruction, "brighter");

        editor.set_outcome(MockOutcome::NoImage);
        let result = editor.edit(ImageEditRequest::new(image, "darker")).await;
        assert!(matches!(result, Err(ImageEditError::NoImageGenerated)));
        assert_eq!(editor.requests().len(), 2);
    }
}
