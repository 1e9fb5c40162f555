//! Mock Generation Service Implementation
//!
//! Minimal mock used by `GenerationServiceFactory` when provider is `"mock"`.
//! Returns deterministic responses for testing.

use crate::{GenerationError, GenerationRequest, GenerationResponse, GenerationService};

/// Mock generation service for testing
#[derive(Debug, Clone)]
pub struct MockGenerationService;

impl MockGenerationService {
    /// Create a new mock generation service
    pub fn new() -> Self {
        Self
    }
}

impl Default for MockGenerationService {
    fn default() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl GenerationService for MockGenerationService {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        tracing::info!("Mock generation service processing request");

        let model = if request.model.is_empty() {
            "mock-model".to_string()
        } else {
            request.model
        };

        // Generate a simple response based on the last user message
        let last_message = request
            .messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or("empty");

        let content = match request.context {
            Some(ref ctx) if !ctx.is_empty() => {
                format!("Mock grounded response to: {}", last_message)
            }
            _ => format!("Mock response to: {}", last_message),
        };

        let input_tokens = request
            .messages
            .iter()
            .map(|m| m.content.len() as i64 / 4)
            .sum::<i64>();
        let output_tokens = content.len() as i64 / 4;

        Ok(GenerationResponse {
            content,
            model,
            input_tokens,
            output_tokens,
            stop_reason: "end_turn".to_string(),
        })
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }
}

/// Generation service that always fails; used to exercise abort paths
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, Default)]
pub struct FailingGenerationService;

#[cfg(any(test, feature = "test-support"))]
#[async_trait::async_trait]
impl GenerationService for FailingGenerationService {
    async fn generate(
        &self,
        _request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        Err(GenerationError::Request("upstream unavailable".to_string()))
    }

    fn default_model(&self) -> &str {
        "failing-model"
    }
}
