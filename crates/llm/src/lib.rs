//! Generation service for Lexbridge
//!
//! Defines the `GenerationService` contract the conversation engine calls with
//! linear chat history and optional retrieved document context, plus the
//! provider implementations: the Anthropic Messages API client and a
//! deterministic mock for tests and local development.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub mod anthropic;
pub mod mock;

pub use anthropic::AnthropicService;
pub use mock::MockGenerationService;

/// Chat roles understood by generation providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

/// One entry of the linear conversation history sent to a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// A completion request: history plus optional retrieved context
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Model identifier; empty string selects the provider default
    pub model: String,
    /// Base system prompt, if any
    pub system_prompt: Option<String>,
    /// Retrieved document context to ground the reply, if any
    pub context: Option<String>,
    /// Linear conversation history, oldest first
    pub messages: Vec<ChatMessage>,
    /// Response token cap; None uses the provider configuration
    pub max_tokens: Option<u32>,
}

/// A completion response from a provider
#[derive(Debug, Clone)]
pub struct GenerationResponse {
    pub content: String,
    pub model: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub stop_reason: String,
}

/// Errors from generation providers
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("bad response: {0}")]
    Response(String),

    #[error("rate limited by provider")]
    RateLimit,

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<GenerationError> for lexbridge_common::Error {
    fn from(err: GenerationError) -> Self {
        lexbridge_common::Error::Generation(err.to_string())
    }
}

/// Provider configuration
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub api_key: String,
    pub default_model: String,
    pub max_tokens: u32,
    pub base_url: Option<String>,
}

/// Contract every generation provider satisfies
#[async_trait::async_trait]
pub trait GenerationService: Send + Sync {
    /// Generate an assistant reply for the given history and context
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError>;

    /// The model used when a request does not name one
    fn default_model(&self) -> &str;
}

/// Builds the configured provider
pub struct GenerationServiceFactory;

impl GenerationServiceFactory {
    /// Create a provider by name: "anthropic" or "mock"
    pub fn create(
        provider: &str,
        config: GenerationConfig,
    ) -> Result<Arc<dyn GenerationService>, GenerationError> {
        match provider {
            "anthropic" => {
                if config.api_key.is_empty() {
                    return Err(GenerationError::Configuration(
                        "anthropic provider requires an API key".to_string(),
                    ));
                }
                Ok(Arc::new(AnthropicService::new(config)))
            }
            "mock" => Ok(Arc::new(MockGenerationService::new())),
            other => Err(GenerationError::Configuration(format!(
                "unknown generation provider: {}",
                other
            ))),
        }
    }
}

/// Fold the base system prompt and retrieved context into one system string.
///
/// Providers that take a dedicated system field (Anthropic) call this; the
/// context block is appended after the base prompt so instructions keep
/// precedence over source material.
pub(crate) fn compose_system(
    system_prompt: Option<&str>,
    context: Option<&str>,
) -> Option<String> {
    match (system_prompt, context) {
        (None, None) => None,
        (Some(p), None) => Some(p.to_string()),
        (None, Some(c)) => Some(format!("Relevant documents:\n{}", c)),
        (Some(p), Some(c)) => Some(format!("{}\n\nRelevant documents:\n{}", p, c)),
    }
}
