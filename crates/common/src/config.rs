//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database connection URL (PostgreSQL)
    pub database_url: String,

    /// Generation provider selection ("anthropic" or "mock")
    pub llm_provider: String,
    pub anthropic_api_key: String,
    pub llm_model: String,
    pub llm_max_tokens: u32,

    /// Retrieval defaults
    pub rag_top_k: usize,
    pub rag_min_similarity: f32,
    pub context_max_tokens: u32,

    /// Runtime configuration
    pub log_level: String,
    pub rust_log: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let llm_provider = env::var("LLM_PROVIDER").unwrap_or_else(|_| "anthropic".to_string());

        // The API key is only mandatory when the real provider is selected
        let anthropic_api_key = match llm_provider.as_str() {
            "mock" => env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
            _ => env::var("ANTHROPIC_API_KEY")
                .map_err(|_| anyhow::anyhow!("ANTHROPIC_API_KEY is required"))?,
        };

        let config = Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL is required"))?,

            llm_provider,
            anthropic_api_key,
            llm_model: env::var("LLM_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-5-20250929".to_string()),
            llm_max_tokens: env::var("LLM_MAX_TOKENS")
                .unwrap_or_else(|_| "1024".to_string())
                .parse()
                .unwrap_or(1024),

            rag_top_k: env::var("RAG_TOP_K")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            rag_min_similarity: env::var("RAG_MIN_SIMILARITY")
                .unwrap_or_else(|_| "0.7".to_string())
                .parse()
                .unwrap_or(0.7),
            context_max_tokens: env::var("CONTEXT_MAX_TOKENS")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .unwrap_or(4000),

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "lexbridge=debug".to_string()),
        };

        Ok(config)
    }
}
