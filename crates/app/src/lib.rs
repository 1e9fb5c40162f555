//! Lexbridge application composition root
//!
//! Wires configuration, the database pool and the external collaborators into
//! the conversation engine. The transport layer (out of process) calls the
//! returned service.

use std::sync::Arc;

use lexbridge_common::Config;
use lexbridge_conversations::{ConversationService, PgConversationStore};
use lexbridge_llm::{GenerationConfig, GenerationServiceFactory};
use lexbridge_retrieval::{
    ContextAssembler, InMemoryIndex, LexicalScorer, RetrievalIndex, SearchParams, TextChunker,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Initialize tracing from RUST_LOG, falling back to the configured default
pub fn init_tracing(config: &Config) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.rust_log.clone()));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Connect the Postgres pool
pub async fn connect_pool(config: &Config) -> Result<PgPool, anyhow::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    Ok(pool)
}

/// Assemble the conversation engine from configuration.
///
/// The retrieval index is the in-memory lexical one until an embedding
/// collaborator is configured; swap the `Arc<dyn RetrievalIndex>` here to
/// change strategies without touching the engine.
pub fn build_engine(pool: PgPool, config: &Config) -> Result<ConversationService, anyhow::Error> {
    let generation = GenerationServiceFactory::create(
        &config.llm_provider,
        GenerationConfig {
            api_key: config.anthropic_api_key.clone(),
            default_model: config.llm_model.clone(),
            max_tokens: config.llm_max_tokens,
            base_url: None,
        },
    )?;

    let retrieval: Arc<dyn RetrievalIndex> = Arc::new(InMemoryIndex::new(
        TextChunker::default(),
        Arc::new(LexicalScorer::new()),
    ));

    let store = Arc::new(PgConversationStore::new(pool));

    let service = ConversationService::new(store, generation, retrieval)
        .with_assembler(ContextAssembler::new(config.context_max_tokens))
        .with_search_params(SearchParams {
            top_k: config.rag_top_k,
            min_similarity: config.rag_min_similarity,
        });

    Ok(service)
}
