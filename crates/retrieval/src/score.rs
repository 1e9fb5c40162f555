//! Similarity scoring strategies
//!
//! Scoring is pluggable behind `SimilarityScorer` so the index can move from
//! lexical overlap to embedding cosine similarity without touching the search
//! contract or its consumers.

use std::sync::Arc;

use crate::error::RetrievalError;

/// Scores a chunk of text against a query, 0.0–1.0
pub trait SimilarityScorer: Send + Sync {
    fn score(&self, query: &str, content: &str) -> Result<f32, RetrievalError>;
}

/// Lexical term-overlap scorer.
///
/// Score is the fraction of distinct query terms present in the chunk.
/// Deterministic, cheap, and embedding-free; the shipped default until an
/// embedding collaborator is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalScorer;

impl LexicalScorer {
    pub fn new() -> Self {
        Self
    }
}

fn terms(text: &str) -> Vec<String> {
    let mut out: Vec<String> = text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect();
    out.sort();
    out.dedup();
    out
}

impl SimilarityScorer for LexicalScorer {
    fn score(&self, query: &str, content: &str) -> Result<f32, RetrievalError> {
        let query_terms = terms(query);
        if query_terms.is_empty() {
            return Ok(0.0);
        }

        let content_terms = terms(content);

        let matched = query_terms
            .iter()
            .filter(|t| content_terms.binary_search(t).is_ok())
            .count();

        Ok(matched as f32 / query_terms.len() as f32)
    }
}

/// Embedding collaborator contract; implementations live outside this core
pub trait TextEmbedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError>;
}

/// Cosine-similarity scorer over an embedding collaborator.
///
/// The intended production strategy; scores are clamped to 0.0–1.0 so the
/// threshold contract holds regardless of the embedding space.
pub struct EmbeddingScorer {
    embedder: Arc<dyn TextEmbedder>,
}

impl EmbeddingScorer {
    pub fn new(embedder: Arc<dyn TextEmbedder>) -> Self {
        Self { embedder }
    }
}

impl SimilarityScorer for EmbeddingScorer {
    fn score(&self, query: &str, content: &str) -> Result<f32, RetrievalError> {
        let query_embedding = self.embedder.embed(query)?;
        let content_embedding = self.embedder.embed(content)?;
        Ok(cosine_similarity(&query_embedding, &content_embedding).clamp(0.0, 1.0))
    }
}

/// Cosine similarity between two vectors; 0.0 for mismatched or zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
