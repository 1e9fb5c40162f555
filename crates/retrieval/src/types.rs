//! Retrieval value types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default number of chunks returned by a search
pub const DEFAULT_TOP_K: usize = 5;

/// Default minimum similarity score for a chunk to be returned
pub const DEFAULT_MIN_SIMILARITY: f32 = 0.7;

/// A scored slice of a source document.
///
/// Transient: produced by retrieval, consumed by the context assembler,
/// never persisted by the conversation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub document_id: Uuid,
    pub title: String,
    pub content: String,
    /// Similarity to the query, 0.0–1.0
    pub similarity_score: f32,
}

/// Metadata supplied when a document is indexed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Owner whose corpus this document belongs to
    pub owner_id: Uuid,
    pub title: String,
    /// Original source reference (file name, upload id), if any
    pub source: Option<String>,
}

/// Search tuning parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SearchParams {
    /// Maximum number of chunks to return
    pub top_k: usize,
    /// Minimum similarity score, 0.0–1.0
    pub min_similarity: f32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            min_similarity: DEFAULT_MIN_SIMILARITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_params_defaults() {
        let params = SearchParams::default();
        assert_eq!(params.top_k, 5);
        assert!((params.min_similarity - 0.7).abs() < f32::EPSILON);
    }
}
