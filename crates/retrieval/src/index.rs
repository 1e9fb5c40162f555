//! Retrieval index contract and the in-memory implementation

use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::chunker::TextChunker;
use crate::error::RetrievalError;
use crate::score::SimilarityScorer;
use crate::types::{DocumentChunk, DocumentMetadata, SearchParams};

/// Search contract the conversation engine consumes.
///
/// Indexing and removal run through the ingestion path; `search` is the only
/// operation the completion orchestrator calls.
#[async_trait::async_trait]
pub trait RetrievalIndex: Send + Sync {
    /// Rank the owner's chunks against `query`.
    ///
    /// Returns chunks scoring at least `params.min_similarity`, sorted by
    /// score descending (ties: shorter chunk first, then document id),
    /// truncated to `params.top_k`. An empty corpus yields `Ok(vec![])`.
    async fn search(
        &self,
        owner_id: Uuid,
        query: &str,
        params: SearchParams,
    ) -> Result<Vec<DocumentChunk>, RetrievalError>;

    /// Chunk and index a document; re-indexing a document replaces its chunks
    async fn index(
        &self,
        document_id: Uuid,
        text: &str,
        metadata: DocumentMetadata,
    ) -> Result<(), RetrievalError>;

    /// Drop all chunks of a document
    async fn remove(&self, document_id: Uuid) -> Result<(), RetrievalError>;
}

struct IndexedChunk {
    owner_id: Uuid,
    document_id: Uuid,
    title: String,
    content: String,
}

/// In-memory retrieval index.
///
/// Chunks documents on `index()` and scores them with the configured strategy
/// on `search()`. The threshold/sort/top-k contract is applied here, in one
/// place, so swapping scorers cannot change result semantics.
pub struct InMemoryIndex {
    chunker: TextChunker,
    scorer: Arc<dyn SimilarityScorer>,
    entries: RwLock<Vec<IndexedChunk>>,
}

impl InMemoryIndex {
    pub fn new(chunker: TextChunker, scorer: Arc<dyn SimilarityScorer>) -> Self {
        Self {
            chunker,
            scorer,
            entries: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl RetrievalIndex for InMemoryIndex {
    async fn search(
        &self,
        owner_id: Uuid,
        query: &str,
        params: SearchParams,
    ) -> Result<Vec<DocumentChunk>, RetrievalError> {
        if !(0.0..=1.0).contains(&params.min_similarity) {
            return Err(RetrievalError::InvalidParams(format!(
                "min_similarity must be within 0.0-1.0, got {}",
                params.min_similarity
            )));
        }

        let entries = self
            .entries
            .read()
            .map_err(|_| RetrievalError::IndexUnavailable("index lock poisoned".to_string()))?;

        let mut scored: Vec<DocumentChunk> = Vec::new();
        for entry in entries.iter().filter(|e| e.owner_id == owner_id) {
            let score = self.scorer.score(query, &entry.content)?;
            if score >= params.min_similarity {
                scored.push(DocumentChunk {
                    document_id: entry.document_id,
                    title: entry.title.clone(),
                    content: entry.content.clone(),
                    similarity_score: score,
                });
            }
        }

        scored.sort_by(|a, b| {
            b.similarity_score
                .partial_cmp(&a.similarity_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.content.len().cmp(&b.content.len()))
                .then_with(|| a.document_id.cmp(&b.document_id))
        });
        scored.truncate(params.top_k);

        tracing::debug!(
            owner_id = %owner_id,
            results = scored.len(),
            top_k = params.top_k,
            "retrieval search complete"
        );

        Ok(scored)
    }

    async fn index(
        &self,
        document_id: Uuid,
        text: &str,
        metadata: DocumentMetadata,
    ) -> Result<(), RetrievalError> {
        let slices = self.chunker.chunk(text);

        let mut entries = self
            .entries
            .write()
            .map_err(|_| RetrievalError::IndexUnavailable("index lock poisoned".to_string()))?;

        entries.retain(|e| e.document_id != document_id);
        for slice in slices {
            entries.push(IndexedChunk {
                owner_id: metadata.owner_id,
                document_id,
                title: metadata.title.clone(),
                content: slice.content,
            });
        }

        Ok(())
    }

    async fn remove(&self, document_id: Uuid) -> Result<(), RetrievalError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| RetrievalError::IndexUnavailable("index lock poisoned".to_string()))?;
        entries.retain(|e| e.document_id != document_id);
        Ok(())
    }
}
