//! Retrieval pipeline for Lexbridge
//!
//! Everything between a raw legal document and the context block handed to the
//! generation service:
//! - `TextChunker` splits document text into overlapping windows at indexing time
//! - `SimilarityScorer` strategies rank chunks against a query
//! - `RetrievalIndex` is the search contract the conversation engine consumes
//! - `ContextAssembler` packs ranked chunks into a token-budgeted prompt context

pub mod chunker;
pub mod context;
pub mod error;
pub mod index;
pub mod score;
pub mod types;

pub use chunker::{TextChunker, TextSlice};
pub use context::{AssembledContext, ContextAssembler};
pub use error::RetrievalError;
pub use index::{InMemoryIndex, RetrievalIndex};
pub use score::{cosine_similarity, EmbeddingScorer, LexicalScorer, SimilarityScorer, TextEmbedder};
pub use types::{DocumentChunk, DocumentMetadata, SearchParams};
