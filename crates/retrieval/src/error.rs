//! Retrieval error types

use thiserror::Error;

/// Errors from the retrieval pipeline
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("embedding failed: {0}")]
    EmbeddingFailed(String),

    #[error("invalid search parameters: {0}")]
    InvalidParams(String),
}

impl From<RetrievalError> for lexbridge_common::Error {
    fn from(err: RetrievalError) -> Self {
        lexbridge_common::Error::Retrieval(err.to_string())
    }
}
