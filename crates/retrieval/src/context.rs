//! Context assembly
//!
//! Packs ranked chunks into a prompt context under a token budget. Packing is
//! relevance-first: chunks are taken in the order retrieval ranked them, and
//! the first chunk that would overflow the budget ends the context — a later,
//! smaller chunk never jumps the queue.

use uuid::Uuid;

use crate::types::DocumentChunk;

/// English text averages ~4 chars/token for subword tokenizers.
const CHARS_PER_TOKEN: usize = 4;

/// Separator between packed chunks
const SEPARATOR: &str = "\n---\n";

/// Default context budget in tokens
const DEFAULT_MAX_TOKENS: u32 = 4000;

/// A packed context and the documents that contributed to it
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledContext {
    pub text: String,
    /// Ids of documents whose chunks were packed, deduplicated, in pack order
    pub document_ids: Vec<Uuid>,
}

impl AssembledContext {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Token-budgeted context assembler
#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler {
    max_tokens: u32,
}

impl ContextAssembler {
    pub fn new(max_tokens: u32) -> Self {
        Self { max_tokens }
    }

    /// Budget in characters
    pub fn max_chars(&self) -> usize {
        self.max_tokens as usize * CHARS_PER_TOKEN
    }

    /// Pack chunks in the given order until the budget is hit.
    ///
    /// The separator owed by each additional chunk counts against the budget,
    /// so the output text never exceeds `max_chars()`.
    pub fn assemble(&self, chunks: &[DocumentChunk]) -> AssembledContext {
        let budget = self.max_chars();
        let mut sections: Vec<String> = Vec::new();
        let mut document_ids: Vec<Uuid> = Vec::new();
        let mut total = 0usize;

        for chunk in chunks {
            let formatted = format!("[Document: {}]\n{}\n", chunk.title, chunk.content);
            let separator_len = if sections.is_empty() {
                0
            } else {
                SEPARATOR.len()
            };

            if total + separator_len + formatted.len() > budget {
                break;
            }

            total += separator_len + formatted.len();
            sections.push(formatted);
            if !document_ids.contains(&chunk.document_id) {
                document_ids.push(chunk.document_id);
            }
        }

        AssembledContext {
            text: sections.join(SEPARATOR),
            document_ids,
        }
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TOKENS)
    }
}
