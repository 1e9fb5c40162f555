//! Document chunking
//!
//! Splits raw document text into overlapping windows at indexing time.
//! Windows prefer to end just after a sentence boundary (". ") when one falls
//! in the back half of the window, so chunks rarely cut a sentence in two.

/// Sentence boundary searched for when snapping a window end
const SENTENCE_BOUNDARY: &str = ". ";

/// A chunk of document text with its offset into the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSlice {
    pub content: String,
    /// Byte offset of the window start in the source text
    pub offset: usize,
}

/// Windowed text chunker with sentence-boundary snapping
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            overlap,
        }
    }

    /// Split `text` into overlapping windows.
    ///
    /// Deterministic and idempotent for identical inputs and parameters;
    /// emitted offsets strictly increase.
    pub fn chunk(&self, text: &str) -> Vec<TextSlice> {
        let len = text.len();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < len {
            let mut end = floor_char_boundary(text, (start + self.chunk_size).min(len));

            if end < len {
                // Snap to just after the last ". " in the window, but only when
                // the boundary lies past the window midpoint; a near-front
                // boundary would produce a degenerately short chunk.
                if let Some(pos) = text[start..end].rfind(SENTENCE_BOUNDARY) {
                    let boundary_end = start + pos + SENTENCE_BOUNDARY.len();
                    if boundary_end > start + self.chunk_size / 2 {
                        end = boundary_end;
                    }
                }
            }

            let piece = text[start..end].trim();
            if !piece.is_empty() {
                chunks.push(TextSlice {
                    content: piece.to_string(),
                    offset: start,
                });
            }

            if end >= len {
                break;
            }

            let next = floor_char_boundary(text, end.saturating_sub(self.overlap));
            // Termination guard for degenerate parameters (overlap >= window)
            start = if next > start { next } else { end };
        }

        chunks
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(1000, 200)
    }
}

/// Largest index <= `index` that lands on a char boundary
fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}
