//! Fixed-width sliding-window chunking for career documents.
//!
//! Documents are cut into windows of `chunk_size` characters. Each window starts
//! `chunk_size - overlap` characters after the previous one, so consecutive
//! windows share exactly `overlap` characters. The last window may be shorter
//! than `chunk_size`. Window text is trimmed of surrounding whitespace before it
//! becomes a [`TextChunk`].
//!
//! Widths and offsets are counted in characters (Unicode scalar values), never
//! bytes, so Arabic and other multi-byte text is cut on character boundaries.
//!
//! # Example
//!
//! ```
//! use career_rag_context::window::{WindowChunker, WindowConfig};
//! use career_rag_context::Document;
//!
//! let config = WindowConfig::new(500, 50).unwrap();
//! let chunker = WindowChunker::new(config);
//!
//! let doc = Document::new("careers.txt", "a".repeat(1200));
//! let chunks = chunker.chunk_document(0, &doc);
//!
//! assert_eq!(chunks.len(), 3);
//! assert_eq!(chunks[0].length, 500);
//! assert_eq!(chunks[2].length, 300);
//! assert_eq!(chunks[2].chunk_id, 2);
//! ```
//!
//! # Spans
//!
//! [`WindowChunker::spans`] exposes the untrimmed character ranges. For a text of
//! length `L` the ranges start at `0, s, 2s, ...` (with `s = chunk_size - overlap`)
//! for every start below `L`, and each range ends at `min(start + chunk_size, L)`.
//! Their union is always `0..L`.

use crate::document::Document;
use serde::Serialize;
use std::ops::Range;

/// Default window width in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Default number of characters shared by consecutive windows.
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Rejected window configurations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChunkingError {
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,

    /// An overlap this large would never advance the window.
    #[error("overlap ({overlap}) must be smaller than chunk size ({chunk_size})")]
    InvalidOverlap { chunk_size: usize, overlap: usize },
}

/// Validated window geometry.
///
/// Construct with [`WindowConfig::new`]; the fields are private so that an
/// instance always satisfies `0 < overlap + 1 <= chunk_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    chunk_size: usize,
    overlap: usize,
}

impl WindowConfig {
    /// Build a configuration, rejecting a zero width or an overlap that is not
    /// strictly smaller than the width.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ChunkingError> {
        if chunk_size == 0 {
            return Err(ChunkingError::ZeroChunkSize);
        }
        if overlap >= chunk_size {
            return Err(ChunkingError::InvalidOverlap {
                chunk_size,
                overlap,
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Distance between the starts of two consecutive windows.
    pub fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// A trimmed window of a document together with its provenance.
///
/// `doc_id` is the position of the source document in the batch that was
/// chunked and `chunk_id` is the position of the window inside that document.
/// `length` is the character count of `text` after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextChunk {
    pub text: String,
    pub source: String,
    pub doc_id: usize,
    pub chunk_id: usize,
    #[serde(rename = "chunk_length")]
    pub length: usize,
}

/// Sliding-window chunker. Cheap to copy; holds only its configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowChunker {
    config: WindowConfig,
}

impl WindowChunker {
    pub fn new(config: WindowConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Untrimmed window ranges over `text`, in character offsets.
    pub fn spans(&self, text: &str) -> Vec<Range<usize>> {
        span_ranges(text.chars().count(), &self.config)
    }

    /// Trimmed window texts, in order.
    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        span_ranges(chars.len(), &self.config)
            .into_iter()
            .map(|span| {
                let window: String = chars[span].iter().collect();
                window.trim().to_string()
            })
            .collect()
    }

    /// Chunk one document. `doc_id` is recorded on every produced chunk.
    pub fn chunk_document(&self, doc_id: usize, document: &Document) -> Vec<TextChunk> {
        self.split(&document.content)
            .into_iter()
            .enumerate()
            .map(|(chunk_id, text)| TextChunk {
                length: text.chars().count(),
                text,
                source: document.source.clone(),
                doc_id,
                chunk_id,
            })
            .collect()
    }

    /// Chunk a batch of documents in document-major, chunk-minor order.
    pub fn chunk_documents(&self, documents: &[Document]) -> Vec<TextChunk> {
        let mut all_chunks = Vec::new();
        for (doc_id, document) in documents.iter().enumerate() {
            let chunks = self.chunk_document(doc_id, document);
            tracing::debug!(
                "Chunked {} into {} chunks (size: {}, overlap: {})",
                document.source,
                chunks.len(),
                self.config.chunk_size,
                self.config.overlap
            );
            all_chunks.extend(chunks);
        }
        all_chunks
    }
}

fn span_ranges(len: usize, config: &WindowConfig) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = 0;
    while start < len {
        let end = (start + config.chunk_size).min(len);
        spans.push(start..end);
        start += config.stride();
    }
    spans
}
