//! Document loading and sliding-window chunking for the career RAG pipeline.
//!
//! - [`document`]: the [`Document`] type and a non-recursive folder loader
//! - [`window`]: fixed-width overlapping windows producing [`TextChunk`]s

pub mod document;
pub mod window;

pub use document::{Document, load_documents};
pub use window::{
    ChunkingError, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, TextChunk, WindowChunker,
    WindowConfig,
};
