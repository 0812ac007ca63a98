//! # career-rag-embed
//!
//! Text embeddings for the career RAG pipeline, generated locally with
//! FastEmbed ONNX models and exposed through the [`EmbeddingProvider`] trait so
//! that the indexing pipeline and the retriever can be driven by any backend.
//!
//! ## Quick Start
//!
//! ```no_run
//! use career_rag_embed::{EmbedConfig, EmbeddingProvider, FastEmbedProvider};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = FastEmbedProvider::create(EmbedConfig::default()).await?;
//!
//! let texts = vec!["Software engineer".to_string(), "Nurse".to_string()];
//! let result = provider.embed_texts(&texts).await?;
//!
//! println!("Generated {} embeddings of dimension {}",
//!          result.len(), result.dimension);
//! # Ok(())
//! # }
//! ```
//!
//! ## Memory Usage
//!
//! Embeddings are returned as half-precision (f16) vectors, L2-normalized by
//! default. The model itself lives inside the provider; there is no global
//! cache, so construct one provider at startup and share it.

pub mod config;
pub mod error;
pub mod provider;

pub use config::{DEFAULT_MODEL_NAME, EmbedConfig};
pub use error::{EmbedError, Result};
pub use provider::{EmbeddingProvider, EmbeddingResult, FastEmbedProvider};
