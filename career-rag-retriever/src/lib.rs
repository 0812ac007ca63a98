//! career-rag-retriever: document indexing and retrieval for career guidance
//!
//! This crate keeps a SQLite vector collection in sync with a folder of career
//! documents and answers nearest-chunk queries against it. The folder is
//! snapshotted by file modification time; the collection is rebuilt only when
//! the snapshot changes or the collection is empty.
//!
//! ## Key Modules
//!
//! - **[`retrieval`]**: Freshness tracking, the rebuild pipeline, the retriever and prompt assembly
//! - **[`storage`]**: Vector index abstraction with the SQLite implementation
//! - **[`status`]**: Index statistics for diagnostics
//! - **[`config`]**: Folder locations and chunking parameters
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use career_rag_embed::{EmbedConfig, FastEmbedProvider};
//! use career_rag_retriever::{
//!     config::RetrieverConfig,
//!     retrieval::{indexing_pipeline::IndexingPipeline, prompt::PromptAssembler, retriever::Retriever},
//!     storage::sqlite_store::SqliteVectorIndex,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = RetrieverConfig::new("rag/uploaded_files", "rag_persist");
//! let embedder = Arc::new(FastEmbedProvider::create(EmbedConfig::default()).await?);
//! let index = Arc::new(SqliteVectorIndex::open(&config.database_path(), &config.collection).await?);
//!
//! let pipeline = IndexingPipeline::new(&config, embedder.clone(), index.clone())?;
//! pipeline.ensure_fresh().await?;
//!
//! let chunks = Retriever::new(index, embedder).retrieve_text("Holland code IAS", 10).await?;
//! let prompt = PromptAssembler::default().assemble("Holland code IAS", &chunks);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Folder → Loader → WindowChunker → Embeddings → SQLite Storage
//!   ↓                                               ↓
//! FreshnessTracker ← IndexingPipeline        Retriever → PromptAssembler
//! ```

pub mod config;
pub mod retrieval;
pub mod status;
pub mod storage;
