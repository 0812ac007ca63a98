//! Rebuilds the vector collection from the document folder when it is stale.
//!
//! ## Pipeline Flow
//!
//! ```text
//! docs folder → load_documents → WindowChunker → EmbeddingProvider → VectorIndex
//!      ↓                                                                  ↓
//! snapshot_folder ─────────────── FreshnessTracker ────────── save_snapshot
//! ```
//!
//! A rebuild is all-or-nothing from the caller's point of view:
//!
//! 1. Chunk every document and give the chunks global ids `chunk_0 .. chunk_{N-1}`
//!    in document-major order.
//! 2. Embed all chunk texts in one batch.
//! 3. Delete `chunk_0 .. chunk_{count-1}` using the collection's current count.
//! 4. Upsert the new records.
//! 5. Save the folder snapshot.
//!
//! If there are no documents, no chunks or no embeddings the collection and
//! the snapshot are left untouched. Any error aborts before the snapshot is
//! saved, so the next check sees the index as stale again.
//!
//! The delete and the upsert are two separate writes. A crash between them
//! leaves an empty collection, which the freshness check treats as stale.
//!
//! ## Concurrency
//!
//! [`IndexingPipeline::ensure_fresh`], [`IndexingPipeline::rebuild`] and
//! [`IndexingPipeline::clear_index`] serialize on one async mutex owned by the
//! pipeline. Concurrent requests wait for an in-flight rebuild and then see the
//! rebuilt collection instead of starting a second one.

use anyhow::{Result, bail};
use career_rag_context::{Document, TextChunk, WindowChunker, load_documents};
use career_rag_embed::EmbeddingProvider;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::freshness::{FolderSnapshot, FreshnessTracker, StaleReason};
use crate::config::RetrieverConfig;
use crate::storage::{ChunkMetadata, IndexedVector, VectorIndex};

/// Why a rebuild left the index untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoDocuments,
    NoChunks,
    NoEmbeddings,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SkipReason::NoDocuments => "no documents to index",
            SkipReason::NoChunks => "documents produced no chunks",
            SkipReason::NoEmbeddings => "embedding backend returned no vectors",
        };
        f.write_str(text)
    }
}

/// Result of [`IndexingPipeline::rebuild`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// The collection now holds exactly `chunks` records
    Rebuilt { chunks: usize },
    /// Nothing was written
    Skipped(SkipReason),
}

/// Result of [`IndexingPipeline::ensure_fresh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The existing collection was already current
    Fresh,
    /// The collection was stale and has been rebuilt
    Rebuilt { chunks: usize, reason: StaleReason },
    /// The collection was stale but could not be rebuilt
    Unavailable(SkipReason),
}

impl Freshness {
    /// Whether the collection can be queried.
    pub fn is_ready(&self) -> bool {
        !matches!(self, Freshness::Unavailable(_))
    }
}

/// Storage id of the chunk at global position `position`.
pub fn chunk_storage_id(position: usize) -> String {
    format!("chunk_{position}")
}

/// Ids for a batch of chunks, `chunk_0 .. chunk_{N-1}` in batch order.
pub fn assign_chunk_ids(chunks: &[TextChunk]) -> Vec<String> {
    (0..chunks.len()).map(chunk_storage_id).collect()
}

/// Orchestrates freshness checks and rebuilds. See module docs.
pub struct IndexingPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    tracker: FreshnessTracker,
    chunker: WindowChunker,
    docs_dir: PathBuf,
    rebuild_lock: Mutex<()>,
}

impl IndexingPipeline {
    /// Create a pipeline over an already opened index.
    ///
    /// # Arguments
    /// * `config` - Folder locations and chunking geometry
    /// * `embedder` - Embedding backend used for chunk texts
    /// * `index` - Vector collection to keep in sync with the folder
    ///
    /// # Errors
    /// Fails when the configured chunk overlap is not smaller than the chunk size.
    pub fn new(
        config: &RetrieverConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Result<Self> {
        let chunker = WindowChunker::new(config.window_config()?);
        Ok(Self {
            embedder,
            index,
            tracker: FreshnessTracker::new(&config.persist_dir),
            chunker,
            docs_dir: config.docs_dir.clone(),
            rebuild_lock: Mutex::new(()),
        })
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    pub fn tracker(&self) -> &FreshnessTracker {
        &self.tracker
    }

    pub fn docs_dir(&self) -> &Path {
        &self.docs_dir
    }

    /// Check the folder against the stored snapshot and rebuild if stale.
    ///
    /// The whole check-and-rebuild runs under the pipeline lock.
    pub async fn ensure_fresh(&self) -> Result<Freshness> {
        let _guard = self.rebuild_lock.lock().await;

        let check = self
            .tracker
            .should_reindex(self.index.as_ref(), &self.docs_dir)
            .await?;
        let Some(reason) = check.reason else {
            return Ok(Freshness::Fresh);
        };

        info!("Reindexing documents ({})", reason);
        let documents = self.load_documents().await?;
        match self.rebuild_locked(&documents, &check.snapshot).await? {
            RebuildOutcome::Rebuilt { chunks } => Ok(Freshness::Rebuilt { chunks, reason }),
            RebuildOutcome::Skipped(skip) => Ok(Freshness::Unavailable(skip)),
        }
    }

    /// Replace the collection with `documents` and record `snapshot`. See module docs.
    pub async fn rebuild(
        &self,
        documents: &[Document],
        snapshot: &FolderSnapshot,
    ) -> Result<RebuildOutcome> {
        let _guard = self.rebuild_lock.lock().await;
        self.rebuild_locked(documents, snapshot).await
    }

    /// Rebuild from the folder regardless of the stored snapshot.
    pub async fn force_rebuild(&self) -> Result<RebuildOutcome> {
        let _guard = self.rebuild_lock.lock().await;
        let snapshot = super::freshness::snapshot_folder(&self.docs_dir).await?;
        let documents = self.load_documents().await?;
        self.rebuild_locked(&documents, &snapshot).await
    }

    /// Delete every indexed chunk and the stored snapshot so the next
    /// [`ensure_fresh`](Self::ensure_fresh) rebuilds. Returns how many ids were deleted.
    pub async fn clear_index(&self) -> Result<usize> {
        let _guard = self.rebuild_lock.lock().await;

        let count = self.index.count().await?;
        let ids: Vec<String> = (0..count).map(chunk_storage_id).collect();
        if !ids.is_empty() {
            self.index.delete(&ids).await?;
            info!("Deleted {} chunks from index", ids.len());
        }
        if self.tracker.clear_snapshot().await? {
            info!("Deleted index metadata");
        }
        Ok(ids.len())
    }

    async fn load_documents(&self) -> Result<Vec<Document>> {
        let folder = self.docs_dir.clone();
        let documents = tokio::task::spawn_blocking(move || load_documents(&folder)).await??;
        Ok(documents)
    }

    async fn rebuild_locked(
        &self,
        documents: &[Document],
        snapshot: &FolderSnapshot,
    ) -> Result<RebuildOutcome> {
        if documents.is_empty() {
            warn!("No documents in {}", self.docs_dir.display());
            return Ok(RebuildOutcome::Skipped(SkipReason::NoDocuments));
        }

        let chunks = self.chunker.chunk_documents(documents);
        if chunks.is_empty() {
            warn!("{} documents produced no chunks", documents.len());
            return Ok(RebuildOutcome::Skipped(SkipReason::NoChunks));
        }
        debug!(
            "Chunked {} documents into {} chunks",
            documents.len(),
            chunks.len()
        );

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_texts(&texts).await?;
        if embeddings.is_empty() {
            warn!("Embedding backend returned nothing for {} chunks", chunks.len());
            return Ok(RebuildOutcome::Skipped(SkipReason::NoEmbeddings));
        }
        if embeddings.len() != chunks.len() {
            bail!(
                "embedding backend returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            );
        }

        let ids = assign_chunk_ids(&chunks);
        let records: Vec<IndexedVector> = ids
            .into_iter()
            .zip(chunks)
            .zip(embeddings.embeddings)
            .map(|((id, chunk), embedding)| IndexedVector {
                id,
                embedding,
                document: chunk.text,
                metadata: ChunkMetadata {
                    source: chunk.source,
                    doc_id: chunk.doc_id,
                    chunk_id: chunk.chunk_id,
                },
            })
            .collect();
        let total = records.len();

        let previous = self.index.count().await?;
        let stale_ids: Vec<String> = (0..previous).map(chunk_storage_id).collect();
        if !stale_ids.is_empty() {
            self.index.delete(&stale_ids).await?;
        }
        self.index.upsert(records).await?;

        self.tracker.save_snapshot(snapshot).await?;
        info!(
            "Indexed {} chunks into {} (replaced {})",
            total,
            self.index.collection(),
            previous
        );
        Ok(RebuildOutcome::Rebuilt { chunks: total })
    }
}
