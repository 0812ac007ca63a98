//! Storage abstraction for chunk vectors.
//!
//! The indexing pipeline and the retriever talk to a [`VectorIndex`]: a named
//! collection of `(id, embedding, document text, metadata)` records that can be
//! counted, deleted by id, upserted in batches and queried for nearest
//! neighbours. [`sqlite_store::SqliteVectorIndex`] is the concrete
//! implementation; tests plug in their own.
//!
//! ## Architecture
//!
//! ```text
//! IndexingPipeline ─┐
//!                   ├─ VectorIndex ── SqliteVectorIndex
//! Retriever ────────┘
//! ```
//!
//! ## Distances
//!
//! `query` returns matches ordered from nearest to farthest together with the
//! backend's distance. Callers turn a distance into a similarity as
//! `1 - distance` and keep the backend's order.

use anyhow::Result;
use async_trait::async_trait;
use half::f16;
use serde::{Deserialize, Serialize};

pub mod sqlite_store;

/// Provenance stored next to every vector. See module docs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// File name of the source document
    pub source: String,
    /// Position of the source document in the batch it was indexed with
    pub doc_id: usize,
    /// Position of the chunk inside its document
    pub chunk_id: usize,
}

/// One record to write into the index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedVector {
    pub id: String,
    pub embedding: Vec<f16>,
    pub document: String,
    pub metadata: ChunkMetadata,
}

/// One nearest-neighbour result. See module docs for the distance convention.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorMatch {
    pub id: String,
    pub document: String,
    pub distance: f32,
    pub metadata: ChunkMetadata,
}

/// A named collection of chunk vectors. See module docs for usage.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Name of the collection this handle reads and writes
    fn collection(&self) -> &str;

    /// Number of records in the collection
    async fn count(&self) -> Result<usize>;

    /// Delete records by id, ignoring ids that are not present. Returns how many were removed.
    async fn delete(&self, ids: &[String]) -> Result<usize>;

    /// Insert records, replacing any record with the same id
    async fn upsert(&self, records: Vec<IndexedVector>) -> Result<()>;

    /// Up to `limit` records nearest to `embedding`, nearest first
    async fn query(&self, embedding: &[f16], limit: usize) -> Result<Vec<VectorMatch>>;

    /// Ids of every record in insertion order
    async fn list_ids(&self) -> Result<Vec<String>>;
}
