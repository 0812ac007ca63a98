//! Nearest-chunk lookup over a [`VectorIndex`].

use anyhow::Result;
use career_rag_embed::EmbeddingProvider;
use half::f16;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::storage::{ChunkMetadata, VectorIndex, VectorMatch};

/// A chunk returned by [`Retriever::retrieve`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub id: String,
    pub text: String,
    /// `1 - distance`; higher is more similar
    pub similarity: f32,
    pub metadata: ChunkMetadata,
}

impl From<VectorMatch> for RetrievedChunk {
    fn from(m: VectorMatch) -> Self {
        Self {
            id: m.id,
            text: m.document,
            similarity: 1.0 - m.distance,
            metadata: m.metadata,
        }
    }
}

/// Queries the index with a query embedding.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl Retriever {
    pub fn new(index: Arc<dyn VectorIndex>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { index, embedder }
    }

    /// Up to `top_k` chunks nearest to `query_embedding`, in the index's order.
    ///
    /// # Arguments
    /// * `query_embedding` - Vector with the same dimension as the indexed chunks
    /// * `top_k` - Maximum number of chunks; `0` returns nothing without querying
    ///
    /// # Returns
    /// Chunks with `similarity = 1 - distance`. The order is the backend's
    /// nearest-first order and is not re-sorted here.
    pub async fn retrieve(
        &self,
        query_embedding: &[f16],
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let matches = self.index.query(query_embedding, top_k).await?;
        let chunks: Vec<RetrievedChunk> = matches.into_iter().map(RetrievedChunk::from).collect();
        if chunks.iter().any(|c| c.similarity < 0.0) {
            debug!("Retrieved chunks include negative similarity");
        }
        debug!(
            "Retrieved {} chunks from {}",
            chunks.len(),
            self.index.collection()
        );
        Ok(chunks)
    }

    /// Embed `query` and [`retrieve`](Self::retrieve) with it.
    pub async fn retrieve_text(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedChunk>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let embedding = self.embedder.embed_text(query).await?;
        self.retrieve(&embedding, top_k).await
    }
}
