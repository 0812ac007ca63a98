//! Embedding provider implementations

use crate::config::EmbedConfig;
use crate::error::{EmbedError, Result};
use async_trait::async_trait;
use fastembed::{InitOptions, TextEmbedding};
use half::f16;
use std::sync::{Arc, Mutex};

/// Result of embedding generation
#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    /// The generated embeddings, one per input text
    pub embeddings: Vec<Vec<f16>>,
    /// The dimension of each embedding vector
    pub dimension: usize,
}

impl EmbeddingResult {
    /// Create a new embedding result. The dimension is taken from the first
    /// vector, or 0 when there are none.
    pub fn new(embeddings: Vec<Vec<f16>>) -> Self {
        let dimension = embeddings.first().map(|e| e.len()).unwrap_or(0);
        Self {
            embeddings,
            dimension,
        }
    }

    /// Number of embedding vectors, one per embedded text.
    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }
}

/// Trait for embedding providers that can generate embeddings from text
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for a single text
    async fn embed_text(&self, text: &str) -> Result<Vec<f16>>;

    /// Generate embeddings for multiple texts (batch processing)
    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult>;

    /// Get the dimension of embeddings produced by this provider
    fn embedding_dimension(&self) -> usize;

    /// Get the name/identifier of this provider
    fn provider_name(&self) -> &str;
}

/// FastEmbed-based embedding provider running a local ONNX model.
///
/// The model is loaded once by [`FastEmbedProvider::create`] and owned by the
/// provider. Share one provider through an `Arc<dyn EmbeddingProvider>` rather
/// than creating several.
#[derive(Clone)]
pub struct FastEmbedProvider {
    config: EmbedConfig,
    model: Arc<Mutex<TextEmbedding>>,
    dimension: usize,
}

impl std::fmt::Debug for FastEmbedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedProvider")
            .field("config", &self.config)
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl FastEmbedProvider {
    /// Download (if needed) and load the configured model.
    pub async fn create(config: EmbedConfig) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            "Initializing FastEmbed provider for model: {}",
            config.model_name()
        );

        tokio::fs::create_dir_all(&config.cache_dir).await?;

        let load_config = config.clone();
        let (model, dimension) =
            tokio::task::spawn_blocking(move || -> Result<(TextEmbedding, usize)> {
                tracing::info!("Loading embedding model: {}", load_config.model_name());

                let init_options = InitOptions::new(load_config.fastembed_model()?)
                    .with_cache_dir(load_config.cache_dir.clone())
                    .with_show_download_progress(load_config.show_download_progress);

                let mut model =
                    TextEmbedding::try_new(init_options).map_err(EmbedError::model_init)?;

                // Probe the dimension with a throwaway embedding
                let probe = model
                    .embed(vec!["test".to_string()], None)
                    .map_err(EmbedError::model_init)?;
                let dimension = probe.first().map(|emb| emb.len()).unwrap_or(0);
                if dimension == 0 {
                    return Err(EmbedError::model_init(anyhow::anyhow!(
                        "model produced an empty probe embedding"
                    )));
                }

                tracing::info!("Model loaded successfully. Dimension: {}", dimension);
                Ok((model, dimension))
            })
            .await??;

        Ok(Self {
            config,
            model: Arc::new(Mutex::new(model)),
            dimension,
        })
    }

    pub fn config(&self) -> &EmbedConfig {
        &self.config
    }
}

/// Convert f32 embeddings to f16, normalizing each vector when asked to.
fn convert_to_f16(embeddings: Vec<Vec<f32>>, normalize: bool) -> Vec<Vec<f16>> {
    embeddings
        .into_iter()
        .map(|embedding| {
            let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
            let scale = if normalize && norm > 0.0 { 1.0 / norm } else { 1.0 };
            embedding
                .into_iter()
                .map(|value| f16::from_f32(value * scale))
                .collect()
        })
        .collect()
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed_text(&self, text: &str) -> Result<Vec<f16>> {
        let texts = vec![text.to_string()];
        let result = self.embed_texts(&texts).await?;
        result
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| {
                EmbedError::embedding_gen(anyhow::anyhow!("no embedding generated for text"))
            })
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult> {
        if texts.is_empty() {
            return Ok(EmbeddingResult::new(vec![]));
        }

        tracing::debug!("Generating embeddings for {} texts", texts.len());

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.config.batch_size) {
            let chunk = chunk.to_vec();
            let model = Arc::clone(&self.model);

            let batch_embeddings = tokio::task::spawn_blocking(move || -> Result<Vec<Vec<f32>>> {
                tracing::debug!("Processing batch of {} texts", chunk.len());
                let mut model_guard = model.lock().map_err(|_| EmbedError::LockPoisoned)?;
                model_guard
                    .embed(chunk, None)
                    .map_err(EmbedError::embedding_gen)
            })
            .await??;

            all_embeddings.extend(convert_to_f16(batch_embeddings, self.config.normalize));
        }

        tracing::debug!("Generated {} embeddings", all_embeddings.len());
        Ok(EmbeddingResult::new(all_embeddings))
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn provider_name(&self) -> &str {
        "fastembed"
    }
}
