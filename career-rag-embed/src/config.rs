//! Configuration for embedding models

use crate::error::{EmbedError, Result};
use fastembed::EmbeddingModel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the model used when nothing else is configured.
pub const DEFAULT_MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// Configuration for a fastembed text embedding model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedConfig {
    /// Short model name, e.g. `all-MiniLM-L6-v2`
    pub model_name: String,
    /// Directory fastembed downloads model files into
    pub cache_dir: PathBuf,
    /// Maximum batch size for one inference call
    pub batch_size: usize,
    /// Whether to L2-normalize embeddings
    pub normalize: bool,
    /// Show a progress bar while downloading the model
    pub show_download_progress: bool,
}

impl EmbedConfig {
    /// Configuration for a named model with default settings.
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            ..Self::default()
        }
    }

    /// Set the model cache directory (builder style)
    pub fn with_cache_dir<P: AsRef<Path>>(self, cache_dir: P) -> Self {
        Self {
            cache_dir: cache_dir.as_ref().to_path_buf(),
            ..self
        }
    }

    /// Set the batch size for embedding generation (builder style)
    pub fn with_batch_size(self, batch_size: usize) -> Self {
        Self { batch_size, ..self }
    }

    /// Set whether to normalize embeddings (builder style)
    pub fn with_normalize(self, normalize: bool) -> Self {
        Self { normalize, ..self }
    }

    /// Set whether to show download progress (builder style)
    pub fn with_download_progress(self, show_download_progress: bool) -> Self {
        Self {
            show_download_progress,
            ..self
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Resolve the configured name to a fastembed model.
    pub fn fastembed_model(&self) -> Result<EmbeddingModel> {
        match self.model_name.as_str() {
            "all-MiniLM-L6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
            "all-MiniLM-L12-v2" => Ok(EmbeddingModel::AllMiniLML12V2),
            "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
            "paraphrase-multilingual-MiniLM-L12-v2" => Ok(EmbeddingModel::ParaphraseMLMiniLML12V2),
            "multilingual-e5-small" => Ok(EmbeddingModel::MultilingualE5Small),
            other => Err(EmbedError::invalid_config(format!(
                "unsupported embedding model: {other}"
            ))),
        }
    }

    /// Validate the configuration without loading anything.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(EmbedError::invalid_config("batch size must be positive"));
        }
        self.fastembed_model()?;
        tracing::debug!("Embedding configuration valid for: {}", self.model_name);
        Ok(())
    }
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL_NAME.to_string(),
            cache_dir: PathBuf::from(".fastembed_cache"),
            batch_size: 32,
            normalize: true,
            show_download_progress: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = EmbedConfig::default();
        assert_eq!(config.model_name(), "all-MiniLM-L6-v2");
        assert_eq!(config.batch_size, 32);
        assert!(config.normalize);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let temp_dir = tempdir().unwrap();
        let config = EmbedConfig::new("bge-small-en-v1.5")
            .with_cache_dir(temp_dir.path())
            .with_batch_size(8)
            .with_normalize(false);

        assert_eq!(config.cache_dir, temp_dir.path());
        assert_eq!(config.batch_size, 8);
        assert!(!config.normalize);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_model_is_rejected() {
        let config = EmbedConfig::new("not-a-model");
        assert!(matches!(
            config.validate(),
            Err(EmbedError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_zero_batch_is_rejected() {
        assert!(EmbedConfig::default().with_batch_size(0).validate().is_err());
    }
}
