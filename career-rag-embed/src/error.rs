//! Error types for the embedding system

/// Result type for embedding operations.
pub type Result<T> = std::result::Result<T, EmbedError>;

/// Error type for all embedding operations.
///
/// Covers configuration problems (unknown model names), model loading,
/// inference failures, and the plumbing around them (file system access for
/// the model cache, blocking-task joins).
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// Error when model configuration is invalid
    #[error("Invalid model configuration: {message}")]
    InvalidConfig { message: String },

    /// Error during model initialization
    #[error("Model initialization failed: {source}")]
    ModelInitialization {
        #[source]
        source: anyhow::Error,
    },

    /// Error during embedding generation, including a model returning no vectors
    #[error("Embedding generation failed: {source}")]
    EmbeddingGeneration {
        #[source]
        source: anyhow::Error,
    },

    /// A previous inference panicked while holding the model.
    #[error("Embedding model lock poisoned")]
    LockPoisoned,

    /// IO errors when preparing the model cache
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Async task join errors
    #[error("Async task failed: {source}")]
    AsyncTask {
        #[from]
        source: tokio::task::JoinError,
    },
}

impl EmbedError {
    /// Wrap an error raised while loading a model.
    pub fn model_init(source: impl Into<anyhow::Error>) -> Self {
        Self::ModelInitialization {
            source: source.into(),
        }
    }

    /// Wrap an error raised while generating embeddings.
    pub fn embedding_gen(source: impl Into<anyhow::Error>) -> Self {
        Self::EmbeddingGeneration {
            source: source.into(),
        }
    }

    /// Create an invalid configuration error with a custom message.
    ///
    /// # Arguments
    /// * `message` - What is wrong with the configuration
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
