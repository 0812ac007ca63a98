//! Locations and tunables shared by the indexing pipeline and the retriever.

use career_rag_context::{
    ChunkingError, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, WindowConfig,
};
use std::path::{Path, PathBuf};

/// File name of the folder snapshot inside the persist directory.
pub const SNAPSHOT_FILE_NAME: &str = "index_metadata.json";

/// File name of the SQLite vector database inside the persist directory.
pub const DATABASE_FILE_NAME: &str = "index.db";

/// Default collection name.
pub const DEFAULT_COLLECTION: &str = "career_documents";

/// Nearest neighbours returned by a plain retrieval.
pub const DEFAULT_TOP_K: usize = 3;

/// Configuration for indexing and retrieval.
///
/// # Example
///
/// ```
/// use career_rag_retriever::config::RetrieverConfig;
///
/// let config = RetrieverConfig::new("docs", "persist")
///     .with_collection("test")
///     .with_chunking(400, 40);
/// assert_eq!(config.snapshot_path().file_name().unwrap(), "index_metadata.json");
/// assert!(config.window_config().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrieverConfig {
    /// Folder holding the source documents
    pub docs_dir: PathBuf,
    /// Folder holding the vector database and the snapshot
    pub persist_dir: PathBuf,
    /// Collection name inside the vector database
    pub collection: String,
    /// Window width in characters
    pub chunk_size: usize,
    /// Characters shared by consecutive windows
    pub chunk_overlap: usize,
    /// Default number of neighbours to retrieve
    pub top_k: usize,
}

impl RetrieverConfig {
    pub fn new(docs_dir: impl Into<PathBuf>, persist_dir: impl Into<PathBuf>) -> Self {
        Self {
            docs_dir: docs_dir.into(),
            persist_dir: persist_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_chunking(mut self, chunk_size: usize, chunk_overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.chunk_overlap = chunk_overlap;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn database_path(&self) -> PathBuf {
        self.persist_dir.join(DATABASE_FILE_NAME)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        snapshot_path_in(&self.persist_dir)
    }

    /// Validated chunking geometry.
    pub fn window_config(&self) -> Result<WindowConfig, ChunkingError> {
        WindowConfig::new(self.chunk_size, self.chunk_overlap)
    }
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("./rag/uploaded_files"),
            persist_dir: PathBuf::from("./rag_persist"),
            collection: DEFAULT_COLLECTION.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
        }
    }
}

pub(crate) fn snapshot_path_in(persist_dir: &Path) -> PathBuf {
    persist_dir.join(SNAPSHOT_FILE_NAME)
}
