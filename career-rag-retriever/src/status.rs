//! Point-in-time report on the vector index and the document folder.

use anyhow::Result;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::RetrieverConfig;
use crate::retrieval::freshness::FreshnessTracker;
use crate::storage::VectorIndex;
use crate::storage::sqlite_store::SqliteVectorIndex;

/// Index statistics and freshness
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStatus {
    /// Collection name
    pub collection: String,
    /// Number of stored chunks
    pub total_chunks: usize,
    /// Distinct source files among the stored chunks
    pub sources: Vec<String>,
    /// Most recent chunk write, UTC
    pub last_indexed_at: Option<NaiveDateTime>,
    /// Files currently in the document folder
    pub folder_files: usize,
    /// Files recorded in the saved snapshot, if one exists
    pub snapshot_files: Option<usize>,
    /// Why the next query would rebuild, `None` when up to date
    pub stale_reason: Option<String>,
    /// Size of the database file in bytes
    pub database_size_bytes: Option<u64>,
}

impl IndexStatus {
    /// Collect the status without modifying the index or the snapshot.
    pub async fn collect(config: &RetrieverConfig, index: &SqliteVectorIndex) -> Result<Self> {
        let tracker = FreshnessTracker::new(&config.persist_dir);
        let check = tracker.should_reindex(index, &config.docs_dir).await?;
        let snapshot_files = match tracker.load_snapshot().await {
            Ok(snapshot) => snapshot.map(|s| s.len()),
            Err(_) => None,
        };
        let database_size_bytes = tokio::fs::metadata(config.database_path())
            .await
            .ok()
            .map(|m| m.len());

        Ok(Self {
            collection: index.collection().to_string(),
            total_chunks: index.count().await?,
            sources: index.sources().await?,
            last_indexed_at: index.last_indexed_at().await?,
            folder_files: check.snapshot.len(),
            snapshot_files,
            stale_reason: check.reason.map(|r| r.to_string()),
            database_size_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_status_of_fresh_install() -> Result<()> {
        let temp_dir = tempdir()?;
        let config = RetrieverConfig::new(
            temp_dir.path().join("docs"),
            temp_dir.path().join("persist"),
        );
        tokio::fs::create_dir_all(&config.docs_dir).await?;
        tokio::fs::write(config.docs_dir.join("a.txt"), "text").await?;
        let index = SqliteVectorIndex::open(&config.database_path(), &config.collection).await?;

        let status = IndexStatus::collect(&config, &index).await?;
        assert_eq!(status.collection, "career_documents");
        assert_eq!(status.total_chunks, 0);
        assert_eq!(status.folder_files, 1);
        assert_eq!(status.snapshot_files, None);
        assert_eq!(status.stale_reason.as_deref(), Some("no index metadata found"));
        assert!(status.database_size_bytes.is_some());
        Ok(())
    }
}
