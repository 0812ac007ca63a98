//! Change detection for the document folder.
//!
//! A [`FolderSnapshot`] maps every regular file directly inside the document
//! folder to its modification time in nanoseconds since the Unix epoch. After a
//! successful rebuild the snapshot is written to `index_metadata.json` in the
//! persist directory as pretty-printed JSON:
//!
//! ```json
//! {
//!   "careers.txt": 1718000000123456789,
//!   "holland.txt": 1718000100500000000
//! }
//! ```
//!
//! Times are stored as integers, so an untouched file always compares equal
//! to its saved entry.
//!
//! [`FreshnessTracker::should_reindex`] compares a fresh snapshot against the
//! stored one. The index is stale when the stored snapshot is missing or
//! unreadable, when any file was added, removed or touched, or when the
//! snapshots match but the vector collection is empty.

use crate::config::snapshot_path_in;
use crate::storage::VectorIndex;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// File name to modification time (epoch nanoseconds).
pub type FolderSnapshot = BTreeMap<String, i64>;

/// Why a rebuild is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// No snapshot has been saved yet
    MissingSnapshot,
    /// The saved snapshot could not be read or parsed
    UnreadableSnapshot,
    /// Files were added, removed or modified since the last rebuild
    FilesChanged,
    /// The folder is unchanged but the collection holds no vectors
    EmptyIndex,
}

impl std::fmt::Display for StaleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            StaleReason::MissingSnapshot => "no index metadata found",
            StaleReason::UnreadableSnapshot => "index metadata unreadable",
            StaleReason::FilesChanged => "documents changed",
            StaleReason::EmptyIndex => "collection is empty",
        };
        f.write_str(text)
    }
}

/// Outcome of a freshness check together with the snapshot it was based on.
#[derive(Debug, Clone, PartialEq)]
pub struct FreshnessCheck {
    /// `None` when the index is up to date
    pub reason: Option<StaleReason>,
    /// Snapshot of the folder as it is now; save it after a rebuild
    pub snapshot: FolderSnapshot,
}

/// Snapshot the regular files directly inside `folder`.
///
/// A missing folder gives an empty snapshot.
pub async fn snapshot_folder(folder: &Path) -> Result<FolderSnapshot> {
    let mut snapshot = FolderSnapshot::new();
    if !tokio::fs::metadata(folder)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
    {
        return Ok(snapshot);
    }

    let mut entries = tokio::fs::read_dir(folder)
        .await
        .with_context(|| format!("reading document folder {}", folder.display()))?;
    while let Some(entry) = entries.next_entry().await? {
        // follows symlinks, like the loader
        let metadata = match tokio::fs::metadata(entry.path()).await {
            Ok(metadata) => metadata,
            Err(err) => {
                tracing::warn!("Skipping {}: {}", entry.path().display(), err);
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        snapshot.insert(name, epoch_nanos(metadata.modified()?));
    }
    Ok(snapshot)
}

/// Saturates outside the roughly 1678..2262 range an `i64` of nanoseconds covers.
fn epoch_nanos(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_nanos()).unwrap_or(i64::MAX),
        Err(before) => i64::try_from(before.duration().as_nanos()).map_or(i64::MIN, |n| -n),
    }
}

/// Reads and writes the persisted snapshot. See module docs.
#[derive(Debug, Clone)]
pub struct FreshnessTracker {
    snapshot_path: PathBuf,
}

impl FreshnessTracker {
    /// Tracker storing its snapshot in `persist_dir/index_metadata.json`.
    pub fn new(persist_dir: &Path) -> Self {
        Self {
            snapshot_path: snapshot_path_in(persist_dir),
        }
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Load the stored snapshot. `Ok(None)` when none was saved.
    pub async fn load_snapshot(&self) -> Result<Option<FolderSnapshot>> {
        let bytes = match tokio::fs::read(&self.snapshot_path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("reading {}", self.snapshot_path.display())
                });
            }
        };
        let snapshot = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing {}", self.snapshot_path.display()))?;
        Ok(Some(snapshot))
    }

    /// Decide whether `index` must be rebuilt from `folder`.
    ///
    /// Has no side effects. Errors only when the folder cannot be listed or
    /// the index cannot be counted; a bad snapshot file counts as stale.
    pub async fn should_reindex(
        &self,
        index: &dyn VectorIndex,
        folder: &Path,
    ) -> Result<FreshnessCheck> {
        let snapshot = snapshot_folder(folder).await?;

        let reason = match self.load_snapshot().await {
            Ok(None) => Some(StaleReason::MissingSnapshot),
            Err(err) => {
                tracing::warn!("Error reading index metadata, will reindex: {:#}", err);
                Some(StaleReason::UnreadableSnapshot)
            }
            Ok(Some(previous)) if previous != snapshot => {
                tracing::info!(
                    previous = previous.len(),
                    current = snapshot.len(),
                    "Documents changed since last index"
                );
                Some(StaleReason::FilesChanged)
            }
            Ok(Some(_)) => {
                if index.count().await? == 0 {
                    Some(StaleReason::EmptyIndex)
                } else {
                    None
                }
            }
        };

        match reason {
            Some(reason) => tracing::info!("Index is stale: {}", reason),
            None => tracing::debug!("Documents unchanged, using existing index"),
        }
        Ok(FreshnessCheck { reason, snapshot })
    }

    /// Persist `snapshot`, overwriting any previous one.
    pub async fn save_snapshot(&self, snapshot: &FolderSnapshot) -> Result<()> {
        if let Some(parent) = self.snapshot_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(snapshot)?;
        tokio::fs::write(&self.snapshot_path, json)
            .await
            .with_context(|| format!("writing {}", self.snapshot_path.display()))?;
        tracing::debug!("Index metadata saved ({} files)", snapshot.len());
        Ok(())
    }

    /// Remove the stored snapshot. Returns whether a file was removed.
    pub async fn clear_snapshot(&self) -> Result<bool> {
        match tokio::fs::remove_file(&self.snapshot_path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sqlite_store::SqliteVectorIndex;
    use crate::storage::{ChunkMetadata, IndexedVector};
    use half::f16;
    use tempfile::tempdir;

    async fn index_with_one_vector() -> Result<SqliteVectorIndex> {
        let index = SqliteVectorIndex::open_memory("careers").await?;
        index
            .upsert(vec![IndexedVector {
                id: "chunk_0".to_string(),
                embedding: vec![f16::ONE],
                document: "doc".to_string(),
                metadata: ChunkMetadata {
                    source: "a.txt".to_string(),
                    doc_id: 0,
                    chunk_id: 0,
                },
            }])
            .await?;
        Ok(index)
    }

    #[tokio::test]
    async fn test_snapshot_lists_top_level_files() -> Result<()> {
        let temp_dir = tempdir()?;
        let docs = temp_dir.path().join("docs");
        assert!(snapshot_folder(&docs).await?.is_empty());

        tokio::fs::create_dir_all(docs.join("nested")).await?;
        tokio::fs::write(docs.join("a.txt"), "a").await?;
        tokio::fs::write(docs.join(".hidden"), "h").await?;
        tokio::fs::write(docs.join("nested").join("b.txt"), "b").await?;

        let snapshot = snapshot_folder(&docs).await?;
        let names: Vec<&str> = snapshot.keys().map(String::as_str).collect();
        assert_eq!(names, vec![".hidden", "a.txt"]);
        assert!(snapshot["a.txt"] > 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_stale() -> Result<()> {
        let temp_dir = tempdir()?;
        let tracker = FreshnessTracker::new(temp_dir.path());
        let index = index_with_one_vector().await?;

        let check = tracker.should_reindex(&index, temp_dir.path()).await?;
        assert_eq!(check.reason, Some(StaleReason::MissingSnapshot));
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_stale() -> Result<()> {
        let temp_dir = tempdir()?;
        let tracker = FreshnessTracker::new(temp_dir.path());
        tokio::fs::write(tracker.snapshot_path(), "{not json").await?;
        let index = index_with_one_vector().await?;

        let check = tracker.should_reindex(&index, temp_dir.path()).await?;
        assert_eq!(check.reason, Some(StaleReason::UnreadableSnapshot));
        Ok(())
    }

    #[tokio::test]
    async fn test_saved_snapshot_is_fresh_until_files_change() -> Result<()> {
        let temp_dir = tempdir()?;
        let docs = temp_dir.path().join("docs");
        tokio::fs::create_dir_all(&docs).await?;
        tokio::fs::write(docs.join("a.txt"), "a").await?;
        tokio::fs::write(docs.join("b.txt"), "b").await?;

        let tracker = FreshnessTracker::new(&temp_dir.path().join("persist"));
        let index = index_with_one_vector().await?;

        let first = tracker.should_reindex(&index, &docs).await?;
        assert_eq!(first.reason, Some(StaleReason::MissingSnapshot));
        tracker.save_snapshot(&first.snapshot).await?;

        let second = tracker.should_reindex(&index, &docs).await?;
        assert_eq!(second.reason, None);
        assert_eq!(second.snapshot, first.snapshot);

        tokio::fs::remove_file(docs.join("b.txt")).await?;
        let third = tracker.should_reindex(&index, &docs).await?;
        assert_eq!(third.reason, Some(StaleReason::FilesChanged));
        assert!(!third.snapshot.contains_key("b.txt"));
        assert!(third.snapshot.contains_key("a.txt"));
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_index_is_stale_even_when_snapshot_matches() -> Result<()> {
        let temp_dir = tempdir()?;
        tokio::fs::write(temp_dir.path().join("a.txt"), "a").await?;
        let tracker = FreshnessTracker::new(&temp_dir.path().join("persist"));
        let empty = SqliteVectorIndex::open_memory("careers").await?;

        let snapshot = snapshot_folder(temp_dir.path()).await?;
        tracker.save_snapshot(&snapshot).await?;

        let check = tracker.should_reindex(&empty, temp_dir.path()).await?;
        assert_eq!(check.reason, Some(StaleReason::EmptyIndex));
        Ok(())
    }

    #[tokio::test]
    async fn test_snapshot_file_format_and_clear() -> Result<()> {
        let temp_dir = tempdir()?;
        let tracker = FreshnessTracker::new(&temp_dir.path().join("persist"));
        let mut snapshot = FolderSnapshot::new();
        snapshot.insert("careers.txt".to_string(), 1718000000125000000);

        tracker.save_snapshot(&snapshot).await?;
        let raw = tokio::fs::read_to_string(tracker.snapshot_path()).await?;
        assert_eq!(raw, "{\n  \"careers.txt\": 1718000000125000000\n}");
        assert_eq!(tracker.load_snapshot().await?, Some(snapshot));

        assert!(tracker.clear_snapshot().await?);
        assert!(!tracker.clear_snapshot().await?);
        assert_eq!(tracker.load_snapshot().await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_nanosecond_mtimes_reload_exactly() -> Result<()> {
        let temp_dir = tempdir()?;
        let tracker = FreshnessTracker::new(temp_dir.path());
        let snapshot: FolderSnapshot = [
            ("a.txt", 1_760_000_037_654_435_900),
            ("b.txt", 1_760_000_037_654_435_901),
            ("c.txt", 1_718_000_100_123_456_789),
            ("d.txt", 999_999_999),
        ]
        .into_iter()
        .map(|(name, nanos)| (name.to_string(), nanos))
        .collect();

        tracker.save_snapshot(&snapshot).await?;
        assert_eq!(tracker.load_snapshot().await?, Some(snapshot));
        Ok(())
    }

    #[test]
    fn test_epoch_nanos_keeps_sub_microsecond_precision() {
        let time = UNIX_EPOCH + std::time::Duration::new(1_760_000_037, 654_435_900);
        assert_eq!(epoch_nanos(time), 1_760_000_037_654_435_900);
        let before = UNIX_EPOCH - std::time::Duration::from_nanos(5);
        assert_eq!(epoch_nanos(before), -5);
    }
}
