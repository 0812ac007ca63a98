//! SQLite implementation of [`VectorIndex`].
//!
//! Vectors are stored as f16 blobs in a single table keyed by
//! `(collection, id)`, so several named collections can share one database
//! file. Nearest-neighbour search loads the collection's vectors and ranks them
//! in memory by cosine distance `1 - cos(a, b)`, which lies in `[0, 2]`.
//!
//! ## Database Schema
//!
//! ```sql
//! CREATE TABLE collections (
//!     name TEXT PRIMARY KEY,
//!     created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
//! );
//!
//! CREATE TABLE vectors (
//!     collection TEXT NOT NULL REFERENCES collections(name) ON DELETE CASCADE,
//!     id TEXT NOT NULL,               -- chunk_{n}
//!     document TEXT NOT NULL,         -- chunk text
//!     source TEXT NOT NULL,           -- source file name
//!     doc_id INTEGER NOT NULL,
//!     chunk_id INTEGER NOT NULL,
//!     embedding BLOB NOT NULL,        -- f16 vector
//!     indexed_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
//!     PRIMARY KEY (collection, id)
//! );
//! ```
//!
//! ## SQLite Settings
//!
//! - **WAL mode** so readers are not blocked while a rebuild writes
//! - **Large page size** (64KB) for embedding blobs
//! - **Auto-vacuum** to give space back after delete-all rebuilds
//! - **Foreign keys** so dropping a collection drops its vectors

use super::{ChunkMetadata, IndexedVector, VectorIndex, VectorMatch};
use anyhow::{Result, bail};
use async_trait::async_trait;
use half::f16;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::Path;

/// Largest number of ids bound into one DELETE statement.
const DELETE_BATCH: usize = 500;

/// SQLite-backed vector collection. See module docs for the schema.
#[derive(Clone, Debug)]
pub struct SqliteVectorIndex {
    pool: SqlitePool,
    collection: String,
}

impl SqliteVectorIndex {
    /// Open (or create) the database at `db_path` and get-or-create `collection`.
    pub async fn open(db_path: &Path, collection: &str) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let pool = SqlitePool::connect_with(
            SqliteConnectOptions::new()
                .filename(db_path)
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .busy_timeout(std::time::Duration::from_secs(5))
                .foreign_keys(true)
                .create_if_missing(true)
                .auto_vacuum(sqlx::sqlite::SqliteAutoVacuum::Full)
                .page_size(1 << 16)
                .optimize_on_close(true, 1 << 10),
        )
        .await?;
        Self::new_with_pool(pool, collection).await
    }

    /// Open an in-memory database, for tests.
    pub async fn open_memory(collection: &str) -> Result<Self> {
        // every pooled connection to :memory: would be a separate database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(
                SqliteConnectOptions::new()
                    .in_memory(true)
                    .foreign_keys(true),
            )
            .await?;
        Self::new_with_pool(pool, collection).await
    }

    async fn new_with_pool(pool: SqlitePool, collection: &str) -> Result<Self> {
        Self::create_tables(&pool).await?;

        sqlx::query("INSERT OR IGNORE INTO collections (name) VALUES (?1)")
            .bind(collection)
            .execute(&pool)
            .await?;

        Ok(Self {
            pool,
            collection: collection.to_string(),
        })
    }

    async fn create_tables(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS vectors (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                document TEXT NOT NULL,
                source TEXT NOT NULL,
                doc_id INTEGER NOT NULL,
                chunk_id INTEGER NOT NULL,
                embedding BLOB NOT NULL,
                indexed_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (collection, id),
                FOREIGN KEY (collection) REFERENCES collections(name) ON DELETE CASCADE
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_vectors_source ON vectors(collection, source)")
            .execute(pool)
            .await?;

        Ok(())
    }

    /// When the most recent record of this collection was written.
    pub async fn last_indexed_at(&self) -> Result<Option<chrono::NaiveDateTime>> {
        let latest = sqlx::query_scalar::<_, Option<chrono::NaiveDateTime>>(
            "SELECT MAX(indexed_at) FROM vectors WHERE collection = ?1",
        )
        .bind(&self.collection)
        .fetch_one(&self.pool)
        .await?;
        Ok(latest)
    }

    /// Distinct source file names present in the collection.
    pub async fn sources(&self) -> Result<Vec<String>> {
        let sources = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT source FROM vectors WHERE collection = ?1 ORDER BY source",
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await?;
        Ok(sources)
    }
}

fn encode_embedding(embedding: &[f16]) -> &[u8] {
    bytemuck::cast_slice::<f16, u8>(embedding)
}

// Blobs from SQLite carry no alignment guarantee, so decode bytewise.
fn decode_embedding(bytes: &[u8]) -> Vec<f16> {
    bytes
        .chunks_exact(2)
        .map(|pair| f16::from_ne_bytes([pair[0], pair[1]]))
        .collect()
}

/// Cosine distance `1 - cos(a, b)`. A zero vector is treated as orthogonal to everything.
pub(crate) fn cosine_distance(a: &[f16], b: &[f16]) -> f32 {
    let mut dot_product = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        let x = x.to_f32();
        let y = y.to_f32();
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let norm = norm_a.sqrt() * norm_b.sqrt();
    if norm == 0.0 {
        1.0
    } else {
        1.0 - dot_product / norm
    }
}

#[async_trait]
impl VectorIndex for SqliteVectorIndex {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vectors WHERE collection = ?1")
            .bind(&self.collection)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    async fn delete(&self, ids: &[String]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut removed = 0u64;
        for batch in ids.chunks(DELETE_BATCH) {
            // ?1 is the collection, ids start at ?2
            let placeholders = (0..batch.len())
                .map(|i| format!("?{}", i + 2))
                .collect::<Vec<_>>()
                .join(", ");
            let query =
                format!("DELETE FROM vectors WHERE collection = ?1 AND id IN ({placeholders})");

            let mut query_builder = sqlx::query(&query).bind(&self.collection);
            for id in batch {
                query_builder = query_builder.bind(id);
            }
            removed += query_builder.execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;

        tracing::debug!("Deleted {} vectors from {}", removed, self.collection);
        Ok(removed as usize)
    }

    async fn upsert(&self, records: Vec<IndexedVector>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for record in &records {
            sqlx::query(
                r#"
                INSERT INTO vectors (collection, id, document, source, doc_id, chunk_id, embedding, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, datetime('now'))
                ON CONFLICT(collection, id) DO UPDATE SET
                    document = excluded.document,
                    source = excluded.source,
                    doc_id = excluded.doc_id,
                    chunk_id = excluded.chunk_id,
                    embedding = excluded.embedding,
                    indexed_at = excluded.indexed_at
                "#,
            )
            .bind(&self.collection)
            .bind(&record.id)
            .bind(&record.document)
            .bind(&record.metadata.source)
            .bind(record.metadata.doc_id as i64)
            .bind(record.metadata.chunk_id as i64)
            .bind(encode_embedding(&record.embedding))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!("Upserted {} vectors into {}", records.len(), self.collection);
        Ok(())
    }

    async fn query(&self, embedding: &[f16], limit: usize) -> Result<Vec<VectorMatch>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT id, document, source, doc_id, chunk_id, embedding FROM vectors WHERE collection = ?1 ORDER BY rowid",
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await?;

        let mut matches = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.get("id");
            let bytes: Vec<u8> = row.get("embedding");
            let stored = decode_embedding(&bytes);
            if stored.len() != embedding.len() {
                bail!(
                    "query dimension {} does not match dimension {} of {} in collection {}",
                    embedding.len(),
                    stored.len(),
                    id,
                    self.collection
                );
            }

            let doc_id: i64 = row.get("doc_id");
            let chunk_id: i64 = row.get("chunk_id");
            matches.push(VectorMatch {
                distance: cosine_distance(embedding, &stored),
                id,
                document: row.get("document"),
                metadata: ChunkMetadata {
                    source: row.get("source"),
                    doc_id: doc_id as usize,
                    chunk_id: chunk_id as usize,
                },
            });
        }

        // Stable sort keeps insertion order among equal distances
        matches.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);

        Ok(matches)
    }

    async fn list_ids(&self) -> Result<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT id FROM vectors WHERE collection = ?1 ORDER BY rowid",
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn vector(values: &[f32]) -> Vec<f16> {
        values.iter().map(|v| f16::from_f32(*v)).collect()
    }

    fn record(id: &str, values: &[f32], source: &str, chunk_id: usize) -> IndexedVector {
        IndexedVector {
            id: id.to_string(),
            embedding: vector(values),
            document: format!("text of {id}"),
            metadata: ChunkMetadata {
                source: source.to_string(),
                doc_id: 0,
                chunk_id,
            },
        }
    }

    #[tokio::test]
    async fn test_upsert_count_delete() -> Result<()> {
        let index = SqliteVectorIndex::open_memory("careers").await?;
        assert_eq!(index.count().await?, 0);

        index
            .upsert(vec![
                record("chunk_0", &[1.0, 0.0], "a.txt", 0),
                record("chunk_1", &[0.0, 1.0], "a.txt", 1),
                record("chunk_2", &[0.7, 0.7], "b.txt", 0),
            ])
            .await?;
        assert_eq!(index.count().await?, 3);
        assert_eq!(index.list_ids().await?, vec!["chunk_0", "chunk_1", "chunk_2"]);
        assert_eq!(index.sources().await?, vec!["a.txt", "b.txt"]);

        // replacing an id does not add a record
        index
            .upsert(vec![record("chunk_1", &[0.5, 0.5], "c.txt", 9)])
            .await?;
        assert_eq!(index.count().await?, 3);

        let removed = index
            .delete(&["chunk_0".to_string(), "chunk_7".to_string()])
            .await?;
        assert_eq!(removed, 1);
        assert_eq!(index.list_ids().await?, vec!["chunk_1", "chunk_2"]);
        assert_eq!(index.delete(&[]).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_query_orders_by_distance() -> Result<()> {
        let index = SqliteVectorIndex::open_memory("careers").await?;
        index
            .upsert(vec![
                record("chunk_0", &[0.0, 1.0], "a.txt", 0),
                record("chunk_1", &[1.0, 0.0], "a.txt", 1),
                record("chunk_2", &[0.6, 0.8], "a.txt", 2),
            ])
            .await?;

        let matches = index.query(&vector(&[1.0, 0.0]), 10).await?;
        let ids: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["chunk_1", "chunk_2", "chunk_0"]);
        assert!(matches[0].distance.abs() < 1e-3);
        assert!((matches[1].distance - 0.4).abs() < 1e-2);
        assert!((matches[2].distance - 1.0).abs() < 1e-3);
        assert_eq!(matches[0].document, "text of chunk_1");
        assert_eq!(matches[0].metadata.chunk_id, 1);

        let top = index.query(&vector(&[1.0, 0.0]), 1).await?;
        assert_eq!(top.len(), 1);
        assert!(index.query(&vector(&[1.0, 0.0]), 0).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_query_rejects_dimension_mismatch() -> Result<()> {
        let index = SqliteVectorIndex::open_memory("careers").await?;
        index.upsert(vec![record("chunk_0", &[1.0, 0.0], "a.txt", 0)]).await?;
        assert!(index.query(&vector(&[1.0, 0.0, 0.0]), 3).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_collections_are_isolated_and_persistent() -> Result<()> {
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join("persist").join("index.db");

        {
            let careers = SqliteVectorIndex::open(&db_path, "careers").await?;
            careers.upsert(vec![record("chunk_0", &[1.0, 0.0], "a.txt", 0)]).await?;
            assert!(careers.last_indexed_at().await?.is_some());
        }

        let reopened = SqliteVectorIndex::open(&db_path, "careers").await?;
        assert_eq!(reopened.count().await?, 1);

        let other = SqliteVectorIndex::open(&db_path, "other").await?;
        assert_eq!(other.count().await?, 0);
        assert!(other.last_indexed_at().await?.is_none());
        Ok(())
    }

    #[test]
    fn test_cosine_distance() {
        let a = vector(&[1.0, 0.0]);
        assert!(cosine_distance(&a, &a).abs() < 1e-6);
        assert!((cosine_distance(&a, &vector(&[0.0, 1.0])) - 1.0).abs() < 1e-6);
        assert!((cosine_distance(&a, &vector(&[-1.0, 0.0])) - 2.0).abs() < 1e-6);
        assert_eq!(cosine_distance(&vector(&[0.0, 0.0]), &a), 1.0);
    }

    #[test]
    fn test_embedding_blob_roundtrip() {
        let embedding = vector(&[0.25, -1.5, 3.0]);
        assert_eq!(decode_embedding(encode_embedding(&embedding)), embedding);
    }
}
