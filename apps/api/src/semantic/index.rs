//! Semantic Index — persistent vector store keyed by profile id.
//!
//! Vectors live in their own SQLite database (WAL mode), independent from the
//! document store, so the two can be inspected and reconciled separately.
//! Rows are keyed by profile id with a hash of the synthesized search text;
//! upserting unchanged text skips the embedding entirely.

use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::{debug, warn};

use crate::semantic::embedder::{dot, EmbedError, Embedder};

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("semantic index unavailable: {0}")]
    Unavailable(String),

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<EmbedError> for IndexError {
    fn from(e: EmbedError) -> Self {
        match e {
            EmbedError::Unavailable(msg) => IndexError::Unavailable(msg),
            EmbedError::Failed(msg) => IndexError::Embedding(msg),
        }
    }
}

/// What an upsert actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new or changed search text was embedded and stored.
    Embedded,
    /// The stored text hash matched; nothing was re-embedded.
    Unchanged,
}

pub struct SemanticIndex {
    pool: SqlitePool,
    embedder: Option<Arc<dyn Embedder>>,
}

impl SemanticIndex {
    /// Opens the index over an existing pool, creating the schema if needed.
    /// `embedder` is `None` when no backend could be loaded; the index then
    /// reports unavailable on embed-requiring operations but `remove`,
    /// `count` and `list_ids` still work.
    pub async fn open(
        pool: SqlitePool,
        embedder: Option<Arc<dyn Embedder>>,
    ) -> Result<Self, IndexError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profile_vectors (
                profile_id TEXT PRIMARY KEY,
                dim INTEGER NOT NULL,
                vector BLOB NOT NULL,
                text_hash TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool, embedder })
    }

    pub fn available(&self) -> bool {
        self.embedder.is_some()
    }

    fn embedder(&self) -> Result<&Arc<dyn Embedder>, IndexError> {
        self.embedder
            .as_ref()
            .ok_or_else(|| IndexError::Unavailable("no embedding backend configured".to_string()))
    }

    /// One-time model warm-up. Embeds a probe string and discards it; safe to
    /// call repeatedly and to retry after a failure.
    pub async fn warmup(&self) -> Result<(), IndexError> {
        let embedder = self.embedder()?;
        embedder.embed("warmup probe")?;
        debug!("embedding backend '{}' warmed up", embedder.name());
        Ok(())
    }

    /// Embeds `search_text` and stores the vector under `profile_id`,
    /// replacing any prior vector for that id. Safe to call repeatedly:
    /// the store never grows for the same id, and unchanged text is not
    /// re-embedded.
    pub async fn upsert(
        &self,
        profile_id: &str,
        search_text: &str,
    ) -> Result<UpsertOutcome, IndexError> {
        let text_hash = hash_text(search_text);

        let existing: Option<String> =
            sqlx::query_scalar("SELECT text_hash FROM profile_vectors WHERE profile_id = ?")
                .bind(profile_id)
                .fetch_optional(&self.pool)
                .await?;
        if existing.as_deref() == Some(text_hash.as_str()) {
            return Ok(UpsertOutcome::Unchanged);
        }

        let embedder = self.embedder()?;
        let vector = embedder.embed(search_text)?;

        sqlx::query(
            r#"
            INSERT INTO profile_vectors (profile_id, dim, vector, text_hash, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(profile_id) DO UPDATE SET
                dim = excluded.dim,
                vector = excluded.vector,
                text_hash = excluded.text_hash,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(profile_id)
        .bind(vector.len() as i64)
        .bind(vector_to_blob(&vector))
        .bind(&text_hash)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(UpsertOutcome::Embedded)
    }

    /// Top-k most similar stored vectors for a query text, similarity
    /// descending, ties broken by ascending profile id.
    pub async fn query(
        &self,
        search_text: &str,
        top_k: usize,
    ) -> Result<Vec<(String, f32)>, IndexError> {
        let embedder = self.embedder()?;
        let query_vector = embedder.embed(search_text)?;

        let rows = sqlx::query("SELECT profile_id, dim, vector FROM profile_vectors")
            .fetch_all(&self.pool)
            .await?;

        let mut scored: Vec<(String, f32)> = Vec::with_capacity(rows.len());
        for row in rows {
            let profile_id: String = row.get("profile_id");
            let dim: i64 = row.get("dim");
            if dim as usize != query_vector.len() {
                // stale row from a different backend dimension; reconcile will re-embed
                warn!("skipping vector for {profile_id}: dim {dim} != {}", query_vector.len());
                continue;
            }
            let blob: Vec<u8> = row.get("vector");
            let vector = blob_to_vector(&blob);
            scored.push((profile_id, dot(&query_vector, &vector)));
        }

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(top_k);
        Ok(scored)
    }

    /// Evicts the vector for a profile. Subsequent queries never return the
    /// id. Works even with no embedding backend loaded.
    pub async fn remove(&self, profile_id: &str) -> Result<(), IndexError> {
        sqlx::query("DELETE FROM profile_vectors WHERE profile_id = ?")
            .bind(profile_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, IndexError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profile_vectors")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Every profile id with a stored vector, ascending. Used by the
    /// reconciliation pass and the admin summary.
    pub async fn list_ids(&self) -> Result<Vec<String>, IndexError> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT profile_id FROM profile_vectors ORDER BY profile_id")
                .fetch_all(&self.pool)
                .await?;
        Ok(ids)
    }
}

fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn vector_to_blob(vector: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

fn blob_to_vector(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::embedder::HashEmbedder;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_index() -> SemanticIndex {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        SemanticIndex::open(pool, Some(Arc::new(HashEmbedder::default())))
            .await
            .expect("index schema")
    }

    async fn unavailable_index() -> SemanticIndex {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        SemanticIndex::open(pool, None).await.expect("index schema")
    }

    #[tokio::test]
    async fn test_upsert_then_query_returns_the_id() {
        let index = memory_index().await;
        index.upsert("p1", "python sql pipelines").await.unwrap();

        let hits = index.query("python sql", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, "p1");
        assert!(hits[0].1 > 0.0);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let index = memory_index().await;
        let first = index.upsert("p1", "python sql").await.unwrap();
        assert_eq!(first, UpsertOutcome::Embedded);

        let before = index.query("python", 5).await.unwrap();
        let second = index.upsert("p1", "python sql").await.unwrap();
        assert_eq!(second, UpsertOutcome::Unchanged);

        let after = index.query("python", 5).await.unwrap();
        assert_eq!(before, after);
        assert_eq!(index.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_replaces_changed_text() {
        let index = memory_index().await;
        index.upsert("p1", "python sql").await.unwrap();
        let outcome = index.upsert("p1", "java spring boot").await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Embedded);
        assert_eq!(index.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_query_orders_by_similarity_then_id() {
        let index = memory_index().await;
        index.upsert("b", "python sql data pipelines").await.unwrap();
        index.upsert("a", "python sql data pipelines").await.unwrap();
        index.upsert("c", "gardening and cooking").await.unwrap();

        let hits = index.query("python sql data pipelines", 3).await.unwrap();
        // identical vectors tie; ascending id breaks the tie
        assert_eq!(hits[0].0, "a");
        assert_eq!(hits[1].0, "b");
        assert_eq!(hits[2].0, "c");
        assert!(hits[0].1 >= hits[2].1);
    }

    #[tokio::test]
    async fn test_query_respects_top_k() {
        let index = memory_index().await;
        for id in ["a", "b", "c", "d"] {
            index.upsert(id, &format!("text about {id}")).await.unwrap();
        }
        let hits = index.query("text", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_remove_evicts_the_id() {
        let index = memory_index().await;
        index.upsert("p1", "python").await.unwrap();
        index.upsert("p2", "python").await.unwrap();

        index.remove("p1").await.unwrap();
        let hits = index.query("python", 10).await.unwrap();
        assert!(hits.iter().all(|(id, _)| id != "p1"));
        assert_eq!(index.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_index_surfaces_recoverable_error() {
        let index = unavailable_index().await;
        assert!(!index.available());
        assert!(matches!(
            index.upsert("p1", "text").await,
            Err(IndexError::Unavailable(_))
        ));
        assert!(matches!(
            index.query("text", 5).await,
            Err(IndexError::Unavailable(_))
        ));
        // removal still works so explicit profile deletion can evict vectors
        index.remove("p1").await.unwrap();
        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_vectors_survive_store_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("vectors.db");

        {
            let pool = crate::db::create_pool(&db_path).await.unwrap();
            let index = SemanticIndex::open(pool, Some(Arc::new(HashEmbedder::default())))
                .await
                .unwrap();
            index.upsert("p1", "python sql").await.unwrap();
        }

        let pool = crate::db::create_pool(&db_path).await.unwrap();
        let index = SemanticIndex::open(pool, Some(Arc::new(HashEmbedder::default())))
            .await
            .unwrap();
        assert_eq!(index.count().await.unwrap(), 1);
        let hits = index.query("python sql", 5).await.unwrap();
        assert_eq!(hits[0].0, "p1");
    }

    #[tokio::test]
    async fn test_blob_roundtrip() {
        let vector = vec![0.25_f32, -1.5, 3.75];
        assert_eq!(blob_to_vector(&vector_to_blob(&vector)), vector);
    }
}
