use std::path::Path;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

/// Opens (creating if missing) a SQLite database in WAL mode and returns a pool.
/// WAL keeps previously committed rows intact if the process dies mid-write.
pub async fn create_pool(db_path: &Path) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    info!("SQLite pool established at {}", db_path.display());
    Ok(pool)
}

/// Creates the document-store schema. Idempotent.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id TEXT PRIMARY KEY,
            source_name TEXT NOT NULL,
            file_path TEXT NOT NULL,
            json_path TEXT NOT NULL,
            full_name TEXT NOT NULL,
            email TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            experience_years INTEGER,
            education_level TEXT NOT NULL DEFAULT '',
            record TEXT NOT NULL,
            raw_text TEXT NOT NULL,
            search_text TEXT NOT NULL,
            low_confidence INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tenders (
            id TEXT PRIMARY KEY,
            source_name TEXT NOT NULL,
            content_hash TEXT NOT NULL,
            json_path TEXT NOT NULL,
            title TEXT NOT NULL,
            record TEXT NOT NULL,
            search_text TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS match_runs (
            id TEXT PRIMARY KEY,
            tender_id TEXT NOT NULL,
            report_path TEXT NOT NULL,
            semantic_mode TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (tender_id) REFERENCES tenders(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS match_results (
            run_id TEXT NOT NULL,
            profile_id TEXT NOT NULL,
            rank INTEGER NOT NULL,
            lexical_score REAL NOT NULL,
            semantic_score REAL NOT NULL,
            combined_score REAL NOT NULL,
            matched_skills TEXT NOT NULL,
            missing_skills TEXT NOT NULL,
            justification TEXT NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (run_id, profile_id),
            FOREIGN KEY (run_id) REFERENCES match_runs(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// In-memory database for tests. A single connection keeps the shared schema alive.
#[cfg(test)]
pub async fn create_memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    init_schema(&pool).await.expect("schema");
    pool
}
