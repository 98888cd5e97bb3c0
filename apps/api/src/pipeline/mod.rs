//! Ingestion and matching pipeline.
//!
//! Ingestion: load → extract → synthesize → persist the structured record →
//! upsert the vector. A failed vector write never fails the ingestion; it
//! leaves a detectable consistency gap that the reconciliation pass repairs.
//! Matching: load candidates → semantic query (or explicit lexical-only
//! fallback) → rank → write report → persist the run.

pub mod handlers;
pub mod reconcile;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::{DocumentKind, ExtractedRecord};
use crate::loader;
use crate::matching::{rank_candidates, SemanticMode};
use crate::models::matching::MatchResult;
use crate::models::profile::{CvRecord, Profile, ProfileRow};
use crate::models::tender::TenderRequest;
use crate::report;
use crate::semantic::IndexError;
use crate::state::AppState;
use crate::synthesis;

/// Per-file result of CV ingestion. `vector_indexed == false` flags a
/// consistency gap (structured row written, vector missing).
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub profile_id: String,
    pub source_name: String,
    pub full_name: String,
    pub low_confidence: bool,
    pub vector_indexed: bool,
}

/// Everything a match run produced.
#[derive(Debug, Clone, Serialize)]
pub struct MatchRunSummary {
    pub run_id: Uuid,
    pub tender_id: Uuid,
    pub tender_title: String,
    pub semantic_mode: SemanticMode,
    pub report_path: String,
    pub candidate_count: usize,
    pub results: Vec<MatchResult>,
}

/// Ingests one CV file end to end. The profile id is the content hash, so
/// re-ingesting identical content overwrites instead of duplicating.
pub async fn ingest_cv_file(state: &AppState, path: &Path) -> Result<IngestOutcome, AppError> {
    let source_name = file_name(path);
    let profile_id = loader::content_hash(path)?;
    let raw_text = loader::load(path)?;

    let extracted = state
        .extractor
        .extract(&raw_text, &source_name, DocumentKind::Cv)
        .await;
    if extracted.low_confidence() {
        warn!("low-confidence extraction for {source_name}");
    }
    let record = match extracted {
        ExtractedRecord::Cv(record) => record,
        ExtractedRecord::Tender(_) => {
            return Err(AppError::Internal(anyhow::anyhow!(
                "extractor returned a tender record for a CV"
            )))
        }
    };

    let search_text = synthesis::synthesize_cv(&record, &raw_text);
    let json_path = state
        .config
        .parsed_cvs_dir()
        .join(format!("{}-{}.json", slugify(stem(&source_name)), &profile_id[..8]));
    write_json(&record, &json_path)?;

    upsert_profile(
        &state.db,
        &profile_id,
        &source_name,
        path,
        &json_path,
        &record,
        &raw_text,
        &search_text,
    )
    .await?;

    let vector_indexed = match state.index.upsert(&profile_id, &search_text).await {
        Ok(_) => true,
        Err(IndexError::Unavailable(reason)) => {
            warn!("vector upsert skipped for {source_name}: index unavailable ({reason})");
            false
        }
        Err(IndexError::Embedding(reason)) => {
            warn!("vector upsert failed for {source_name}: {reason}");
            false
        }
        Err(e @ IndexError::Database(_)) => return Err(e.into()),
    };

    Ok(IngestOutcome {
        profile_id,
        source_name,
        full_name: record.full_name,
        low_confidence: record.low_confidence,
        vector_indexed,
    })
}

/// Ingests every supported file in the CV bank. One bad file never aborts the
/// batch; failures are logged and reported alongside the successes.
pub async fn sync_cv_bank(state: &AppState) -> (Vec<IngestOutcome>, Vec<String>) {
    let mut outcomes = Vec::new();
    let mut failures = Vec::new();

    for path in bank_files(&state.config.cv_bank_dir()) {
        match ingest_cv_file(state, &path).await {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                let name = file_name(&path);
                warn!("skipping {name}: {e}");
                failures.push(name);
            }
        }
    }
    (outcomes, failures)
}

/// Ingests a tender file for one matching run.
pub async fn ingest_tender_file(state: &AppState, path: &Path) -> Result<TenderRequest, AppError> {
    let source_name = file_name(path);
    let content_hash = loader::content_hash(path)?;
    let raw_text = loader::load(path)?;

    let extracted = state
        .extractor
        .extract(&raw_text, &source_name, DocumentKind::Tender)
        .await;
    if extracted.low_confidence() {
        warn!("low-confidence extraction for tender {source_name}");
    }
    let record = match extracted {
        ExtractedRecord::Tender(record) => record,
        ExtractedRecord::Cv(_) => {
            return Err(AppError::Internal(anyhow::anyhow!(
                "extractor returned a CV record for a tender"
            )))
        }
    };

    let search_text = synthesis::synthesize_tender(&record, &raw_text);
    let json_path = state
        .config
        .parsed_tenders_dir()
        .join(format!("{}-{}.json", slugify(stem(&source_name)), &content_hash[..8]));
    write_json(&record, &json_path)?;

    let tender = TenderRequest {
        id: Uuid::new_v4(),
        source_name,
        raw_text,
        record,
        search_text,
    };
    insert_tender(&state.db, &tender, &content_hash, &json_path).await?;
    Ok(tender)
}

/// Runs the hybrid match for a tender over every stored profile, writes the
/// shortlist report, and persists the run.
pub async fn run_match(state: &AppState, tender: &TenderRequest) -> Result<MatchRunSummary, AppError> {
    let profiles = load_profiles(&state.db).await?;

    let (mode, semantic_hits): (SemanticMode, HashMap<String, f32>) = match state
        .index
        .query(&tender.search_text, state.config.search_top_k)
        .await
    {
        Ok(hits) => (SemanticMode::Hybrid, hits.into_iter().collect()),
        Err(IndexError::Unavailable(reason)) => {
            warn!("semantic index unavailable, falling back to lexical-only: {reason}");
            (SemanticMode::LexicalOnly, Default::default())
        }
        Err(IndexError::Embedding(reason)) => {
            warn!("query embedding failed, falling back to lexical-only: {reason}");
            (SemanticMode::LexicalOnly, Default::default())
        }
        Err(e @ IndexError::Database(_)) => return Err(e.into()),
    };

    let results = rank_candidates(tender, &profiles, &semantic_hits, mode, state.weights);

    let generated_at = Utc::now();
    let report_path = report::write_report(
        &state.config.reports_dir(),
        tender,
        &results,
        generated_at,
    )?;
    let report_path = report_path.to_string_lossy().into_owned();

    let run_id = Uuid::new_v4();
    persist_run(&state.db, run_id, tender, mode, &report_path, &results).await?;
    info!(
        "match run {run_id} ranked {} candidates for '{}' ({})",
        results.len(),
        tender.record.title,
        mode.as_str()
    );

    Ok(MatchRunSummary {
        run_id,
        tender_id: tender.id,
        tender_title: tender.record.title.clone(),
        semantic_mode: mode,
        report_path,
        candidate_count: results.len(),
        results,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Store access
// ────────────────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
async fn upsert_profile(
    pool: &SqlitePool,
    id: &str,
    source_name: &str,
    file_path: &Path,
    json_path: &Path,
    record: &CvRecord,
    raw_text: &str,
    search_text: &str,
) -> Result<(), AppError> {
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO profiles (
            id, source_name, file_path, json_path, full_name, email, phone,
            experience_years, education_level, record, raw_text, search_text,
            low_confidence, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            source_name = excluded.source_name,
            file_path = excluded.file_path,
            json_path = excluded.json_path,
            full_name = excluded.full_name,
            email = excluded.email,
            phone = excluded.phone,
            experience_years = excluded.experience_years,
            education_level = excluded.education_level,
            record = excluded.record,
            raw_text = excluded.raw_text,
            search_text = excluded.search_text,
            low_confidence = excluded.low_confidence,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(id)
    .bind(source_name)
    .bind(file_path.to_string_lossy().as_ref())
    .bind(json_path.to_string_lossy().as_ref())
    .bind(&record.full_name)
    .bind(&record.email)
    .bind(&record.phone)
    .bind(record.years_experience.map(|y| y as i64))
    .bind(record.education_level.as_str())
    .bind(sqlx::types::Json(record))
    .bind(raw_text)
    .bind(search_text)
    .bind(record.low_confidence)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

async fn insert_tender(
    pool: &SqlitePool,
    tender: &TenderRequest,
    content_hash: &str,
    json_path: &Path,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO tenders (id, source_name, content_hash, json_path, title, record, search_text, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(tender.id.to_string())
    .bind(&tender.source_name)
    .bind(content_hash)
    .bind(json_path.to_string_lossy().as_ref())
    .bind(&tender.record.title)
    .bind(sqlx::types::Json(&tender.record))
    .bind(&tender.search_text)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

async fn persist_run(
    pool: &SqlitePool,
    run_id: Uuid,
    tender: &TenderRequest,
    mode: SemanticMode,
    report_path: &str,
    results: &[MatchResult],
) -> Result<(), AppError> {
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO match_runs (id, tender_id, report_path, semantic_mode, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(run_id.to_string())
    .bind(tender.id.to_string())
    .bind(report_path)
    .bind(mode.as_str())
    .bind(now)
    .execute(pool)
    .await?;

    for result in results {
        sqlx::query(
            r#"
            INSERT INTO match_results (
                run_id, profile_id, rank, lexical_score, semantic_score,
                combined_score, matched_skills, missing_skills, justification, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(run_id.to_string())
        .bind(&result.profile_id)
        .bind(result.rank as i64)
        .bind(result.lexical_score as f64)
        .bind(result.semantic_score as f64)
        .bind(result.combined_score as f64)
        .bind(sqlx::types::Json(&result.matched_skills))
        .bind(sqlx::types::Json(&result.missing_skills))
        .bind(sqlx::types::Json(&result.justification))
        .bind(now)
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Every stored profile, ordered by id for stable iteration.
pub async fn load_profiles(pool: &SqlitePool) -> Result<Vec<Profile>, AppError> {
    let rows: Vec<ProfileRow> = sqlx::query_as("SELECT * FROM profiles ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(profile_from_row).collect())
}

pub fn profile_from_row(row: ProfileRow) -> Profile {
    Profile {
        id: row.id,
        source_name: row.source_name,
        raw_text: row.raw_text,
        record: row.record.0,
        search_text: row.search_text,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Filesystem helpers
// ────────────────────────────────────────────────────────────────────────────

fn bank_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file() && loader::is_supported(p))
                .collect()
        })
        .unwrap_or_default();
    files.sort();
    files
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(value)
        .context("failed to serialize record")
        .map_err(AppError::Internal)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write {}", path.display()))
        .map_err(AppError::Internal)?;
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn stem(source_name: &str) -> &str {
    source_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(source_name)
}

/// Filesystem-safe slug for artifact names.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut last_dash = false;
    for c in value.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            slug.push(c);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let trimmed = slug.trim_matches('-');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::extract::HeuristicExtractor;
    use crate::matching::MatchWeights;
    use crate::semantic::{HashEmbedder, SemanticIndex};
    use std::sync::Arc;

    async fn test_state(data_dir: &Path, with_embedder: bool) -> AppState {
        let config = Config::for_data_dir(data_dir);
        config.ensure_dirs().unwrap();
        let db = crate::db::create_memory_pool().await;

        let vector_pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let embedder: Option<Arc<dyn crate::semantic::Embedder>> = if with_embedder {
            Some(Arc::new(HashEmbedder::default()))
        } else {
            None
        };
        let index = SemanticIndex::open(vector_pool, embedder).await.unwrap();

        AppState {
            db,
            index: Arc::new(index),
            extractor: Arc::new(HeuristicExtractor::new(2026, 40)),
            weights: MatchWeights::default(),
            config,
        }
    }

    fn write_cv(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    const CV_A: &str = "Alice Smith\nalice@example.org\nSenior Backend Developer\n\nSkills\nPython, SQL, Docker\n\nExperience\nBackend work 2016-2024";
    const CV_B: &str = "Bob Jones\nbob@example.org\nMarketing Specialist\n\nSkills\nJava\n\nExperience\nCampaigns 2019-2024";
    const TENDER: &str = "Data Platform Tender\nWe need a backend developer.\n\nRequirements\n5 years of Python and SQL experience\nDocker deployments";

    #[tokio::test]
    async fn test_ingest_cv_writes_both_stores() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), true).await;
        let path = write_cv(&state.config.cv_bank_dir(), "alice.txt", CV_A);

        let outcome = ingest_cv_file(&state, &path).await.unwrap();
        assert!(outcome.vector_indexed);
        assert!(!outcome.low_confidence);
        assert_eq!(outcome.full_name, "Alice Smith");

        let profiles = load_profiles(&state.db).await.unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].id, outcome.profile_id);
        assert_eq!(state.index.count().await.unwrap(), 1);

        // parsed artifact exists and holds the structured record
        let json_files: Vec<_> = std::fs::read_dir(state.config.parsed_cvs_dir())
            .unwrap()
            .collect();
        assert_eq!(json_files.len(), 1);
    }

    #[tokio::test]
    async fn test_reingest_same_content_does_not_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), true).await;
        let path = write_cv(&state.config.cv_bank_dir(), "alice.txt", CV_A);

        let first = ingest_cv_file(&state, &path).await.unwrap();
        let second = ingest_cv_file(&state, &path).await.unwrap();
        assert_eq!(first.profile_id, second.profile_id);

        assert_eq!(load_profiles(&state.db).await.unwrap().len(), 1);
        assert_eq!(state.index.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ingest_without_embedder_leaves_detectable_gap() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), false).await;
        let path = write_cv(&state.config.cv_bank_dir(), "alice.txt", CV_A);

        let outcome = ingest_cv_file(&state, &path).await.unwrap();
        assert!(!outcome.vector_indexed);
        assert_eq!(load_profiles(&state.db).await.unwrap().len(), 1);
        assert_eq!(state.index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sync_cv_bank_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), true).await;
        write_cv(&state.config.cv_bank_dir(), "alice.txt", CV_A);
        write_cv(&state.config.cv_bank_dir(), "bob.txt", CV_B);
        // unsupported extension is filtered out before loading
        write_cv(&state.config.cv_bank_dir(), "notes.docx", "ignored");

        let (outcomes, failures) = sync_cv_bank(&state).await;
        assert_eq!(outcomes.len(), 2);
        assert!(failures.is_empty());
    }

    #[tokio::test]
    async fn test_full_match_run_hybrid() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), true).await;
        write_cv(&state.config.cv_bank_dir(), "alice.txt", CV_A);
        write_cv(&state.config.cv_bank_dir(), "bob.txt", CV_B);
        sync_cv_bank(&state).await;

        let tender_path = write_cv(&state.config.uploads_dir(), "tender.txt", TENDER);
        let tender = ingest_tender_file(&state, &tender_path).await.unwrap();
        let summary = run_match(&state, &tender).await.unwrap();

        assert_eq!(summary.semantic_mode, SemanticMode::Hybrid);
        assert_eq!(summary.results.len(), 2);
        // Alice covers python/sql/docker; she must outrank Bob
        assert_eq!(summary.results[0].candidate_name, "Alice Smith");
        assert_eq!(summary.results[0].rank, 1);
        assert!(summary.results[0].combined_score > summary.results[1].combined_score);
        assert!(std::path::Path::new(&summary.report_path).exists());
    }

    #[tokio::test]
    async fn test_match_run_degrades_to_lexical_only() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), false).await;
        write_cv(&state.config.cv_bank_dir(), "alice.txt", CV_A);
        write_cv(&state.config.cv_bank_dir(), "bob.txt", CV_B);
        sync_cv_bank(&state).await;

        let tender_path = write_cv(&state.config.uploads_dir(), "tender.txt", TENDER);
        let tender = ingest_tender_file(&state, &tender_path).await.unwrap();
        let summary = run_match(&state, &tender).await.unwrap();

        assert_eq!(summary.semantic_mode, SemanticMode::LexicalOnly);
        assert!(summary.results.iter().all(|r| r.semantic_score == 0.0));
        for result in &summary.results {
            assert_eq!(result.combined_score, result.lexical_score);
        }
        assert_eq!(summary.results[0].candidate_name, "Alice Smith");
    }

    #[tokio::test]
    async fn test_match_results_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), true).await;
        write_cv(&state.config.cv_bank_dir(), "alice.txt", CV_A);
        sync_cv_bank(&state).await;

        let tender_path = write_cv(&state.config.uploads_dir(), "tender.txt", TENDER);
        let tender = ingest_tender_file(&state, &tender_path).await.unwrap();
        let summary = run_match(&state, &tender).await.unwrap();

        let stored: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM match_results WHERE run_id = ?")
                .bind(summary.run_id.to_string())
                .fetch_one(&state.db)
                .await
                .unwrap();
        assert_eq!(stored as usize, summary.results.len());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Jane Doe CV (final).v2"), "jane-doe-cv-final-v2");
        assert_eq!(slugify("___"), "___");
        assert_eq!(slugify("??!"), "file");
    }
}
