use std::path::{Path, PathBuf};

use axum::{
    extract::{Multipart, Path as UrlPath, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::errors::AppError;
use crate::models::matching::{MatchResultRow, MatchRunRow};
use crate::models::profile::ProfileRow;
use crate::models::tender::TenderRow;
use crate::pipeline::reconcile::{reconcile, ReconcileReport};
use crate::pipeline::{
    ingest_cv_file, ingest_tender_file, run_match, slugify, sync_cv_bank, IngestOutcome,
    MatchRunSummary,
};
use crate::state::AppState;

#[derive(Serialize)]
pub struct MatchResponse {
    #[serde(flatten)]
    pub summary: MatchRunSummary,
    /// CVs uploaded with this request (empty means the stored bank was used).
    pub uploaded: Vec<IngestOutcome>,
    pub upload_failures: Vec<String>,
    pub bank_mode: bool,
}

#[derive(Serialize)]
pub struct IndexBankResponse {
    pub indexed: Vec<IngestOutcome>,
    pub failures: Vec<String>,
    pub total_cv_count: i64,
    pub semantic_index_count: i64,
}

/// POST /api/match
/// Multipart: `tender_file` (required) plus any number of `cv_files`.
/// Uploaded CVs are ingested first; the match then runs over every stored
/// profile.
pub async fn handle_match(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MatchResponse>, AppError> {
    let uploads_dir = state.config.uploads_dir();
    let mut tender_path: Option<PathBuf> = None;
    let mut cv_paths: Vec<PathBuf> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart request: {e}")))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or("upload.txt").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;

        match field_name.as_str() {
            "tender_file" => tender_path = Some(save_upload(&uploads_dir, &file_name, &bytes)?),
            "cv_files" => cv_paths.push(save_upload(&uploads_dir, &file_name, &bytes)?),
            _ => {}
        }
    }

    let tender_path = tender_path
        .ok_or_else(|| AppError::Validation("multipart field 'tender_file' is required".to_string()))?;

    let bank_mode = cv_paths.is_empty();
    let mut uploaded = Vec::new();
    let mut upload_failures = Vec::new();
    for path in &cv_paths {
        match ingest_cv_file(&state, path).await {
            Ok(outcome) => uploaded.push(outcome),
            Err(e) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                warn!("uploaded CV {name} skipped: {e}");
                upload_failures.push(name);
            }
        }
    }

    let tender = ingest_tender_file(&state, &tender_path).await?;
    let summary = run_match(&state, &tender).await?;

    Ok(Json(MatchResponse {
        summary,
        uploaded,
        upload_failures,
        bank_mode,
    }))
}

/// POST /api/index-bank
pub async fn handle_index_bank(
    State(state): State<AppState>,
) -> Result<Json<IndexBankResponse>, AppError> {
    let (indexed, failures) = sync_cv_bank(&state).await;
    Ok(Json(IndexBankResponse {
        indexed,
        failures,
        total_cv_count: count_profiles(&state).await?,
        semantic_index_count: state.index.count().await?,
    }))
}

/// GET /api/cvs
pub async fn handle_list_cvs(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProfileRow>>, AppError> {
    let rows: Vec<ProfileRow> =
        sqlx::query_as("SELECT * FROM profiles ORDER BY updated_at DESC, id DESC")
            .fetch_all(&state.db)
            .await?;
    Ok(Json(rows))
}

/// DELETE /api/cvs/:id
/// Explicit profile removal; evicts the vector entry as well.
pub async fn handle_remove_cv(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
) -> Result<StatusCode, AppError> {
    let deleted = sqlx::query("DELETE FROM profiles WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;
    if deleted.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("profile {id} not found")));
    }
    state.index.remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/health
pub async fn handle_api_health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    Ok(Json(json!({
        "status": "ok",
        "indexed_cv_count": count_profiles(&state).await?,
        "semantic_index_count": state.index.count().await?,
        "semantic_index_available": state.index.available(),
    })))
}

#[derive(Serialize, sqlx::FromRow)]
pub struct RecentRun {
    pub id: String,
    pub report_path: String,
    pub semantic_mode: String,
    pub created_at: chrono::DateTime<Utc>,
    pub tender_title: String,
    pub tender_source: String,
}

/// GET /api/admin/summary
pub async fn handle_admin_summary(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let tender_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tenders")
        .fetch_one(&state.db)
        .await?;
    let recent_runs: Vec<RecentRun> = sqlx::query_as(
        r#"
        SELECT
            mr.id,
            mr.report_path,
            mr.semantic_mode,
            mr.created_at,
            t.title AS tender_title,
            t.source_name AS tender_source
        FROM match_runs mr
        JOIN tenders t ON t.id = mr.tender_id
        ORDER BY mr.created_at DESC, mr.id DESC
        LIMIT 10
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    let recent_tenders: Vec<TenderRow> =
        sqlx::query_as("SELECT * FROM tenders ORDER BY created_at DESC, id DESC LIMIT 10")
            .fetch_all(&state.db)
            .await?;

    Ok(Json(json!({
        "cv_count": count_profiles(&state).await?,
        "tender_count": tender_count,
        "semantic_index_count": state.index.count().await?,
        "semantic_index_available": state.index.available(),
        "recent_runs": recent_runs,
        "recent_tenders": recent_tenders,
    })))
}

#[derive(Serialize)]
pub struct RunDetailResponse {
    pub run: MatchRunRow,
    pub results: Vec<MatchResultRow>,
}

/// GET /api/runs/:id
/// Stored results of one past match run.
pub async fn handle_get_run(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
) -> Result<Json<RunDetailResponse>, AppError> {
    let run: Option<MatchRunRow> = sqlx::query_as("SELECT * FROM match_runs WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?;
    let run = run.ok_or_else(|| AppError::NotFound(format!("match run {id} not found")))?;

    let results: Vec<MatchResultRow> =
        sqlx::query_as("SELECT * FROM match_results WHERE run_id = ? ORDER BY rank")
            .bind(&id)
            .fetch_all(&state.db)
            .await?;

    Ok(Json(RunDetailResponse { run, results }))
}

/// POST /api/admin/reconcile
pub async fn handle_reconcile(
    State(state): State<AppState>,
) -> Result<Json<ReconcileReport>, AppError> {
    let report = reconcile(&state.db, &state.index).await?;
    Ok(Json(report))
}

async fn count_profiles(state: &AppState) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
        .fetch_one(&state.db)
        .await?;
    Ok(count)
}

fn save_upload(uploads_dir: &Path, original_name: &str, bytes: &[u8]) -> Result<PathBuf, AppError> {
    let (stem, extension) = match original_name.rsplit_once('.') {
        Some((stem, ext)) => (stem, format!(".{}", ext.to_ascii_lowercase())),
        None => (original_name, ".txt".to_string()),
    };
    let file_name = format!(
        "{}-{}{}",
        Utc::now().format("%Y%m%d%H%M%S"),
        slugify(stem),
        extension
    );
    let path = uploads_dir.join(file_name);
    std::fs::write(&path, bytes)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to store upload: {e}")))?;
    Ok(path)
}
