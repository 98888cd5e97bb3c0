use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One ranked candidate for one tender. Scores are all in [0, 1];
/// `combined_score` is a pure function of the two scores and the configured
/// weights, so re-running an unchanged match reproduces identical ranks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub tender_id: Uuid,
    pub profile_id: String,
    pub candidate_name: String,
    pub source_name: String,
    pub lexical_score: f32,
    pub semantic_score: f32,
    pub combined_score: f32,
    /// 1-based position after deterministic sorting.
    pub rank: u32,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub justification: Vec<String>,
}

/// Row shape of the `match_runs` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchRunRow {
    pub id: String,
    pub tender_id: String,
    pub report_path: String,
    pub semantic_mode: String,
    pub created_at: DateTime<Utc>,
}

/// Row shape of the `match_results` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchResultRow {
    pub run_id: String,
    pub profile_id: String,
    pub rank: i64,
    pub lexical_score: f64,
    pub semantic_score: f64,
    pub combined_score: f64,
    pub matched_skills: sqlx::types::Json<Vec<String>>,
    pub missing_skills: sqlx::types::Json<Vec<String>>,
    pub justification: sqlx::types::Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
}
