use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::profile::EducationLevel;

/// Structured fields extracted from one tender (call-for-proposal) document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenderRecord {
    pub title: String,
    pub required_skills: Vec<String>,
    pub required_roles: Vec<String>,
    pub languages: Vec<String>,
    pub education_level: EducationLevel,
    pub min_years_experience: Option<u32>,
    /// Frequency-ranked terms from prominent text, stopwords removed.
    pub keywords: Vec<String>,
    pub summary: String,
    pub raw_sections: BTreeMap<String, String>,
    pub low_confidence: bool,
}

/// One tender as used by a matching run. Ephemeral: created per upload,
/// retained only in the run history.
#[derive(Debug, Clone, Serialize)]
pub struct TenderRequest {
    pub id: Uuid,
    pub source_name: String,
    pub raw_text: String,
    pub record: TenderRecord,
    pub search_text: String,
}

/// Row shape of the `tenders` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TenderRow {
    pub id: String,
    pub source_name: String,
    pub content_hash: String,
    pub json_path: String,
    pub title: String,
    pub record: sqlx::types::Json<TenderRecord>,
    pub search_text: String,
    pub created_at: DateTime<Utc>,
}
