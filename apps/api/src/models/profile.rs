use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Education attainment detected in a document, ordered by rank so that
/// `candidate >= required` expresses "meets the requirement".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationLevel {
    #[default]
    Unspecified,
    Bachelor,
    Master,
    Phd,
}

impl EducationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EducationLevel::Unspecified => "",
            EducationLevel::Bachelor => "bachelor",
            EducationLevel::Master => "master",
            EducationLevel::Phd => "phd",
        }
    }
}

/// Web presence links captured from a CV.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Links {
    pub linkedin: String,
    pub github: String,
    pub portfolio: String,
}

/// A spoken language detected in a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageSkill {
    pub name: String,
    pub proficiency: Option<String>,
}

/// Structured fields extracted from one candidate CV.
///
/// Everything here is produced by deterministic pattern heuristics; repeated
/// extraction of the same text yields an identical record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CvRecord {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub links: Links,
    pub summary: String,
    /// Deduplicated case-insensitively; case of the first occurrence preserved.
    pub skills: Vec<String>,
    pub roles: Vec<String>,
    pub certifications: Vec<String>,
    pub languages: Vec<LanguageSkill>,
    pub education_level: EducationLevel,
    pub years_experience: Option<u32>,
    pub keywords: Vec<String>,
    pub raw_sections: BTreeMap<String, String>,
    /// Set when the input text was below the extraction threshold.
    pub low_confidence: bool,
}

/// One candidate profile: stable identity plus everything derived from the
/// source file. The embedding vector is owned by the semantic index, not here.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    /// SHA-256 of the source file bytes.
    pub id: String,
    pub source_name: String,
    pub raw_text: String,
    pub record: CvRecord,
    pub search_text: String,
}

/// Row shape of the `profiles` table. Scalar columns are denormalized from the
/// record for inspection; `record` holds the full structured fields as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProfileRow {
    pub id: String,
    pub source_name: String,
    pub file_path: String,
    pub json_path: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub experience_years: Option<i64>,
    pub education_level: String,
    pub record: sqlx::types::Json<CvRecord>,
    pub raw_text: String,
    pub search_text: String,
    pub low_confidence: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
