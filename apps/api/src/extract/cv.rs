//! CV extraction — raw text to a structured `CvRecord` via pattern heuristics.

use crate::extract::catalog::{
    contains_term, dedup_preserve_first_case, detect_terms, CERT_CATALOG, EDUCATION_CATALOG,
    LANGUAGE_CATALOG, ROLE_CATALOG, SKILL_CATALOG,
};
use crate::extract::heuristics::{
    estimate_cv_experience_years, extract_email, extract_keywords, extract_links, extract_phone,
    guess_full_name, name_from_source, split_sections, summary_snippet, KEYWORD_LIMIT,
};
use crate::models::profile::{CvRecord, EducationLevel, LanguageSkill};

const SUMMARY_LINES: usize = 5;
const SUMMARY_MAX_CHARS: usize = 300;

/// Extracts a structured record from CV text. Never fails: input below
/// `min_chars` yields an empty record flagged low-confidence, so batch
/// ingestion degrades per-file instead of aborting.
pub fn parse_cv(text: &str, source_name: &str, reference_year: i32, min_chars: usize) -> CvRecord {
    let trimmed = text.trim();
    if trimmed.len() < min_chars {
        return CvRecord {
            full_name: name_from_source(source_name),
            low_confidence: true,
            ..CvRecord::default()
        };
    }

    let skills = dedup_preserve_first_case(
        detect_terms(trimmed, SKILL_CATALOG)
            .into_iter()
            .map(|hit| hit.surface)
            .collect(),
    );
    let roles = detect_terms(trimmed, ROLE_CATALOG)
        .into_iter()
        .map(|hit| hit.canonical)
        .collect();
    let certifications = detect_terms(trimmed, CERT_CATALOG)
        .into_iter()
        .map(|hit| hit.canonical)
        .collect();
    let languages = detect_terms(trimmed, LANGUAGE_CATALOG)
        .into_iter()
        .map(|hit| LanguageSkill {
            name: hit.canonical,
            proficiency: None,
        })
        .collect();

    let full_name = match guess_full_name(trimmed) {
        name if name.is_empty() => name_from_source(source_name),
        name => name,
    };

    CvRecord {
        full_name,
        email: extract_email(trimmed),
        phone: extract_phone(trimmed),
        links: extract_links(trimmed),
        summary: summary_snippet(trimmed, SUMMARY_LINES, SUMMARY_MAX_CHARS),
        skills,
        roles,
        certifications,
        languages,
        education_level: detect_education_level(trimmed),
        years_experience: estimate_cv_experience_years(trimmed, reference_year),
        keywords: extract_keywords(trimmed, KEYWORD_LIMIT),
        raw_sections: split_sections(trimmed),
        low_confidence: false,
    }
}

/// The highest education level mentioned anywhere in the text.
pub fn detect_education_level(text: &str) -> EducationLevel {
    for (level, aliases) in EDUCATION_CATALOG {
        if aliases.iter().any(|alias| contains_term(text, alias)) {
            return *level;
        }
    }
    EducationLevel::Unspecified
}
