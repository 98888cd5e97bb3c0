//! Tender extraction — raw text to a structured `TenderRecord`.

use crate::extract::catalog::{
    dedup_preserve_first_case, detect_terms, LANGUAGE_CATALOG, ROLE_CATALOG, SKILL_CATALOG,
};
use crate::extract::cv::detect_education_level;
use crate::extract::heuristics::{
    estimate_required_experience, extract_keywords, name_from_source, split_sections,
    summary_snippet, KEYWORD_LIMIT,
};
use crate::models::tender::TenderRecord;

const SUMMARY_LINES: usize = 8;
const SUMMARY_MAX_CHARS: usize = 500;

/// Extracts a structured record from tender text. Mirrors `parse_cv`'s
/// degradation contract: below `min_chars` the record is empty and flagged.
pub fn parse_tender(text: &str, source_name: &str, min_chars: usize) -> TenderRecord {
    let trimmed = text.trim();
    if trimmed.len() < min_chars {
        return TenderRecord {
            title: name_from_source(source_name),
            low_confidence: true,
            ..TenderRecord::default()
        };
    }

    let title = trimmed
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| name_from_source(source_name));

    let required_skills = dedup_preserve_first_case(
        detect_terms(trimmed, SKILL_CATALOG)
            .into_iter()
            .map(|hit| hit.surface)
            .collect(),
    );
    let required_roles = detect_terms(trimmed, ROLE_CATALOG)
        .into_iter()
        .map(|hit| hit.canonical)
        .collect();
    let languages = detect_terms(trimmed, LANGUAGE_CATALOG)
        .into_iter()
        .map(|hit| hit.canonical)
        .collect();

    TenderRecord {
        title,
        required_skills,
        required_roles,
        languages,
        education_level: detect_education_level(trimmed),
        min_years_experience: estimate_required_experience(trimmed),
        keywords: extract_keywords(trimmed, KEYWORD_LIMIT),
        summary: summary_snippet(trimmed, SUMMARY_LINES, SUMMARY_MAX_CHARS),
        raw_sections: split_sections(trimmed),
        low_confidence: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::EducationLevel;

    const TENDER_FIXTURE: &str = "\
Data Platform Modernization Tender
We are looking for a data engineer to modernize our analytics stack.

Requirements:
5+ years of experience with Python and SQL
Docker deployment experience
Master degree in computer science
English and French required
";

    #[test]
    fn test_parse_tender_is_deterministic() {
        let a = parse_tender(TENDER_FIXTURE, "tender.txt", 40);
        let b = parse_tender(TENDER_FIXTURE, "tender.txt", 40);
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_tender_extracts_requirements() {
        let record = parse_tender(TENDER_FIXTURE, "tender.txt", 40);
        assert_eq!(record.title, "Data Platform Modernization Tender");
        assert!(record
            .required_skills
            .iter()
            .any(|s| s.eq_ignore_ascii_case("python")));
        assert!(record
            .required_skills
            .iter()
            .any(|s| s.eq_ignore_ascii_case("sql")));
        assert_eq!(record.min_years_experience, Some(5));
        assert_eq!(record.education_level, EducationLevel::Master);
        assert!(record.languages.contains(&"English".to_string()));
        assert!(record.languages.contains(&"French".to_string()));
        assert!(record.required_roles.contains(&"data engineer".to_string()));
    }

    #[test]
    fn test_short_tender_is_low_confidence() {
        let record = parse_tender("need devs", "big-tender.pdf", 40);
        assert!(record.low_confidence);
        assert!(record.required_skills.is_empty());
        assert_eq!(record.title, "Big Tender");
        assert_eq!(record.min_years_experience, None);
    }

    #[test]
    fn test_requirements_section_is_captured() {
        let record = parse_tender(TENDER_FIXTURE, "tender.txt", 40);
        let requirements = record.raw_sections.get("requirements").unwrap();
        assert!(requirements.contains("Python and SQL"));
    }
}
