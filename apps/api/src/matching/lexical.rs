//! Lexical scoring — keyword-overlap match strength, independent of
//! embeddings.
//!
//! The score is the Jaccard overlap between the tender's term set
//! (required skills ∪ keywords) and the candidate's term set (skills ∪
//! roles), compared case-insensitively and clipped to [0, 1].

use std::collections::BTreeSet;

use crate::models::profile::CvRecord;
use crate::models::tender::TenderRecord;

/// Lexical score plus the detail the report renderer shows.
#[derive(Debug, Clone, PartialEq)]
pub struct LexicalBreakdown {
    pub score: f32,
    /// Tender required skills the candidate covers (tender's surface forms).
    pub matched_skills: Vec<String>,
    /// Tender required skills the candidate lacks.
    pub missing_skills: Vec<String>,
    /// Languages required by the tender that the candidate also lists.
    pub common_languages: Vec<String>,
}

pub fn lexical_score(tender: &TenderRecord, cv: &CvRecord) -> LexicalBreakdown {
    let tender_terms: BTreeSet<String> = tender
        .required_skills
        .iter()
        .chain(tender.keywords.iter())
        .map(|t| t.to_lowercase())
        .collect();
    let candidate_terms: BTreeSet<String> = cv
        .skills
        .iter()
        .chain(cv.roles.iter())
        .map(|t| t.to_lowercase())
        .collect();

    let intersection = tender_terms.intersection(&candidate_terms).count();
    let union = tender_terms.union(&candidate_terms).count();
    let score = if union == 0 {
        0.0
    } else {
        (intersection as f32 / union as f32).clamp(0.0, 1.0)
    };

    let candidate_skills: BTreeSet<String> =
        cv.skills.iter().map(|s| s.to_lowercase()).collect();
    let mut matched_skills = Vec::new();
    let mut missing_skills = Vec::new();
    for skill in &tender.required_skills {
        if candidate_skills.contains(&skill.to_lowercase()) {
            matched_skills.push(skill.clone());
        } else {
            missing_skills.push(skill.clone());
        }
    }
    matched_skills.sort();
    missing_skills.sort();

    let candidate_languages: BTreeSet<String> = cv
        .languages
        .iter()
        .map(|l| l.name.to_lowercase())
        .collect();
    let mut common_languages: Vec<String> = tender
        .languages
        .iter()
        .filter(|l| candidate_languages.contains(&l.to_lowercase()))
        .cloned()
        .collect();
    common_languages.sort();

    LexicalBreakdown {
        score,
        matched_skills,
        missing_skills,
        common_languages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::LanguageSkill;

    fn tender_with_skills(skills: &[&str]) -> TenderRecord {
        TenderRecord {
            required_skills: skills.iter().map(|s| s.to_string()).collect(),
            ..TenderRecord::default()
        }
    }

    fn cv_with_skills(skills: &[&str]) -> CvRecord {
        CvRecord {
            skills: skills.iter().map(|s| s.to_string()).collect(),
            ..CvRecord::default()
        }
    }

    #[test]
    fn test_full_overlap_with_extra_candidate_skill() {
        // tender {python, sql} vs candidate {python, sql, docker}:
        // intersection 2, union 3
        let breakdown = lexical_score(
            &tender_with_skills(&["python", "sql"]),
            &cv_with_skills(&["python", "sql", "docker"]),
        );
        assert!((breakdown.score - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(breakdown.matched_skills, vec!["python", "sql"]);
        assert!(breakdown.missing_skills.is_empty());
    }

    #[test]
    fn test_no_overlap_scores_zero() {
        let breakdown = lexical_score(
            &tender_with_skills(&["python", "sql"]),
            &cv_with_skills(&["java"]),
        );
        assert_eq!(breakdown.score, 0.0);
        assert_eq!(breakdown.missing_skills, vec!["python", "sql"]);
    }

    #[test]
    fn test_comparison_is_case_insensitive() {
        let breakdown = lexical_score(
            &tender_with_skills(&["Python"]),
            &cv_with_skills(&["python"]),
        );
        assert!((breakdown.score - 1.0).abs() < 1e-6);
        assert_eq!(breakdown.matched_skills, vec!["Python"]);
    }

    #[test]
    fn test_candidate_roles_count_as_terms() {
        let mut tender = tender_with_skills(&[]);
        tender.keywords = vec!["data engineer".to_string()];
        let mut cv = cv_with_skills(&[]);
        cv.roles = vec!["data engineer".to_string()];

        let breakdown = lexical_score(&tender, &cv);
        assert!((breakdown.score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_sets_score_zero() {
        let breakdown = lexical_score(&tender_with_skills(&[]), &cv_with_skills(&[]));
        assert_eq!(breakdown.score, 0.0);
    }

    #[test]
    fn test_common_languages_reported() {
        let mut tender = tender_with_skills(&["python"]);
        tender.languages = vec!["English".to_string(), "German".to_string()];
        let mut cv = cv_with_skills(&["python"]);
        cv.languages = vec![LanguageSkill {
            name: "English".to_string(),
            proficiency: None,
        }];

        let breakdown = lexical_score(&tender, &cv);
        assert_eq!(breakdown.common_languages, vec!["English"]);
    }

    #[test]
    fn test_lexical_score_is_deterministic() {
        let tender = tender_with_skills(&["python", "sql"]);
        let cv = cv_with_skills(&["python", "docker"]);
        assert_eq!(lexical_score(&tender, &cv), lexical_score(&tender, &cv));
    }
}
