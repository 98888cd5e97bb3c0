//! Report Renderer — writes the ranked shortlist as a markdown document.
//!
//! Thin collaborator: everything it shows comes from the MatchResults and the
//! tender record; it adds no scoring logic of its own.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::models::matching::MatchResult;
use crate::models::tender::TenderRequest;

/// How many candidates the shortlist shows.
pub const SHORTLIST_SIZE: usize = 5;

/// Renders the shortlist document. Pure: same inputs, same markdown.
pub fn render_shortlist(tender: &TenderRequest, results: &[MatchResult]) -> String {
    let record = &tender.record;
    let mut out = String::new();

    out.push_str("# Shortlist Report\n\n");
    out.push_str(&format!("Tender: {}\n\n", record.title));
    out.push_str(&format!(
        "Required skills: {}\n\n",
        if record.required_skills.is_empty() {
            "Not detected".to_string()
        } else {
            record.required_skills.join(", ")
        }
    ));
    if let Some(years) = record.min_years_experience {
        out.push_str(&format!("Required experience: {years} years\n\n"));
    }

    for result in results.iter().take(SHORTLIST_SIZE) {
        out.push_str(&format!(
            "## {}. {} — {:.2}\n\n",
            result.rank, result.candidate_name, result.combined_score
        ));
        out.push_str(&format!("Source file: {}\n\n", result.source_name));
        out.push_str(&format!("Lexical score: {:.2}\n\n", result.lexical_score));
        out.push_str(&format!("Semantic score: {:.2}\n\n", result.semantic_score));
        out.push_str(&format!(
            "Matched skills: {}\n\n",
            if result.matched_skills.is_empty() {
                "No direct match detected".to_string()
            } else {
                result.matched_skills.join(", ")
            }
        ));
        out.push_str(&format!(
            "Missing skills: {}\n\n",
            if result.missing_skills.is_empty() {
                "None".to_string()
            } else {
                result.missing_skills.join(", ")
            }
        ));
        for note in &result.justification {
            out.push_str(&format!("- {note}\n"));
        }
        out.push('\n');
    }

    out
}

/// Writes the shortlist under `reports_dir` with a timestamped file name and
/// returns the path.
pub fn write_report(
    reports_dir: &Path,
    tender: &TenderRequest,
    results: &[MatchResult],
    generated_at: DateTime<Utc>,
) -> Result<PathBuf> {
    let file_name = format!("{}-shortlist.md", generated_at.format("%Y%m%d%H%M%S"));
    let path = reports_dir.join(file_name);
    std::fs::write(&path, render_shortlist(tender, results))
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tender::TenderRecord;
    use uuid::Uuid;

    fn sample_tender() -> TenderRequest {
        TenderRequest {
            id: Uuid::nil(),
            source_name: "tender.txt".to_string(),
            raw_text: String::new(),
            record: TenderRecord {
                title: "Data Platform Tender".to_string(),
                required_skills: vec!["python".to_string(), "sql".to_string()],
                min_years_experience: Some(5),
                ..TenderRecord::default()
            },
            search_text: String::new(),
        }
    }

    fn sample_result(rank: u32, name: &str) -> MatchResult {
        MatchResult {
            tender_id: Uuid::nil(),
            profile_id: name.to_lowercase(),
            candidate_name: name.to_string(),
            source_name: format!("{}.txt", name.to_lowercase()),
            lexical_score: 0.67,
            semantic_score: 0.8,
            combined_score: 0.73,
            rank,
            matched_skills: vec!["python".to_string()],
            missing_skills: vec!["sql".to_string()],
            justification: vec!["Skills matched: python".to_string()],
        }
    }

    #[test]
    fn test_render_contains_tender_and_candidates() {
        let markdown = render_shortlist(
            &sample_tender(),
            &[sample_result(1, "Jane"), sample_result(2, "John")],
        );
        assert!(markdown.contains("Data Platform Tender"));
        assert!(markdown.contains("## 1. Jane"));
        assert!(markdown.contains("## 2. John"));
        assert!(markdown.contains("Required experience: 5 years"));
        assert!(markdown.contains("- Skills matched: python"));
    }

    #[test]
    fn test_render_is_clipped_to_shortlist_size() {
        let results: Vec<MatchResult> = (1..=8)
            .map(|i| sample_result(i, &format!("C{i}")))
            .collect();
        let markdown = render_shortlist(&sample_tender(), &results);
        assert!(markdown.contains("## 5. C5"));
        assert!(!markdown.contains("## 6. C6"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let tender = sample_tender();
        let results = [sample_result(1, "Jane")];
        assert_eq!(
            render_shortlist(&tender, &results),
            render_shortlist(&tender, &results)
        );
    }

    #[test]
    fn test_write_report_creates_timestamped_file() {
        let dir = tempfile::tempdir().unwrap();
        let generated_at = chrono::DateTime::parse_from_rfc3339("2026-08-06T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let path = write_report(dir.path(), &sample_tender(), &[sample_result(1, "Jane")], generated_at)
            .unwrap();

        assert_eq!(path.file_name().unwrap(), "20260806120000-shortlist.md");
        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.contains("Jane"));
    }
}
