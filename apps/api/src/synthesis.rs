//! Search-Text Synthesizer — projects a structured record into the single
//! text blob fed to the embedding step.
//!
//! Field order is fixed and high-signal fields are repeated so the embedding
//! leans toward matchable vocabulary. The output must be stable for a given
//! record: the semantic index hashes it to decide whether re-embedding is
//! needed at all.

use crate::extract::ExtractedRecord;
use crate::extract::heuristics::normalize_space;
use crate::models::profile::CvRecord;
use crate::models::tender::TenderRecord;

/// Skills dominate matching, so they appear three times in the blob.
const SKILL_REPEAT: usize = 3;
/// Roles are the second-strongest signal.
const ROLE_REPEAT: usize = 2;
/// Free text is weak signal; only a fixed prefix participates.
const RAW_TEXT_PREFIX_CHARS: usize = 3000;

/// Canonical search text for any extracted record.
pub fn synthesize(record: &ExtractedRecord, raw_text: &str) -> String {
    match record {
        ExtractedRecord::Cv(cv) => synthesize_cv(cv, raw_text),
        ExtractedRecord::Tender(tender) => synthesize_tender(tender, raw_text),
    }
}

pub fn synthesize_cv(record: &CvRecord, raw_text: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    parts.push(record.full_name.clone());
    parts.push(record.summary.clone());
    push_repeated(&mut parts, &record.skills, SKILL_REPEAT);
    push_repeated(&mut parts, &record.roles, ROLE_REPEAT);
    parts.push(record.certifications.join(" "));
    parts.push(
        record
            .languages
            .iter()
            .map(|l| l.name.as_str())
            .collect::<Vec<_>>()
            .join(" "),
    );
    parts.push(record.keywords.join(" "));
    parts.push(prefix(raw_text, RAW_TEXT_PREFIX_CHARS));
    join_parts(parts)
}

pub fn synthesize_tender(record: &TenderRecord, raw_text: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    parts.push(record.title.clone());
    parts.push(record.summary.clone());
    push_repeated(&mut parts, &record.required_skills, SKILL_REPEAT);
    push_repeated(&mut parts, &record.required_roles, ROLE_REPEAT);
    parts.push(record.languages.join(" "));
    parts.push(record.keywords.join(" "));
    parts.push(prefix(raw_text, RAW_TEXT_PREFIX_CHARS));
    join_parts(parts)
}

fn push_repeated(parts: &mut Vec<String>, values: &[String], times: usize) {
    let joined = values.join(" ");
    for _ in 0..times {
        parts.push(joined.clone());
    }
}

fn prefix(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn join_parts(parts: Vec<String>) -> String {
    normalize_space(
        &parts
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
    )
}
