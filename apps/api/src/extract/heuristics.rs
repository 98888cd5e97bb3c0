//! Pattern-capture heuristics shared by CV and tender extraction.
//!
//! Everything here is a pure function of its input text (plus an explicit
//! reference year for experience estimation), so extraction stays
//! deterministic and testable.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::extract::catalog::{SECTION_HEADERS, STOPWORDS};
use crate::models::profile::Links;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"(?i)[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"(\+?\d[\d\s().-]{7,}\d)").unwrap();
    static ref LINKEDIN_RE: Regex =
        Regex::new(r"(?i)https?://(?:www\.)?linkedin\.com/[^\s]+").unwrap();
    static ref GITHUB_RE: Regex =
        Regex::new(r"(?i)https?://(?:www\.)?github\.com/[^\s]+").unwrap();
    static ref URL_RE: Regex = Regex::new(r"(?i)https?://[^\s]+").unwrap();
    static ref CALENDAR_YEAR_RE: Regex = Regex::new(r"\b(19\d{2}|20\d{2})\b").unwrap();
    static ref EXPLICIT_YEARS_RE: Regex =
        Regex::new(r"(?i)(\d+)\+?\s*(?:years|year|ans|an)\b").unwrap();
    static ref TOKEN_RE: Regex = Regex::new(r"[a-zA-Z][a-zA-Z+#/.-]{2,}").unwrap();
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// Experience estimates never exceed this; CVs listing graduation years from
/// the 80s would otherwise claim implausible spans.
const MAX_EXPERIENCE_YEARS: u32 = 25;

/// Default size of the keyword inventory.
pub const KEYWORD_LIMIT: usize = 12;

pub fn normalize_space(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

pub fn extract_email(text: &str) -> String {
    EMAIL_RE
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

pub fn extract_phone(text: &str) -> String {
    PHONE_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| normalize_space(m.as_str()))
        .unwrap_or_default()
}

pub fn extract_links(text: &str) -> Links {
    Links {
        linkedin: first_match(&LINKEDIN_RE, text),
        github: first_match(&GITHUB_RE, text),
        portfolio: first_match(&URL_RE, text),
    }
}

fn first_match(re: &Regex, text: &str) -> String {
    re.find(text).map(|m| m.as_str().to_string()).unwrap_or_default()
}

/// Estimates a candidate's experience from the span of calendar years in the
/// CV, falling back to an explicit "N years" mention. `reference_year` is
/// injected by the caller so repeated extraction of the same text is stable.
pub fn estimate_cv_experience_years(text: &str, reference_year: i32) -> Option<u32> {
    let mut years: Vec<i32> = CALENDAR_YEAR_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1)?.as_str().parse::<i32>().ok())
        .filter(|y| (1980..=reference_year).contains(y))
        .collect();
    years.sort_unstable();
    years.dedup();

    if years.len() >= 2 {
        let span = (reference_year - years[0]).clamp(0, MAX_EXPERIENCE_YEARS as i32);
        return Some(span as u32);
    }
    if years.len() == 1 {
        let span = (reference_year - years[0]).clamp(1, MAX_EXPERIENCE_YEARS as i32);
        return Some(span as u32);
    }
    explicit_years(text).next()
}

/// The strictest "N years" requirement in a tender, if any.
pub fn estimate_required_experience(text: &str) -> Option<u32> {
    explicit_years(text).max()
}

fn explicit_years(text: &str) -> impl Iterator<Item = u32> + '_ {
    EXPLICIT_YEARS_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1)?.as_str().parse::<u32>().ok())
        .filter(|&n| n <= MAX_EXPERIENCE_YEARS)
}

/// Frequency-ranked free-text keywords, stopwords removed. Ties are broken
/// alphabetically so the inventory is stable across runs.
pub fn extract_keywords(text: &str, limit: usize) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();

    for token in TOKEN_RE.find_iter(&lowered) {
        let cleaned = token.as_str().trim_matches([' ', '.', '-', '/']).to_string();
        if cleaned.len() < 3 || STOPWORDS.contains(&cleaned.as_str()) {
            continue;
        }
        *counts.entry(cleaned).or_insert(0) += 1;
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.into_iter().take(limit).map(|(word, _)| word).collect()
}

/// Splits a document into named sections keyed by canonical header name.
/// A line is a header when, stripped of trailing ':' and lowercased, it
/// exactly matches a known alias. Content before the first header is dropped.
pub fn split_sections(text: &str) -> BTreeMap<String, String> {
    let mut sections: BTreeMap<String, String> = BTreeMap::new();
    let mut current: Option<&str> = None;
    let mut buffer = String::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(name) = header_name(trimmed) {
            flush_section(&mut sections, current, &mut buffer);
            current = Some(name);
            continue;
        }
        if current.is_some() && !trimmed.is_empty() {
            if !buffer.is_empty() {
                buffer.push('\n');
            }
            buffer.push_str(trimmed);
        }
    }
    flush_section(&mut sections, current, &mut buffer);
    sections
}

fn header_name(line: &str) -> Option<&'static str> {
    if line.is_empty() || line.len() > 40 {
        return None;
    }
    let candidate = line.trim_end_matches(':').trim().to_lowercase();
    for (canonical, aliases) in SECTION_HEADERS {
        if aliases.iter().any(|a| *a == candidate) {
            return Some(canonical);
        }
    }
    None
}

fn flush_section(
    sections: &mut BTreeMap<String, String>,
    name: Option<&str>,
    buffer: &mut String,
) {
    if let Some(name) = name {
        if !buffer.is_empty() {
            // Repeated headers concatenate rather than overwrite.
            let entry = sections.entry(name.to_string()).or_default();
            if !entry.is_empty() {
                entry.push('\n');
            }
            entry.push_str(buffer);
        }
    }
    buffer.clear();
}

/// Guesses the candidate's name from the first lines of a CV: the first line
/// with at least two words, no digits, no email, and plausible length.
pub fn guess_full_name(text: &str) -> String {
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()).take(6) {
        if line.contains('@') || line.split_whitespace().count() < 2 || line.len() > 60 {
            continue;
        }
        if line.chars().any(|c| c.is_ascii_digit()) {
            continue;
        }
        return title_case(line);
    }
    String::new()
}

/// Fallback display name derived from the source file name.
pub fn name_from_source(source_name: &str) -> String {
    let stem = source_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(source_name);
    title_case(&stem.replace(['-', '_'], " "))
}

/// First `lines` non-empty lines joined and clipped to `max_chars`.
pub fn summary_snippet(text: &str, lines: usize, max_chars: usize) -> String {
    let joined = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(lines)
        .collect::<Vec<_>>()
        .join(" ");
    let normalized = normalize_space(&joined);
    normalized.chars().take(max_chars).collect()
}

pub fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
