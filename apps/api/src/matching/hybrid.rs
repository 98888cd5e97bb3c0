//! Hybrid Matcher — merges lexical and semantic signal into one ranked list.
//!
//! The ranking core is a pure function: given the tender, the candidate set,
//! the semantic hits, and the weights, it always produces the same scores and
//! the same order. Semantic unavailability is an explicit mode, not a silent
//! accuracy loss.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::matching::lexical::{lexical_score, LexicalBreakdown};
use crate::models::matching::MatchResult;
use crate::models::profile::Profile;
use crate::models::tender::TenderRequest;

/// Relative weights of the two signals, normalized to sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchWeights {
    lexical: f32,
    semantic: f32,
}

impl MatchWeights {
    pub fn new(lexical: f32, semantic: f32) -> Self {
        let sum = lexical + semantic;
        if sum.is_nan() || sum <= 0.0 || lexical < 0.0 || semantic < 0.0 {
            return Self::default();
        }
        Self {
            lexical: lexical / sum,
            semantic: semantic / sum,
        }
    }

    pub fn lexical(&self) -> f32 {
        self.lexical
    }

    pub fn semantic(&self) -> f32 {
        self.semantic
    }
}

impl Default for MatchWeights {
    /// The documented default blend: 0.55 lexical / 0.45 semantic.
    fn default() -> Self {
        Self {
            lexical: 0.55,
            semantic: 0.45,
        }
    }
}

/// Whether the semantic index contributed to this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticMode {
    Hybrid,
    /// Index unavailable: semantic scores are uniformly zero and the combined
    /// score equals the lexical score.
    LexicalOnly,
}

impl SemanticMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticMode::Hybrid => "hybrid",
            SemanticMode::LexicalOnly => "lexical_only",
        }
    }
}

/// Ranks every candidate for the tender. Candidates absent from
/// `semantic_hits` (outside top-k, missing vector, or lexical-only mode)
/// score semantic 0 but still appear. Sorting is fully deterministic:
/// combined desc, lexical desc, profile id asc.
pub fn rank_candidates(
    tender: &TenderRequest,
    profiles: &[Profile],
    semantic_hits: &HashMap<String, f32>,
    mode: SemanticMode,
    weights: MatchWeights,
) -> Vec<MatchResult> {
    let mut results: Vec<MatchResult> = profiles
        .iter()
        .map(|profile| {
            let breakdown = lexical_score(&tender.record, &profile.record);
            let semantic = match mode {
                SemanticMode::LexicalOnly => 0.0,
                SemanticMode::Hybrid => semantic_hits
                    .get(&profile.id)
                    .copied()
                    .unwrap_or(0.0)
                    .clamp(0.0, 1.0),
            };
            let combined = match mode {
                SemanticMode::LexicalOnly => breakdown.score,
                SemanticMode::Hybrid => {
                    (weights.lexical() * breakdown.score + weights.semantic() * semantic)
                        .clamp(0.0, 1.0)
                }
            };
            let justification = build_justification(tender, profile, &breakdown, semantic, mode);
            MatchResult {
                tender_id: tender.id,
                profile_id: profile.id.clone(),
                candidate_name: profile.record.full_name.clone(),
                source_name: profile.source_name.clone(),
                lexical_score: breakdown.score,
                semantic_score: semantic,
                combined_score: combined,
                rank: 0,
                matched_skills: breakdown.matched_skills,
                missing_skills: breakdown.missing_skills,
                justification,
            }
        })
        .collect();

    results.sort_by(|a, b| {
        b.combined_score
            .total_cmp(&a.combined_score)
            .then_with(|| b.lexical_score.total_cmp(&a.lexical_score))
            .then_with(|| a.profile_id.cmp(&b.profile_id))
    });
    for (index, result) in results.iter_mut().enumerate() {
        result.rank = (index + 1) as u32;
    }
    results
}

/// Human-readable notes carried into the shortlist report.
fn build_justification(
    tender: &TenderRequest,
    profile: &Profile,
    breakdown: &LexicalBreakdown,
    semantic: f32,
    mode: SemanticMode,
) -> Vec<String> {
    let mut notes = Vec::new();
    match mode {
        SemanticMode::Hybrid => {
            notes.push(format!("Semantic similarity: {:.2}", semantic));
        }
        SemanticMode::LexicalOnly => {
            notes.push("Semantic index unavailable; ranked by keyword overlap only".to_string());
        }
    }
    if !breakdown.matched_skills.is_empty() {
        notes.push(format!(
            "Skills matched: {}",
            breakdown.matched_skills.iter().take(6).cloned().collect::<Vec<_>>().join(", ")
        ));
    }
    if !breakdown.missing_skills.is_empty() {
        notes.push(format!(
            "Missing skills: {}",
            breakdown.missing_skills.iter().take(5).cloned().collect::<Vec<_>>().join(", ")
        ));
    }
    if !breakdown.common_languages.is_empty() {
        notes.push(format!(
            "Languages aligned: {}",
            breakdown.common_languages.join(", ")
        ));
    }
    if let Some(required) = tender.record.min_years_experience {
        let candidate = profile.record.years_experience.unwrap_or(0);
        notes.push(format!(
            "Experience: candidate {candidate} years vs requirement {required}"
        ));
    }
    notes
}
