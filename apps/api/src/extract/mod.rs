//! Heuristic Extractor — deterministic pattern-based document understanding.
//!
//! The `Extractor` trait is the seam for richer backends (an LLM-assisted
//! extractor can slot in behind it later); `HeuristicExtractor` is the default
//! and only shipped implementation: keyword catalogs, section detection, and
//! numeric capture, with no randomness and no external calls.

pub mod catalog;
pub mod cv;
pub mod heuristics;
pub mod tender;

use async_trait::async_trait;

use crate::models::profile::CvRecord;
use crate::models::tender::TenderRecord;

/// Which kind of document is being extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Cv,
    Tender,
}

/// Tagged result of extraction; variant follows the requested kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedRecord {
    Cv(CvRecord),
    Tender(TenderRecord),
}

impl ExtractedRecord {
    pub fn low_confidence(&self) -> bool {
        match self {
            ExtractedRecord::Cv(record) => record.low_confidence,
            ExtractedRecord::Tender(record) => record.low_confidence,
        }
    }
}

/// Document extractor. Implementations never fail hard: unparseable input
/// yields an empty low-confidence record so batch ingestion keeps going.
///
/// Carried in `AppState` as `Arc<dyn Extractor>`.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, text: &str, source_name: &str, kind: DocumentKind) -> ExtractedRecord;
}

/// Pure-Rust heuristic extractor. The reference year for experience
/// estimation is fixed at construction so `extract` stays a pure function of
/// its input text.
pub struct HeuristicExtractor {
    reference_year: i32,
    min_text_chars: usize,
}

impl HeuristicExtractor {
    pub fn new(reference_year: i32, min_text_chars: usize) -> Self {
        Self {
            reference_year,
            min_text_chars,
        }
    }
}

#[async_trait]
impl Extractor for HeuristicExtractor {
    async fn extract(&self, text: &str, source_name: &str, kind: DocumentKind) -> ExtractedRecord {
        match kind {
            DocumentKind::Cv => ExtractedRecord::Cv(cv::parse_cv(
                text,
                source_name,
                self.reference_year,
                self.min_text_chars,
            )),
            DocumentKind::Tender => ExtractedRecord::Tender(tender::parse_tender(
                text,
                source_name,
                self.min_text_chars,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_extractor_dispatches_on_kind() {
        let extractor = HeuristicExtractor::new(2026, 40);
        let text = "A long enough document mentioning Python and SQL for a data engineer role.";

        match extractor.extract(text, "cv.txt", DocumentKind::Cv).await {
            ExtractedRecord::Cv(record) => assert!(!record.skills.is_empty()),
            other => panic!("expected CV record, got {other:?}"),
        }
        match extractor.extract(text, "tender.txt", DocumentKind::Tender).await {
            ExtractedRecord::Tender(record) => assert!(!record.required_skills.is_empty()),
            other => panic!("expected tender record, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_extract_twice_yields_identical_records() {
        let extractor = HeuristicExtractor::new(2026, 40);
        let text = "Jane Doe\nPython developer since 2018, Docker and Kubernetes in production.";

        let a = extractor.extract(text, "cv.txt", DocumentKind::Cv).await;
        let b = extractor.extract(text, "cv.txt", DocumentKind::Cv).await;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_low_confidence_surfaces_through_the_trait() {
        let extractor = HeuristicExtractor::new(2026, 40);
        let record = extractor.extract("", "empty.txt", DocumentKind::Cv).await;
        assert!(record.low_confidence());
    }
}
