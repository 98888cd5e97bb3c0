use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::extract::Extractor;
use crate::matching::MatchWeights;
use crate::semantic::SemanticIndex;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Document store: profiles, tenders, match runs.
    pub db: SqlitePool,
    /// Vector store + embedding backend. Owns vector persistence exclusively.
    pub index: Arc<SemanticIndex>,
    /// Pluggable extractor. Default: HeuristicExtractor.
    pub extractor: Arc<dyn Extractor>,
    /// Lexical/semantic blend for the hybrid matcher.
    pub weights: MatchWeights,
    pub config: Config,
}
