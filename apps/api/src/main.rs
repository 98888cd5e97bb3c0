mod config;
mod db;
mod errors;
mod extract;
mod loader;
mod matching;
mod models;
mod pipeline;
mod report;
mod routes;
mod semantic;
mod state;
mod synthesis;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use chrono::Datelike;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, EmbeddingBackend};
use crate::db::{create_pool, init_schema};
use crate::extract::HeuristicExtractor;
use crate::matching::MatchWeights;
use crate::routes::build_router;
use crate::semantic::{Embedder, FastEmbedder, HashEmbedder, SemanticIndex};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; everything below receives explicit values.
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tendermatch API v{}", env!("CARGO_PKG_VERSION"));
    config.ensure_dirs()?;

    // Document store
    let db = create_pool(&config.documents_db_path()).await?;
    init_schema(&db).await?;

    // Embedding backend. A failed model load is recoverable: the service
    // starts anyway and matching degrades to lexical-only until the index
    // comes back (e.g. after a reconcile once the model download succeeds).
    let embedder: Option<Arc<dyn Embedder>> = match config.embedding_backend {
        EmbeddingBackend::FastEmbed => match FastEmbedder::new() {
            Ok(embedder) => Some(Arc::new(embedder)),
            Err(e) => {
                warn!("embedding model unavailable, running lexical-only: {e}");
                None
            }
        },
        EmbeddingBackend::Hash => Some(Arc::new(HashEmbedder::default())),
        EmbeddingBackend::Disabled => None,
    };

    // Vector store (independent database, same id namespace as profiles)
    let vector_pool = create_pool(&config.vectors_db_path()).await?;
    let index = Arc::new(SemanticIndex::open(vector_pool, embedder).await?);
    if index.available() {
        // Idempotent warm-up; a failure here is logged, not fatal.
        if let Err(e) = index.warmup().await {
            warn!("embedding warm-up failed: {e}");
        }
        info!("semantic index ready ({} vectors)", index.count().await?);
    } else {
        info!("semantic index disabled; matching runs lexical-only");
    }

    let extractor = Arc::new(HeuristicExtractor::new(
        chrono::Utc::now().year(),
        config.min_extract_chars,
    ));
    let weights = MatchWeights::new(config.lexical_weight, config.semantic_weight);

    // Build app state
    let state = AppState {
        db,
        index,
        extractor,
        weights,
        config: config.clone(),
    };

    // Index whatever sits in the CV bank before accepting requests.
    let (indexed, failures) = pipeline::sync_cv_bank(&state).await;
    info!(
        "CV bank synced: {} ingested, {} skipped",
        indexed.len(),
        failures.len()
    );

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
