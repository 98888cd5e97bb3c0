//! Semantic search infrastructure: embedding backends and the persistent
//! vector index keyed by profile id.

pub mod embedder;
pub mod index;

pub use embedder::{Embedder, FastEmbedder, HashEmbedder, EMBEDDING_DIM};
pub use index::{IndexError, SemanticIndex, UpsertOutcome};
