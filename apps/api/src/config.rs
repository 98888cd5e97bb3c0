use std::path::PathBuf;

use anyhow::{Context, Result};

/// Embedding backend selected at startup via `EMBEDDING_BACKEND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// Local ONNX model via fastembed (all-MiniLM-L6-v2). Downloads on first run.
    FastEmbed,
    /// Deterministic FNV-1a feature hashing. No model download, offline-safe.
    Hash,
    /// No semantic index; matching runs lexical-only.
    Disabled,
}

/// Application configuration loaded from environment variables once at startup.
/// Every value has a local-friendly default; nothing is required.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
    /// How many candidates the semantic index returns per match run.
    pub search_top_k: usize,
    /// Relative weight of the lexical score in the combined score.
    pub lexical_weight: f32,
    /// Relative weight of the semantic score in the combined score.
    pub semantic_weight: f32,
    /// Below this many characters, extraction yields an empty low-confidence record.
    pub min_extract_chars: usize,
    pub embedding_backend: EmbeddingBackend,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            data_dir: PathBuf::from(env_or("DATA_DIR", "data")),
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
            search_top_k: env_or("SEARCH_TOP_K", "10")
                .parse::<usize>()
                .context("SEARCH_TOP_K must be a non-negative integer")?,
            lexical_weight: env_or("LEXICAL_WEIGHT", "0.55")
                .parse::<f32>()
                .context("LEXICAL_WEIGHT must be a number")?,
            semantic_weight: env_or("SEMANTIC_WEIGHT", "0.45")
                .parse::<f32>()
                .context("SEMANTIC_WEIGHT must be a number")?,
            min_extract_chars: env_or("MIN_EXTRACT_CHARS", "40")
                .parse::<usize>()
                .context("MIN_EXTRACT_CHARS must be a non-negative integer")?,
            embedding_backend: parse_backend(&env_or("EMBEDDING_BACKEND", "fastembed"))?,
        })
    }

    pub fn documents_db_path(&self) -> PathBuf {
        self.data_dir.join("documents.db")
    }

    pub fn vectors_db_path(&self) -> PathBuf {
        self.data_dir.join("vectors.db")
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    pub fn cv_bank_dir(&self) -> PathBuf {
        self.data_dir.join("cv_bank")
    }

    pub fn parsed_cvs_dir(&self) -> PathBuf {
        self.data_dir.join("parsed").join("cvs")
    }

    pub fn parsed_tenders_dir(&self) -> PathBuf {
        self.data_dir.join("parsed").join("tenders")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.data_dir.join("reports")
    }

    /// Creates the on-disk layout. Idempotent.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [
            self.uploads_dir(),
            self.cv_bank_dir(),
            self.parsed_cvs_dir(),
            self.parsed_tenders_dir(),
            self.reports_dir(),
        ] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }

    /// A config rooted at an arbitrary directory, used by tests.
    #[cfg(test)]
    pub fn for_data_dir(data_dir: &std::path::Path) -> Self {
        Config {
            data_dir: data_dir.to_path_buf(),
            port: 0,
            rust_log: "info".to_string(),
            search_top_k: 10,
            lexical_weight: 0.55,
            semantic_weight: 0.45,
            min_extract_chars: 40,
            embedding_backend: EmbeddingBackend::Hash,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_backend(value: &str) -> Result<EmbeddingBackend> {
    match value.to_ascii_lowercase().as_str() {
        "fastembed" => Ok(EmbeddingBackend::FastEmbed),
        "hash" => Ok(EmbeddingBackend::Hash),
        "disabled" | "off" | "none" => Ok(EmbeddingBackend::Disabled),
        other => {
            anyhow::bail!("unknown EMBEDDING_BACKEND '{other}' (expected fastembed, hash or disabled)")
        }
    }
}
