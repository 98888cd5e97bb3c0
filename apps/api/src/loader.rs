//! Document Loader — turns an uploaded or bank file into normalized UTF-8 text.
//!
//! Supported: PDF (via pdf-extract), plain text, markdown. Anything else is a
//! `LoadError`. Empty text is valid output; extraction downstream degrades to a
//! low-confidence record instead of rejecting it.

use std::path::Path;

use sha2::{Digest, Sha256};
use thiserror::Error;

const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt", "md"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported file type '{extension}' for {name}")]
    Unsupported { name: String, extension: String },

    #[error("failed to read {name}: {reason}")]
    Unreadable { name: String, reason: String },

    #[error("failed to extract PDF text from {name}: {reason}")]
    Pdf { name: String, reason: String },
}

/// Reads a source file and returns its text content, normalized to `\n`
/// line endings with any BOM stripped.
pub fn load(path: &Path) -> Result<String, LoadError> {
    let name = display_name(path);
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(LoadError::Unsupported { name, extension });
    }

    let text = if extension == "pdf" {
        pdf_extract::extract_text(path).map_err(|e| LoadError::Pdf {
            name: name.clone(),
            reason: e.to_string(),
        })?
    } else {
        let bytes = std::fs::read(path).map_err(|e| LoadError::Unreadable {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        String::from_utf8_lossy(&bytes).into_owned()
    };

    Ok(normalize_text(&text))
}

/// SHA-256 of the raw file bytes, hex-encoded. Profile identity is derived
/// from this hash, so identical content always maps to the same profile.
pub fn content_hash(path: &Path) -> Result<String, LoadError> {
    let bytes = std::fs::read(path).map_err(|e| LoadError::Unreadable {
        name: display_name(path),
        reason: e.to_string(),
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex_encode(&hasher.finalize()))
}

/// True if the file has an extension the loader understands.
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn normalize_text(text: &str) -> String {
    text.trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .trim()
        .to_string()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}
