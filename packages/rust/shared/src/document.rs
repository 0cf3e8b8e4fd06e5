//! Document ingestion.
//!
//! A [`Document`] is the immutable input record of the pipeline: counts and
//! content hash are computed exactly once here and never recomputed by later
//! stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{DocIntelError, Result};

/// Default maximum accepted document size (1 MiB).
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 1024 * 1024;

/// Language assumed when none is declared.
const DEFAULT_LANGUAGE: &str = "en";

/// Normalized, immutable representation of an ingested document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique document identifier (UUID v7).
    pub id: String,
    /// Raw document text.
    pub text: String,
    /// Declared or defaulted language code.
    pub language: String,
    /// UTF-8 byte length, computed at ingestion.
    pub byte_len: usize,
    /// Whitespace-delimited word count, computed at ingestion.
    pub word_count: usize,
    /// SHA-256 hash of the raw text.
    pub content_hash: String,
    /// When the document was ingested.
    pub ingested_at: DateTime<Utc>,
}

/// Ingest raw text into an immutable [`Document`].
///
/// Rejects empty/whitespace-only text and text larger than `max_bytes`
/// with [`DocIntelError::InvalidInput`] before any pipeline stage runs.
pub fn ingest(raw: &str, declared_language: Option<&str>, max_bytes: usize) -> Result<Document> {
    if raw.trim().is_empty() {
        return Err(DocIntelError::invalid_input("document text is empty"));
    }

    if raw.len() > max_bytes {
        return Err(DocIntelError::invalid_input(format!(
            "document is {} bytes, exceeding the {} byte limit",
            raw.len(),
            max_bytes
        )));
    }

    let language = declared_language
        .filter(|l| !l.trim().is_empty())
        .unwrap_or(DEFAULT_LANGUAGE)
        .to_string();

    let doc = Document {
        id: Uuid::now_v7().to_string(),
        text: raw.to_string(),
        language,
        byte_len: raw.len(),
        word_count: raw.split_whitespace().count(),
        content_hash: compute_hash(raw),
        ingested_at: Utc::now(),
    };

    tracing::debug!(
        id = %doc.id,
        bytes = doc.byte_len,
        words = doc.word_count,
        language = %doc.language,
        "document ingested"
    );

    Ok(doc)
}

/// Compute SHA-256 hash of content.
fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
