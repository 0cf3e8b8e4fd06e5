//! Feature extractors for the DocIntel pipeline.
//!
//! Each extractor is a pure function of the [`Document`]: no shared mutable
//! state, so the executor may run them in any order or concurrently. Failures
//! are isolated — one failing extractor never aborts its siblings.

pub mod entities;
pub mod quality;
pub mod risk;
pub mod sentiment;

use docintel_shared::{Document, Result, StageValue};

pub use entities::EntityExtractor;
pub use quality::QualityExtractor;
pub use risk::RiskExtractor;
pub use sentiment::SentimentExtractor;

/// Shared extractor capability.
///
/// `run` produces a typed partial result; errors carry
/// [`docintel_shared::DocIntelError::Extraction`] semantics and are recorded
/// by the executor as a degraded stage result.
pub trait Extractor: Send + Sync {
    /// Stage name this extractor answers to.
    fn name(&self) -> &'static str;

    /// Extract a typed partial result from the document.
    fn run(&self, doc: &Document) -> Result<StageValue>;
}

/// Heading heuristic shared by the sentiment and quality extractors:
/// markdown headings, short `Title:` lines, and short all-caps lines.
pub(crate) fn is_heading(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.len() > 80 {
        return false;
    }
    if trimmed.starts_with('#') {
        return true;
    }
    if trimmed.ends_with(':') && trimmed.split_whitespace().count() <= 8 {
        return true;
    }
    trimmed.chars().any(|c| c.is_alphabetic())
        && !trimmed.chars().any(|c| c.is_lowercase())
        && trimmed.split_whitespace().count() <= 8
}

/// Lowercased alphanumeric tokens of a line.
pub(crate) fn tokenize(line: &str) -> Vec<String> {
    line.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_detection() {
        assert!(is_heading("# Executive Summary"));
        assert!(is_heading("Recommendations:"));
        assert!(is_heading("EXECUTIVE SUMMARY"));
        assert!(!is_heading("This is a normal body sentence."));
        assert!(!is_heading(""));
    }

    #[test]
    fn tokenize_lowercases_and_splits() {
        assert_eq!(
            tokenize("Strong growth, excellent ROI!"),
            vec!["strong", "growth", "excellent", "roi"]
        );
    }
}
