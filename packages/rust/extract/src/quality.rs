//! Structural quality extraction.
//!
//! Checks the document for the structural elements a complete business
//! document is expected to carry. Missing elements are evidence for the
//! quality score, never an error.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use docintel_shared::{Document, QualitySignal, Result, StageValue};

use crate::{Extractor, is_heading};

/// Currency or percentage figures — the minimal definition of "financial data".
static FINANCIAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\d|\d+(?:\.\d+)?\s?%").expect("valid regex"));

/// Minimum heading count for a document to count as well-sectioned.
const WELL_FORMED_SECTION_COUNT: usize = 2;

/// Extractor producing a [`QualitySignal`] of structural presence checks.
#[derive(Debug, Default)]
pub struct QualityExtractor;

impl Extractor for QualityExtractor {
    fn name(&self) -> &'static str {
        "extract_quality"
    }

    fn run(&self, doc: &Document) -> Result<StageValue> {
        Ok(StageValue::Quality(extract_signal(&doc.text)))
    }
}

/// Run all structural completeness checks.
pub fn extract_signal(text: &str) -> QualitySignal {
    let lower = text.to_lowercase();
    let section_count = text.lines().filter(|l| is_heading(l)).count();

    let signal = QualitySignal {
        has_executive_summary: lower.contains("executive summary"),
        has_financial_data: FINANCIAL_RE.is_match(text),
        has_recommendations: lower.contains("recommendation"),
        well_formed_sections: section_count >= WELL_FORMED_SECTION_COUNT,
        section_count,
    };

    debug!(
        sections = signal.section_count,
        exec_summary = signal.has_executive_summary,
        financial = signal.has_financial_data,
        "quality signal extracted"
    );

    signal
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRUCTURED_DOC: &str = "\
# Executive Summary
We project $2.3M in savings.

# Recommendations:
Proceed with phase one.

# Timeline
Delivery within 18 months.";

    #[test]
    fn detects_all_elements_in_structured_document() {
        let signal = extract_signal(STRUCTURED_DOC);
        assert!(signal.has_executive_summary);
        assert!(signal.has_financial_data);
        assert!(signal.has_recommendations);
        assert!(signal.well_formed_sections);
        assert_eq!(signal.section_count, 3);
    }

    #[test]
    fn unstructured_text_fails_all_checks() {
        let signal = extract_signal("just a short memo with no structure at all");
        assert!(!signal.has_executive_summary);
        assert!(!signal.has_financial_data);
        assert!(!signal.has_recommendations);
        assert!(!signal.well_formed_sections);
        assert_eq!(signal.section_count, 0);
    }

    #[test]
    fn financial_data_detected_from_percentages_alone() {
        let signal = extract_signal("Efficiency improved 40% year over year.");
        assert!(signal.has_financial_data);
    }

    #[test]
    fn one_heading_is_not_well_formed() {
        let signal = extract_signal("# Only Section\nbody text");
        assert!(!signal.well_formed_sections);
        assert_eq!(signal.section_count, 1);
    }
}
