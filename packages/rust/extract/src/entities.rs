//! Entity and metric extraction.
//!
//! Regex scans for organization names, dates and timelines, currency
//! amounts, and percentages. One [`ExtractedFact`] per match, with its byte
//! span, in document order.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use docintel_shared::{Document, ExtractedFact, FactKind, Result, StageValue};

use crate::Extractor;

/// Organization names: capitalized phrases ending in a corporate suffix,
/// or single words fused with one ("TechCorp").
static ORG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:[A-Z][A-Za-z&]+\s+){1,3}(?:Corp(?:oration)?|Inc|Ltd|LLC|Group|Industries)\b|\b[A-Z][A-Za-z]+(?:Corp|Inc|Ltd)\b",
    )
    .expect("valid regex")
});

/// Calendar dates with a month name ("December 15, 2024", "March 2025").
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+(?:\d{1,2},?\s+)?\d{4}\b",
    )
    .expect("valid regex")
});

/// Relative timelines ("18 months", "3 years", "2 quarters").
static TIMELINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d+\s+(?:day|week|month|quarter|year)s?\b").expect("valid regex")
});

/// Currency amounts ("$5.8M", "$2,300", "$1.2 billion").
static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\d[\d,]*(?:\.\d+)?(?:\s?(?:million|billion)|[MBK])?\b").expect("valid regex")
});

/// Percentages ("180%", "7.5 %").
static PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+(?:\.\d+)?\s?%").expect("valid regex"));

/// Extractor for organizations, dates, amounts, and percentage metrics.
#[derive(Debug, Default)]
pub struct EntityExtractor;

impl Extractor for EntityExtractor {
    fn name(&self) -> &'static str {
        "extract_entities"
    }

    fn run(&self, doc: &Document) -> Result<StageValue> {
        Ok(StageValue::Facts(extract_facts(&doc.text)))
    }
}

/// Scan text for all supported fact kinds, ordered by document position.
pub fn extract_facts(text: &str) -> Vec<ExtractedFact> {
    let mut facts: Vec<ExtractedFact> = Vec::new();

    collect_matches(&ORG_RE, text, FactKind::Entity, &mut facts);
    collect_matches(&DATE_RE, text, FactKind::Date, &mut facts);
    collect_matches(&TIMELINE_RE, text, FactKind::Date, &mut facts);
    collect_matches(&AMOUNT_RE, text, FactKind::Amount, &mut facts);
    collect_matches(&PERCENT_RE, text, FactKind::Metric, &mut facts);

    // Document order; ties broken by span end then kind for determinism.
    facts.sort_by_key(|f| (f.span.start, f.span.end, f.kind));

    debug!(count = facts.len(), "entity extraction complete");
    facts
}

fn collect_matches(re: &Regex, text: &str, kind: FactKind, out: &mut Vec<ExtractedFact>) {
    for m in re.find_iter(text) {
        out.push(ExtractedFact::new(kind, m.as_str(), m.start(), m.end()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values_of(facts: &[ExtractedFact], kind: FactKind) -> Vec<&str> {
        facts
            .iter()
            .filter(|f| f.kind == kind)
            .map(|f| f.value.as_str())
            .collect()
    }

    #[test]
    fn extracts_organizations() {
        let facts = extract_facts("TechCorp Industries partnered with Innovation Consulting Group.");
        let orgs = values_of(&facts, FactKind::Entity);
        assert_eq!(orgs, vec!["TechCorp Industries", "Innovation Consulting Group"]);
    }

    #[test]
    fn extracts_fused_suffix_org() {
        let facts = extract_facts("The bid from MegaCorp was accepted.");
        assert_eq!(values_of(&facts, FactKind::Entity), vec!["MegaCorp"]);
    }

    #[test]
    fn extracts_amounts_and_percentages() {
        let facts = extract_facts("Budget of $5.8M with projected 180% ROI and $2,300 in fees.");
        assert_eq!(values_of(&facts, FactKind::Amount), vec!["$5.8M", "$2,300"]);
        assert_eq!(values_of(&facts, FactKind::Metric), vec!["180%"]);
    }

    #[test]
    fn extracts_dates_and_timelines() {
        let facts = extract_facts("Kickoff on December 15, 2024 with an 18 months rollout.");
        let dates = values_of(&facts, FactKind::Date);
        assert_eq!(dates, vec!["December 15, 2024", "18 months"]);
    }

    #[test]
    fn facts_are_in_document_order_with_spans() {
        let text = "Pay $2.3M to TechCorp by June 2025.";
        let facts = extract_facts(text);
        assert!(facts.windows(2).all(|w| w[0].span.start <= w[1].span.start));
        for fact in &facts {
            assert_eq!(&text[fact.span.start..fact.span.end], fact.value);
        }
    }

    #[test]
    fn duplicates_are_kept_per_occurrence() {
        let facts = extract_facts("$1M now and $1M later.");
        assert_eq!(values_of(&facts, FactKind::Amount), vec!["$1M", "$1M"]);
    }

    #[test]
    fn empty_text_yields_no_facts() {
        assert!(extract_facts("Nothing quantitative here.").is_empty());
    }
}
