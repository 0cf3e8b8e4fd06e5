//! Risk-indicator extraction.
//!
//! Matches category keyword lists against the document and records which
//! keywords fired per category. Scoring (weights, cap, level) happens in the
//! scoring engine — this stage only gathers evidence.

use std::collections::BTreeMap;

use tracing::debug;

use docintel_shared::{Document, Result, RiskCategory, RiskSignal, StageValue};

use crate::Extractor;

/// Indicator phrases per risk category. Matched as lowercase substrings so
/// multi-word phrases work.
const RISK_KEYWORDS: &[(RiskCategory, &[&str])] = &[
    (
        RiskCategory::Financial,
        &["cost overrun", "budget", "deficit", "debt", "liability", "cash flow", "write-off"],
    ),
    (
        RiskCategory::Operational,
        &["delay", "bottleneck", "breakdown", "outage", "failure", "disruption", "staffing"],
    ),
    (
        RiskCategory::Market,
        &["competition", "competitor", "recession", "volatility", "market decline", "churn"],
    ),
    (
        RiskCategory::Timeline,
        &["behind schedule", "deadline", "slippage", "long-term commitment", "milestone slip"],
    ),
    (
        RiskCategory::Regulatory,
        &["violation", "non-compliant", "regulatory", "audit finding", "lawsuit", "penalty"],
    ),
];

/// Extractor producing a [`RiskSignal`] of matched indicator keywords.
#[derive(Debug, Default)]
pub struct RiskExtractor;

impl Extractor for RiskExtractor {
    fn name(&self) -> &'static str {
        "extract_risk"
    }

    fn run(&self, doc: &Document) -> Result<StageValue> {
        Ok(StageValue::Risk(extract_signal(&doc.text)))
    }
}

/// Match every category's keyword list against the lowercased text.
pub fn extract_signal(text: &str) -> RiskSignal {
    let lower = text.to_lowercase();
    let mut matches: BTreeMap<RiskCategory, Vec<String>> = BTreeMap::new();

    for (category, keywords) in RISK_KEYWORDS {
        let found: Vec<String> = keywords
            .iter()
            .filter(|kw| lower.contains(*kw))
            .map(|kw| (*kw).to_string())
            .collect();

        if !found.is_empty() {
            matches.insert(*category, found);
        }
    }

    debug!(categories = matches.len(), "risk signal extracted");
    RiskSignal { matches }
}
