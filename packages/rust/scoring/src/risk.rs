//! Risk scoring.

use std::collections::BTreeMap;

use tracing::debug;

use docintel_shared::{RiskAssessment, RiskCategory, RiskLevel, RiskSignal, Score};

/// Upper bound of the risk score.
pub const RISK_SCORE_MAX: u8 = 20;

/// Weight used for a category the caller's weight map does not cover.
const DEFAULT_CATEGORY_WEIGHT: u32 = 4;

/// Combine matched risk categories into a 0–20 risk score.
///
/// The score is the sum of per-category severity weights over matched
/// categories — not an average — and is explicitly clipped at
/// [`RISK_SCORE_MAX`]: the pre-clip total and the clip itself are recorded
/// in the assessment rather than overflowing silently.
pub fn score_risk(
    signal: &RiskSignal,
    weights: &BTreeMap<RiskCategory, u32>,
) -> RiskAssessment {
    let categories = signal.matched_categories();

    let raw_total: u32 = categories
        .iter()
        .map(|cat| {
            weights
                .get(cat)
                .copied()
                .unwrap_or(DEFAULT_CATEGORY_WEIGHT)
        })
        .sum();

    let clipped = raw_total > RISK_SCORE_MAX as u32;
    if clipped {
        debug!(raw_total, cap = RISK_SCORE_MAX, "risk score clipped at upper bound");
    }

    let value = raw_total.min(RISK_SCORE_MAX as u32);
    let level = RiskLevel::from_score(value as u8);

    // Confidence grows with the amount of keyword evidence behind the match.
    let evidence = signal.total_hits().min(5) as f64;
    let confidence = 0.5 + 0.1 * evidence;

    RiskAssessment {
        score: Score::new(value, RISK_SCORE_MAX, confidence, level.as_str()),
        level,
        categories,
        raw_total,
        clipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docintel_shared::default_risk_weights;

    fn signal_with(categories: &[(RiskCategory, &[&str])]) -> RiskSignal {
        RiskSignal {
            matches: categories
                .iter()
                .map(|(cat, kws)| (*cat, kws.iter().map(|k| k.to_string()).collect()))
                .collect(),
        }
    }

    #[test]
    fn empty_signal_scores_zero_low() {
        let a = score_risk(&RiskSignal::default(), &default_risk_weights());
        assert_eq!(a.score.value, 0);
        assert_eq!(a.level, RiskLevel::Low);
        assert!(a.categories.is_empty());
        assert!(!a.clipped);
    }

    #[test]
    fn weights_are_summed_not_averaged() {
        let signal = signal_with(&[
            (RiskCategory::Financial, &["budget"]),
            (RiskCategory::Operational, &["delay"]),
        ]);
        let a = score_risk(&signal, &default_risk_weights());
        // financial 5 + operational 4
        assert_eq!(a.score.value, 9);
        assert_eq!(a.level, RiskLevel::Medium);
    }

    #[test]
    fn all_categories_hit_the_explicit_clip() {
        let signal = signal_with(&[
            (RiskCategory::Financial, &["budget"]),
            (RiskCategory::Operational, &["delay"]),
            (RiskCategory::Market, &["competition"]),
            (RiskCategory::Timeline, &["deadline"]),
            (RiskCategory::Regulatory, &["violation"]),
        ]);
        let a = score_risk(&signal, &default_risk_weights());
        assert_eq!(a.raw_total, 21);
        assert!(a.clipped);
        assert_eq!(a.score.value, RISK_SCORE_MAX);
        assert_eq!(a.level, RiskLevel::High);
    }

    #[test]
    fn custom_weights_are_honored() {
        let signal = signal_with(&[(RiskCategory::Market, &["churn"])]);
        let weights = BTreeMap::from([(RiskCategory::Market, 14)]);
        let a = score_risk(&signal, &weights);
        assert_eq!(a.score.value, 14);
        assert_eq!(a.level, RiskLevel::High);
    }

    #[test]
    fn missing_weight_falls_back_to_default() {
        let signal = signal_with(&[(RiskCategory::Timeline, &["deadline"])]);
        let a = score_risk(&signal, &BTreeMap::new());
        assert_eq!(a.score.value, DEFAULT_CATEGORY_WEIGHT as u8);
    }

    #[test]
    fn more_evidence_raises_confidence() {
        let thin = signal_with(&[(RiskCategory::Financial, &["budget"])]);
        let thick = signal_with(&[
            (RiskCategory::Financial, &["budget", "debt", "deficit"]),
            (RiskCategory::Operational, &["delay", "outage"]),
        ]);
        let a = score_risk(&thin, &default_risk_weights());
        let b = score_risk(&thick, &default_risk_weights());
        assert!(b.score.confidence > a.score.confidence);
        assert!(b.score.confidence <= 1.0);
    }

    #[test]
    fn score_label_matches_level() {
        let signal = signal_with(&[(RiskCategory::Regulatory, &["violation"])]);
        let a = score_risk(&signal, &default_risk_weights());
        assert_eq!(a.score.label, a.level.as_str());
    }
}
