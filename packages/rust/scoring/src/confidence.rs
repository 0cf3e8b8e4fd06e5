//! Confidence derivation.
//!
//! Confidence backs a score with two measures: extractor *coverage* (how much
//! of the expected evidence was observed) and *agreement* (how consistently
//! the contributing signals point the same way). Lower coverage or higher
//! signal variance reduces confidence.

use docintel_shared::{ExtractedFact, FactKind};

/// Coverage assumed when entity extraction is unavailable to a best-effort
/// scoring stage.
pub const FALLBACK_COVERAGE: f64 = 0.25;

/// Combine coverage and agreement into a `[0, 1]` confidence.
pub fn confidence(coverage: f64, agreement: f64) -> f64 {
    (coverage * agreement).clamp(0.0, 1.0)
}

/// Fraction of the expected fact kinds present in an extraction result.
pub fn fact_coverage(facts: &[ExtractedFact]) -> f64 {
    let present = FactKind::ALL
        .iter()
        .filter(|kind| facts.iter().any(|f| f.kind == **kind))
        .count();
    present as f64 / FactKind::ALL.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use docintel_shared::ExtractedFact;

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(confidence(1.5, 1.0), 1.0);
        assert_eq!(confidence(-0.5, 1.0), 0.0);
        assert!((confidence(0.5, 0.8) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn coverage_counts_distinct_kinds() {
        let facts = vec![
            ExtractedFact::new(FactKind::Amount, "$1M", 0, 3),
            ExtractedFact::new(FactKind::Amount, "$2M", 10, 13),
            ExtractedFact::new(FactKind::Metric, "40%", 20, 23),
        ];
        assert!((fact_coverage(&facts) - 0.5).abs() < 1e-12);
        assert_eq!(fact_coverage(&[]), 0.0);
    }
}
