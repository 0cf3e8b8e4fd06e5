//! Quality scoring.

use docintel_shared::{QualityAssessment, QualitySignal, Score};

/// Points contributed by each present structural element.
const POINTS_PER_ELEMENT: u32 = 25;

/// Map structural completeness checks to a 0–100 quality score.
///
/// Each present element contributes a fixed point value; missing elements
/// become findings, never errors. The checks are exact, so confidence is
/// always 1.0.
pub fn score_quality(signal: &QualitySignal) -> QualityAssessment {
    let checks: [(bool, &str, &str); 4] = [
        (
            signal.has_executive_summary,
            "executive summary",
            "Executive summary section is missing",
        ),
        (
            signal.has_financial_data,
            "financial data",
            "No financial figures detected",
        ),
        (
            signal.has_recommendations,
            "clear recommendations",
            "No clear recommendations section",
        ),
        (
            signal.well_formed_sections,
            "well-formed sections",
            "Document lacks well-formed sections",
        ),
    ];

    let mut value = 0;
    let mut present = Vec::new();
    let mut findings = Vec::new();

    for (ok, name, finding) in checks {
        if ok {
            value += POINTS_PER_ELEMENT;
            present.push(name.to_string());
        } else {
            findings.push(finding.to_string());
        }
    }

    QualityAssessment {
        score: Score::new(value, 100, 1.0, label_for(value)),
        present,
        findings,
    }
}

fn label_for(value: u32) -> &'static str {
    match value {
        80..=100 => "Excellent",
        60..=79 => "Good",
        40..=59 => "Fair",
        _ => "Needs Improvement",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_document_scores_hundred() {
        let signal = QualitySignal {
            has_executive_summary: true,
            has_financial_data: true,
            has_recommendations: true,
            well_formed_sections: true,
            section_count: 4,
        };
        let a = score_quality(&signal);
        assert_eq!(a.score.value, 100);
        assert_eq!(a.score.label, "Excellent");
        assert!(a.findings.is_empty());
        assert_eq!(a.present.len(), 4);
    }

    #[test]
    fn bare_document_scores_zero_with_findings() {
        let a = score_quality(&QualitySignal::default());
        assert_eq!(a.score.value, 0);
        assert_eq!(a.score.label, "Needs Improvement");
        assert_eq!(a.findings.len(), 4);
        assert!(a.findings.iter().any(|f| f.contains("Executive summary")));
    }

    #[test]
    fn missing_elements_are_findings_not_errors() {
        let signal = QualitySignal {
            has_executive_summary: true,
            has_financial_data: false,
            has_recommendations: true,
            well_formed_sections: true,
            section_count: 3,
        };
        let a = score_quality(&signal);
        assert_eq!(a.score.value, 75);
        assert_eq!(a.score.label, "Good");
        assert_eq!(a.findings, vec!["No financial figures detected"]);
    }

    #[test]
    fn quality_confidence_is_certain() {
        let a = score_quality(&QualitySignal::default());
        assert_eq!(a.score.confidence, 1.0);
    }
}
