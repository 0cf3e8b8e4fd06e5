//! Report synthesis.
//!
//! Turns a finalized [`PipelineRun`] into a [`Report`]: an executive summary
//! sentence, an ordered key-findings list, and rule-table recommendations.
//! Synthesis is a pure function of the run — it never mutates the run, and
//! synthesizing the same run twice yields byte-identical reports.

pub mod render;

use tracing::debug;

use docintel_shared::{
    DocIntelError, FactKind, PipelineRun, QualityAssessment, Report, Result, RiskAssessment,
    RiskCategory, RiskLevel, RiskSignal, RiskSummary, SentimentAssessment, SentimentSummary,
    StageStatus, StageValue,
};

pub use render::render_markdown;

/// Risk score above which "multiple risk factors" becomes a key finding.
const NOTABLE_RISK_SCORE: u8 = 5;

/// Quality score below which a clarity recommendation is added.
const QUALITY_RECOMMENDATION_THRESHOLD: u8 = 60;

/// Synthesize a report from a finalized run.
///
/// Requires at least one of the sentiment/risk scoring stages to have
/// succeeded; otherwise fails with [`DocIntelError::Synthesis`].
pub fn synthesize(run: &PipelineRun) -> Result<Report> {
    let sentiment = run.sentiment();
    let risk = run.risk();

    if sentiment.is_none() && risk.is_none() {
        return Err(DocIntelError::Synthesis(
            "neither sentiment nor risk scoring succeeded".into(),
        ));
    }

    let quality = run.quality();
    let financial_present = financial_data_present(run);

    let report = Report {
        summary: summary_text(run, sentiment, risk),
        key_findings: key_findings(run, sentiment, risk, quality, financial_present),
        sentiment: sentiment_summary(sentiment),
        risk: risk_summary(risk),
        recommendations: recommendations(sentiment, risk, quality, financial_present),
        // Sourced from the run so synthesis stays reproducible.
        generated_at: run.finished_at,
    };

    debug!(
        findings = report.key_findings.len(),
        recommendations = report.recommendations.len(),
        "report synthesized"
    );

    Ok(report)
}

// ---------------------------------------------------------------------------
// Executive summary
// ---------------------------------------------------------------------------

/// One-paragraph overview interpolating word count, sentiment, confidence,
/// and risk level.
fn summary_text(
    run: &PipelineRun,
    sentiment: Option<&SentimentAssessment>,
    risk: Option<&RiskAssessment>,
) -> String {
    let mut parts = vec![format!(
        "Analysis of business document containing {} words.",
        run.document.word_count
    )];

    match sentiment {
        Some(s) => parts.push(format!(
            "Overall sentiment is {} with {:.0}% confidence.",
            s.score.label.to_lowercase(),
            s.score.confidence * 100.0
        )),
        None => parts.push("Overall sentiment could not be determined.".into()),
    }

    match risk {
        Some(r) => parts.push(format!(
            "Risk assessment indicates {} risk level.",
            r.level.as_str().to_lowercase()
        )),
        None => parts.push("Risk assessment unavailable.".into()),
    }

    parts.join(" ")
}

// ---------------------------------------------------------------------------
// Key findings
// ---------------------------------------------------------------------------

/// Ordered key findings, built in fixed priority order: sentiment, risk,
/// financial-data presence, focus area, presentation quality.
fn key_findings(
    run: &PipelineRun,
    sentiment: Option<&SentimentAssessment>,
    risk: Option<&RiskAssessment>,
    quality: Option<&QualityAssessment>,
    financial_present: bool,
) -> Vec<String> {
    let mut findings = Vec::new();

    if let Some(s) = sentiment {
        if s.score.label != "Neutral" {
            findings.push(format!(
                "Strong {} sentiment detected throughout document",
                s.score.label.to_lowercase()
            ));
        }
    }

    if let Some(r) = risk {
        if r.score.value > NOTABLE_RISK_SCORE {
            findings.push(format!(
                "Multiple risk factors identified (score: {}/{})",
                r.score.value, r.score.max
            ));
        }
    }

    if financial_present {
        findings.push("Significant financial data and metrics present".into());
    } else {
        findings.push("Financial data absent from document".into());
    }

    if let Some(category) = primary_focus(run) {
        findings.push(format!(
            "Primary risk focus area: {}",
            category.as_str()
        ));
    }

    if let Some(q) = quality {
        if matches!(q.score.label.as_str(), "Excellent" | "Good") {
            findings.push(format!(
                "Content quality assessed as {}",
                q.score.label.to_lowercase()
            ));
        }
    }

    findings
}

/// Whether the document carries financial figures: entity facts first,
/// structural quality evidence as the fallback.
fn financial_data_present(run: &PipelineRun) -> bool {
    if let Some(facts) = run.facts() {
        return facts
            .iter()
            .any(|f| matches!(f.kind, FactKind::Amount | FactKind::Metric));
    }
    run.quality()
        .map(|q| q.present.iter().any(|p| p == "financial data"))
        .unwrap_or(false)
}

/// The risk category with the most matched keywords, ties broken by fixed
/// category order.
fn primary_focus(run: &PipelineRun) -> Option<RiskCategory> {
    let signal = run
        .stages
        .values()
        .filter(|s| s.status == StageStatus::Succeeded)
        .flat_map(|s| s.outputs.values())
        .find_map(|v| match v {
            StageValue::Risk(signal) => Some(signal),
            _ => None,
        })?;

    best_matched_category(signal)
}

fn best_matched_category(signal: &RiskSignal) -> Option<RiskCategory> {
    let mut best: Option<(RiskCategory, usize)> = None;
    for (category, keywords) in &signal.matches {
        let better = best
            .map(|(_, count)| keywords.len() > count)
            .unwrap_or(true);
        if better {
            best = Some((*category, keywords.len()));
        }
    }
    best.map(|(category, _)| category)
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

/// Deterministic, order-preserving rule table keyed by risk level and
/// finding presence.
fn recommendations(
    sentiment: Option<&SentimentAssessment>,
    risk: Option<&RiskAssessment>,
    quality: Option<&QualityAssessment>,
    financial_present: bool,
) -> Vec<String> {
    let mut recs: Vec<String> = Vec::new();

    if risk.map(|r| r.level >= RiskLevel::Medium).unwrap_or(false) {
        recs.push("Negotiate milestone-based payment structure to reduce financial risk".into());
        recs.push("Develop comprehensive risk mitigation strategy".into());
    }

    if sentiment.map(|s| s.score.label == "Negative").unwrap_or(false) {
        recs.push("Address negative sentiment factors to improve stakeholder perception".into());
    }

    if financial_present {
        recs.push("Proceed with detailed technical assessment and due diligence".into());
    }

    if quality
        .map(|q| q.score.value < QUALITY_RECOMMENDATION_THRESHOLD)
        .unwrap_or(false)
    {
        recs.push("Improve content structure and clarity".into());
    }

    if recs.is_empty() {
        recs.push("Maintain current course; risk levels appear manageable".into());
    }

    recs
}

// ---------------------------------------------------------------------------
// Record shaping
// ---------------------------------------------------------------------------

fn sentiment_summary(sentiment: Option<&SentimentAssessment>) -> SentimentSummary {
    match sentiment {
        Some(s) => SentimentSummary {
            score: s.score.value,
            confidence: s.score.confidence,
            label: s.score.label.clone(),
        },
        // Placeholder with zero confidence when the stage did not succeed.
        None => SentimentSummary {
            score: 50,
            confidence: 0.0,
            label: "Unknown".into(),
        },
    }
}

fn risk_summary(risk: Option<&RiskAssessment>) -> RiskSummary {
    match risk {
        Some(r) => RiskSummary {
            score: r.score.value,
            level: r.level.as_str().into(),
            categories: r.categories.iter().map(|c| c.as_str().into()).collect(),
        },
        None => RiskSummary {
            score: 0,
            level: "Unknown".into(),
            categories: Vec::new(),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
