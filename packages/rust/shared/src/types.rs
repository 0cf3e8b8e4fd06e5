//! Core domain types for the DocIntel analysis pipeline.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::Document;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for pipeline run identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Extracted facts
// ---------------------------------------------------------------------------

/// The kind of a structured fact extracted from a document.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FactKind {
    /// Organization or named entity.
    Entity,
    /// Calendar date or relative timeline ("18 months").
    Date,
    /// Currency amount.
    Amount,
    /// Numeric metric (percentage, ratio).
    Metric,
}

impl FactKind {
    /// All fact kinds an entity extractor is expected to cover.
    pub const ALL: [FactKind; 4] = [
        FactKind::Entity,
        FactKind::Date,
        FactKind::Amount,
        FactKind::Metric,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entity => "entity",
            Self::Date => "date",
            Self::Amount => "amount",
            Self::Metric => "metric",
        }
    }
}

/// Byte-offset span into `Document::text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// One typed fact occurrence. Duplicates are allowed; order follows the
/// document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFact {
    pub kind: FactKind,
    pub value: String,
    pub span: Span,
}

impl ExtractedFact {
    pub fn new(kind: FactKind, value: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            kind,
            value: value.into(),
            span: Span { start, end },
        }
    }
}

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

/// A bounded numeric score with confidence and a human label.
///
/// Invariants are enforced at construction: `value <= max` and
/// `confidence` in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub value: u8,
    pub max: u8,
    pub confidence: f64,
    pub label: String,
}

impl Score {
    /// Build a score, clamping `value` into `0..=max` and `confidence`
    /// into `[0, 1]`.
    pub fn new(value: u32, max: u8, confidence: f64, label: impl Into<String>) -> Self {
        Self {
            value: value.min(max as u32) as u8,
            max,
            confidence: confidence.clamp(0.0, 1.0),
            label: label.into(),
        }
    }
}

/// Dominant-emotion vocabulary. Declaration order is the tie-break order
/// when keyword counts are equal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Optimistic,
    Confident,
    Neutral,
    Cautious,
    Negative,
}

impl Emotion {
    pub const ALL: [Emotion; 5] = [
        Emotion::Optimistic,
        Emotion::Confident,
        Emotion::Neutral,
        Emotion::Cautious,
        Emotion::Negative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Optimistic => "optimistic",
            Self::Confident => "confident",
            Self::Neutral => "neutral",
            Self::Cautious => "cautious",
            Self::Negative => "negative",
        }
    }
}

// ---------------------------------------------------------------------------
// Risk vocabulary
// ---------------------------------------------------------------------------

/// The fixed set of risk dimensions contributing to the risk score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Financial,
    Operational,
    Market,
    Timeline,
    Regulatory,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 5] = [
        RiskCategory::Financial,
        RiskCategory::Operational,
        RiskCategory::Market,
        RiskCategory::Timeline,
        RiskCategory::Regulatory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Financial => "financial",
            Self::Operational => "operational",
            Self::Market => "market",
            Self::Timeline => "timeline",
            Self::Regulatory => "regulatory",
        }
    }
}

impl std::str::FromStr for RiskCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "financial" => Ok(Self::Financial),
            "operational" => Ok(Self::Operational),
            "market" => Ok(Self::Market),
            "timeline" => Ok(Self::Timeline),
            "regulatory" => Ok(Self::Regulatory),
            other => Err(format!("unknown risk category '{other}'")),
        }
    }
}

/// Risk level buckets over the 0–20 risk score. Boundaries are inclusive
/// on the lower end: 0–6 Low, 7–13 Medium, 14–20 High.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Map a risk score to its unique level bucket.
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=6 => Self::Low,
            7..=13 => Self::Medium,
            _ => Self::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

// ---------------------------------------------------------------------------
// Raw extractor signals
// ---------------------------------------------------------------------------

/// Lexical polarity evidence gathered by the sentiment extractor.
///
/// Weighted masses reflect positional weighting (headline and executive
/// summary hits count more than body hits).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentSignal {
    pub positive_hits: u32,
    pub negative_hits: u32,
    pub weighted_positive: f64,
    pub weighted_negative: f64,
    /// Emotion keyword counts, keyed in fixed vocabulary order.
    pub emotion_counts: BTreeMap<Emotion, u32>,
}

/// Risk-indicator keywords matched per category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskSignal {
    pub matches: BTreeMap<RiskCategory, Vec<String>>,
}

impl RiskSignal {
    /// Categories with at least one matched keyword, in fixed order.
    pub fn matched_categories(&self) -> Vec<RiskCategory> {
        self.matches.keys().copied().collect()
    }

    /// Total matched keyword occurrences across all categories.
    pub fn total_hits(&self) -> usize {
        self.matches.values().map(Vec::len).sum()
    }
}

/// Structural completeness evidence gathered by the quality extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualitySignal {
    pub has_executive_summary: bool,
    pub has_financial_data: bool,
    pub has_recommendations: bool,
    pub well_formed_sections: bool,
    pub section_count: usize,
}

// ---------------------------------------------------------------------------
// Assessments (scoring engine outputs)
// ---------------------------------------------------------------------------

/// Final sentiment assessment: a 0–100 score plus the dominant emotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentAssessment {
    pub score: Score,
    pub emotion: Emotion,
}

/// Final risk assessment: a 0–20 score, its level bucket, and the matched
/// categories. The pre-clip total and the clip itself are recorded rather
/// than silently discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: Score,
    pub level: RiskLevel,
    pub categories: Vec<RiskCategory>,
    pub raw_total: u32,
    pub clipped: bool,
}

/// Final quality assessment: a 0–100 score, the structural elements found,
/// and findings for the missing ones (non-fatal).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub score: Score,
    pub present: Vec<String>,
    pub findings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Stage results
// ---------------------------------------------------------------------------

/// Per-stage state machine: `pending -> running -> {succeeded, failed, skipped}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl StageStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Skipped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// A typed stage output value.
///
/// Replaces the string-template indirection of the source system: dependents
/// receive these as read-only typed references, validated when the stage
/// graph is built rather than at substitution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StageValue {
    Facts(Vec<ExtractedFact>),
    Sentiment(SentimentSignal),
    Risk(RiskSignal),
    Quality(QualitySignal),
    SentimentScore(SentimentAssessment),
    RiskScore(RiskAssessment),
    QualityScore(QualityAssessment),
    Text(String),
}

/// Output of one pipeline stage: named result values plus terminal status.
///
/// Owned exclusively by the executor until handed to dependents read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    pub name: String,
    pub status: StageStatus,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, StageValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl StageResult {
    /// A fresh pending result for a named stage.
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: StageStatus::Pending,
            outputs: BTreeMap::new(),
            error: None,
            duration_ms: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineRun
// ---------------------------------------------------------------------------

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Partial,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }
}

/// The aggregate of all stage results for one document, keyed by stage name.
///
/// Appended to as stages complete; immutable once the executor returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: RunId,
    pub document: Document,
    pub stages: BTreeMap<String, StageResult>,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl PipelineRun {
    /// Look up one stage result by name.
    pub fn stage(&self, name: &str) -> Option<&StageResult> {
        self.stages.get(name)
    }

    /// True when the named stage reached `succeeded`.
    pub fn stage_succeeded(&self, name: &str) -> bool {
        self.stage(name)
            .map(|s| s.status == StageStatus::Succeeded)
            .unwrap_or(false)
    }

    /// Find the first output of a given shape across all succeeded stages.
    fn find_output<T, F: Fn(&StageValue) -> Option<&T>>(&self, pick: F) -> Option<&T> {
        self.stages
            .values()
            .filter(|s| s.status == StageStatus::Succeeded)
            .flat_map(|s| s.outputs.values())
            .find_map(|v| pick(v))
    }

    /// The sentiment assessment, if its scoring stage succeeded.
    pub fn sentiment(&self) -> Option<&SentimentAssessment> {
        self.find_output(|v| match v {
            StageValue::SentimentScore(a) => Some(a),
            _ => None,
        })
    }

    /// The risk assessment, if its scoring stage succeeded.
    pub fn risk(&self) -> Option<&RiskAssessment> {
        self.find_output(|v| match v {
            StageValue::RiskScore(a) => Some(a),
            _ => None,
        })
    }

    /// The quality assessment, if its scoring stage succeeded.
    pub fn quality(&self) -> Option<&QualityAssessment> {
        self.find_output(|v| match v {
            StageValue::QualityScore(a) => Some(a),
            _ => None,
        })
    }

    /// Extracted facts, if entity extraction succeeded.
    pub fn facts(&self) -> Option<&Vec<ExtractedFact>> {
        self.find_output(|v| match v {
            StageValue::Facts(f) => Some(f),
            _ => None,
        })
    }

    /// Per-stage error reasons for every non-succeeded stage.
    pub fn error_reasons(&self) -> Vec<(String, String)> {
        self.stages
            .values()
            .filter(|s| s.status != StageStatus::Succeeded)
            .map(|s| {
                (
                    s.name.clone(),
                    s.error.clone().unwrap_or_else(|| s.status.as_str().into()),
                )
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Sentiment portion of the report record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub score: u8,
    pub confidence: f64,
    pub label: String,
}

/// Risk portion of the report record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub score: u8,
    pub level: String,
    pub categories: Vec<String>,
}

/// Derived, read-only view over a finalized [`PipelineRun`].
///
/// Regenerable deterministically: `generated_at` is the run's finish time,
/// so synthesizing the same run twice yields identical reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub summary: String,
    pub key_findings: Vec<String>,
    pub sentiment: SentimentSummary,
    pub risk: RiskSummary,
    pub recommendations: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_roundtrip() {
        let id = RunId::new();
        let s = id.to_string();
        let parsed: RunId = s.parse().expect("parse RunId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn score_clamps_value_and_confidence() {
        let s = Score::new(150, 100, 1.7, "Positive");
        assert_eq!(s.value, 100);
        assert!((s.confidence - 1.0).abs() < f64::EPSILON);

        let s = Score::new(25, 20, -0.2, "High");
        assert_eq!(s.value, 20);
        assert_eq!(s.confidence, 0.0);
    }

    #[test]
    fn risk_level_bucket_boundaries() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(6), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(7), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(13), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(14), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(20), RiskLevel::High);
    }

    #[test]
    fn risk_category_parse() {
        assert_eq!(
            "financial".parse::<RiskCategory>().unwrap(),
            RiskCategory::Financial
        );
        assert!("reputational".parse::<RiskCategory>().is_err());
    }

    #[test]
    fn stage_status_terminality() {
        assert!(!StageStatus::Pending.is_terminal());
        assert!(!StageStatus::Running.is_terminal());
        assert!(StageStatus::Succeeded.is_terminal());
        assert!(StageStatus::Failed.is_terminal());
        assert!(StageStatus::Skipped.is_terminal());
    }

    #[test]
    fn stage_value_serialization_is_tagged() {
        let value = StageValue::Facts(vec![ExtractedFact::new(
            FactKind::Amount,
            "$5.8M",
            10,
            15,
        )]);
        let json = serde_json::to_string(&value).expect("serialize");
        assert!(json.contains(r#""type":"facts"#));
        let parsed: StageValue = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, value);
    }

    #[test]
    fn report_serialization_shape() {
        let report = Report {
            summary: "Analysis of business document containing 1247 words.".into(),
            key_findings: vec!["Strong positive sentiment detected".into()],
            sentiment: SentimentSummary {
                score: 85,
                confidence: 0.92,
                label: "Positive".into(),
            },
            risk: RiskSummary {
                score: 8,
                level: "Medium".into(),
                categories: vec!["financial".into()],
            },
            recommendations: vec!["Negotiate milestone-based payment structure".into()],
            generated_at: Utc::now(),
        };

        let json = serde_json::to_string_pretty(&report).expect("serialize");
        let parsed: Report = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.sentiment.score, 85);
        assert_eq!(parsed.risk.level, "Medium");
    }
}
