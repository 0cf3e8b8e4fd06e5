//! End-to-end analysis pipeline: document → extractors → scores → report.
//!
//! Wires the default stage graph to the real extractors and the scoring
//! engine, and gates concurrent runs behind an admission semaphore.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{info, instrument};

use docintel_extract::{
    EntityExtractor, Extractor, QualityExtractor, RiskExtractor, SentimentExtractor,
};
use docintel_scoring::{FALLBACK_COVERAGE, fact_coverage, score_quality, score_risk,
    score_sentiment};
use docintel_shared::{
    DocIntelError, Document, PipelineRun, Report, Result, RiskCategory, RunConfig, StageStatus,
    StageValue,
};

use crate::executor::{CancelHandle, StageInputs, StageRunner, execute};
use crate::graph::{StageGraph, StageSpec};

// ---------------------------------------------------------------------------
// Stage and output names
// ---------------------------------------------------------------------------

pub const STAGE_EXTRACT_ENTITIES: &str = "extract_entities";
pub const STAGE_EXTRACT_SENTIMENT: &str = "extract_sentiment";
pub const STAGE_EXTRACT_RISK: &str = "extract_risk";
pub const STAGE_EXTRACT_QUALITY: &str = "extract_quality";
pub const STAGE_SCORE_SENTIMENT: &str = "score_sentiment";
pub const STAGE_SCORE_RISK: &str = "score_risk";
pub const STAGE_SCORE_QUALITY: &str = "score_quality";

pub const OUT_FACTS: &str = "facts";
pub const OUT_SENTIMENT_SIGNAL: &str = "sentiment_signal";
pub const OUT_RISK_SIGNAL: &str = "risk_signal";
pub const OUT_QUALITY_SIGNAL: &str = "quality_signal";
pub const OUT_SENTIMENT: &str = "sentiment";
pub const OUT_RISK: &str = "risk";
pub const OUT_QUALITY: &str = "quality";

/// The default analysis graph.
///
/// Extractor stages have no dependency edges between them and run
/// concurrently; each scoring stage consumes its extractor's signal.
/// `score_sentiment` is best-effort: it additionally reads entity facts for
/// coverage-based confidence and falls back to a documented floor when
/// entity extraction did not succeed.
pub fn default_graph() -> Result<StageGraph> {
    StageGraph::new(vec![
        StageSpec::new(STAGE_EXTRACT_ENTITIES),
        StageSpec::new(STAGE_EXTRACT_SENTIMENT),
        StageSpec::new(STAGE_EXTRACT_RISK),
        StageSpec::new(STAGE_EXTRACT_QUALITY),
        StageSpec::new(STAGE_SCORE_SENTIMENT)
            .depends_on(STAGE_EXTRACT_SENTIMENT)
            .depends_on(STAGE_EXTRACT_ENTITIES)
            .best_effort(),
        StageSpec::new(STAGE_SCORE_RISK).depends_on(STAGE_EXTRACT_RISK),
        StageSpec::new(STAGE_SCORE_QUALITY).depends_on(STAGE_EXTRACT_QUALITY),
    ])
}

// ---------------------------------------------------------------------------
// Default stage runner
// ---------------------------------------------------------------------------

/// Dispatches the built-in stages to the extractors and the scoring engine.
pub struct DefaultStageRunner {
    risk_weights: BTreeMap<RiskCategory, u32>,
}

impl DefaultStageRunner {
    pub fn new(risk_weights: BTreeMap<RiskCategory, u32>) -> Self {
        Self { risk_weights }
    }
}

impl StageRunner for DefaultStageRunner {
    fn run_stage(
        &self,
        spec: &StageSpec,
        inputs: &StageInputs,
    ) -> Result<BTreeMap<String, StageValue>> {
        let doc = inputs.document.as_ref();

        match spec.name.as_str() {
            STAGE_EXTRACT_ENTITIES => {
                let value = EntityExtractor.run(doc)?;
                Ok(BTreeMap::from([(OUT_FACTS.to_string(), value)]))
            }
            STAGE_EXTRACT_SENTIMENT => {
                let value = SentimentExtractor.run(doc)?;
                Ok(BTreeMap::from([(OUT_SENTIMENT_SIGNAL.to_string(), value)]))
            }
            STAGE_EXTRACT_RISK => {
                let value = RiskExtractor.run(doc)?;
                Ok(BTreeMap::from([(OUT_RISK_SIGNAL.to_string(), value)]))
            }
            STAGE_EXTRACT_QUALITY => {
                let value = QualityExtractor.run(doc)?;
                Ok(BTreeMap::from([(OUT_QUALITY_SIGNAL.to_string(), value)]))
            }
            STAGE_SCORE_SENTIMENT => {
                // Hard input: the polarity signal. A best-effort run without
                // it still fails — a sentiment score needs evidence.
                let signal = match inputs.output(STAGE_EXTRACT_SENTIMENT, OUT_SENTIMENT_SIGNAL)
                {
                    Some(StageValue::Sentiment(s)) => s.clone(),
                    _ => {
                        return Err(DocIntelError::extraction(
                            &spec.name,
                            "sentiment signal unavailable",
                        ));
                    }
                };
                // Soft input: entity facts only sharpen confidence.
                let coverage = match inputs.output(STAGE_EXTRACT_ENTITIES, OUT_FACTS) {
                    Some(StageValue::Facts(facts)) => fact_coverage(facts),
                    _ => FALLBACK_COVERAGE,
                };
                Ok(BTreeMap::from([(
                    OUT_SENTIMENT.to_string(),
                    StageValue::SentimentScore(score_sentiment(&signal, coverage)),
                )]))
            }
            STAGE_SCORE_RISK => {
                let signal = match inputs.output(STAGE_EXTRACT_RISK, OUT_RISK_SIGNAL) {
                    Some(StageValue::Risk(s)) => s.clone(),
                    _ => {
                        return Err(DocIntelError::extraction(
                            &spec.name,
                            "risk signal unavailable",
                        ));
                    }
                };
                Ok(BTreeMap::from([(
                    OUT_RISK.to_string(),
                    StageValue::RiskScore(score_risk(&signal, &self.risk_weights)),
                )]))
            }
            STAGE_SCORE_QUALITY => {
                let signal = match inputs.output(STAGE_EXTRACT_QUALITY, OUT_QUALITY_SIGNAL) {
                    Some(StageValue::Quality(s)) => s.clone(),
                    _ => {
                        return Err(DocIntelError::extraction(
                            &spec.name,
                            "quality signal unavailable",
                        ));
                    }
                };
                Ok(BTreeMap::from([(
                    OUT_QUALITY.to_string(),
                    StageValue::QualityScore(score_quality(&signal)),
                )]))
            }
            other => Err(DocIntelError::validation(format!(
                "unknown stage '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called as each stage reaches a terminal status.
    fn stage_finished(&self, name: &str, status: StageStatus, current: usize, total: usize);
    /// Called when the run is finalized.
    fn done(&self, run: &PipelineRun);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn stage_finished(&self, _name: &str, _status: StageStatus, _current: usize, _total: usize) {}
    fn done(&self, _run: &PipelineRun) {}
}

// ---------------------------------------------------------------------------
// Analysis engine
// ---------------------------------------------------------------------------

/// Outcome of one analysis: the finalized run, and the report when at least
/// one of the sentiment/risk scoring stages succeeded.
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub run: PipelineRun,
    pub report: Option<Report>,
}

/// Entry point for running analyses, with admission control over the number
/// of simultaneous runs. Runs share nothing but this gate.
pub struct AnalysisEngine {
    config: RunConfig,
    runner: Arc<DefaultStageRunner>,
    admissions: Arc<Semaphore>,
}

impl AnalysisEngine {
    pub fn new(config: RunConfig) -> Self {
        let runner = Arc::new(DefaultStageRunner::new(
            config.risk_category_weights.clone(),
        ));
        let admissions = Arc::new(Semaphore::new(config.max_concurrent_runs));
        Self {
            config,
            runner,
            admissions,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Analyze one document to a finalized run and (when possible) a report.
    pub async fn analyze(
        &self,
        document: Document,
        progress: &dyn ProgressReporter,
    ) -> Result<AnalysisOutcome> {
        self.analyze_with_cancel(document, &CancelHandle::new(), progress)
            .await
    }

    /// Analyze with an external cancellation handle.
    #[instrument(skip_all, fields(doc_id = %document.id, words = document.word_count))]
    pub async fn analyze_with_cancel(
        &self,
        document: Document,
        cancel: &CancelHandle,
        progress: &dyn ProgressReporter,
    ) -> Result<AnalysisOutcome> {
        let _admission = self
            .admissions
            .acquire()
            .await
            .expect("admission semaphore closed");

        let graph = default_graph()?;

        progress.phase("Running analysis stages");
        let run = execute(
            document,
            &graph,
            self.runner.clone(),
            &self.config,
            cancel,
            progress,
        )
        .await;

        // A report requires at least one of the sentiment/risk scores.
        let report = if run.sentiment().is_some() || run.risk().is_some() {
            progress.phase("Synthesizing report");
            Some(docintel_report::synthesize(&run)?)
        } else {
            info!(
                run_id = %run.id,
                status = run.status.as_str(),
                "no scoring stage succeeded, skipping report synthesis"
            );
            None
        };

        progress.done(&run);

        Ok(AnalysisOutcome { run, report })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
