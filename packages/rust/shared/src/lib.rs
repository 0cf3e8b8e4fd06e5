//! Shared types, error model, and configuration for DocIntel.
//!
//! This crate is the foundation depended on by all other DocIntel crates.
//! It provides:
//! - [`DocIntelError`] — the unified error type
//! - Document ingestion ([`Document`], [`ingest`])
//! - Domain types ([`ExtractedFact`], [`Score`], [`StageResult`],
//!   [`PipelineRun`], [`Report`])
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)

pub mod config;
pub mod document;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, LimitsConfig, OutputConfig, RiskWeightsConfig, RunConfig, config_dir,
    config_file_path, default_risk_weights, init_config, load_config, load_config_from,
};
pub use document::{DEFAULT_MAX_DOCUMENT_BYTES, Document, ingest};
pub use error::{DocIntelError, Result};
pub use types::{
    Emotion, ExtractedFact, FactKind, PipelineRun, QualityAssessment, QualitySignal, Report,
    RiskAssessment, RiskCategory, RiskLevel, RiskSignal, RunId, RunStatus, Score,
    SentimentAssessment, SentimentSignal, SentimentSummary, RiskSummary, Span, StageResult,
    StageStatus, StageValue,
};
