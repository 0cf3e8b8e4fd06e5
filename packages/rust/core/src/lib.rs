//! Core pipeline orchestration for DocIntel.
//!
//! This crate ties extractors, the scoring engine, and report synthesis into
//! an end-to-end analysis workflow: a validated stage graph, a concurrent
//! executor with timeout/cancellation, and an admission-controlled engine.

pub mod executor;
pub mod graph;
pub mod pipeline;

pub use executor::{CancelHandle, StageInputs, StageRunner, execute};
pub use graph::{StageGraph, StageSpec};
pub use pipeline::{
    AnalysisEngine, AnalysisOutcome, DefaultStageRunner, ProgressReporter, SilentProgress,
    default_graph,
};
