//! Deterministic scoring engine for DocIntel.
//!
//! Pure functions mapping raw extractor signals to bounded scores. Idempotent
//! by construction: no randomness, no wall-clock reads, ordered maps wherever
//! iteration order matters — identical signals yield bit-identical scores.

pub mod confidence;
pub mod quality;
pub mod risk;
pub mod sentiment;

pub use confidence::{FALLBACK_COVERAGE, confidence, fact_coverage};
pub use quality::score_quality;
pub use risk::{RISK_SCORE_MAX, score_risk};
pub use sentiment::score_sentiment;
