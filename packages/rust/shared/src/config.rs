//! Application configuration for DocIntel.
//!
//! User config lives at `~/.docintel/docintel.toml`.
//! CLI flags override config file values, which override defaults.
//! Per-run settings are carried in [`RunConfig`] — an explicit parameter
//! object, never process-global state.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::document::DEFAULT_MAX_DOCUMENT_BYTES;
use crate::error::{DocIntelError, Result};
use crate::types::RiskCategory;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docintel.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docintel";

// ---------------------------------------------------------------------------
// Config structs (matching docintel.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Resource limits and admission control.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Per-category risk severity weights.
    #[serde(default)]
    pub risk_weights: RiskWeightsConfig,

    /// Output defaults.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[limits]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum accepted document size in bytes.
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: usize,

    /// Run-level wall-clock budget in seconds.
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,

    /// Maximum concurrent stage tasks within one run.
    #[serde(default = "default_stage_concurrency")]
    pub stage_concurrency: usize,

    /// Maximum simultaneous pipeline runs (admission control).
    #[serde(default = "default_max_concurrent_runs")]
    pub max_concurrent_runs: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_document_bytes: default_max_document_bytes(),
            run_timeout_secs: default_run_timeout_secs(),
            stage_concurrency: default_stage_concurrency(),
            max_concurrent_runs: default_max_concurrent_runs(),
        }
    }
}

fn default_max_document_bytes() -> usize {
    DEFAULT_MAX_DOCUMENT_BYTES
}
fn default_run_timeout_secs() -> u64 {
    30
}
fn default_stage_concurrency() -> usize {
    4
}
fn default_max_concurrent_runs() -> usize {
    4
}

/// `[risk_weights]` section.
///
/// The weight sum across all five categories intentionally exceeds the
/// 20-point cap so the explicit clip is reachable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskWeightsConfig {
    #[serde(default = "default_financial_weight")]
    pub financial: u32,
    #[serde(default = "default_operational_weight")]
    pub operational: u32,
    #[serde(default = "default_market_weight")]
    pub market: u32,
    #[serde(default = "default_timeline_weight")]
    pub timeline: u32,
    #[serde(default = "default_regulatory_weight")]
    pub regulatory: u32,
}

impl Default for RiskWeightsConfig {
    fn default() -> Self {
        Self {
            financial: default_financial_weight(),
            operational: default_operational_weight(),
            market: default_market_weight(),
            timeline: default_timeline_weight(),
            regulatory: default_regulatory_weight(),
        }
    }
}

fn default_financial_weight() -> u32 {
    5
}
fn default_operational_weight() -> u32 {
    4
}
fn default_market_weight() -> u32 {
    4
}
fn default_timeline_weight() -> u32 {
    3
}
fn default_regulatory_weight() -> u32 {
    5
}

impl RiskWeightsConfig {
    /// Weights as a map keyed by category, in fixed category order.
    pub fn as_map(&self) -> BTreeMap<RiskCategory, u32> {
        BTreeMap::from([
            (RiskCategory::Financial, self.financial),
            (RiskCategory::Operational, self.operational),
            (RiskCategory::Market, self.market),
            (RiskCategory::Timeline, self.timeline),
            (RiskCategory::Regulatory, self.regulatory),
        ])
    }
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default report format: "text" or "json".
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

fn default_format() -> String {
    "text".into()
}

/// Default per-category risk severity weights.
pub fn default_risk_weights() -> BTreeMap<RiskCategory, u32> {
    RiskWeightsConfig::default().as_map()
}

// ---------------------------------------------------------------------------
// Run config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime configuration for a single pipeline run — merged from config
/// file + CLI flags and passed explicitly into the executor.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Run-level wall-clock budget.
    pub max_run_timeout: Duration,
    /// Stages allowed to run with defaults when a dependency failed.
    pub best_effort_stages: BTreeSet<String>,
    /// Per-category risk severity weights.
    pub risk_category_weights: BTreeMap<RiskCategory, u32>,
    /// Maximum accepted document size in bytes.
    pub max_document_bytes: usize,
    /// Maximum concurrent stage tasks within one run.
    pub stage_concurrency: usize,
    /// Maximum simultaneous runs (admission control).
    pub max_concurrent_runs: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for RunConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_run_timeout: Duration::from_secs(config.limits.run_timeout_secs),
            best_effort_stages: BTreeSet::new(),
            risk_category_weights: config.risk_weights.as_map(),
            max_document_bytes: config.limits.max_document_bytes,
            stage_concurrency: config.limits.stage_concurrency.max(1),
            max_concurrent_runs: config.limits.max_concurrent_runs.max(1),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docintel/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocIntelError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docintel/docintel.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocIntelError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DocIntelError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocIntelError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocIntelError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocIntelError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("max_document_bytes"));
        assert!(toml_str.contains("financial"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.limits.run_timeout_secs, 30);
        assert_eq!(parsed.risk_weights.financial, 5);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[limits]
run_timeout_secs = 5

[risk_weights]
financial = 8
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.limits.run_timeout_secs, 5);
        assert_eq!(config.limits.stage_concurrency, 4);
        assert_eq!(config.risk_weights.financial, 8);
        assert_eq!(config.risk_weights.timeline, 3);
    }

    #[test]
    fn run_config_from_app_config() {
        let app = AppConfig::default();
        let run = RunConfig::from(&app);
        assert_eq!(run.max_run_timeout, Duration::from_secs(30));
        assert_eq!(run.stage_concurrency, 4);
        assert_eq!(
            run.risk_category_weights[&RiskCategory::Financial],
            5
        );
        assert!(run.best_effort_stages.is_empty());
    }

    #[test]
    fn default_weight_sum_exceeds_cap() {
        let total: u32 = default_risk_weights().values().sum();
        assert!(total > 20, "clip must be reachable, got weight sum {total}");
    }
}
