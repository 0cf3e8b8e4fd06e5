//! CLI command definitions, routing, and tracing setup.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use docintel_core::{AnalysisEngine, AnalysisOutcome, ProgressReporter, SilentProgress};
use docintel_shared::{
    AppConfig, PipelineRun, RunConfig, StageStatus, ingest, init_config, load_config,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// DocIntel — turn business documents into structured intelligence reports.
#[derive(Parser)]
#[command(
    name = "docintel",
    version,
    about = "Analyze business documents: extract facts, score sentiment and risk, synthesize a report.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Report output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Analyze a single document and print its report.
    Analyze {
        /// Path to the document, or "-" to read stdin.
        file: String,

        /// Declared document language (defaults to "en").
        #[arg(short, long)]
        language: Option<String>,

        /// Report format: text or json.
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Run-level timeout in seconds (overrides config).
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Stage names to treat as best-effort (can be repeated).
        #[arg(long)]
        best_effort: Vec<String>,
    },

    /// Analyze every .txt/.md document in a directory concurrently.
    Batch {
        /// Directory of documents.
        dir: String,

        /// Report format: text or json.
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docintel=info",
        1 => "docintel=debug",
        _ => "docintel=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Analyze {
            file,
            language,
            format,
            timeout_secs,
            best_effort,
        } => cmd_analyze(&file, language.as_deref(), format, timeout_secs, best_effort).await,
        Command::Batch { dir, format } => cmd_batch(&dir, format).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// analyze
// ---------------------------------------------------------------------------

async fn cmd_analyze(
    file: &str,
    language: Option<&str>,
    format: OutputFormat,
    timeout_secs: Option<u64>,
    best_effort: Vec<String>,
) -> Result<()> {
    let config = load_config()?;
    let mut run_config = RunConfig::from(&config);

    if let Some(secs) = timeout_secs {
        run_config.max_run_timeout = Duration::from_secs(secs);
    }
    for stage in best_effort {
        run_config.best_effort_stages.insert(stage);
    }

    let raw = read_document(file)?;
    let doc = ingest(&raw, language, run_config.max_document_bytes)?;

    info!(file, words = doc.word_count, "analyzing document");

    let engine = AnalysisEngine::new(run_config);
    let reporter = CliProgress::new();
    let outcome = engine.analyze(doc, &reporter).await?;

    print_outcome(&outcome, format)
}

/// Read a document from a file path or stdin ("-").
fn read_document(file: &str) -> Result<String> {
    if file == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| eyre!("failed to read stdin: {e}"))?;
        Ok(buf)
    } else {
        std::fs::read_to_string(file)
            .map_err(|e| eyre!("failed to read '{file}': {e}"))
    }
}

fn print_outcome(outcome: &AnalysisOutcome, format: OutputFormat) -> Result<()> {
    match &outcome.report {
        Some(report) => match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(report)?);
            }
            OutputFormat::Text => {
                println!("{}", docintel_report::render_markdown(report));
                print_run_footer(&outcome.run);
            }
        },
        None => {
            eprintln!("Analysis failed — no scoring stage succeeded:");
            for (stage, reason) in outcome.run.error_reasons() {
                eprintln!("  {stage}: {reason}");
            }
            return Err(eyre!(
                "run {} finished with status '{}' and no report",
                outcome.run.id,
                outcome.run.status.as_str()
            ));
        }
    }
    Ok(())
}

fn print_run_footer(run: &PipelineRun) {
    println!("  Run:    {}", run.id);
    println!("  Status: {}", run.status.as_str());
    println!(
        "  Stages: {} succeeded / {} total",
        run.stages
            .values()
            .filter(|s| s.status == StageStatus::Succeeded)
            .count(),
        run.stages.len()
    );
    println!("  Time:   {}ms", run.elapsed_ms);
}

// ---------------------------------------------------------------------------
// batch
// ---------------------------------------------------------------------------

async fn cmd_batch(dir: &str, format: OutputFormat) -> Result<()> {
    let config = load_config()?;
    let run_config = RunConfig::from(&config);
    let max_document_bytes = run_config.max_document_bytes;

    let paths = collect_documents(Path::new(dir))?;
    if paths.is_empty() {
        return Err(eyre!("no .txt or .md documents found in '{dir}'"));
    }

    info!(
        count = paths.len(),
        max_concurrent = run_config.max_concurrent_runs,
        "starting batch analysis"
    );

    // The engine's admission semaphore bounds how many of these run at once.
    let engine = Arc::new(AnalysisEngine::new(run_config));
    let mut handles = Vec::new();

    for path in paths {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            let raw = std::fs::read_to_string(&path)
                .map_err(|e| eyre!("failed to read '{}': {e}", path.display()))?;
            let doc = ingest(&raw, None, max_document_bytes)?;
            let outcome = engine.analyze(doc, &SilentProgress).await?;
            Ok::<(PathBuf, AnalysisOutcome), color_eyre::eyre::Report>((path, outcome))
        }));
    }

    let mut failures = 0usize;
    for handle in handles {
        match handle.await? {
            Ok((path, outcome)) => match format {
                OutputFormat::Json => {
                    if let Some(report) = &outcome.report {
                        println!("{}", serde_json::to_string(report)?);
                    }
                }
                OutputFormat::Text => {
                    let (sentiment, risk) = outcome
                        .report
                        .as_ref()
                        .map(|r| (r.sentiment.score, r.risk.score))
                        .unwrap_or((0, 0));
                    println!(
                        "  {:<40} {:<9} sentiment {:>3}/100  risk {:>2}/20  {}ms",
                        path.display(),
                        outcome.run.status.as_str(),
                        sentiment,
                        risk,
                        outcome.run.elapsed_ms
                    );
                    if outcome.report.is_none() {
                        failures += 1;
                    }
                }
            },
            Err(e) => {
                failures += 1;
                eprintln!("  analysis failed: {e}");
            }
        }
    }

    if failures > 0 {
        return Err(eyre!("{failures} document(s) failed to produce a report"));
    }
    Ok(())
}

/// Gather .txt and .md files directly inside `dir`, sorted for stable output.
fn collect_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        std::fs::read_dir(dir).map_err(|e| eyre!("cannot read '{}': {e}", dir.display()))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext == "txt" || ext == "md")
                .unwrap_or(false)
        })
        .collect();

    paths.sort();
    Ok(paths)
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn stage_finished(&self, name: &str, status: StageStatus, current: usize, total: usize) {
        self.spinner.set_message(format!(
            "[{current}/{total}] {name}: {}",
            status.as_str()
        ));
    }

    fn done(&self, _run: &PipelineRun) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
