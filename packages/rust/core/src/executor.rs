//! Pipeline executor.
//!
//! Drives a [`StageGraph`] over one document: stages whose dependencies are
//! terminal run concurrently as tokio tasks bounded by a semaphore, while the
//! executor task remains the sole writer of run state (single-writer
//! invariant). A run-level timeout and a cancel handle bound every run.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::Utc;
use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use docintel_shared::{
    Document, PipelineRun, Result, RunConfig, RunId, RunStatus, StageResult, StageStatus,
    StageValue,
};

use crate::graph::{StageGraph, StageSpec};
use crate::pipeline::ProgressReporter;

/// Stage failure reason recorded when the run budget expires.
const REASON_TIMEOUT: &str = "timeout";

/// Stage failure reason recorded when the run is cancelled.
const REASON_CANCELLED: &str = "cancelled";

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Cloneable cancellation handle for a run.
///
/// Cancelling marks every non-terminal stage `failed(reason = cancelled)`.
/// Idempotent: repeated calls, or cancelling an already-finalized run, are
/// no-ops.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Safe to call from any task, any number of times.
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            // Single buffered permit: the executor observes this even if it
            // registers its waiter after the call.
            self.inner.notify.notify_one();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve once cancellation has been requested.
    pub(crate) async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.inner.notify.notified().await;
    }
}

// ---------------------------------------------------------------------------
// Stage runner
// ---------------------------------------------------------------------------

/// Read-only inputs handed to a stage at dispatch time.
///
/// `dependencies` holds only the *succeeded* dependency results; a
/// best-effort stage must substitute its documented default for anything
/// missing here.
#[derive(Debug, Clone)]
pub struct StageInputs {
    pub document: Arc<Document>,
    pub dependencies: BTreeMap<String, StageResult>,
}

impl StageInputs {
    /// Look up a named output of a succeeded dependency stage.
    pub fn output(&self, stage: &str, key: &str) -> Option<&StageValue> {
        self.dependencies
            .get(stage)
            .and_then(|r| r.outputs.get(key))
    }
}

/// Executes one stage's work. Implementations are pure with respect to the
/// inputs; the executor owns all run-state mutation.
pub trait StageRunner: Send + Sync {
    fn run_stage(
        &self,
        spec: &StageSpec,
        inputs: &StageInputs,
    ) -> Result<BTreeMap<String, StageValue>>;
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Run the stage graph over a document and return the finalized run.
///
/// The returned [`PipelineRun`] is immutable from the caller's perspective:
/// the executor is the only writer while the run is live.
#[instrument(skip_all, fields(stages = graph.len(), words = document.word_count))]
pub async fn execute(
    document: Document,
    graph: &StageGraph,
    runner: Arc<dyn StageRunner>,
    config: &RunConfig,
    cancel: &CancelHandle,
    progress: &dyn ProgressReporter,
) -> PipelineRun {
    let run_id = RunId::new();
    let started_at = Utc::now();
    let start = Instant::now();
    let doc = Arc::new(document);
    let total = graph.len();

    let mut results: BTreeMap<String, StageResult> = graph
        .stages()
        .iter()
        .map(|s| (s.name.clone(), StageResult::pending(&s.name)))
        .collect();

    let mut timed_out = false;
    let mut was_cancelled = false;

    if config.max_run_timeout.is_zero() {
        // A zero budget expires before anything can be dispatched.
        timed_out = true;
        for result in results.values_mut() {
            result.status = StageStatus::Failed;
            result.error = Some(REASON_TIMEOUT.into());
        }
    } else {
        let semaphore = Arc::new(Semaphore::new(config.stage_concurrency));
        let mut tasks: JoinSet<(String, Result<BTreeMap<String, StageValue>>, u64)> =
            JoinSet::new();
        let mut task_names: HashMap<tokio::task::Id, String> = HashMap::new();
        let mut completed = 0usize;

        let run_timeout = tokio::time::sleep(config.max_run_timeout);
        tokio::pin!(run_timeout);

        loop {
            // Dispatch until fixpoint. Skips cascade: a skipped stage is
            // terminal and may render its dependents skippable in turn.
            loop {
                let ready: Vec<StageSpec> = graph
                    .stages()
                    .iter()
                    .filter(|s| {
                        results[&s.name].status == StageStatus::Pending
                            && s.depends_on
                                .iter()
                                .all(|d| results[d].status.is_terminal())
                    })
                    .cloned()
                    .collect();

                if ready.is_empty() {
                    break;
                }

                for spec in ready {
                    let best_effort = spec.best_effort
                        || config.best_effort_stages.contains(&spec.name);

                    let failed_dep = spec
                        .depends_on
                        .iter()
                        .find(|d| results[d.as_str()].status != StageStatus::Succeeded);

                    if let Some(dep) = failed_dep {
                        if !best_effort {
                            if let Some(entry) = results.get_mut(&spec.name) {
                                entry.status = StageStatus::Skipped;
                                entry.error =
                                    Some(format!("dependency '{dep}' did not succeed"));
                            }
                            completed += 1;
                            progress.stage_finished(
                                &spec.name,
                                StageStatus::Skipped,
                                completed,
                                total,
                            );
                            debug!(stage = %spec.name, dependency = %dep, "stage skipped");
                            continue;
                        }
                        debug!(
                            stage = %spec.name,
                            dependency = %dep,
                            "best-effort stage running with defaults"
                        );
                    }

                    let mut dependencies = BTreeMap::new();
                    for dep in &spec.depends_on {
                        if let Some(result) = results.get(dep) {
                            if result.status == StageStatus::Succeeded {
                                dependencies.insert(dep.clone(), result.clone());
                            }
                        }
                    }

                    if let Some(entry) = results.get_mut(&spec.name) {
                        entry.status = StageStatus::Running;
                    }

                    let inputs = StageInputs {
                        document: doc.clone(),
                        dependencies,
                    };
                    let sem = semaphore.clone();
                    let stage_runner = runner.clone();
                    let name = spec.name.clone();

                    let handle = tasks.spawn(async move {
                        let _permit = sem.acquire_owned().await.expect("semaphore closed");
                        let stage_start = Instant::now();
                        let out = stage_runner.run_stage(&spec, &inputs);
                        (spec.name, out, stage_start.elapsed().as_millis() as u64)
                    });
                    task_names.insert(handle.id(), name);
                }
            }

            if results.values().all(|r| r.status.is_terminal()) {
                break;
            }

            tokio::select! {
                joined = tasks.join_next_with_id() => {
                    match joined {
                        Some(Ok((id, (name, out, duration_ms)))) => {
                            task_names.remove(&id);
                            if let Some(entry) = results.get_mut(&name) {
                                entry.duration_ms = duration_ms;
                                match out {
                                    Ok(outputs) => {
                                        entry.status = StageStatus::Succeeded;
                                        entry.outputs = outputs;
                                    }
                                    Err(e) => {
                                        entry.status = StageStatus::Failed;
                                        entry.error = Some(e.to_string());
                                        warn!(stage = %name, error = %e, "stage failed");
                                    }
                                }
                                completed += 1;
                                progress.stage_finished(
                                    &name,
                                    entry.status,
                                    completed,
                                    total,
                                );
                            }
                        }
                        Some(Err(join_err)) => {
                            if let Some(name) = task_names.remove(&join_err.id()) {
                                if let Some(entry) = results.get_mut(&name) {
                                    entry.status = StageStatus::Failed;
                                    entry.error =
                                        Some(format!("stage task failed: {join_err}"));
                                }
                                completed += 1;
                                warn!(stage = %name, error = %join_err, "stage task failed");
                            }
                        }
                        None => {
                            warn!("no running tasks but run is not terminal");
                            break;
                        }
                    }
                }
                _ = &mut run_timeout => {
                    timed_out = true;
                    break;
                }
                _ = cancel.cancelled() => {
                    was_cancelled = true;
                    break;
                }
            }
        }

        if timed_out || was_cancelled {
            tasks.abort_all();
            let reason = if was_cancelled {
                REASON_CANCELLED
            } else {
                REASON_TIMEOUT
            };
            for result in results.values_mut() {
                if !result.status.is_terminal() {
                    result.status = StageStatus::Failed;
                    result.error = Some(reason.into());
                }
            }
        }
    }

    let succeeded = results
        .values()
        .filter(|r| r.status == StageStatus::Succeeded)
        .count();

    // A timed-out run finalizes as partial regardless of what completed.
    let status = if timed_out {
        RunStatus::Partial
    } else if succeeded == results.len() {
        RunStatus::Completed
    } else if succeeded == 0 {
        RunStatus::Failed
    } else {
        RunStatus::Partial
    };

    let run = PipelineRun {
        id: run_id,
        document: Arc::try_unwrap(doc).unwrap_or_else(|arc| (*arc).clone()),
        stages: results,
        status,
        started_at,
        finished_at: Utc::now(),
        elapsed_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        run_id = %run.id,
        status = run.status.as_str(),
        succeeded,
        stages = run.stages.len(),
        elapsed_ms = run.elapsed_ms,
        cancelled = was_cancelled,
        timed_out,
        "run finalized"
    );

    run
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::time::Duration;

    use docintel_shared::{DocIntelError, ingest};

    use crate::pipeline::SilentProgress;

    /// Test runner: fails configured stages, sleeps in configured stages,
    /// and otherwise echoes the stage name as a text output.
    #[derive(Default)]
    struct TestRunner {
        fail: BTreeSet<String>,
        slow_ms: u64,
    }

    impl StageRunner for TestRunner {
        fn run_stage(
            &self,
            spec: &StageSpec,
            _inputs: &StageInputs,
        ) -> Result<BTreeMap<String, StageValue>> {
            if self.slow_ms > 0 {
                std::thread::sleep(Duration::from_millis(self.slow_ms));
            }
            if self.fail.contains(&spec.name) {
                return Err(DocIntelError::extraction(&spec.name, "synthetic failure"));
            }
            Ok(BTreeMap::from([(
                "text".to_string(),
                StageValue::Text(format!("{} done", spec.name)),
            )]))
        }
    }

    fn doc() -> Document {
        ingest("A small test document.", None, 1024).expect("ingest")
    }

    fn diamond_graph() -> StageGraph {
        StageGraph::new(vec![
            StageSpec::new("left"),
            StageSpec::new("right"),
            StageSpec::new("join").depends_on("left").depends_on("right"),
        ])
        .expect("graph")
    }

    #[tokio::test]
    async fn all_stages_succeed() {
        let runner = Arc::new(TestRunner::default());
        let run = execute(
            doc(),
            &diamond_graph(),
            runner,
            &RunConfig::default(),
            &CancelHandle::new(),
            &SilentProgress,
        )
        .await;

        assert_eq!(run.status, RunStatus::Completed);
        assert!(run.stage_succeeded("left"));
        assert!(run.stage_succeeded("join"));
        assert_eq!(
            run.stage("join").unwrap().outputs["text"],
            StageValue::Text("join done".into())
        );
    }

    #[tokio::test]
    async fn failed_dependency_skips_dependent() {
        let runner = Arc::new(TestRunner {
            fail: BTreeSet::from(["left".to_string()]),
            slow_ms: 0,
        });
        let run = execute(
            doc(),
            &diamond_graph(),
            runner,
            &RunConfig::default(),
            &CancelHandle::new(),
            &SilentProgress,
        )
        .await;

        assert_eq!(run.status, RunStatus::Partial);
        assert_eq!(run.stage("left").unwrap().status, StageStatus::Failed);
        assert_eq!(run.stage("join").unwrap().status, StageStatus::Skipped);
        assert!(
            run.stage("join")
                .unwrap()
                .error
                .as_deref()
                .unwrap_or_default()
                .contains("left")
        );
        // The sibling is unaffected.
        assert!(run.stage_succeeded("right"));
    }

    #[tokio::test]
    async fn best_effort_stage_runs_despite_failed_dependency() {
        let graph = StageGraph::new(vec![
            StageSpec::new("source"),
            StageSpec::new("consumer").depends_on("source").best_effort(),
        ])
        .expect("graph");

        let runner = Arc::new(TestRunner {
            fail: BTreeSet::from(["source".to_string()]),
            slow_ms: 0,
        });
        let run = execute(
            doc(),
            &graph,
            runner,
            &RunConfig::default(),
            &CancelHandle::new(),
            &SilentProgress,
        )
        .await;

        assert_eq!(run.status, RunStatus::Partial);
        assert!(run.stage_succeeded("consumer"));
    }

    #[tokio::test]
    async fn run_config_can_promote_stage_to_best_effort() {
        let graph = StageGraph::new(vec![
            StageSpec::new("source"),
            StageSpec::new("consumer").depends_on("source"),
        ])
        .expect("graph");

        let mut config = RunConfig::default();
        config.best_effort_stages.insert("consumer".to_string());

        let runner = Arc::new(TestRunner {
            fail: BTreeSet::from(["source".to_string()]),
            slow_ms: 0,
        });
        let run = execute(
            doc(),
            &graph,
            runner,
            &config,
            &CancelHandle::new(),
            &SilentProgress,
        )
        .await;

        assert!(run.stage_succeeded("consumer"));
    }

    #[tokio::test]
    async fn zero_timeout_fails_every_stage() {
        let mut config = RunConfig::default();
        config.max_run_timeout = Duration::ZERO;

        let runner = Arc::new(TestRunner::default());
        let run = execute(
            doc(),
            &diamond_graph(),
            runner,
            &config,
            &CancelHandle::new(),
            &SilentProgress,
        )
        .await;

        assert_eq!(run.status, RunStatus::Partial);
        for stage in run.stages.values() {
            assert_eq!(stage.status, StageStatus::Failed);
            assert_eq!(stage.error.as_deref(), Some("timeout"));
        }
    }

    // Four workers so the executor and timer keep running while the two
    // extractor tasks block their threads.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn timeout_fails_remaining_stages() {
        let mut config = RunConfig::default();
        config.max_run_timeout = Duration::from_millis(50);

        let runner = Arc::new(TestRunner {
            fail: BTreeSet::new(),
            slow_ms: 500,
        });
        let run = execute(
            doc(),
            &diamond_graph(),
            runner,
            &config,
            &CancelHandle::new(),
            &SilentProgress,
        )
        .await;

        assert_eq!(run.status, RunStatus::Partial);
        assert!(
            run.stages
                .values()
                .all(|s| s.error.as_deref() == Some("timeout"))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn cancellation_fails_non_terminal_stages() {
        let runner = Arc::new(TestRunner {
            fail: BTreeSet::new(),
            slow_ms: 500,
        });
        let cancel = CancelHandle::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let run = execute(
            doc(),
            &diamond_graph(),
            runner,
            &RunConfig::default(),
            &cancel,
            &SilentProgress,
        )
        .await;

        assert_eq!(run.status, RunStatus::Failed);
        assert!(
            run.stages
                .values()
                .all(|s| s.error.as_deref() == Some("cancelled"))
        );
    }

    #[tokio::test]
    async fn cancel_after_finalize_is_noop() {
        let cancel = CancelHandle::new();
        let runner = Arc::new(TestRunner::default());
        let run = execute(
            doc(),
            &diamond_graph(),
            runner,
            &RunConfig::default(),
            &cancel,
            &SilentProgress,
        )
        .await;
        assert_eq!(run.status, RunStatus::Completed);

        // Cancelling a finalized run changes nothing; repeated cancels are fine.
        cancel.cancel();
        cancel.cancel();
        assert!(cancel.is_cancelled());
        assert_eq!(run.status, RunStatus::Completed);
    }

    #[test]
    fn stage_inputs_output_lookup() {
        let mut result = StageResult::pending("dep");
        result.status = StageStatus::Succeeded;
        result
            .outputs
            .insert("text".into(), StageValue::Text("value".into()));

        let inputs = StageInputs {
            document: Arc::new(doc()),
            dependencies: BTreeMap::from([("dep".to_string(), result)]),
        };

        assert_eq!(
            inputs.output("dep", "text"),
            Some(&StageValue::Text("value".into()))
        );
        assert_eq!(inputs.output("dep", "missing"), None);
        assert_eq!(inputs.output("ghost", "text"), None);
    }
}
