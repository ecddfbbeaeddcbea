use crate::resolver::ModuleResolver;
use crate::sandbox::{
    build_context, evaluate_commonjs, fresh_module, install_sink, take_resolution_failure,
    take_sink, RunSink,
};
use crate::scheduler::RunPhase;
use boa_engine::{JsError, Source};
use revet_types::{RunError, RunResult};
use serde_json::Value as JsonValue;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::time::Duration;
use tracing::{debug, warn};

/// The two independent wall-clock budgets of a run: a short one for the
/// synchronous phase and a coarser one for the whole await phase.
#[derive(Clone, Copy, Debug)]
pub struct ExecutionBudgets {
    pub sync: Duration,
    pub awaiting: Duration,
}

impl Default for ExecutionBudgets {
    fn default() -> Self {
        ExecutionBudgets {
            // Generous for synchronous logic, too short for network calls:
            // network-bound work must go through `schedule`.
            sync: Duration::from_millis(1000),
            awaiting: Duration::from_millis(10_000),
        }
    }
}

/// Everything the executor needs for one run.
pub struct ExecutionRequest {
    /// Display identity of the script, used in error messages.
    pub origin: String,
    /// Fully transformed, directly executable source.
    pub source: String,
    /// The pre-resolved review-context data exposed as `review`.
    pub review: JsonValue,
    /// Serves the script's relative imports.
    pub resolver: Box<dyn ModuleResolver>,
    pub budgets: ExecutionBudgets,
}

enum WorkerEvent {
    SyncCompleted,
    Finished(Box<Result<RunResult, RunError>>),
}

/// Execute a policy script to completion and aggregate everything it
/// emitted into one immutable [`RunResult`].
///
/// The engine context is not Send, so a dedicated worker thread owns it;
/// this thread only watches the clock. On a budget overrun the worker is
/// abandoned, not joined — the process is expected to exit shortly after
/// a fatal run error anyway.
pub fn execute(request: ExecutionRequest) -> Result<RunResult, RunError> {
    let budgets = request.budgets;
    let (tx, rx) = mpsc::channel();

    let worker = std::thread::Builder::new()
        .name("revet-sandbox".to_string())
        .spawn(move || {
            let outcome = run_policy(request, &tx);
            let _ = tx.send(WorkerEvent::Finished(Box::new(outcome)));
        })
        .map_err(|err| RunError::Execution {
            reason: format!("could not spawn sandbox worker: {err}"),
        })?;

    match rx.recv_timeout(budgets.sync) {
        Ok(WorkerEvent::Finished(outcome)) => {
            let _ = worker.join();
            *outcome
        }
        Ok(WorkerEvent::SyncCompleted) => match rx.recv_timeout(budgets.awaiting) {
            Ok(WorkerEvent::Finished(outcome)) => {
                let _ = worker.join();
                *outcome
            }
            Ok(WorkerEvent::SyncCompleted) => Err(RunError::Execution {
                reason: "sandbox worker signaled twice".to_string(),
            }),
            Err(RecvTimeoutError::Timeout) => {
                warn!(budget_ms = budgets.awaiting.as_millis() as u64, "await phase timed out");
                Err(RunError::ScheduledTask {
                    reason: format!(
                        "await phase exceeded its {} ms budget",
                        budgets.awaiting.as_millis()
                    ),
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(worker_gone()),
        },
        Err(RecvTimeoutError::Timeout) => {
            warn!(budget_ms = budgets.sync.as_millis() as u64, "synchronous phase timed out");
            Err(RunError::Execution {
                reason: format!(
                    "synchronous execution exceeded its {} ms budget",
                    budgets.sync.as_millis()
                ),
            })
        }
        Err(RecvTimeoutError::Disconnected) => Err(worker_gone()),
    }
}

fn worker_gone() -> RunError {
    RunError::Execution {
        reason: "sandbox worker terminated unexpectedly".to_string(),
    }
}

/// Guard returning the thread-local sink to its empty state on every exit
/// path, including evaluation errors.
struct SinkGuard;

impl Drop for SinkGuard {
    fn drop(&mut self) {
        let _ = take_sink();
    }
}

fn run_policy(request: ExecutionRequest, tx: &Sender<WorkerEvent>) -> Result<RunResult, RunError> {
    let mut phase = RunPhase::Idle;
    debug!(?phase, origin = %request.origin, "preparing sandbox");

    let mut ctx = build_context(&request.review).map_err(|err| RunError::Execution {
        reason: format!("sandbox setup failed: {err}"),
    })?;

    install_sink(RunSink::new(request.origin, request.resolver));
    let _guard = SinkGuard;

    phase = RunPhase::Running;
    debug!(?phase, "synchronous execution starting");

    let module = fresh_module(&mut ctx).map_err(|err| RunError::Execution {
        reason: format!("sandbox setup failed: {err}"),
    })?;
    if let Err(err) = evaluate_commonjs(&request.source, &module, &mut ctx) {
        // Tasks registered before the abort are discarded, not awaited.
        return Err(resolution_or_execution(err));
    }

    let _ = tx.send(WorkerEvent::SyncCompleted);
    phase = RunPhase::AwaitingScheduled;
    debug!(?phase, "awaiting scheduled tasks");

    let mut last_marker = None;
    loop {
        // Activate tasks registered since the last pump (including ones
        // registered inside completion callbacks), then drain microtasks.
        ctx.eval(Source::from_bytes(b"__revet_activate()"))
            .map_err(resolution_or_execution)?;
        ctx.run_jobs();

        let snapshot = crate::sandbox::board_snapshot()?;
        if let Some(reason) = snapshot.failure {
            return Err(RunError::ScheduledTask { reason });
        }
        if snapshot.pending == 0 {
            break;
        }
        if last_marker == Some(snapshot.marker) {
            // Nothing settled, failed, or registered: the remaining tasks
            // can only be callbacks whose completion signal never fires.
            return Err(RunError::ScheduledTask {
                reason: format!(
                    "{} scheduled task(s) never signaled completion",
                    snapshot.pending
                ),
            });
        }
        last_marker = Some(snapshot.marker);
    }

    phase = RunPhase::Finalized;
    debug!(?phase, "run finalized");

    let sink = take_sink().ok_or_else(|| RunError::Execution {
        reason: "sandbox state lost during finalization".to_string(),
    })?;
    Ok(sink.results)
}

fn resolution_or_execution(err: JsError) -> RunError {
    let reason = err.to_string();
    match take_resolution_failure() {
        // Only the error `require` itself threw maps to a resolution
        // failure; a recorded failure whose error the script caught is
        // stale, and the escaped exception stands on its own.
        Some(failure) if reason.contains(&failure.thrown_message()) => {
            RunError::RemoteResolution {
                specifier: failure.specifier,
                referrer: failure.referrer,
                reason: failure.reason,
            }
        }
        _ => RunError::Execution { reason },
    }
}
