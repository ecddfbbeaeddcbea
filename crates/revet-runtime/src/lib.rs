//! Sandbox executor and scheduler/result aggregator.
//!
//! Transformed policy source runs inside an embedded ECMAScript context
//! with a closed capability surface: the read-only `review` object, the
//! four emission functions, `schedule`, and a `require` backed by an
//! injected [`ModuleResolver`]. Nothing else from the host is reachable —
//! no ambient filesystem or network access.
//!
//! Execution is single-threaded and cooperative. The script body runs
//! synchronously top to bottom; only work registered through `schedule`
//! may complete later, and the aggregator pumps the engine's microtask
//! queue until every registered task has settled. Two independent
//! wall-clock budgets bound the run: a short one for the synchronous
//! phase and a coarser one for the await phase.

#![forbid(unsafe_code)]

mod execute;
mod resolver;
mod sandbox;
mod scheduler;

pub use execute::{execute, ExecutionBudgets, ExecutionRequest};
pub use resolver::{ModuleResolver, NoRemoteContext, ResolveError, ResolvedModule};
pub use scheduler::RunPhase;
