// src/engine/mod.rs

//! Task-tree execution engine.
//!
//! This module ties together:
//! - placeholder interpolation ([`interpolate`]) and result path cleaning
//!   ([`paths`])
//! - the per-run / per-branch execution context ([`context`])
//! - progress events and the sink abstraction every mode writes to
//!   ([`events`])
//! - the pre-order tree walker ([`walker`]) and its side-effect-free twin,
//!   the execution plan ([`plan`])

pub mod context;
pub mod events;
pub mod interpolate;
pub mod paths;
pub mod plan;
pub mod walker;

pub use context::{ResolvedTask, RunContext};
pub use events::{Completion, ProgressEvent, ProgressSink};
pub use interpolate::{interpolate, Vars};
pub use plan::{build_plan, render_plan, PlanEntry};
pub use walker::{execute_run, RunReport, TaskFailure, TreeWalker, WalkOptions};
