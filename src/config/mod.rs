// src/config/mod.rs

//! Workflow loading and validation.
//!
//! Responsibilities:
//! - Define the serde-backed workflow model (`model.rs`).
//! - Load a workflow document from disk or text (`loader.rs`).
//! - Validate names, result paths and nesting depth (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

/// Deepest task nesting accepted by default.
pub const MAX_TASK_DEPTH: usize = 64;

pub use loader::{load_and_validate, load_and_validate_with_depth, load_from_path, parse_json_workflow};
pub use model::{RawTask, RawWorkflow, Task, Workflow};
pub use validate::validate_with_depth;
