//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod collapse;
pub mod models;
pub mod utils;

// Re-export main command functions
pub use collapse::{execute_collapse, validate_args};
pub use models::{CollapseArgs, CollapseOutcome, OutputPaths, RendererKind, ReportSource};
pub use utils::{display_version, validate_folded_file};
