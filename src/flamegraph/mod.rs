//! Flamegraph rendering.
//!
//! This module converts validated folded files into SVG flamegraphs,
//! either in process with the inferno library or through `flamegraph.pl`.

pub mod generator;
pub mod script;

// Re-export main types
pub use generator::{generate_text_summary, FlamegraphConfig, FlamegraphRenderer, InfernoRenderer};
pub use script::{download_flamegraph, ScriptRenderer};
