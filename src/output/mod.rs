//! Output writers for collapsed stacks.
//!
//! This module handles writing data to disk in various formats:
//! - Folded stacks (and validating them)
//! - Interactive HTML call trees and flamegraph pages
//! - SVG flamegraphs
//! - JSON summaries

pub mod folded;
pub mod html;
pub mod json;
pub mod svg;

use crate::utils::error::OutputError;
use log::debug;
use std::path::Path;

// Re-export main functions
pub use folded::{validate_folded, write_folded, FoldedValidation};
pub use html::{stacks_to_tree, write_svg_page, write_tree_html, TreeNode};
pub use json::{read_summary, write_summary, CollapseSummary, HotPath};
pub use svg::write_svg;

/// Validate an output path and create its parent directories
///
/// **Private** - shared by the writers
pub(crate) fn prepare_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    Ok(())
}
