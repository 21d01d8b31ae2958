//! JSON summary output.
//!
//! A summary records where the stacks came from, the report header and
//! the hottest stacks, so runs can be compared without re-reading reports.

use super::prepare_output_path;
use crate::parser::schema::Header;
use crate::utils::config::SCHEMA_VERSION;
use crate::utils::error::OutputError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// A single hot stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotPath {
    /// Folded stack, `;`-separated
    pub stack: String,

    /// Events attributed to this stack
    pub count: u64,

    /// Share of all folded events
    pub percentage: f64,
}

/// Machine-readable summary of one collapse run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollapseSummary {
    /// Summary format version
    pub version: String,

    /// Report the stacks were read from
    pub source: String,

    /// `full-tree` or `brief`
    pub format: String,

    pub header: Header,

    /// Sum of all folded counts
    pub total_events: u64,

    /// Number of distinct stacks
    pub stack_count: usize,

    pub hot_paths: Vec<HotPath>,

    /// RFC 3339 timestamp
    pub generated_at: String,
}

impl CollapseSummary {
    pub fn new(
        source: impl Into<String>,
        format: impl Into<String>,
        header: Header,
        total_events: u64,
        stack_count: usize,
        hot_paths: Vec<HotPath>,
    ) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            source: source.into(),
            format: format.into(),
            header,
            total_events,
            stack_count,
            hot_paths,
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Write a summary to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_summary(
    summary: &CollapseSummary,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing summary to: {}", output_path.display());

    prepare_output_path(output_path)?;

    let file = File::create(output_path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, summary)?;

    info!(
        "Summary written successfully ({} bytes)",
        std::fs::metadata(output_path).map(|m| m.len()).unwrap_or(0)
    );

    Ok(())
}

/// Read a summary back from a JSON file
///
/// **Public** - useful for comparing runs and for tests
pub fn read_summary(input_path: impl AsRef<Path>) -> Result<CollapseSummary, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading summary from: {}", input_path.display());

    let file = File::open(input_path)?;
    let summary: CollapseSummary = serde_json::from_reader(file)?;

    debug!(
        "Summary loaded: version {}, source {}",
        summary.version, summary.source
    );

    Ok(summary)
}
