//! Folded stack output and validation.
//!
//! One line per stack: `frame1;frame2;...;frameN COUNT`. This is the
//! hand-off format for flamegraph renderers and is written bit-exact.

use super::prepare_output_path;
use crate::aggregator::stack_builder::StackMap;
use crate::utils::config::{MIN_VALID_LINE_RATIO, VALIDATION_SAMPLE_LINES};
use crate::utils::error::OutputError;
use log::{debug, info};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Replace non-ASCII and control characters in a frame name with `?`
pub fn sanitize_frame(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect()
}

/// Sanitized folded lines, in map order
///
/// Stacks that only differ in characters lost to sanitization are merged
/// into the position of the first one.
pub fn folded_lines(stacks: &StackMap) -> Vec<String> {
    let sanitized: StackMap = stacks
        .iter()
        .map(|(stack, count)| {
            let frames: Vec<String> = stack.split(';').map(sanitize_frame).collect();
            (frames.join(";"), count)
        })
        .collect();

    sanitized
        .iter()
        .map(|(stack, count)| format!("{} {}", stack, count))
        .collect()
}

/// Write a stack map as folded lines
///
/// **Public** - main entry point for folded output
///
/// The file is written to a temporary sibling and moved into place, so a
/// failed write never leaves a truncated file behind.
///
/// # Returns
/// Sum of the counts written
pub fn write_folded(stacks: &StackMap, output_path: impl AsRef<Path>) -> Result<u64, OutputError> {
    let output_path = output_path.as_ref();
    info!("Writing folded stacks to: {}", output_path.display());

    prepare_output_path(output_path)?;

    let dir = match output_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let temp = NamedTempFile::new_in(dir)?;
    let mut writer = BufWriter::new(temp);

    for line in folded_lines(stacks) {
        writeln!(writer, "{}", line)?;
    }

    let temp = writer
        .into_inner()
        .map_err(|e| OutputError::WriteFailed(e.into_error()))?;
    temp.persist(output_path)
        .map_err(|e| OutputError::WriteFailed(e.error))?;

    let written = stacks.total();
    info!("Folded stacks written ({} stacks, {} events)", stacks.len(), written);
    Ok(written)
}

/// Outcome of a successful folded file validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldedValidation {
    /// Lines ending in a positive integer count
    pub valid_lines: usize,
    /// Lines looked at (at most the validation window)
    pub inspected_lines: usize,
}

impl FoldedValidation {
    pub fn summary(&self) -> String {
        format!(
            "Valid folded file: {} valid lines out of {} inspected",
            self.valid_lines, self.inspected_lines
        )
    }
}

/// Whether a line is `path COUNT` with a positive integer count
fn is_valid_folded_line(line: &str) -> bool {
    match line.rsplit_once(' ') {
        Some((_, count)) => count.parse::<i64>().map(|c| c > 0).unwrap_or(false),
        None => false,
    }
}

/// Check a folded file before handing it to a renderer
///
/// **Public** - run after every folded write
///
/// Inspects at most the first 1000 lines. The file is rejected when it is
/// missing or empty, has no valid lines, or fewer than half of the
/// inspected lines are valid.
///
/// # Errors
/// * `OutputError::InvalidFolded` - with a diagnostic naming the failed check
pub fn validate_folded(path: impl AsRef<Path>) -> Result<FoldedValidation, OutputError> {
    let path = path.as_ref();
    let invalid = |reason: String| OutputError::InvalidFolded {
        path: path.to_path_buf(),
        reason,
    };

    if !path.is_file() {
        return Err(invalid("File does not exist".to_string()));
    }
    let size = std::fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| invalid(format!("Error reading file: {}", e)))?;
    if size == 0 {
        return Err(invalid("File is empty".to_string()));
    }

    let file = File::open(path).map_err(|e| invalid(format!("Error reading file: {}", e)))?;
    let mut inspected = 0;
    let mut valid = 0;

    for line in BufReader::new(file).lines().take(VALIDATION_SAMPLE_LINES) {
        let line = line.map_err(|e| invalid(format!("Error reading file: {}", e)))?;
        inspected += 1;
        let line = line.trim();
        if !line.is_empty() && is_valid_folded_line(line) {
            valid += 1;
        }
    }

    if valid == 0 {
        return Err(invalid(format!(
            "No valid stack traces found (checked {} lines)",
            inspected
        )));
    }
    if (valid as f64) / (inspected as f64) < MIN_VALID_LINE_RATIO {
        return Err(invalid(format!(
            "Too many invalid lines: {}/{} valid",
            valid, inspected
        )));
    }

    let result = FoldedValidation {
        valid_lines: valid,
        inspected_lines: inspected,
    };
    debug!("{}", result.summary());
    Ok(result)
}
