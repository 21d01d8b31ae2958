use crate::output::validate_folded;
use crate::utils::config::{MIN_VALID_LINE_RATIO, SCHEMA_VERSION, VALIDATION_SAMPLE_LINES};
use anyhow::{Context, Result};
use std::path::Path;

/// Validate a folded stacks file
pub fn validate_folded_file(file_path: &Path) -> Result<()> {
    println!("Validating folded file: {}", file_path.display());

    let validation = validate_folded(file_path)
        .with_context(|| format!("{} is not a usable folded file", file_path.display()))?;

    println!("✓ {}", validation.summary());

    Ok(())
}

/// Display version information
pub fn display_version() {
    println!("simpleperf-collapse v{}", env!("CARGO_PKG_VERSION"));
    println!("Summary Schema: v{}", SCHEMA_VERSION);
    println!(
        "Folded validation: first {} lines, at least {:.0}% valid",
        VALIDATION_SAMPLE_LINES,
        MIN_VALID_LINE_RATIO * 100.0
    );
    println!();
    println!("Collapses `simpleperf report -g` output into folded stacks and flamegraphs.");
}
