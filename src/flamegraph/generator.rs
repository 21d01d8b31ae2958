//! In-process flamegraph rendering and text summaries.
//!
//! Renderers take a validated folded file and produce SVG bytes. The
//! inferno renderer needs no external tools; see `script` for the
//! `flamegraph.pl` alternative.

use crate::aggregator::stack_builder::CollapsedStack;
use crate::utils::config::{
    DEFAULT_COUNT_NAME, DEFAULT_FONT_SIZE, DEFAULT_FRAME_HEIGHT, DEFAULT_IMAGE_WIDTH,
};
use crate::utils::error::FlamegraphError;
use log::{debug, info};
use std::io::BufRead;
use std::path::Path;

/// Flamegraph configuration
#[derive(Debug, Clone, PartialEq)]
pub struct FlamegraphConfig {
    pub title: String,
    pub width: usize,
    pub frame_height: usize,
    pub font_size: usize,
    /// Unit shown in frame tooltips
    pub count_name: String,
}

impl Default for FlamegraphConfig {
    fn default() -> Self {
        Self {
            title: "Performance Flamegraph".to_string(),
            width: DEFAULT_IMAGE_WIDTH,
            frame_height: DEFAULT_FRAME_HEIGHT,
            font_size: DEFAULT_FONT_SIZE,
            count_name: DEFAULT_COUNT_NAME.to_string(),
        }
    }
}

impl FlamegraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn with_count_name(mut self, count_name: impl Into<String>) -> Self {
        self.count_name = count_name.into();
        self
    }
}

/// Something that turns a folded file into an SVG flamegraph
pub trait FlamegraphRenderer {
    /// Render `folded` to SVG bytes
    fn render(&self, folded: &Path, config: &FlamegraphConfig) -> Result<Vec<u8>, FlamegraphError>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Renders with the `inferno` crate, in process
#[derive(Debug, Clone, Copy, Default)]
pub struct InfernoRenderer;

impl FlamegraphRenderer for InfernoRenderer {
    fn render(&self, folded: &Path, config: &FlamegraphConfig) -> Result<Vec<u8>, FlamegraphError> {
        let reader = std::io::BufReader::new(std::fs::File::open(folded)?);
        let lines: Vec<String> = reader.lines().collect::<std::io::Result<_>>()?;
        if lines.iter().all(|l| l.trim().is_empty()) {
            return Err(FlamegraphError::EmptyStacks);
        }

        info!("Rendering flamegraph with inferno ({} stacks)", lines.len());

        let mut opts = inferno::flamegraph::Options::default();
        opts.title = config.title.clone();
        opts.count_name = config.count_name.clone();
        opts.image_width = Some(config.width);
        opts.frame_height = config.frame_height;
        opts.font_size = config.font_size;

        let mut svg_output = Vec::new();
        inferno::flamegraph::from_lines(&mut opts, lines.iter().map(|s| s.as_str()), &mut svg_output)
            .map_err(|e| FlamegraphError::GenerationFailed(e.to_string()))?;

        if svg_output.is_empty() {
            return Err(FlamegraphError::GenerationFailed(
                "renderer produced no output".to_string(),
            ));
        }

        debug!("Flamegraph rendered ({} bytes)", svg_output.len());
        Ok(svg_output)
    }

    fn name(&self) -> &'static str {
        "inferno"
    }
}

/// Text table of the hottest stacks, for terminal output
///
/// Long stacks are shortened from the left so the innermost frames stay
/// visible.
pub fn generate_text_summary(stacks: &[CollapsedStack], max_lines: usize, total_events: u64) -> String {
    const STACK_WIDTH: usize = 60;

    let mut lines = Vec::new();
    let total = total_events.max(1);
    let rule = format!("  +-{}-+-{}-+-{}-+", "-".repeat(STACK_WIDTH), "-".repeat(14), "-".repeat(7));

    lines.push("  HOT STACKS".to_string());
    lines.push(rule.clone());
    lines.push(format!(
        "  | {:<width$} | {:>14} | {:>7} |",
        "Stack (hottest first)",
        "EVENTS",
        "%",
        width = STACK_WIDTH
    ));
    lines.push(rule.clone());

    for stack in stacks.iter().take(max_lines) {
        let percentage = (stack.weight as f64 / total as f64) * 100.0;
        let chars: Vec<char> = stack.stack.chars().collect();
        let display_stack = if chars.len() > STACK_WIDTH {
            let tail: String = chars[chars.len() - (STACK_WIDTH - 3)..].iter().collect();
            format!("...{}", tail)
        } else {
            stack.stack.clone()
        };

        lines.push(format!(
            "  | {:<width$} | {:>14} | {:>6.2}% |",
            display_stack,
            stack.weight,
            percentage,
            width = STACK_WIDTH
        ));
    }
    lines.push(rule);

    if stacks.len() > max_lines {
        lines.push(format!("   (Showing top {} of {} unique stacks)", max_lines, stacks.len()));
    }

    lines.join("\n")
}
