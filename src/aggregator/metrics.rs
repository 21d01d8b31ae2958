//! Summary metrics over a collapsed stack map.
//!
//! Hot paths are the stacks carrying the most events. Thread explanations
//! compare what a thread's head row declares against what ended up folded.

use super::stack_builder::{CollapsedStack, StackMap};
use crate::output::json::HotPath;
use crate::parser::row::{parse_children_pct, parse_table_row};
use log::debug;

/// Top `top_n` stacks by count
///
/// **Public** - main entry point for hot path ranking
///
/// # Arguments
/// * `stacks` - Collapsed stacks sorted by weight
/// * `total` - Total events the percentages are relative to
/// * `top_n` - Number of paths to return
pub fn calculate_hot_paths(stacks: &[CollapsedStack], total: u64, top_n: usize) -> Vec<HotPath> {
    debug!("Calculating top {} hot paths from {} stacks", top_n, stacks.len());

    stacks
        .iter()
        .take(top_n)
        .map(|stack| create_hot_path(stack, total))
        .collect()
}

/// Create a HotPath from a CollapsedStack
pub fn create_hot_path(stack: &CollapsedStack, total: u64) -> HotPath {
    let percentage = if total > 0 {
        (stack.weight as f64 / total as f64) * 100.0
    } else {
        0.0
    };

    HotPath {
        stack: stack.stack.clone(),
        count: stack.weight,
        percentage,
    }
}

/// Event distribution statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StackDistribution {
    pub total_events: u64,
    pub stack_count: usize,
    pub mean_events_per_stack: u64,
    pub median_events_per_stack: u64,
    pub top_10_percent_events: u64,
    pub top_10_percent_percentage: f64,
}

impl StackDistribution {
    /// Top 10% of stacks hold more than 80% of events
    pub fn is_highly_concentrated(&self) -> bool {
        self.top_10_percent_percentage > 80.0
    }

    pub fn summary(&self) -> String {
        format!(
            "Total: {} events | Stacks: {} | Mean: {} | Median: {} | Top 10%: {:.1}%",
            self.total_events,
            self.stack_count,
            self.mean_events_per_stack,
            self.median_events_per_stack,
            self.top_10_percent_percentage
        )
    }
}

/// Calculate event distribution over stacks sorted by weight
pub fn calculate_distribution(stacks: &[CollapsedStack]) -> StackDistribution {
    if stacks.is_empty() {
        return StackDistribution::default();
    }

    let total: u64 = stacks.iter().map(|s| s.weight).sum();
    let count = stacks.len();

    let mut weights: Vec<u64> = stacks.iter().map(|s| s.weight).collect();
    weights.sort_unstable();
    let median = weights[weights.len() / 2];

    let top_count = (count as f64 * 0.1).ceil() as usize;
    let top_events: u64 = stacks.iter().take(top_count).map(|s| s.weight).sum();

    StackDistribution {
        total_events: total,
        stack_count: count,
        mean_events_per_stack: total / count as u64,
        median_events_per_stack: median,
        top_10_percent_events: top_events,
        top_10_percent_percentage: if total > 0 {
            (top_events as f64 / total as f64) * 100.0
        } else {
            0.0
        },
    }
}

/// Children% of a thread's head row
///
/// Prefers the first row for `thread` whose symbol contains `entry_symbol`,
/// falling back to the thread's first row. Indented rows count; rows whose
/// `Children%` does not parse are skipped.
pub fn find_thread_head_pct(report_text: &str, thread: &str, entry_symbol: &str) -> Option<f64> {
    let mut first = None;
    for line in report_text.lines().map(str::trim_start) {
        let Some(row) = parse_table_row(line) else {
            continue;
        };
        if row.command != thread {
            continue;
        }
        let Some(pct) = line.split_whitespace().next().and_then(parse_children_pct) else {
            debug!("Ignoring head row with unparseable Children%: {}", line);
            continue;
        };
        if row.symbol.contains(entry_symbol) {
            return Some(pct);
        }
        first.get_or_insert(pct);
    }
    first
}

/// Declared vs folded events for one thread
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadExplanation {
    pub thread: String,
    pub prefix: String,
    pub event_count: u64,
    pub head_pct: Option<f64>,
    pub expected_events: u64,
    pub actual_events: u64,
    pub folded_sum: u64,
}

impl ThreadExplanation {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("[Explain] Thread={}", self.thread),
            format!("  Event count (total): {}", self.event_count),
            match self.head_pct {
                Some(pct) => format!("  First-row Children%: {}%", pct),
                None => "  First-row Children%: N/A".to_string(),
            },
            format!("  Expected events (EventCount * Children%): {}", self.expected_events),
            format!(
                "  Actual folded events (keys starting with '{}'): {}",
                self.prefix, self.actual_events
            ),
        ];
        if self.event_count > 0 {
            lines.push(format!(
                "  Actual as % of EventCount: {:.2}%",
                self.actual_events as f64 / self.event_count as f64 * 100.0
            ));
        }
        if self.folded_sum > 0 {
            lines.push(format!(
                "  Actual as % of FoldedSum: {:.2}% (FoldedSum={})",
                self.actual_events as f64 / self.folded_sum as f64 * 100.0,
                self.folded_sum
            ));
        }
        lines
    }
}

/// Compare a thread's declared share with what was folded for it
pub fn explain_thread(
    report_text: &str,
    stacks: &StackMap,
    thread: &str,
    event_count: u64,
    entry_symbol: &str,
) -> ThreadExplanation {
    let head_pct = find_thread_head_pct(report_text, thread, entry_symbol);
    let expected_events = (head_pct.unwrap_or(0.0) / 100.0 * event_count as f64).round() as u64;
    let prefix = format!("{};{}", thread, entry_symbol);
    let actual_events = stacks
        .iter()
        .filter(|(k, _)| k.starts_with(&prefix))
        .map(|(_, c)| c)
        .sum();

    ThreadExplanation {
        thread: thread.to_string(),
        prefix,
        event_count,
        head_pct,
        expected_events,
        actual_events,
        folded_sum: stacks.total(),
    }
}
