//! Main reader for `simpleperf report -g` text.
//!
//! Reading is a single forward pass:
//! header -> table rows -> (full-tree body | brief body) -> done.
//! Header fields are only taken from before the table starts.

use super::brief::{flush_block, BriefCollector};
use super::format::detect_format;
use super::header::{is_header_line, parse_header};
use super::row::{is_column_header, is_skip_marker, is_table_row, parse_table_row};
use super::schema::{Header, ParseOptions, ReportFormat};
use super::tree::{parse_entry, EntryWeight};
use crate::aggregator::filter::ThreadHeadFilter;
use crate::aggregator::stack_builder::{StackAccumulator, StackMap};
use crate::utils::error::ParseError;
use indexmap::IndexMap;
use log::{debug, info};

/// Result of reading one report
#[derive(Debug, Clone)]
pub struct ParsedReport {
    pub header: Header,
    pub format: ReportFormat,

    /// Rounded, strictly positive counts in first-seen order
    pub stacks: StackMap,

    /// Accumulated counts before rounding
    pub raw_stacks: IndexMap<String, f64>,
}

/// Parse report text into a stack map
///
/// **Public** - main entry point for parsing
///
/// # Arguments
/// * `text` - Decoded report text
/// * `options` - Reversal, thread head filtering and equalization
///
/// # Returns
/// Header and collapsed stacks. The stack map may be empty; callers decide
/// whether that is fatal.
///
/// # Errors
/// * `ParseError::MissingHeaderField` - `Event count:` or `Samples:` missing
pub fn parse_report(text: &str, options: &ParseOptions) -> Result<ParsedReport, ParseError> {
    let lines: Vec<&str> = text.lines().collect();
    debug!("Parsing report of {} lines", lines.len());

    let header = parse_header(&lines)?;
    let format = detect_format(&lines);
    let event_total = header.event_total();

    let mut acc = StackAccumulator::new(options.reverse);
    let mut filter = ThreadHeadFilter::new(options.thread_head_filter, options.entry_symbol.as_str());

    match format {
        ReportFormat::FullTree => read_tree_body(&lines, event_total, options, &mut filter, &mut acc),
        ReportFormat::Brief => read_brief_body(&lines, event_total, &mut filter, &mut acc),
    }

    let raw_stacks = acc.raw().clone();
    let stacks = acc.finish();

    info!(
        "Collapsed {} stacks ({} events) from {:?} report",
        stacks.len(),
        stacks.total(),
        format
    );

    Ok(ParsedReport {
        header,
        format,
        stacks,
        raw_stacks,
    })
}

/// Lines that never carry row data
fn is_noise(line: &str) -> bool {
    line.is_empty() || is_header_line(line) || is_column_header(line)
}

fn next_table_row(lines: &[&str], from: usize) -> usize {
    lines
        .iter()
        .skip(from)
        .position(|l| is_table_row(l))
        .map_or(lines.len(), |offset| from + offset)
}

fn read_tree_body(
    lines: &[&str],
    event_total: f64,
    options: &ParseOptions,
    filter: &mut ThreadHeadFilter,
    acc: &mut StackAccumulator,
) {
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim_end();
        if is_noise(line) || is_skip_marker(line) {
            i += 1;
            continue;
        }
        let Some(row) = parse_table_row(line) else {
            i += 1;
            continue;
        };

        let next_row = next_table_row(lines, i + 1);
        let thread = row.thread_key();

        if filter.admits(&thread, &row.symbol) {
            let weight = EntryWeight {
                event_total,
                children_pct: row.children_pct,
            };
            let stacks = parse_entry(&lines[i + 1..next_row], &row, weight, options);
            debug!(
                "Row {} ({:.2}%) produced {} leaves",
                row.symbol,
                row.children_pct,
                stacks.len()
            );
            acc.extend(&stacks);
            filter.record(thread);
        }

        i = next_row;
    }
}

fn read_brief_body(
    lines: &[&str],
    event_total: f64,
    filter: &mut ThreadHeadFilter,
    acc: &mut StackAccumulator,
) {
    let mut collector = BriefCollector::new();

    for line in lines {
        let line = line.trim_end();
        if is_noise(line) {
            continue;
        }
        if is_skip_marker(line) {
            collector.mark_skipped();
            continue;
        }
        if let Some(row) = parse_table_row(line) {
            if let Some(done) = collector.observe(&row) {
                flush_block(done, filter, acc, event_total);
            }
        }
    }

    if let Some(done) = collector.finish() {
        flush_block(done, filter, acc, event_total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TREE_REPORT: &str = "\
Cmdline: /system/bin/simpleperf record -g
Arch: arm64
Event: cpu-cycles (type 0, config 0)
Samples: 10
Event count: 1000

Children  Self  Command  Pid  Tid  Symbol
50.00%  0.00%  proc  1  2  root
       |
       -- root
          |--60.00%-- f
          |--40.00%-- g
";

    #[test]
    fn test_tree_end_to_end() {
        let report = parse_report(TREE_REPORT, &ParseOptions::default()).unwrap();

        assert_eq!(report.format, ReportFormat::FullTree);
        assert_eq!(report.stacks.len(), 2);
        assert_eq!(report.stacks.get("proc;root;f"), Some(300));
        assert_eq!(report.stacks.get("proc;root;g"), Some(200));
    }

    #[test]
    fn test_reverse_option() {
        let options = ParseOptions::default().with_reverse(true);
        let report = parse_report(TREE_REPORT, &options).unwrap();

        assert_eq!(report.stacks.get("f;root;proc"), Some(300));
        assert_eq!(report.stacks.reversed().get("proc;root;f"), Some(300));
    }

    #[test]
    fn test_missing_samples_is_fatal() {
        let err = parse_report("Event count: 1000\n", &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::MissingHeaderField("Samples")));
    }

    #[test]
    fn test_brief_blocks() {
        let text = "\
Samples: 100
Event count: 10000
Children  Self  Command  Pid  Tid  Symbol
30.00%  0.00%  RenderThread  1  3  __start_thread
29.00%  0.00%  RenderThread  1  3  DrawFrame
20.00%  1.00%  GameThread  1  2  __start_thread
19.00%  1.00%  GameThread  1  2  Tick
";
        let report = parse_report(text, &ParseOptions::default()).unwrap();

        assert_eq!(report.format, ReportFormat::Brief);
        let entries: Vec<(&str, u64)> = report.stacks.iter().collect();
        assert_eq!(
            entries,
            vec![
                ("RenderThread;__start_thread;DrawFrame", 3000),
                ("GameThread;__start_thread;Tick", 2000),
            ]
        );
    }
}
