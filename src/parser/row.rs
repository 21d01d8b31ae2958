//! Line grammar of a simpleperf report body.
//!
//! Two kinds of lines matter: top-level table rows, which start with a
//! `Children%` value, and the tree rows nested below them.

use super::schema::TableRow;
use crate::utils::config::SKIPPED_MARKER;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

static TABLE_ROW_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\d+%").unwrap());
static COLUMN_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());
static BRANCH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\|--(\d+\.\d+)%--\s*(.+)").unwrap());
static PERCENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\.\d+%").unwrap());

/// Minimum column count of a usable table row
const MIN_ROW_COLUMNS: usize = 6;

/// Token introducing a tree root
pub const ROOT_TOKEN: &str = "-- ";

/// Whether a line is a top-level table row
pub fn is_table_row(line: &str) -> bool {
    TABLE_ROW_RE.is_match(line)
}

/// Whether a line is the `Children  Self  Command ...` column header
pub fn is_column_header(line: &str) -> bool {
    line.contains("Children") && line.contains("Self") && line.contains("Command")
}

/// Whether a line announces that callgraph detail was omitted
pub fn is_skip_marker(line: &str) -> bool {
    line.contains(SKIPPED_MARKER)
}

/// Whether a line starts a new tree at column 0
pub fn is_root_boundary(line: &str) -> bool {
    line.starts_with(ROOT_TOKEN)
}

/// Whether a line carries a tree-branch marker
pub fn has_tree_marker(line: &str) -> bool {
    line.trim().starts_with(ROOT_TOKEN) || line.contains("|--")
}

/// Parse a top-level table row
///
/// Returns `None` for lines that are not table rows or that have too few
/// columns. A `Children%` that fails to parse is taken as 100%.
pub fn parse_table_row(line: &str) -> Option<TableRow> {
    let line = line.trim_end();
    if !is_table_row(line) {
        return None;
    }

    let parts: Vec<&str> = COLUMN_SPLIT_RE.split(line).collect();
    if parts.len() < MIN_ROW_COLUMNS {
        debug!("Skipping table row with {} columns: {}", parts.len(), line);
        return None;
    }

    let children_pct = parse_children_pct(parts[0]).unwrap_or_else(|| {
        debug!("Unparseable Children% '{}', assuming 100%", parts[0]);
        100.0
    });

    Some(TableRow {
        children_pct,
        command: parts[2].trim().to_string(),
        pid: parts[3].trim().to_string(),
        tid: parts[4].trim().to_string(),
        symbol: parts[parts.len() - 1].trim().to_string(),
    })
}

/// Strict parse of a `Children%` column such as `12.50%`
pub fn parse_children_pct(column: &str) -> Option<f64> {
    column.trim().strip_suffix('%')?.parse::<f64>().ok()
}

/// One line inside a call tree
#[derive(Debug, Clone, PartialEq)]
pub enum TreeLine<'a> {
    Blank,
    /// A lone `|` or a skipped-detail marker
    Separator,
    /// End of the current tree: a table row or a new root at column 0
    Boundary,
    /// `|--xx.xx%-- name` with its pipe depth relative to the first branch
    Branch { rel_depth: usize, pct: f64, name: &'a str },
    /// Indented `-- name` without a percentage
    Dash(&'a str),
    /// Plain symbol text, a 100% child of the previous frame
    Implicit(&'a str),
    Other,
}

/// Classify a line found below a tree root
pub fn classify_tree_line(line: &str) -> TreeLine<'_> {
    let stripped = line.trim();
    if stripped.is_empty() {
        return TreeLine::Blank;
    }
    if is_table_row(line) || is_root_boundary(line) {
        return TreeLine::Boundary;
    }
    if stripped == "|" || is_skip_marker(line) {
        return TreeLine::Separator;
    }
    if !stripped.starts_with('|') && !stripped.starts_with("--") && !PERCENT_RE.is_match(stripped) {
        return TreeLine::Implicit(stripped);
    }
    if let Some(name) = line.trim_start().strip_prefix(ROOT_TOKEN) {
        return TreeLine::Dash(name.trim());
    }
    if let Some(caps) = BRANCH_RE.captures(line) {
        let pct = caps[1].parse::<f64>().unwrap_or(0.0);
        let name = caps.get(2).map_or("", |m| m.as_str().trim());
        return TreeLine::Branch {
            rel_depth: leading_pipes(line).saturating_sub(1),
            pct,
            name,
        };
    }
    TreeLine::Other
}

/// Count pipes in the indentation prefix of a line
fn leading_pipes(line: &str) -> usize {
    line.chars()
        .take_while(|c| matches!(c, '|' | ' ' | '\t'))
        .filter(|c| *c == '|')
        .count()
}
