//! Full-tree reader.
//!
//! Under each top-level row simpleperf prints one or more call trees:
//!
//! ```text
//! 50.00%  0.00%  proc  1  2  root
//!        -- root
//!           |--60.00%-- f
//!           |          |--30.00%-- h
//!           |--40.00%-- g
//! ```
//!
//! The indentation is recovered with an explicit stack of open frames.
//! A branch row at depth `d` closes every open frame deeper than `d`,
//! emitting those that never received a child, then opens its own frame.
//! Only leaves are emitted; interior frames appear as path prefixes.
//! Each leaf count is `event_total × Children% × Π(frame%)`, where frames
//! without a percentage contribute 100%.

use super::row::{classify_tree_line, is_root_boundary, is_skip_marker, is_table_row, TreeLine, ROOT_TOKEN};
use super::schema::{ParseOptions, TableRow, WeightedStack};
use crate::aggregator::equalize::equalize_root_sum;
use crate::utils::config::{MAX_TREE_DEPTH, UNKNOWN_COMMAND};
use log::{debug, warn};
use std::collections::HashSet;

/// Weight parameters of one top-level row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryWeight {
    /// `events_per_sample × total_samples`
    pub event_total: f64,
    /// The row's Children% value
    pub children_pct: f64,
}

impl EntryWeight {
    /// The row's declared share of all events
    pub fn declared(&self) -> f64 {
        self.event_total * (self.children_pct / 100.0)
    }
}

/// Read every tree under one top-level row
///
/// **Public** - called once per table row in full-tree reports
///
/// # Arguments
/// * `body` - Lines after the row, up to (not including) the next table row
/// * `row` - The table row owning these trees
/// * `weight` - Event total and the row's Children%
/// * `options` - Equalization settings
///
/// # Returns
/// One weighted stack per leaf, in emission order
pub fn parse_entry(
    body: &[&str],
    row: &TableRow,
    weight: EntryWeight,
    options: &ParseOptions,
) -> Vec<WeightedStack> {
    let mut stacks = Vec::new();
    let mut i = 0;

    while i < body.len() {
        let line = body[i];
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed == "|" || is_skip_marker(line) {
            i += 1;
            continue;
        }
        if is_table_row(line) {
            break;
        }

        let Some(root) = trimmed.strip_prefix(ROOT_TOKEN) else {
            i += 1;
            continue;
        };
        let root = root.trim();
        let end = next_tree_boundary(body, i + 1);

        if root.chars().count() > 1 {
            let mut tree = TreeWalker::new(&row.command, root, weight).walk(&body[i + 1..end]);

            if options.equalize_root_sum && root.contains(&options.entry_symbol) {
                equalize_root_sum(&mut tree, weight.declared());
            }
            stacks.extend(tree);
        } else {
            debug!("Ignoring tree with degenerate root '{}'", root);
        }

        i = end;
    }

    stacks
}

/// Index of the next table row or column-0 root at or after `from`
fn next_tree_boundary(lines: &[&str], from: usize) -> usize {
    lines
        .iter()
        .skip(from)
        .position(|l| is_table_row(l) || is_root_boundary(l))
        .map_or(lines.len(), |offset| from + offset)
}

/// A frame on the open-path stack
#[derive(Debug, Clone)]
struct OpenFrame {
    name: String,
    /// Share of the parent, `None` for 100%
    pct: Option<f64>,
    /// Set once any deeper frame has been opened under this one
    has_child: bool,
}

/// Explicit-stack automaton over the rows of one tree
struct TreeWalker {
    base_path: Vec<String>,
    weight: EntryWeight,
    frames: Vec<OpenFrame>,
    /// Open-frame depth at the first branch row; pipe depths are relative to it
    pipe_base: Option<usize>,
    emitted: HashSet<String>,
    opened_any: bool,
    out: Vec<WeightedStack>,
}

impl TreeWalker {
    fn new(command: &str, root: &str, weight: EntryWeight) -> Self {
        let mut base_path = Vec::with_capacity(2);
        if !command.is_empty() && command != UNKNOWN_COMMAND {
            base_path.push(command.to_string());
        }
        base_path.push(root.to_string());

        Self {
            base_path,
            weight,
            frames: Vec::new(),
            pipe_base: None,
            emitted: HashSet::new(),
            opened_any: false,
            out: Vec::new(),
        }
    }

    fn walk(mut self, lines: &[&str]) -> Vec<WeightedStack> {
        for line in lines {
            let keep_going = match classify_tree_line(line) {
                TreeLine::Blank | TreeLine::Separator | TreeLine::Other => true,
                TreeLine::Boundary => false,
                TreeLine::Implicit(name) | TreeLine::Dash(name) => self.open(name, None),
                TreeLine::Branch { rel_depth, pct, name } => {
                    let base = *self.pipe_base.get_or_insert(self.frames.len());
                    self.close_to(base + rel_depth);
                    self.open(name, Some(pct))
                }
            };
            if !keep_going {
                break;
            }
        }

        // Whatever is still open ended with the tree
        self.close_to(0);

        if !self.opened_any {
            let path = self.base_path.clone();
            self.out
                .push(WeightedStack::new(path, self.weight.declared()));
        }

        self.out
    }

    /// Open a frame under the current top
    ///
    /// A name already open on the path is folded into that ancestor, which
    /// keeps its leaf status.
    ///
    /// Returns false once the depth bound is hit and the tree must stop.
    fn open(&mut self, name: &str, pct: Option<f64>) -> bool {
        if self.frames.iter().any(|f| f.name == name) {
            debug!("Recursive frame '{}' folded into its ancestor", name);
            return true;
        }

        if let Some(parent) = self.frames.last_mut() {
            parent.has_child = true;
        }
        self.frames.push(OpenFrame {
            name: name.to_string(),
            pct,
            has_child: false,
        });
        self.opened_any = true;

        if self.frames.len() > MAX_TREE_DEPTH {
            warn!(
                "Call path under '{}' exceeds {} frames, truncating",
                self.base_path.join(";"),
                MAX_TREE_DEPTH
            );
            self.emit_prefix(self.frames.len());
            return false;
        }
        true
    }

    /// Pop frames deeper than `depth`, emitting the childless ones
    fn close_to(&mut self, depth: usize) {
        while self.frames.len() > depth {
            let is_leaf = self.frames.last().is_some_and(|f| !f.has_child);
            if is_leaf {
                self.emit_prefix(self.frames.len());
            }
            self.frames.pop();
        }
    }

    fn emit_prefix(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let prefix = &self.frames[..len];

        let fraction = prefix
            .iter()
            .filter_map(|f| f.pct)
            .fold(self.weight.children_pct / 100.0, |acc, pct| acc * (pct / 100.0));

        let mut path = self.base_path.clone();
        path.extend(prefix.iter().map(|f| f.name.clone()));

        if !self.emitted.insert(path.join(";")) {
            return;
        }
        self.out
            .push(WeightedStack::new(path, self.weight.event_total * fraction));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(command: &str, children_pct: f64, symbol: &str) -> TableRow {
        TableRow {
            children_pct,
            command: command.to_string(),
            pid: "1".to_string(),
            tid: "2".to_string(),
            symbol: symbol.to_string(),
        }
    }

    fn weight(children_pct: f64) -> EntryWeight {
        EntryWeight {
            event_total: 1000.0,
            children_pct,
        }
    }

    fn collect(stacks: &[WeightedStack]) -> Vec<(String, i64)> {
        stacks
            .iter()
            .map(|s| (s.frames.join(";"), s.count.round() as i64))
            .collect()
    }

    #[test]
    fn test_siblings_split_parent_share() {
        let body = vec!["       -- root", "          |--60.00%-- f", "          |--40.00%-- g"];
        let stacks = parse_entry(&body, &row("proc", 50.0, "root"), weight(50.0), &ParseOptions::default());

        assert_eq!(
            collect(&stacks),
            vec![("proc;root;f".to_string(), 300), ("proc;root;g".to_string(), 200)]
        );
    }

    #[test]
    fn test_percentages_multiply_down_the_path() {
        let body = vec![
            "-- root",
            "   |--40.00%-- a",
            "   |          |--50.00%-- b",
        ];
        let stacks = parse_entry(&body, &row("proc", 100.0, "root"), weight(100.0), &ParseOptions::default());

        assert_eq!(collect(&stacks), vec![("proc;root;a;b".to_string(), 200)]);
    }

    #[test]
    fn test_implicit_frame_has_full_weight() {
        let body = vec!["-- root", "   a", "   |--30.00%-- b"];
        let stacks = parse_entry(&body, &row("proc", 100.0, "root"), weight(100.0), &ParseOptions::default());

        assert_eq!(collect(&stacks), vec![("proc;root;a;b".to_string(), 300)]);
    }

    #[test]
    fn test_interior_frames_not_emitted() {
        let body = vec![
            "-- root",
            "   |--50.00%-- a",
            "   |          |--20.00%-- b",
            "   |--50.00%-- c",
        ];
        let stacks = parse_entry(&body, &row("proc", 100.0, "root"), weight(100.0), &ParseOptions::default());
        let keys: Vec<String> = stacks.iter().map(|s| s.frames.join(";")).collect();

        assert_eq!(keys, vec!["proc;root;a;b", "proc;root;c"]);
    }

    #[test]
    fn test_direct_recursion_collapsed() {
        let body = vec!["-- root", "   |--50.00%-- f", "   |          |--100.00%-- f"];
        let stacks = parse_entry(&body, &row("proc", 100.0, "root"), weight(100.0), &ParseOptions::default());

        assert_eq!(collect(&stacks), vec![("proc;root;f".to_string(), 500)]);
    }

    #[test]
    fn test_unknown_command_omitted() {
        let body = vec!["-- root", "   |--10.00%-- f"];
        let stacks = parse_entry(&body, &row("Unknown", 100.0, "root"), weight(100.0), &ParseOptions::default());

        assert_eq!(collect(&stacks), vec![("root;f".to_string(), 100)]);
    }

    #[test]
    fn test_bare_root_is_leaf() {
        let body = vec!["-- lonely"];
        let stacks = parse_entry(&body, &row("proc", 25.0, "lonely"), weight(25.0), &ParseOptions::default());

        assert_eq!(collect(&stacks), vec![("proc;lonely".to_string(), 250)]);
    }

    #[test]
    fn test_multiple_roots_under_one_row() {
        let body = vec![
            "-- first",
            "   |--10.00%-- a",
            "",
            "-- second",
            "   |--20.00%-- b",
        ];
        let stacks = parse_entry(&body, &row("proc", 100.0, "x"), weight(100.0), &ParseOptions::default());

        assert_eq!(
            collect(&stacks),
            vec![("proc;first;a".to_string(), 100), ("proc;second;b".to_string(), 200)]
        );
    }

    #[test]
    fn test_equalize_entry_symbol_root() {
        let body = vec![
            "-- __start_thread",
            "   |--30.00%-- a",
            "   |--20.00%-- b",
        ];
        let options = ParseOptions::default().with_equalize_root_sum(true);
        let stacks = parse_entry(&body, &row("T", 100.0, "__start_thread"), weight(100.0), &options);

        // 300 + 200 rescaled to the declared 1000
        assert_eq!(
            collect(&stacks),
            vec![("T;__start_thread;a".to_string(), 600), ("T;__start_thread;b".to_string(), 400)]
        );
    }

    #[test]
    fn test_depth_bound_stops_descent() {
        let mut lines = vec!["-- root".to_string()];
        for depth in 0..(MAX_TREE_DEPTH + 10) {
            let pipes = "|".repeat(depth + 1);
            lines.push(format!("{}--100.00%-- f{}", pipes, depth));
        }
        let body: Vec<&str> = lines.iter().map(String::as_str).collect();
        let stacks = parse_entry(&body, &row("proc", 100.0, "root"), weight(100.0), &ParseOptions::default());

        assert_eq!(stacks.len(), 1);
        assert_eq!(stacks[0].frames.len(), 2 + MAX_TREE_DEPTH + 1);
    }
}
