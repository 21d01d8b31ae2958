//! Report format detection.

use super::row::{has_tree_marker, is_skip_marker};
use super::schema::ReportFormat;
use log::debug;

/// Classify a report body as full-tree or brief
///
/// **Public** - picks which body reader runs
///
/// Any tree marker anywhere makes the report `FullTree`. Otherwise it is
/// `Brief`, whether or not skipped-detail markers are present.
pub fn detect_format(lines: &[&str]) -> ReportFormat {
    if lines.iter().any(|l| has_tree_marker(l)) {
        debug!("Tree markers found, reading report as full callgraph");
        return ReportFormat::FullTree;
    }

    if lines.iter().any(|l| is_skip_marker(l)) {
        debug!("Report announces brief callgraph mode");
    } else {
        debug!("No tree markers, reading report as flat rows");
    }
    ReportFormat::Brief
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_tree() {
        let lines = vec!["50.00%  0.00%  proc  1  2  root", "       -- root", "          |--60.00%-- f"];
        assert_eq!(detect_format(&lines), ReportFormat::FullTree);
    }

    #[test]
    fn test_detect_brief_with_marker() {
        let lines = vec![
            "50.00%  0.00%  proc  1  2  root",
            "  skipped in brief callgraph mode",
        ];
        assert_eq!(detect_format(&lines), ReportFormat::Brief);
    }

    #[test]
    fn test_detect_defaults_to_brief() {
        let lines = vec!["50.00%  0.00%  proc  1  2  root"];
        assert_eq!(detect_format(&lines), ReportFormat::Brief);
    }

    #[test]
    fn test_tree_marker_wins_over_skip_marker() {
        let lines = vec!["  skipped in brief callgraph mode", "|--1.00%-- f"];
        assert_eq!(detect_format(&lines), ReportFormat::FullTree);
    }
}
