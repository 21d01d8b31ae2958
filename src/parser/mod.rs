//! Report parsing and data model.
//!
//! This module handles:
//! - Extracting the report header
//! - Detecting full-tree vs brief reports
//! - Rebuilding call paths from indented call trees
//! - Chaining flat rows in brief reports

pub mod brief;
pub mod format;
pub mod header;
pub mod report;
pub mod row;
pub mod schema;
pub mod tree;

// Re-export main types
pub use format::detect_format;
pub use header::parse_header;
pub use report::{parse_report, ParsedReport};
pub use schema::{Header, ParseOptions, ReportFormat, TableRow, ThreadKey, WeightedStack};
