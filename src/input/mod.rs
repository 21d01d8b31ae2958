//! Obtaining report text.
//!
//! Reports are either read from a text file or produced by running
//! `simpleperf report` on a recording. Either way the bytes go through
//! encoding detection before parsing.

pub mod decode;
pub mod simpleperf;

pub use decode::{decode_report, read_report_file, DecodeQuality};
pub use simpleperf::{ReportPaths, ReportProducer, SimpleperfRunner};
