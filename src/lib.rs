//! simpleperf-collapse
//!
//! Turns `simpleperf report -g` text into folded stacks, the line format
//! flamegraph renderers consume, and renders flamegraphs and call trees
//! from them.
//!
//! This crate provides the core implementation for the
//! `simpleperf-collapse` CLI tool.
//!
//! ## Getting Started
//!
//! ```bash
//! simpleperf report -i perf.data -g -o report.txt
//! simpleperf-collapse collapse --report report.txt
//! ```
//!
//! As a library, [`parser::parse_report`] is the entry point; it returns
//! the report header and a [`aggregator::StackMap`].

pub mod aggregator;
pub mod commands;
pub mod flamegraph;
pub mod input;
pub mod output;
pub mod parser;
pub mod utils;
