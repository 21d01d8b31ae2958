//! Data model shared by the report readers.
//!
//! A report is read into a [`Header`] plus a list of [`WeightedStack`]s,
//! which the stack accumulator folds into a stack map.

use crate::utils::config::THREAD_ENTRY_SYMBOL;
use serde::{Deserialize, Serialize};

/// Report header fields printed by `simpleperf report`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Command line that was profiled
    pub cmdline: Option<String>,

    /// Target architecture
    pub arch: Option<String>,

    /// Event type label, e.g. `cpu-cycles (type 0, config 0)`
    pub event: Option<String>,

    /// Error callchain summary line
    pub error_callchains: Option<String>,

    /// Declared sample count
    pub total_samples: u64,

    /// Declared event count
    pub event_count: u64,
}

impl Header {
    /// Scalar converting a sample share into an absolute event count
    pub fn events_per_sample(&self) -> f64 {
        if self.total_samples > 0 {
            self.event_count as f64 / self.total_samples as f64
        } else {
            1.0
        }
    }

    /// Total event weight that Children% values are fractions of
    pub fn event_total(&self) -> f64 {
        self.events_per_sample() * self.total_samples as f64
    }

    /// Event label without its `(type ..., config ...)` suffix
    pub fn event_name(&self) -> Option<&str> {
        let event = self.event.as_deref()?;
        let name = event.split('(').next().unwrap_or(event).trim();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }

    /// Title used for rendered flamegraphs and pages
    pub fn graph_title(&self) -> String {
        format!("{} Flamegraph", self.event_name().unwrap_or("Performance"))
    }
}

/// Which body grammar a report uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Rows followed by indented call trees (`-- root`, `|--xx.xx%-- f`)
    FullTree,
    /// Flat rows only; callgraph detail was elided
    Brief,
}

impl ReportFormat {
    pub fn label(&self) -> &'static str {
        match self {
            ReportFormat::FullTree => "full-tree",
            ReportFormat::Brief => "brief",
        }
    }
}

/// Identity of an execution thread: (command, pid, tid)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThreadKey {
    pub command: String,
    pub pid: String,
    pub tid: String,
}

/// A top-level table row
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    /// Percentage of all events at or below this row
    pub children_pct: f64,
    pub command: String,
    pub pid: String,
    pub tid: String,
    /// Last column of the row
    pub symbol: String,
}

impl TableRow {
    pub fn thread_key(&self) -> ThreadKey {
        ThreadKey {
            command: self.command.clone(),
            pid: self.pid.clone(),
            tid: self.tid.clone(),
        }
    }
}

/// A call path with an absolute, not yet rounded, count
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedStack {
    /// Frames from outermost to innermost
    pub frames: Vec<String>,
    pub count: f64,
}

impl WeightedStack {
    pub fn new(frames: Vec<String>, count: f64) -> Self {
        Self { frames, count }
    }
}

/// Options controlling how a report is collapsed
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Reverse frame order before merging
    pub reverse: bool,

    /// Keep only the first entry-symbol block per thread
    pub thread_head_filter: bool,

    /// Rescale entry-symbol trees so their leaves sum to the row's share
    pub equalize_root_sum: bool,

    /// Symbol marking a thread's start
    pub entry_symbol: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            reverse: false,
            thread_head_filter: false,
            equalize_root_sum: false,
            entry_symbol: THREAD_ENTRY_SYMBOL.to_string(),
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn with_thread_head_filter(mut self, enabled: bool) -> Self {
        self.thread_head_filter = enabled;
        self
    }

    pub fn with_equalize_root_sum(mut self, enabled: bool) -> Self {
        self.equalize_root_sum = enabled;
        self
    }

    pub fn with_entry_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.entry_symbol = symbol.into();
        self
    }
}
