//! Configuration and constants for the collapser.

use std::time::Duration;

/// Current JSON summary schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Header fields are only looked for within this many leading lines
pub const HEADER_SCAN_LINES: usize = 40;

/// Deepest call path tracked inside a single tree before it is force-emitted
pub const MAX_TREE_DEPTH: usize = 512;

/// Symbol that marks the start of a thread's execution
pub const THREAD_ENTRY_SYMBOL: &str = "__start_thread";

/// Placeholder command simpleperf prints when it cannot resolve the thread name
pub const UNKNOWN_COMMAND: &str = "Unknown";

/// Marker simpleperf prints when callgraph detail was elided for a block
pub const SKIPPED_MARKER: &str = "skipped in brief callgraph mode";

// Folded output validation
pub const VALIDATION_SAMPLE_LINES: usize = 1000;
pub const MIN_VALID_LINE_RATIO: f64 = 0.5;

/// Upper bound for an external flamegraph renderer run
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(300);

/// Timeout for fetching flamegraph.pl
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

pub const FLAMEGRAPH_SCRIPT_URL: &str =
    "https://raw.githubusercontent.com/brendangregg/FlameGraph/master/flamegraph.pl";
pub const FLAMEGRAPH_SCRIPT_NAME: &str = "flamegraph.pl";

// Default render geometry, matching what flamegraph.pl is invoked with
pub const DEFAULT_IMAGE_WIDTH: usize = 1800;
pub const DEFAULT_FRAME_HEIGHT: usize = 16;
pub const DEFAULT_FONT_SIZE: usize = 12;
pub const DEFAULT_COUNT_NAME: &str = "events";

/// Binary used to produce reports from raw capture files
pub const DEFAULT_SIMPLEPERF_BIN: &str = "simpleperf";
