use crate::parser::ParseOptions;
use crate::utils::config::DEFAULT_SIMPLEPERF_BIN;
use std::path::{Path, PathBuf};

/// Where report text comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportSource {
    /// Existing `simpleperf report -g` text
    Report(PathBuf),
    /// A recording that `simpleperf report` is run on
    Data(PathBuf),
}

impl ReportSource {
    pub fn path(&self) -> &Path {
        match self {
            ReportSource::Report(p) | ReportSource::Data(p) => p,
        }
    }
}

/// Which flamegraph renderer to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum RendererKind {
    /// Built-in renderer
    #[default]
    Inferno,
    /// Brendan Gregg's flamegraph.pl
    Script,
}

/// Arguments for the collapse command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct CollapseArgs {
    pub source: ReportSource,

    /// Folded output (default: `<input base>.folded`)
    pub output_folded: Option<PathBuf>,

    /// SVG output (default: `<input base>.svg`)
    pub output_svg: Option<PathBuf>,

    /// HTML call tree output (default: `<input base>.html`)
    pub output_html: Option<PathBuf>,

    /// JSON summary output (only written when set)
    pub output_json: Option<PathBuf>,

    pub no_svg: bool,
    pub no_html: bool,

    pub renderer: RendererKind,

    /// flamegraph.pl location; downloaded next to the folded file if unset
    pub flamegraph_script: Option<PathBuf>,

    /// Perl interpreter for flamegraph.pl
    pub perl: Option<PathBuf>,

    /// simpleperf binary used for `Data` sources
    pub simpleperf: PathBuf,

    pub parse_options: ParseOptions,

    /// Print declared vs folded events for this thread
    pub explain_thread: Option<String>,

    /// Print text summary to stdout
    pub print_summary: bool,

    /// Number of hot paths in the summary
    pub top_paths: usize,
}

impl CollapseArgs {
    pub fn from_report(path: impl Into<PathBuf>) -> Self {
        Self {
            source: ReportSource::Report(path.into()),
            ..Default::default()
        }
    }
}

impl Default for CollapseArgs {
    fn default() -> Self {
        Self {
            source: ReportSource::Report(PathBuf::from("report.txt")),
            output_folded: None,
            output_svg: None,
            output_html: None,
            output_json: None,
            no_svg: false,
            no_html: false,
            renderer: RendererKind::Inferno,
            flamegraph_script: None,
            perl: None,
            simpleperf: PathBuf::from(DEFAULT_SIMPLEPERF_BIN),
            parse_options: ParseOptions::default(),
            explain_thread: None,
            print_summary: false,
            top_paths: 20,
        }
    }
}

/// Output locations after defaults are applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub folded: PathBuf,
    pub svg: Option<PathBuf>,
    pub html: Option<PathBuf>,
    pub json: Option<PathBuf>,
}

impl OutputPaths {
    /// Fill unset outputs from the input's directory and base name
    pub fn resolve(args: &CollapseArgs) -> Self {
        let input = args.source.path();
        let dir = input.parent().map(Path::to_path_buf).unwrap_or_default();
        let base = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stacks".to_string());
        let sibling = |ext: &str| dir.join(format!("{}.{}", base, ext));

        Self {
            folded: args.output_folded.clone().unwrap_or_else(|| sibling("folded")),
            svg: if args.no_svg {
                None
            } else {
                Some(args.output_svg.clone().unwrap_or_else(|| sibling("svg")))
            },
            html: if args.no_html {
                None
            } else {
                Some(args.output_html.clone().unwrap_or_else(|| sibling("html")))
            },
            json: args.output_json.clone(),
        }
    }
}

/// Files written by one collapse run
#[derive(Debug, Clone, PartialEq)]
pub struct CollapseOutcome {
    pub folded: PathBuf,
    pub svg: Option<PathBuf>,
    /// `<svg base>_svg.html` wrapper page
    pub svg_page: Option<PathBuf>,
    pub html: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub stack_count: usize,
    pub total_events: u64,
}
