//! simpleperf-collapse CLI
//!
//! Collapses simpleperf callgraph reports into folded stacks and renders
//! flamegraphs from them.

use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use simpleperf_collapse::commands::{
    display_version, execute_collapse, validate_args, validate_folded_file, CollapseArgs,
    RendererKind, ReportSource,
};
use simpleperf_collapse::parser::ParseOptions;
use simpleperf_collapse::utils::exit_code_for;

/// simpleperf-collapse - folded stacks from simpleperf reports
#[derive(Parser, Debug)]
#[command(name = "simpleperf-collapse")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Collapse a report into folded stacks, a flamegraph and a call tree
    #[command(group(ArgGroup::new("input").required(true).args(["report", "data"])))]
    Collapse {
        /// `simpleperf report -g` text file
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// perf.data recording; `simpleperf report` is run on it
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Output path for folded stacks (default: <input base>.folded)
        #[arg(long)]
        folded: Option<PathBuf>,

        /// Output path for SVG flamegraph (default: <input base>.svg)
        #[arg(long)]
        svg: Option<PathBuf>,

        /// Output path for HTML call tree (default: <input base>.html)
        #[arg(long)]
        html: Option<PathBuf>,

        /// Output path for JSON summary
        #[arg(long)]
        json: Option<PathBuf>,

        /// Do not render a flamegraph
        #[arg(long)]
        no_svg: bool,

        /// Do not write the HTML call tree
        #[arg(long)]
        no_html: bool,

        /// Flamegraph renderer
        #[arg(long, value_enum, default_value_t = RendererKind::Inferno)]
        renderer: RendererKind,

        /// Path to flamegraph.pl (downloaded if omitted)
        #[arg(long, env = "FLAMEGRAPH_PL")]
        flamegraph: Option<PathBuf>,

        /// Perl interpreter for flamegraph.pl
        #[arg(long)]
        perl: Option<PathBuf>,

        /// simpleperf binary for --data
        #[arg(long, env = "SIMPLEPERF", default_value = "simpleperf")]
        simpleperf: PathBuf,

        /// Reverse frame order (innermost first)
        #[arg(long)]
        reverse: bool,

        /// Keep only the first __start_thread block per thread
        #[arg(long)]
        thread_head_filter: bool,

        /// Rescale __start_thread trees to their row's Children%
        #[arg(long)]
        equalize_root_sum: bool,

        /// Print declared vs folded events for a thread
        #[arg(long, value_name = "THREAD")]
        explain_thread: Option<String>,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,

        /// Number of hot paths to report
        #[arg(long, default_value = "20")]
        top: usize,
    },

    /// Validate a folded stacks file
    Validate {
        /// Path to folded file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display version information
    Version,
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Collapse {
            report,
            data,
            folded,
            svg,
            html,
            json,
            no_svg,
            no_html,
            renderer,
            flamegraph,
            perl,
            simpleperf,
            reverse,
            thread_head_filter,
            equalize_root_sum,
            explain_thread,
            summary,
            top,
        } => {
            let source = match (report, data) {
                (Some(path), _) => ReportSource::Report(path),
                (None, Some(path)) => ReportSource::Data(path),
                (None, None) => anyhow::bail!("One of --report or --data is required"),
            };

            let args = CollapseArgs {
                source,
                output_folded: folded,
                output_svg: svg,
                output_html: html,
                output_json: json,
                no_svg,
                no_html,
                renderer,
                flamegraph_script: flamegraph,
                perl,
                simpleperf,
                parse_options: ParseOptions::new()
                    .with_reverse(reverse)
                    .with_thread_head_filter(thread_head_filter)
                    .with_equalize_root_sum(equalize_root_sum),
                explain_thread,
                print_summary: summary,
                top_paths: top,
            };

            // Validate args first
            validate_args(&args)?;

            execute_collapse(args)?;
        }

        Commands::Validate { file } => {
            validate_folded_file(&file)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        for cause in e.chain().skip(1) {
            eprintln!("  Caused by: {}", cause);
        }
        std::process::exit(exit_code_for(&e));
    }
}
