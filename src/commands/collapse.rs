//! Collapse command implementation.
//!
//! The collapse command:
//! 1. Loads report text (file or `simpleperf report`)
//! 2. Parses it into a stack map
//! 3. Writes and validates the folded file
//! 4. Calculates metrics
//! 5. Writes the HTML call tree
//! 6. Renders the flamegraph
//! 7. Writes the JSON summary

use super::models::{CollapseArgs, CollapseOutcome, OutputPaths, RendererKind, ReportSource};
use crate::aggregator::{calculate_distribution, calculate_hot_paths, explain_thread};
use crate::flamegraph::{
    download_flamegraph, generate_text_summary, FlamegraphConfig, FlamegraphRenderer,
    InfernoRenderer, ScriptRenderer,
};
use crate::input::{read_report_file, ReportProducer, SimpleperfRunner};
use crate::output::{
    stacks_to_tree, validate_folded, write_folded, write_summary, write_svg, write_svg_page,
    write_tree_html, CollapseSummary,
};
use crate::parser::{parse_report, Header};
use crate::utils::error::ParseError;
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Execute the collapse command
///
/// **Public** - main entry point called from main.rs
///
/// # Returns
/// The files written and the folded totals
///
/// # Errors
/// * Input that cannot be read or produced
/// * Missing header fields, or a report with no stacks
/// * A folded file that fails validation
/// * Renderer and file write failures
pub fn execute_collapse(args: CollapseArgs) -> Result<CollapseOutcome> {
    let start_time = Instant::now();
    let outputs = OutputPaths::resolve(&args);

    // Step 1: Load report text
    info!("Step 1/7: Loading report from {}...", args.source.path().display());
    let text = load_report(&args)?;

    // Step 2: Parse
    info!("Step 2/7: Parsing report...");
    let report = parse_report(&text, &args.parse_options).context("Failed to parse report")?;
    if report.stacks.is_empty() {
        return Err(ParseError::NoStacks).context(format!(
            "No stacks collapsed from {}",
            args.source.path().display()
        ));
    }
    debug!(
        "Parsed {} report: {} samples, {} events",
        report.format.label(),
        report.header.total_samples,
        report.header.event_count
    );

    if let Some(thread) = &args.explain_thread {
        let explanation = explain_thread(
            &text,
            &report.stacks,
            thread,
            report.header.event_count,
            &args.parse_options.entry_symbol,
        );
        for line in explanation.lines() {
            println!("{}", line);
        }
    }

    // Step 3: Folded output
    info!("Step 3/7: Writing folded stacks...");
    let written = write_folded(&report.stacks, &outputs.folded).context("Failed to write folded stacks")?;
    let validation = validate_folded(&outputs.folded).context("Folded output failed validation")?;
    info!("✓ {}", validation.summary());

    // Step 4: Metrics
    info!("Step 4/7: Calculating top {} hot paths...", args.top_paths);
    let collapsed = report.stacks.to_collapsed_stacks();
    let distribution = calculate_distribution(&collapsed);
    info!("Event distribution: {}", distribution.summary());
    let hot_paths = calculate_hot_paths(&collapsed, written, args.top_paths);

    // Step 5: HTML tree
    if let Some(html_path) = &outputs.html {
        info!("Step 5/7: Writing HTML call tree...");
        let title = outputs
            .folded
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Stack Tree".to_string());
        write_tree_html(&stacks_to_tree(&report.stacks), html_path, &title, &report.header)
            .context("Failed to write HTML call tree")?;
        info!("✓ Call tree written to: {}", html_path.display());
    } else {
        info!("Step 5/7: Skipping HTML call tree (disabled)");
    }

    // Step 6: Flamegraph
    let svg_page = match &outputs.svg {
        Some(svg_path) => {
            info!("Step 6/7: Rendering flamegraph...");
            Some(render_flamegraph(&args, &outputs.folded, svg_path, &report.header)?)
        }
        None => {
            info!("Step 6/7: Skipping flamegraph (disabled)");
            None
        }
    };

    // Step 7: JSON summary
    if let Some(json_path) = &outputs.json {
        info!("Step 7/7: Writing JSON summary...");
        let summary = CollapseSummary::new(
            args.source.path().display().to_string(),
            report.format.label(),
            report.header.clone(),
            written,
            report.stacks.len(),
            hot_paths,
        );
        write_summary(&summary, json_path).context("Failed to write JSON summary")?;
        info!("✓ Summary written to: {}", json_path.display());
    } else {
        info!("Step 7/7: Skipping JSON summary (not requested)");
    }

    if args.print_summary {
        println!("\n{}", "=".repeat(80));
        println!("COLLAPSE SUMMARY");
        println!("{}", "=".repeat(80));
        println!("Source:        {}", args.source.path().display());
        println!("Event:         {}", report.header.event_name().unwrap_or("N/A"));
        println!("Samples:       {}", report.header.total_samples);
        println!("Event count:   {}", report.header.event_count);
        println!("Folded events: {}", written);
        println!("Unique stacks: {}", report.stacks.len());
        println!("\n{}", generate_text_summary(&collapsed, args.top_paths, written));
        println!("{}", "=".repeat(80));
    }

    info!("✓ Folded stacks written to: {}", outputs.folded.display());
    info!("Collapse completed in {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(CollapseOutcome {
        folded: outputs.folded,
        svg: outputs.svg,
        svg_page,
        html: outputs.html,
        json: outputs.json,
        stack_count: report.stacks.len(),
        total_events: written,
    })
}

/// Read or produce the report text
///
/// **Private** - internal helper for execute_collapse
fn load_report(args: &CollapseArgs) -> Result<String> {
    match &args.source {
        ReportSource::Report(path) => read_report_file(path)
            .with_context(|| format!("Failed to read report {}", path.display())),
        ReportSource::Data(path) => SimpleperfRunner::new(&args.simpleperf)
            .produce(path)
            .with_context(|| format!("Failed to generate report from {}", path.display())),
    }
}

/// Render, write the SVG, and write its wrapper page
///
/// **Private** - internal helper for execute_collapse
fn render_flamegraph(args: &CollapseArgs, folded: &Path, svg_path: &Path, header: &Header) -> Result<PathBuf> {
    let config = FlamegraphConfig::new().with_title(header.graph_title());

    let renderer: Box<dyn FlamegraphRenderer> = match args.renderer {
        RendererKind::Inferno => Box::new(InfernoRenderer),
        RendererKind::Script => {
            let script = match &args.flamegraph_script {
                Some(path) => path.clone(),
                None => {
                    let dir = folded.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
                    download_flamegraph(dir).context("Failed to obtain flamegraph.pl")?
                }
            };
            Box::new(ScriptRenderer::new(script).with_perl(args.perl.clone()))
        }
    };

    debug!("Using {} renderer", renderer.name());
    let svg = renderer
        .render(folded, &config)
        .with_context(|| format!("Failed to render flamegraph from {}", folded.display()))?;
    write_svg(&svg, svg_path).context("Failed to write flamegraph SVG")?;
    info!("✓ Flamegraph written to: {}", svg_path.display());

    let page = write_svg_page(svg_path, header).context("Failed to write flamegraph page")?;
    info!("✓ Flamegraph page written to: {}", page.display());
    Ok(page)
}

/// Validate collapse arguments
///
/// **Public** - can be called before execute_collapse for early validation
pub fn validate_args(args: &CollapseArgs) -> Result<()> {
    if args.source.path().as_os_str().is_empty() {
        anyhow::bail!("Input path cannot be empty");
    }

    if args.top_paths == 0 {
        anyhow::bail!("--top must be at least 1");
    }

    let outputs = OutputPaths::resolve(args);
    let input = args.source.path();
    let mut written: Vec<&Path> = vec![outputs.folded.as_path()];
    written.extend(outputs.svg.as_deref());
    written.extend(outputs.html.as_deref());
    written.extend(outputs.json.as_deref());

    for (i, path) in written.iter().enumerate() {
        if *path == input {
            anyhow::bail!("Output {} would overwrite the input", path.display());
        }
        if written[..i].contains(path) {
            anyhow::bail!("Output {} is used for more than one format", path.display());
        }
    }

    if args.renderer == RendererKind::Inferno && args.flamegraph_script.is_some() {
        debug!("--flamegraph is ignored by the inferno renderer");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_args_rejects_zero_top() {
        let args = CollapseArgs {
            top_paths: 0,
            ..CollapseArgs::from_report("report.txt")
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_rejects_overwriting_input() {
        let args = CollapseArgs {
            output_folded: Some(PathBuf::from("report.txt")),
            ..CollapseArgs::from_report("report.txt")
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_rejects_shared_outputs() {
        let args = CollapseArgs {
            output_html: Some(PathBuf::from("out.svg")),
            output_svg: Some(PathBuf::from("out.svg")),
            ..CollapseArgs::from_report("report.txt")
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_defaults_ok() {
        assert!(validate_args(&CollapseArgs::from_report("report.txt")).is_ok());
    }
}
