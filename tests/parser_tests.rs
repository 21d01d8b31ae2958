use pretty_assertions::assert_eq;
use simpleperf_collapse::parser::{detect_format, parse_report, ParseOptions, ReportFormat};
use simpleperf_collapse::utils::ParseError;

const GAME_REPORT: &str = "\
Cmdline: /system/bin/simpleperf record -g -p 100
Arch: arm64
Event: cpu-cycles (type 0, config 0)
Samples: 20
Event count: 2000

Children  Self  Command  Pid  Tid  Symbol
50.00%  0.00%  GameThread  100  101  __start_thread
       |
       -- __start_thread
          |--60.00%-- Tick
          |--40.00%-- Draw

25.00%  0.00%  GameThread  100  101  Tick
       |
       -- Tick
          |--100.00%-- Update

25.00%  0.00%  RenderThread  100  102  __start_thread
       |
       -- __start_thread
          |--80.00%-- Present
";

fn entries(text: &str, options: &ParseOptions) -> Vec<(String, u64)> {
    parse_report(text, options)
        .unwrap()
        .stacks
        .iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

#[test]
fn test_full_report_header() {
    let report = parse_report(GAME_REPORT, &ParseOptions::default()).unwrap();

    assert_eq!(report.format, ReportFormat::FullTree);
    assert_eq!(report.header.total_samples, 20);
    assert_eq!(report.header.event_count, 2000);
    assert_eq!(report.header.arch.as_deref(), Some("arm64"));
    assert_eq!(report.header.graph_title(), "cpu-cycles Flamegraph");
}

#[test]
fn test_full_report_stacks_in_first_seen_order() {
    assert_eq!(
        entries(GAME_REPORT, &ParseOptions::default()),
        vec![
            ("GameThread;__start_thread;Tick".to_string(), 600),
            ("GameThread;__start_thread;Draw".to_string(), 400),
            ("GameThread;Tick;Update".to_string(), 500),
            ("RenderThread;__start_thread;Present".to_string(), 400),
        ]
    );
}

#[test]
fn test_thread_head_filter_keeps_first_entry_block() {
    let options = ParseOptions::default().with_thread_head_filter(true);
    let stacks = entries(GAME_REPORT, &options);

    assert_eq!(stacks.len(), 3);
    assert!(stacks.iter().all(|(k, _)| k.contains("__start_thread")));
    assert_eq!(stacks.iter().map(|(_, v)| v).sum::<u64>(), 1400);
}

#[test]
fn test_equalize_restores_declared_share() {
    let options = ParseOptions::default().with_equalize_root_sum(true);
    let stacks = entries(GAME_REPORT, &options);

    // Row declares 25% of 2000; the single 80% leaf is scaled up to it
    assert!(stacks.contains(&("RenderThread;__start_thread;Present".to_string(), 500)));
    // Already balanced
    assert!(stacks.contains(&("GameThread;__start_thread;Tick".to_string(), 600)));
    // Not headed by the entry symbol
    assert!(stacks.contains(&("GameThread;Tick;Update".to_string(), 500)));
}

#[test]
fn test_reverse_flips_every_path() {
    let forward = parse_report(GAME_REPORT, &ParseOptions::default()).unwrap();
    let reversed = parse_report(GAME_REPORT, &ParseOptions::default().with_reverse(true)).unwrap();

    assert_eq!(reversed.stacks.get("Present;__start_thread;RenderThread"), Some(400));
    assert_eq!(reversed.stacks.reversed(), forward.stacks);
}

#[test]
fn test_identical_paths_across_rows_are_summed() {
    let text = "\
Samples: 10
Event count: 1000
50.00%  0.00%  proc  1  2  root
       -- root
          |--60.00%-- f
30.00%  0.00%  proc  1  2  root
       -- root
          |--100.00%-- f
";
    let report = parse_report(text, &ParseOptions::default()).unwrap();

    assert_eq!(report.stacks.len(), 1);
    assert_eq!(report.stacks.get("proc;root;f"), Some(600));
    let raw = report.raw_stacks["proc;root;f"];
    assert!((raw - 600.0).abs() < 1e-6);
}

#[test]
fn test_half_event_leaves_round_to_even() {
    let text = "\
Samples: 1
Event count: 5
10.00%  0.00%  proc  1  2  aa
       -- aa
          |--100.00%-- x
50.00%  0.00%  proc  1  2  bb
       -- bb
          |--100.00%-- y
";
    // 0.5 events rounds to 0 and 2.5 rounds to 2
    assert_eq!(
        entries(text, &ParseOptions::default()),
        vec![("proc;bb;y".to_string(), 2)]
    );
}

#[test]
fn test_missing_event_count_is_fatal() {
    let err = parse_report("Samples: 10\n50.00%  0.00%  p  1  2  f\n", &ParseOptions::default()).unwrap_err();
    assert!(matches!(err, ParseError::MissingHeaderField("Event count")));
}

const BRIEF_REPORT: &str = "\
Samples: 100
Event count: 10000
Children  Self  Command  Pid  Tid  Symbol
20.00%  0.00%  GameThread  1  2  __start_thread
19.00%  0.00%  GameThread  1  2  Tick
10.00%  0.00%  RenderThread  1  3  __start_thread
5.00%  0.00%  GameThread  1  2  __start_thread
4.00%  0.00%  GameThread  1  2  Tick
";

#[test]
fn test_brief_report_detected() {
    let lines: Vec<&str> = BRIEF_REPORT.lines().collect();
    assert_eq!(detect_format(&lines), ReportFormat::Brief);
}

#[test]
fn test_brief_blocks_merge_without_filter() {
    assert_eq!(
        entries(BRIEF_REPORT, &ParseOptions::default()),
        vec![
            ("GameThread;__start_thread;Tick".to_string(), 2500),
            ("RenderThread;__start_thread".to_string(), 1000),
        ]
    );
}

#[test]
fn test_brief_filter_drops_repeated_thread_blocks() {
    let options = ParseOptions::default().with_thread_head_filter(true);
    assert_eq!(
        entries(BRIEF_REPORT, &options),
        vec![
            ("GameThread;__start_thread;Tick".to_string(), 2000),
            ("RenderThread;__start_thread".to_string(), 1000),
        ]
    );
}

#[test]
fn test_brief_skipped_block_is_dropped() {
    let text = "\
Samples: 100
Event count: 10000
30.00%  0.00%  RenderThread  1  3  __start_thread
29.00%  0.00%  RenderThread  1  3  DrawFrame
skipped in brief callgraph mode
20.00%  1.00%  GameThread  1  2  __start_thread
19.00%  1.00%  GameThread  1  2  Tick
";
    assert_eq!(
        entries(text, &ParseOptions::default()),
        vec![("GameThread;__start_thread;Tick".to_string(), 2000)]
    );
}

#[test]
fn test_header_only_report_has_no_stacks() {
    let report = parse_report("Samples: 10\nEvent count: 1000\n", &ParseOptions::default()).unwrap();
    assert!(report.stacks.is_empty());
}
