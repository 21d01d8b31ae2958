//! Header extraction.
//!
//! The header is the block of `Key: value` lines simpleperf prints before
//! the sample table. Only the leading window is consulted; fields that show
//! up once the table has started are ignored.

use super::row::{is_column_header, is_table_row};
use super::schema::Header;
use crate::utils::config::HEADER_SCAN_LINES;
use crate::utils::error::ParseError;
use log::{debug, warn};

const CMDLINE: &str = "Cmdline:";
const ARCH: &str = "Arch:";
const EVENT: &str = "Event:";
const SAMPLES: &str = "Samples:";
const ERROR_CALLCHAINS: &str = "Error Callchains:";
const EVENT_COUNT: &str = "Event count:";

const HEADER_PREFIXES: &[&str] = &[CMDLINE, ARCH, EVENT, SAMPLES, ERROR_CALLCHAINS, EVENT_COUNT];

/// Whether a line is one of the recognised header fields
pub fn is_header_line(line: &str) -> bool {
    HEADER_PREFIXES.iter().any(|p| line.starts_with(p))
}

/// Parse header fields from the start of a report
///
/// **Public** - first stage of report parsing
///
/// # Errors
/// * `ParseError::MissingHeaderField` - `Event count:` or `Samples:` absent or unparseable
pub fn parse_header(lines: &[&str]) -> Result<Header, ParseError> {
    let mut header = Header::default();
    let mut event_count = None;
    let mut total_samples = None;

    for line in lines.iter().take(HEADER_SCAN_LINES) {
        if is_table_row(line) || is_column_header(line) {
            break;
        }
        let s = line.trim();

        if let Some(v) = s.strip_prefix(CMDLINE) {
            header.cmdline = Some(v.trim().to_string());
        } else if let Some(v) = s.strip_prefix(ARCH) {
            header.arch = Some(v.trim().to_string());
        } else if let Some(v) = s.strip_prefix(EVENT) {
            header.event = Some(v.trim().to_string());
        } else if let Some(v) = s.strip_prefix(SAMPLES) {
            if let Some(n) = parse_count(SAMPLES, v) {
                total_samples.get_or_insert(n);
            }
        } else if let Some(v) = s.strip_prefix(ERROR_CALLCHAINS) {
            header.error_callchains = Some(v.trim().to_string());
        } else if let Some(v) = s.strip_prefix(EVENT_COUNT) {
            if let Some(n) = parse_count(EVENT_COUNT, v) {
                event_count.get_or_insert(n);
            }
        }
    }

    header.event_count = event_count.ok_or(ParseError::MissingHeaderField("Event count"))?;
    header.total_samples = total_samples.ok_or(ParseError::MissingHeaderField("Samples"))?;

    debug!(
        "Header: {} events over {} samples ({:.2} events/sample)",
        header.event_count,
        header.total_samples,
        header.events_per_sample()
    );

    Ok(header)
}

fn parse_count(field: &str, value: &str) -> Option<u64> {
    match value.trim().parse::<u64>() {
        Ok(n) => Some(n),
        Err(e) => {
            warn!("Found header field '{}' but failed to parse '{}': {}", field, value.trim(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_header() {
        let lines = vec![
            "Cmdline: /system/bin/simpleperf record -g -p 1234",
            "Arch: arm64",
            "Event: cpu-cycles (type 0, config 0)",
            "Samples: 10",
            "Error Callchains: 0, 0.00%",
            "Event count: 1000",
            "",
            "Children  Self  Command  Pid  Tid  Symbol",
        ];

        let header = parse_header(&lines).unwrap();
        assert_eq!(header.arch.as_deref(), Some("arm64"));
        assert_eq!(header.event.as_deref(), Some("cpu-cycles (type 0, config 0)"));
        assert_eq!(header.error_callchains.as_deref(), Some("0, 0.00%"));
        assert_eq!(header.total_samples, 10);
        assert_eq!(header.event_count, 1000);
    }

    #[test]
    fn test_missing_event_count_is_fatal() {
        let lines = vec!["Samples: 10"];
        let err = parse_header(&lines).unwrap_err();
        assert!(matches!(err, ParseError::MissingHeaderField("Event count")));
    }

    #[test]
    fn test_unparseable_samples_is_fatal() {
        let lines = vec!["Samples: many", "Event count: 1000"];
        let err = parse_header(&lines).unwrap_err();
        assert!(matches!(err, ParseError::MissingHeaderField("Samples")));
    }

    #[test]
    fn test_unparseable_duplicate_keeps_first_value() {
        let lines = vec!["Samples: 10", "Samples: n/a", "Event count: 1000", "Event count: ?"];
        let header = parse_header(&lines).unwrap();
        assert_eq!(header.total_samples, 10);
        assert_eq!(header.event_count, 1000);
    }

    #[test]
    fn test_fields_after_table_are_ignored() {
        let lines = vec![
            "Event count: 1000",
            "50.00%  50.00%  proc  1  2  root",
            "Samples: 10",
        ];
        assert!(parse_header(&lines).is_err());
    }

    #[test]
    fn test_is_header_line() {
        assert!(is_header_line("Event count: 5"));
        assert!(is_header_line("Arch: x86_64"));
        assert!(!is_header_line("  Event count: 5"));
        assert!(!is_header_line("-- main"));
    }
}
