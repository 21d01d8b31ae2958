//! Producing report text from a `perf.data` recording.

use super::decode::{decode_report, read_report_file};
use crate::utils::config::DEFAULT_SIMPLEPERF_BIN;
use crate::utils::error::InputError;
use log::{debug, info, warn};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Source of `simpleperf report -g` text for a recording
pub trait ReportProducer {
    fn produce(&self, data: &Path) -> Result<String, InputError>;
}

/// Runs the `simpleperf` binary on the host
#[derive(Debug, Clone)]
pub struct SimpleperfRunner {
    binary: PathBuf,
}

impl Default for SimpleperfRunner {
    fn default() -> Self {
        Self::new(DEFAULT_SIMPLEPERF_BIN)
    }
}

/// Report files written next to a recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    /// `report_<base>.txt`, flat report
    pub plain: PathBuf,
    /// `report_<base>_sg.txt`, callgraph report
    pub callgraph: PathBuf,
}

impl ReportPaths {
    pub fn for_data(data: &Path) -> Self {
        let dir = match data.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let base = data
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "perf".to_string());

        Self {
            plain: dir.join(format!("report_{}.txt", base)),
            callgraph: dir.join(format!("report_{}_sg.txt", base)),
        }
    }
}

impl SimpleperfRunner {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn run(&self, args: &[&OsStr]) -> Result<Output, InputError> {
        debug!("Running {} {:?}", self.binary.display(), args);
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .map_err(|source| InputError::SpawnFailed {
                binary: self.binary.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(InputError::ProfilerFailed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }

    /// Let simpleperf write both reports itself with `-o`
    fn write_reports(&self, data: &Path, paths: &ReportPaths) -> Result<String, InputError> {
        self.run(&[
            OsStr::new("report"),
            OsStr::new("-i"),
            data.as_os_str(),
            OsStr::new("-o"),
            paths.plain.as_os_str(),
        ])?;
        let output = self.run(&[
            OsStr::new("report"),
            OsStr::new("-i"),
            data.as_os_str(),
            OsStr::new("-g"),
            OsStr::new("-o"),
            paths.callgraph.as_os_str(),
        ])?;

        match read_report_file(&paths.callgraph) {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!("Could not read {}: {}; using captured output", paths.callgraph.display(), e);
                Ok(decode_report(&output.stdout).0)
            }
        }
    }
}

impl ReportProducer for SimpleperfRunner {
    fn produce(&self, data: &Path) -> Result<String, InputError> {
        if !data.is_file() {
            return Err(InputError::NotFound(data.to_path_buf()));
        }

        let paths = ReportPaths::for_data(data);
        info!("Generating callgraph report for {}", data.display());

        match self.write_reports(data, &paths) {
            Ok(text) => return Ok(text),
            Err(e) => warn!("simpleperf report -o failed ({}); capturing stdout instead", e),
        }

        let output = self.run(&[
            OsStr::new("report"),
            OsStr::new("-i"),
            data.as_os_str(),
            OsStr::new("-g"),
        ])?;
        if let Err(e) = std::fs::write(&paths.callgraph, &output.stdout) {
            warn!("Could not save {}: {}", paths.callgraph.display(), e);
        }

        Ok(decode_report(&output.stdout).0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_report_paths() {
        let paths = ReportPaths::for_data(Path::new("/tmp/run/perf.data"));
        assert_eq!(
            paths,
            ReportPaths {
                plain: PathBuf::from("/tmp/run/report_perf.txt"),
                callgraph: PathBuf::from("/tmp/run/report_perf_sg.txt"),
            }
        );

        let bare = ReportPaths::for_data(Path::new("capture.data"));
        assert_eq!(bare.callgraph, PathBuf::from("./report_capture_sg.txt"));
    }

    #[test]
    fn test_missing_data_file() {
        let result = SimpleperfRunner::default().produce(Path::new("/nonexistent/perf.data"));
        assert!(matches!(result, Err(InputError::NotFound(_))));
    }

    #[test]
    fn test_missing_binary() {
        let data = tempfile::NamedTempFile::new().unwrap();
        let runner = SimpleperfRunner::new("/nonexistent/simpleperf");
        let result = runner.produce(data.path());
        assert!(matches!(result, Err(InputError::SpawnFailed { .. })));
    }
}
