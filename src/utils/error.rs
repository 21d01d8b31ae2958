//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while reading report text
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Report header is missing required field '{0}'")]
    MissingHeaderField(&'static str),

    #[error("No stacks could be collapsed from the report")]
    NoStacks,
}

/// Errors that can occur while obtaining report text
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Input file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read input: {0}")]
    ReadFailed(#[from] std::io::Error),

    #[error("Failed to launch profiler '{binary}': {source}")]
    SpawnFailed {
        binary: String,
        source: std::io::Error,
    },

    #[error("Profiler exited with status {status}: {stderr}")]
    ProfilerFailed { status: i32, stderr: String },
}

/// Errors that can occur during flamegraph generation
#[derive(Error, Debug)]
pub enum FlamegraphError {
    #[error("Empty stack data")]
    EmptyStacks,

    #[error("Failed to generate flamegraph: {0}")]
    GenerationFailed(String),

    #[error("Flamegraph script not found at {0}")]
    ScriptNotFound(PathBuf),

    #[error("Failed to download flamegraph script: {0}")]
    DownloadFailed(String),

    #[error("Flamegraph renderer timed out after {0:?}")]
    Timeout(Duration),

    #[error("Flamegraph renderer failed (exit code {code}): {stderr}")]
    RendererFailed { code: i32, stderr: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),

    #[error("Invalid folded file {path}: {reason}")]
    InvalidFolded { path: PathBuf, reason: String },
}

/// Exit status for a fatal error, distinct per failure class
///
/// **Public** - used by main.rs to report which validation failed
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<ParseError>() {
            return match e {
                ParseError::MissingHeaderField(_) => 8,
                ParseError::NoStacks => 3,
            };
        }
        if let Some(e) = cause.downcast_ref::<OutputError>() {
            return match e {
                OutputError::InvalidFolded { .. } => 4,
                _ => 7,
            };
        }
        if cause.downcast_ref::<InputError>().is_some() {
            return 5;
        }
        if cause.downcast_ref::<FlamegraphError>().is_some() {
            return 6;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_exit_codes_are_distinct() {
        let missing: anyhow::Error = ParseError::MissingHeaderField("Samples").into();
        let empty: anyhow::Error = ParseError::NoStacks.into();
        let folded: anyhow::Error = OutputError::InvalidFolded {
            path: PathBuf::from("x.folded"),
            reason: "File is empty".to_string(),
        }
        .into();

        assert_eq!(exit_code_for(&missing), 8);
        assert_eq!(exit_code_for(&empty), 3);
        assert_eq!(exit_code_for(&folded), 4);
    }

    #[test]
    fn test_exit_code_sees_through_context() {
        let result: Result<(), FlamegraphError> = Err(FlamegraphError::EmptyStacks);
        let err = result.context("Failed to render").unwrap_err();
        assert_eq!(exit_code_for(&err), 6);
    }

    #[test]
    fn test_unknown_error_exit_code() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(exit_code_for(&err), 1);
    }
}
