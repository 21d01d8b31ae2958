//! External `flamegraph.pl` rendering.
//!
//! The script is run through Perl when it is a `.pl` file, or executed
//! directly otherwise. Rendering is bounded by a timeout; a script that
//! overruns it is killed.

use super::generator::{FlamegraphConfig, FlamegraphRenderer};
use crate::utils::config::{
    DEFAULT_DOWNLOAD_TIMEOUT, DEFAULT_RENDER_TIMEOUT, FLAMEGRAPH_SCRIPT_NAME, FLAMEGRAPH_SCRIPT_URL,
};
use crate::utils::error::FlamegraphError;
use log::{debug, info, warn};
use reqwest::blocking::Client;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Renders by running Brendan Gregg's `flamegraph.pl`
#[derive(Debug, Clone)]
pub struct ScriptRenderer {
    script: PathBuf,
    perl: Option<PathBuf>,
    timeout: Duration,
}

impl ScriptRenderer {
    pub fn new(script: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
            perl: None,
            timeout: DEFAULT_RENDER_TIMEOUT,
        }
    }

    /// Interpreter for `.pl` scripts (defaults to `perl` on PATH)
    pub fn with_perl(mut self, perl: Option<PathBuf>) -> Self {
        self.perl = perl;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    fn command(&self, folded: &Path, config: &FlamegraphConfig) -> Command {
        let is_perl = self
            .script
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("pl"));

        let mut cmd = if is_perl {
            let mut cmd = Command::new(self.perl.as_deref().unwrap_or_else(|| Path::new("perl")));
            cmd.arg(&self.script);
            cmd
        } else {
            Command::new(&self.script)
        };

        cmd.arg("--width")
            .arg(config.width.to_string())
            .arg("--height")
            .arg(config.frame_height.to_string())
            .arg("--title")
            .arg(&config.title)
            .arg("--fontsize")
            .arg(config.font_size.to_string())
            .arg("--countname")
            .arg(&config.count_name)
            .arg(folded);
        cmd
    }
}

/// Drain a child pipe on its own thread so a full pipe cannot stall the child
fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

impl FlamegraphRenderer for ScriptRenderer {
    fn render(&self, folded: &Path, config: &FlamegraphConfig) -> Result<Vec<u8>, FlamegraphError> {
        if !self.script.is_file() {
            return Err(FlamegraphError::ScriptNotFound(self.script.clone()));
        }

        info!("Rendering flamegraph with {}", self.script.display());

        let mut child = self
            .command(folded, config)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if started.elapsed() >= self.timeout {
                warn!("Flamegraph script exceeded {:?}, killing it", self.timeout);
                let _ = child.kill();
                let _ = child.wait();
                return Err(FlamegraphError::Timeout(self.timeout));
            }
            thread::sleep(POLL_INTERVAL);
        };

        let svg = stdout.and_then(|h| h.join().ok()).unwrap_or_default();
        let stderr = stderr.and_then(|h| h.join().ok()).unwrap_or_default();
        let stderr = String::from_utf8_lossy(&stderr).trim().to_string();

        if !status.success() {
            return Err(FlamegraphError::RendererFailed {
                code: status.code().unwrap_or(-1),
                stderr,
            });
        }
        if svg.is_empty() {
            return Err(FlamegraphError::GenerationFailed(format!(
                "script produced no output{}",
                if stderr.is_empty() { String::new() } else { format!(": {}", stderr) }
            )));
        }

        debug!("Script rendered {} bytes in {:?}", svg.len(), started.elapsed());
        Ok(svg)
    }

    fn name(&self) -> &'static str {
        "flamegraph.pl"
    }
}

/// Fetch `flamegraph.pl` into `dir`
///
/// **Public** - used when no script path was given
///
/// An existing copy in `dir` is reused. The download goes to a temporary
/// file in `dir` and is only moved into place once complete.
///
/// # Errors
/// * `FlamegraphError::DownloadFailed` - network error or non-success status
/// * `FlamegraphError::IoError` - the script could not be saved
pub fn download_flamegraph(dir: &Path) -> Result<PathBuf, FlamegraphError> {
    let target = dir.join(FLAMEGRAPH_SCRIPT_NAME);
    if target.is_file() {
        debug!("Reusing {}", target.display());
        return Ok(target);
    }

    info!("Downloading {} from {}", FLAMEGRAPH_SCRIPT_NAME, FLAMEGRAPH_SCRIPT_URL);

    let client = Client::builder()
        .timeout(DEFAULT_DOWNLOAD_TIMEOUT)
        .build()
        .map_err(|e| FlamegraphError::DownloadFailed(e.to_string()))?;

    let response = client
        .get(FLAMEGRAPH_SCRIPT_URL)
        .send()
        .map_err(|e| FlamegraphError::DownloadFailed(e.to_string()))?;

    if !response.status().is_success() {
        return Err(FlamegraphError::DownloadFailed(format!("HTTP {}", response.status())));
    }

    let body = response
        .bytes()
        .map_err(|e| FlamegraphError::DownloadFailed(e.to_string()))?;

    std::fs::create_dir_all(dir)?;
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(&body)?;
    temp.persist(&target).map_err(|e| FlamegraphError::IoError(e.error))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o755))?;
    }

    info!("Saved {} ({} bytes)", target.display(), body.len());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_script() {
        let renderer = ScriptRenderer::new("/nonexistent/flamegraph.pl");
        let result = renderer.render(Path::new("x.folded"), &FlamegraphConfig::default());
        assert!(matches!(result, Err(FlamegraphError::ScriptNotFound(_))));
    }

    #[test]
    fn test_download_reuses_existing_copy() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join(FLAMEGRAPH_SCRIPT_NAME);
        std::fs::write(&existing, "#!/usr/bin/perl\n").unwrap();

        assert_eq!(download_flamegraph(dir.path()).unwrap(), existing);
    }

    #[test]
    fn test_perl_command_line() {
        let renderer = ScriptRenderer::new("tools/flamegraph.pl").with_perl(Some(PathBuf::from("/usr/bin/perl")));
        let config = FlamegraphConfig::default().with_title("T");
        let cmd = renderer.command(Path::new("in.folded"), &config);

        assert_eq!(cmd.get_program(), "/usr/bin/perl");
        let args: Vec<String> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args[0], "tools/flamegraph.pl");
        assert!(args.windows(2).any(|w| w[0] == "--title" && w[1] == "T"));
        assert_eq!(args.last().map(String::as_str), Some("in.folded"));
    }

    #[cfg(unix)]
    #[test]
    fn test_script_output_and_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let folded = dir.path().join("in.folded");
        std::fs::write(&folded, "a;b 1\n").unwrap();
        let shell = Some(PathBuf::from("/bin/sh"));

        let ok_script = dir.path().join("render.pl");
        std::fs::write(&ok_script, "echo '<svg></svg>'\n").unwrap();
        let svg = ScriptRenderer::new(&ok_script)
            .with_perl(shell.clone())
            .render(&folded, &FlamegraphConfig::default())
            .unwrap();
        assert_eq!(String::from_utf8(svg).unwrap().trim(), "<svg></svg>");

        let slow_script = dir.path().join("slow.pl");
        std::fs::write(&slow_script, "sleep 5\n").unwrap();
        let result = ScriptRenderer::new(&slow_script)
            .with_perl(shell.clone())
            .with_timeout(Duration::from_millis(200))
            .render(&folded, &FlamegraphConfig::default());
        assert!(matches!(result, Err(FlamegraphError::Timeout(_))));

        let failing = dir.path().join("fail.pl");
        std::fs::write(&failing, "echo broken >&2\nexit 3\n").unwrap();
        let result = ScriptRenderer::new(&failing)
            .with_perl(shell)
            .render(&folded, &FlamegraphConfig::default());
        assert!(matches!(result, Err(FlamegraphError::RendererFailed { code: 3, .. })));
    }
}
