//! CLI-based extractor using the external yt-dlp binary

use super::parser::{classify_stderr, parse_direct_url, parse_info_json, parse_printed_path};
use super::traits::{Extractor, OutputTemplate, RawVideoInfo};
use crate::error::ExtractorError;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// CLI-based extractor using the external yt-dlp binary
///
/// Each call spawns one engine process. The URL and format selector are
/// passed as discrete arguments after `--`, so they are never interpreted
/// as engine options. On Unix the process runs in its own process group,
/// and a timeout kills the whole group (including any ffmpeg children).
///
/// # Examples
///
/// ```no_run
/// use media_dl::extractor::{Extractor, YtDlpExtractor};
/// use std::path::PathBuf;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // Create with explicit path
/// let extractor = YtDlpExtractor::new(PathBuf::from("/usr/local/bin/yt-dlp"));
///
/// // Or auto-discover from PATH
/// let extractor = YtDlpExtractor::from_path().expect("yt-dlp not found in PATH");
///
/// let url = extractor
///     .direct_url("https://youtu.be/dQw4w9WgXcQ", "best", Duration::from_secs(30))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct YtDlpExtractor {
    binary_path: PathBuf,
}

impl YtDlpExtractor {
    /// Create a new CLI extractor with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find yt-dlp in PATH
    ///
    /// `Some(YtDlpExtractor)` if the binary is found, `None` otherwise.
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Path of the engine binary
    pub fn binary_path(&self) -> &std::path::Path {
        &self.binary_path
    }

    async fn run(&self, args: Vec<OsString>, timeout: Duration) -> Result<Vec<u8>, ExtractorError> {
        let mut command = Command::new(&self.binary_path);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ExtractorError::Unavailable,
            _ => ExtractorError::Failed {
                detail: format!("failed to execute {}: {}", self.binary_path.display(), e),
            },
        })?;
        let pid = child.id();

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) if output.status.success() => Ok(output.stdout),
            Ok(Ok(output)) => {
                let err = classify_stderr(&output.stderr);
                tracing::debug!(
                    status = %output.status,
                    detail = err.detail().unwrap_or_default(),
                    "yt-dlp exited with an error"
                );
                Err(err)
            }
            Ok(Err(e)) => Err(ExtractorError::Failed {
                detail: format!("failed to collect yt-dlp output: {}", e),
            }),
            Err(_) => {
                // dropping the wait future already killed the direct child
                if let Some(pid) = pid {
                    kill_process_group(pid);
                }
                let secs = bound_secs(timeout);
                tracing::warn!(pid = ?pid, timeout_secs = secs, "yt-dlp timed out and was killed");
                Err(ExtractorError::Timeout { secs })
            }
        }
    }
}

fn args<I, S>(items: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    items.into_iter().map(Into::into).collect()
}

/// Timeout rounded up to whole seconds
fn bound_secs(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis().div_ceil(1000)).unwrap_or(u64::MAX)
}

#[cfg(unix)]
fn kill_process_group(pid: u32) {
    let Ok(pgid) = i32::try_from(pid) else {
        return;
    };
    // SAFETY: kill(2) with a negative pid signals the process group we created
    // with process_group(0); a stale group yields ESRCH, which is ignored.
    unsafe {
        libc::kill(-pgid, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

#[async_trait]
impl Extractor for YtDlpExtractor {
    async fn list_formats(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<RawVideoInfo, ExtractorError> {
        let stdout = self
            .run(
                args(["-j", "--no-playlist", "--no-warnings", "--", url]),
                timeout,
            )
            .await?;
        parse_info_json(&stdout)
    }

    async fn download(
        &self,
        url: &str,
        format: &str,
        template: &OutputTemplate,
        timeout: Duration,
    ) -> Result<PathBuf, ExtractorError> {
        let output_pattern = template.render();
        let stdout = self
            .run(
                args([
                    "--no-playlist",
                    "--no-warnings",
                    "--no-progress",
                    "--no-mtime",
                    "-f",
                    format,
                    "-o",
                    output_pattern.as_str(),
                    "--print",
                    "after_move:filepath",
                    "--no-simulate",
                    "--",
                    url,
                ]),
                timeout,
            )
            .await?;
        parse_printed_path(&stdout)
    }

    async fn direct_url(
        &self,
        url: &str,
        format: &str,
        timeout: Duration,
    ) -> Result<String, ExtractorError> {
        let stdout = self
            .run(
                args(["-g", "--no-playlist", "--no-warnings", "-f", format, "--", url]),
                timeout,
            )
            .await?;
        parse_direct_url(&stdout)
    }

    fn is_available(&self) -> bool {
        self.binary_path.is_file()
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_path_agrees_with_which() {
        let which_result = which::which("yt-dlp");
        let from_path_result = YtDlpExtractor::from_path();

        assert_eq!(which_result.is_ok(), from_path_result.is_some());
        if let (Ok(expected), Some(extractor)) = (which_result, from_path_result) {
            assert_eq!(extractor.binary_path(), expected.as_path());
            assert_eq!(extractor.name(), "yt-dlp");
        }
    }

    #[tokio::test]
    async fn missing_binary_is_unavailable() {
        let extractor = YtDlpExtractor::new(PathBuf::from("/nonexistent/yt-dlp-binary-xyz"));

        assert!(!extractor.is_available());
        let result = extractor
            .list_formats("https://youtu.be/abc", Duration::from_secs(5))
            .await;
        assert!(matches!(result, Err(ExtractorError::Unavailable)));
    }

    #[test]
    fn timeout_bound_rounds_up() {
        assert_eq!(bound_secs(Duration::from_secs(30)), 30);
        assert_eq!(bound_secs(Duration::from_millis(200)), 1);
        assert_eq!(bound_secs(Duration::from_millis(1500)), 2);
    }
}
