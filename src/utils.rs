//! Utility functions for filenames and the artifact store

use crate::error::{Error, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Upper bound on sanitized filename length, in characters
pub const MAX_FILENAME_CHARS: usize = 100;

/// Label used when a title sanitizes to nothing
pub const DEFAULT_LABEL: &str = "video";

/// Suffixes the extraction engine uses for files it has not finished writing
pub const INTERMEDIATE_SUFFIXES: &[&str] = &[".part", ".ytdl", ".temp", ".tmp"];

// Patterns are literals; compilation cannot fail
#[allow(clippy::unwrap_used)]
static FORBIDDEN_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1f\x7f]"#).unwrap());

#[allow(clippy::unwrap_used)]
static DOT_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{2,}").unwrap());

/// Map an arbitrary title to a filesystem-safe name
///
/// Removes `< > : " / \ | ? *` and control characters, collapses runs of dots
/// so the result never contains `..`, trims surrounding whitespace and dots,
/// and bounds the result to [`MAX_FILENAME_CHARS`] characters. Returns
/// [`DEFAULT_LABEL`] if nothing remains.
///
/// # Examples
///
/// ```
/// use media_dl::utils::sanitize_filename;
///
/// assert_eq!(sanitize_filename("What? A/B: test"), "What AB test");
/// assert_eq!(sanitize_filename("Wait... what"), "Wait. what");
/// assert_eq!(sanitize_filename("///"), "video");
/// ```
#[must_use]
pub fn sanitize_filename(input: &str) -> String {
    let stripped = FORBIDDEN_CHARS.replace_all(input, "");
    let collapsed = DOT_RUNS.replace_all(&stripped, ".");
    let trimmed = collapsed.trim_matches(|c: char| c.is_whitespace() || c == '.');

    let bounded: String = trimmed.chars().take(MAX_FILENAME_CHARS).collect();
    // truncation can expose a trailing space or dot
    let bounded = bounded.trim_end_matches(|c: char| c.is_whitespace() || c == '.');

    if bounded.is_empty() {
        DEFAULT_LABEL.to_string()
    } else {
        bounded.to_string()
    }
}

/// Whether `name` is a file the engine is still writing
#[must_use]
pub fn is_intermediate_file(name: &str) -> bool {
    let lower = name.to_lowercase();
    INTERMEDIATE_SUFFIXES
        .iter()
        .any(|suffix| lower.ends_with(suffix))
}

/// Check a client-supplied artifact name without touching the filesystem
///
/// Rejects empty names, traversal sequences, path separators, drive
/// prefixes, NUL bytes and intermediate engine files.
pub fn validate_artifact_name(name: &str) -> Result<()> {
    let reject = |reason: &str| Err(Error::PathRejected(reason.to_string()));

    if name.trim().is_empty() {
        return reject("empty filename");
    }
    if name.contains("..") {
        return reject("traversal sequence in filename");
    }
    if name.contains(['/', '\\']) {
        return reject("path separator in filename");
    }
    if name.contains(':') {
        return reject("drive or stream prefix in filename");
    }
    if name.chars().any(char::is_control) {
        return reject("control character in filename");
    }
    if is_intermediate_file(name) {
        return reject("incomplete download");
    }
    Ok(())
}

/// Get available disk space for a given path
///
/// Uses platform-specific APIs to query filesystem statistics:
/// - Linux: statvfs
/// - macOS: statvfs
/// - Windows: GetDiskFreeSpaceExW
///
/// # Examples
///
/// ```ignore
/// let available = get_available_space(Path::new("./downloads"))?;
/// println!("Available space: {} MB", available / (1024 * 1024));
/// ```
pub fn get_available_space(path: &Path) -> std::io::Result<u64> {
    #[cfg(unix)]
    {
        use std::ffi::CString;
        use std::os::unix::ffi::OsStrExt;

        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        // SAFETY: c_path is a valid NUL-terminated string, stat is zeroed
        // before the call and only read after statvfs reports success.
        unsafe {
            let mut stat: libc::statvfs = std::mem::zeroed();
            if libc::statvfs(c_path.as_ptr(), &mut stat) != 0 {
                return Err(std::io::Error::last_os_error());
            }

            // f_bavail is blocks available to unprivileged users
            #[allow(clippy::unnecessary_cast)]
            let available_bytes = (stat.f_bavail as u64).saturating_mul(stat.f_frsize as u64);
            Ok(available_bytes)
        }
    }

    #[cfg(windows)]
    {
        use std::os::windows::ffi::OsStrExt;
        use winapi::um::fileapi::GetDiskFreeSpaceExW;

        let wide_path: Vec<u16> = path
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();

        // SAFETY: wide_path is NUL-terminated and every output pointer refers
        // to a live, aligned u64 that is only read after a successful call.
        unsafe {
            let mut free_bytes_available: u64 = 0;
            let mut _total_bytes: u64 = 0;
            let mut _total_free_bytes: u64 = 0;

            if GetDiskFreeSpaceExW(
                wide_path.as_ptr(),
                &mut free_bytes_available as *mut u64 as *mut _,
                &mut _total_bytes as *mut u64 as *mut _,
                &mut _total_free_bytes as *mut u64 as *mut _,
            ) == 0
            {
                return Err(std::io::Error::last_os_error());
            }

            Ok(free_bytes_available)
        }
    }

    #[cfg(not(any(unix, windows)))]
    {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "Disk space checking is not supported on this platform",
        ))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sanitize_removes_forbidden_characters() {
        assert_eq!(
            sanitize_filename(r#"a<b>c:d"e/f\g|h?i*j"#),
            "abcdefghij"
        );
        assert_eq!(sanitize_filename("tab\there\u{0}nul"), "tabherenul");
    }

    #[test]
    fn sanitize_never_yields_traversal() {
        for input in ["..", "../../etc/passwd", "a..b", "Wait... what", ". . ."] {
            let out = sanitize_filename(input);
            assert!(!out.contains(".."), "{input:?} -> {out:?}");
            assert!(!out.contains('/'));
            assert!(!out.starts_with('.'));
        }
        assert_eq!(sanitize_filename("../../etc/passwd"), "etcpasswd");
    }

    #[test]
    fn sanitize_falls_back_to_default_label() {
        assert_eq!(sanitize_filename(""), DEFAULT_LABEL);
        assert_eq!(sanitize_filename("   "), DEFAULT_LABEL);
        assert_eq!(sanitize_filename("???***"), DEFAULT_LABEL);
        assert_eq!(sanitize_filename("..."), DEFAULT_LABEL);
    }

    #[test]
    fn sanitize_bounds_length_on_char_boundaries() {
        let long = "é".repeat(250);
        let out = sanitize_filename(&long);
        assert_eq!(out.chars().count(), MAX_FILENAME_CHARS);

        let padded = format!("{} tail", "x".repeat(MAX_FILENAME_CHARS - 1));
        let out = sanitize_filename(&padded);
        assert!(!out.ends_with(' '));
        assert!(out.chars().count() <= MAX_FILENAME_CHARS);
    }

    #[test]
    fn sanitize_is_deterministic_and_keeps_normal_titles() {
        let title = "Rick Astley - Never Gonna Give You Up (Official Video)";
        assert_eq!(sanitize_filename(title), title);
        assert_eq!(sanitize_filename(title), sanitize_filename(title));
    }

    #[test]
    fn artifact_names_with_paths_are_rejected() {
        for name in [
            "",
            " ",
            "..",
            "../secret.mp4",
            "a/b.mp4",
            "a\\b.mp4",
            "C:evil.mp4",
            "/etc/passwd",
            "clip\0.mp4",
        ] {
            assert!(
                matches!(validate_artifact_name(name), Err(Error::PathRejected(_))),
                "accepted {name:?}"
            );
        }
    }

    #[test]
    fn intermediate_files_are_rejected() {
        for name in ["clip.mp4.part", "clip.ytdl", "clip.TEMP", "clip.mp4.tmp"] {
            assert!(is_intermediate_file(name));
            assert!(validate_artifact_name(name).is_err());
        }
        assert!(!is_intermediate_file("participants.mp4"));
    }

    #[test]
    fn plain_artifact_names_are_accepted() {
        validate_artifact_name("My Clip-0f8e6b1c2d3a4e5f9a8b7c6d5e4f3a2b.mp4").unwrap();
        validate_artifact_name("song.m4a").unwrap();
    }

    #[test]
    fn available_space_of_temp_dir() {
        let temp_dir = TempDir::new().unwrap();
        let available = get_available_space(temp_dir.path()).unwrap();

        assert!(available > 0, "Available space should be greater than 0");
    }

    #[test]
    fn available_space_of_missing_path_is_an_error() {
        let result = get_available_space(Path::new("/nonexistent/path/that/should/not/exist"));
        assert!(result.is_err());
    }
}
