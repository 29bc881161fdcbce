//! Extraction engine adapters
//!
//! This module is the only code that talks to the external extraction
//! engine. The [`Extractor`] trait is implemented by:
//!
//! - [`YtDlpExtractor`]: runs the `yt-dlp` binary as a subprocess
//! - [`NoOpExtractor`]: stub used when no binary is installed; every call
//!   fails with [`ExtractorError::Unavailable`](crate::error::ExtractorError::Unavailable)
//!
//! Engine output is parsed into [`RawVideoInfo`] and [`RawFormat`] records
//! before anything else sees it.
//!
//! ## Usage
//!
//! ```no_run
//! use media_dl::extractor::{Extractor, OutputTemplate, YtDlpExtractor};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let extractor = YtDlpExtractor::from_path().expect("yt-dlp binary not found");
//!
//!     let template = OutputTemplate::new("./downloads", "clip-0123");
//!     let path = extractor
//!         .download(
//!             "https://youtu.be/dQw4w9WgXcQ",
//!             "best",
//!             &template,
//!             Duration::from_secs(600),
//!         )
//!         .await?;
//!     println!("saved to {}", path.display());
//!
//!     Ok(())
//! }
//! ```

mod cli;
mod noop;
mod parser;
mod traits;

pub use cli::YtDlpExtractor;
pub use noop::NoOpExtractor;
pub use parser::{classify_stderr, parse_direct_url, parse_info_json, parse_printed_path};
pub use traits::{Extractor, OutputTemplate, RawFormat, RawVideoInfo};

use crate::config::ExtractorConfig;
use std::sync::Arc;

/// Pick the extractor implementation for this configuration
///
/// An explicit `binary_path` wins; otherwise PATH is searched when
/// `search_path` is set. Falls back to [`NoOpExtractor`].
pub fn from_config(config: &ExtractorConfig) -> Arc<dyn Extractor> {
    if let Some(ref path) = config.binary_path {
        Arc::new(YtDlpExtractor::new(path.clone()))
    } else if config.search_path {
        YtDlpExtractor::from_path()
            .map(|e| Arc::new(e) as Arc<dyn Extractor>)
            .unwrap_or_else(|| Arc::new(NoOpExtractor))
    } else {
        Arc::new(NoOpExtractor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn explicit_binary_path_is_used() {
        let config = ExtractorConfig {
            binary_path: Some(PathBuf::from("/opt/yt-dlp")),
            search_path: false,
            ..Default::default()
        };
        assert_eq!(from_config(&config).name(), "yt-dlp");
    }

    #[test]
    fn no_path_and_no_search_is_noop() {
        let config = ExtractorConfig {
            binary_path: None,
            search_path: false,
            ..Default::default()
        };
        let extractor = from_config(&config);
        assert_eq!(extractor.name(), "noop");
        assert!(!extractor.is_available());
    }
}
