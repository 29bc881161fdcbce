//! Configuration types for media-dl
//!
//! All settings have sensible defaults. The service binary builds its
//! [`Config`] with [`Config::from_env`], which layers environment variables
//! over an optional JSON file named by `CONFIG_FILE`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

/// Artifact store and job behaviour
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Artifact store directory (default: "./downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Age at which artifacts and job records are evicted (default: 1 hour)
    #[serde(default = "default_max_age", with = "duration_serde")]
    pub max_age: Duration,

    /// Interval between scheduled retention sweeps (default: 5 minutes)
    #[serde(default = "default_sweep_interval", with = "duration_serde")]
    pub sweep_interval: Duration,

    /// Maximum concurrent extractor processes (default: 4)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,

    /// Refuse server-side downloads when free space drops below this many bytes
    /// (default: 100 MiB, 0 disables the check)
    #[serde(default = "default_min_free_space")]
    pub min_free_space: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            max_age: default_max_age(),
            sweep_interval: default_sweep_interval(),
            max_concurrent_downloads: default_max_concurrent(),
            min_free_space: default_min_free_space(),
        }
    }
}

/// Which raw formats the catalog keeps
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatFilter {
    /// Any format with a stream URL
    #[default]
    Playable,
    /// Only formats carrying both video and audio
    Muxed,
}

/// Extraction engine settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Path to the yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub binary_path: Option<PathBuf>,

    /// Whether to search PATH for yt-dlp if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Bound on metadata requests (default: 30 seconds)
    #[serde(default = "default_info_timeout", with = "duration_serde")]
    pub info_timeout: Duration,

    /// Bound on server-side downloads (default: 10 minutes)
    #[serde(default = "default_download_timeout", with = "duration_serde")]
    pub download_timeout: Duration,

    /// Bound on direct URL resolution (default: 30 seconds)
    #[serde(default = "default_info_timeout", with = "duration_serde")]
    pub direct_url_timeout: Duration,

    /// Maximum formats returned to clients (default: 15)
    #[serde(default = "default_max_formats")]
    pub max_formats: usize,

    /// Catalog filter (default: playable)
    #[serde(default)]
    pub format_filter: FormatFilter,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            binary_path: None,
            search_path: true,
            info_timeout: default_info_timeout(),
            download_timeout: default_download_timeout(),
            direct_url_timeout: default_info_timeout(),
            max_formats: default_max_formats(),
            format_filter: FormatFilter::default(),
        }
    }
}

/// API and external server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 0.0.0.0:8000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Main configuration for MediaDownloader
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Artifact store and job behaviour
    #[serde(default)]
    pub download: DownloadConfig,

    /// Extraction engine settings
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// API server settings
    #[serde(flatten)]
    pub server: ServerIntegrationConfig,

    /// Allow-listed platform domains
    #[serde(default = "default_platforms")]
    pub platforms: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download: DownloadConfig::default(),
            extractor: ExtractorConfig::default(),
            server: ServerIntegrationConfig::default(),
            platforms: default_platforms(),
        }
    }
}

impl Config {
    /// Artifact store directory
    pub fn download_dir(&self) -> &PathBuf {
        &self.download.download_dir
    }

    /// Build configuration from the process environment
    ///
    /// See [`Config::from_lookup`] for the recognised variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from a variable lookup function
    ///
    /// `CONFIG_FILE` names an optional JSON file used as the base. These
    /// variables override it:
    ///
    /// | Variable | Setting |
    /// |---|---|
    /// | `DOWNLOAD_DIR` | `download.download_dir` |
    /// | `ARTIFACT_MAX_AGE_SECS` | `download.max_age` |
    /// | `SWEEP_INTERVAL_SECS` | `download.sweep_interval` |
    /// | `MAX_CONCURRENT_DOWNLOADS` | `download.max_concurrent_downloads` |
    /// | `MIN_FREE_SPACE_BYTES` | `download.min_free_space` |
    /// | `YTDLP_PATH` | `extractor.binary_path` |
    /// | `INFO_TIMEOUT_SECS` | `extractor.info_timeout` |
    /// | `DOWNLOAD_TIMEOUT_SECS` | `extractor.download_timeout` |
    /// | `MAX_FORMATS` | `extractor.max_formats` |
    /// | `BIND_ADDRESS` | `api.bind_address` |
    /// | `PORT` | port of `api.bind_address` |
    /// | `CORS_ORIGINS` | `api.cors_origins` (comma separated) |
    /// | `SUPPORTED_PLATFORMS` | `platforms` (comma separated) |
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("CONFIG_FILE") {
            Some(path) => {
                let raw = std::fs::read_to_string(&path).map_err(|e| Error::Config {
                    message: format!("cannot read config file '{}': {}", path, e),
                    key: Some("CONFIG_FILE".to_string()),
                })?;
                serde_json::from_str(&raw).map_err(|e| Error::Config {
                    message: format!("invalid config file '{}': {}", path, e),
                    key: Some("CONFIG_FILE".to_string()),
                })?
            }
            None => Config::default(),
        };

        if let Some(dir) = lookup("DOWNLOAD_DIR") {
            config.download.download_dir = PathBuf::from(dir);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "ARTIFACT_MAX_AGE_SECS")? {
            config.download.max_age = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "SWEEP_INTERVAL_SECS")? {
            config.download.sweep_interval = Duration::from_secs(secs);
        }
        if let Some(n) = parse_var::<usize>(&lookup, "MAX_CONCURRENT_DOWNLOADS")? {
            config.download.max_concurrent_downloads = n;
        }
        if let Some(bytes) = parse_var::<u64>(&lookup, "MIN_FREE_SPACE_BYTES")? {
            config.download.min_free_space = bytes;
        }
        if let Some(path) = lookup("YTDLP_PATH") {
            config.extractor.binary_path = Some(PathBuf::from(path));
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "INFO_TIMEOUT_SECS")? {
            config.extractor.info_timeout = Duration::from_secs(secs);
            config.extractor.direct_url_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "DOWNLOAD_TIMEOUT_SECS")? {
            config.extractor.download_timeout = Duration::from_secs(secs);
        }
        if let Some(n) = parse_var::<usize>(&lookup, "MAX_FORMATS")? {
            config.extractor.max_formats = n;
        }
        if let Some(addr) = parse_var::<SocketAddr>(&lookup, "BIND_ADDRESS")? {
            config.server.api.bind_address = addr;
        }
        if let Some(port) = parse_var::<u16>(&lookup, "PORT")? {
            config.server.api.bind_address.set_port(port);
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            config.server.api.cors_origins = split_list(&origins);
        }
        if let Some(platforms) = lookup("SUPPORTED_PLATFORMS") {
            config.platforms = split_list(&platforms);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the downloader cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.download.max_concurrent_downloads == 0 {
            return Err(Error::Config {
                message: "max_concurrent_downloads must be at least 1".to_string(),
                key: Some("MAX_CONCURRENT_DOWNLOADS".to_string()),
            });
        }
        if self.download.sweep_interval.is_zero() {
            return Err(Error::Config {
                message: "sweep_interval must be positive".to_string(),
                key: Some("SWEEP_INTERVAL_SECS".to_string()),
            });
        }
        if self.platforms.is_empty() {
            return Err(Error::Config {
                message: "at least one supported platform is required".to_string(),
                key: Some("SUPPORTED_PLATFORMS".to_string()),
            });
        }
        Ok(())
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::Config {
                message: format!("invalid value '{}' for {}: {}", raw, key, e),
                key: Some(key.to_string()),
            }),
        None => Ok(None),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_max_age() -> Duration {
    Duration::from_secs(3600)
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(300)
}

fn default_max_concurrent() -> usize {
    4
}

fn default_min_free_space() -> u64 {
    100 * 1024 * 1024
}

fn default_true() -> bool {
    true
}

fn default_info_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_download_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_max_formats() -> usize {
    15
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_platforms() -> Vec<String> {
    crate::platforms::DEFAULT_PLATFORMS
        .iter()
        .map(|d| d.to_string())
        .collect()
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.download.download_dir, PathBuf::from("./downloads"));
        assert_eq!(config.download.max_age, Duration::from_secs(3600));
        assert_eq!(config.extractor.info_timeout, Duration::from_secs(30));
        assert_eq!(config.extractor.max_formats, 15);
        assert_eq!(config.server.api.bind_address.port(), 8000);
        assert!(config.platforms.iter().any(|p| p == "youtube.com"));
    }

    #[test]
    fn environment_overrides_are_applied() {
        let config = Config::from_lookup(lookup_from(&[
            ("DOWNLOAD_DIR", "/srv/media"),
            ("ARTIFACT_MAX_AGE_SECS", "60"),
            ("PORT", "9090"),
            ("YTDLP_PATH", "/opt/yt-dlp"),
            ("MAX_FORMATS", "10"),
            ("SUPPORTED_PLATFORMS", "YouTube.com, vimeo.com,,"),
        ]))
        .unwrap();

        assert_eq!(config.download_dir(), &PathBuf::from("/srv/media"));
        assert_eq!(config.download.max_age, Duration::from_secs(60));
        assert_eq!(config.server.api.bind_address.port(), 9090);
        assert_eq!(
            config.extractor.binary_path,
            Some(PathBuf::from("/opt/yt-dlp"))
        );
        assert_eq!(config.extractor.max_formats, 10);
        assert_eq!(config.platforms, vec!["youtube.com", "vimeo.com"]);
    }

    #[test]
    fn unparseable_value_names_the_key() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();

        match err {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("PORT")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("MAX_CONCURRENT_DOWNLOADS", "0")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn config_file_is_the_base_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"download": {"download_dir": "/from/file", "max_age": 10}, "api": {"bind_address": "127.0.0.1:7000"}}"#,
        )
        .unwrap();
        let path_str = path.to_str().unwrap().to_string();

        let config = Config::from_lookup(lookup_from(&[
            ("CONFIG_FILE", &path_str),
            ("ARTIFACT_MAX_AGE_SECS", "20"),
        ]))
        .unwrap();

        assert_eq!(config.download.download_dir, PathBuf::from("/from/file"));
        assert_eq!(config.download.max_age, Duration::from_secs(20));
        assert_eq!(
            config.server.api.bind_address,
            "127.0.0.1:7000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(config.extractor.max_formats, 15);
    }

    #[test]
    fn durations_serialize_as_seconds() {
        let config = Config::default();
        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(json["download"]["max_age"], 3600);
        assert_eq!(json["extractor"]["download_timeout"], 600);
        assert_eq!(json["extractor"]["format_filter"], "playable");
    }
}
