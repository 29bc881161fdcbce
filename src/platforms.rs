//! Source URL allow-list

use std::collections::HashSet;
use url::Url;

/// Domains accepted when no allow-list is configured
pub const DEFAULT_PLATFORMS: &[&str] = &[
    "youtube.com",
    "youtu.be",
    "vimeo.com",
    "dailymotion.com",
    "tiktok.com",
    "instagram.com",
    "facebook.com",
    "fb.watch",
    "twitter.com",
    "x.com",
    "twitch.tv",
    "soundcloud.com",
    "reddit.com",
    "bilibili.com",
];

/// Allow-listed source domains
///
/// A URL is supported when it is `http` or `https` and its host equals a
/// listed domain or is a subdomain of one (`m.youtube.com` matches
/// `youtube.com`, `notyoutube.com` does not).
#[derive(Clone, Debug)]
pub struct PlatformRegistry {
    domains: Vec<String>,
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_PLATFORMS.iter().map(|d| d.to_string()))
    }
}

impl PlatformRegistry {
    /// Build a registry from domain names
    ///
    /// Names are lowercased; a leading `.` or `www.` is dropped.
    pub fn new(domains: impl IntoIterator<Item = String>) -> Self {
        let mut seen = HashSet::new();
        let domains: Vec<String> = domains
            .into_iter()
            .map(|d| {
                let d = d.trim().trim_start_matches('.').to_lowercase();
                d.strip_prefix("www.").map(str::to_string).unwrap_or(d)
            })
            .filter(|d| !d.is_empty() && seen.insert(d.clone()))
            .collect();
        Self { domains }
    }

    /// Domains in configuration order
    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// Whether `raw` points at an allow-listed platform
    pub fn is_supported(&self, raw: &str) -> bool {
        self.host_of(raw)
            .map(|host| self.matches_host(&host))
            .unwrap_or(false)
    }

    /// Lowercased host of an http(s) URL, `None` if `raw` is not one
    pub fn host_of(&self, raw: &str) -> Option<String> {
        let parsed = Url::parse(raw.trim()).ok()?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return None;
        }
        parsed.host_str().map(|h| h.trim_end_matches('.').to_lowercase())
    }

    fn matches_host(&self, host: &str) -> bool {
        self.domains.iter().any(|domain| {
            host == domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_hosts_and_subdomains_are_supported() {
        let registry = PlatformRegistry::default();

        assert!(registry.is_supported("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(registry.is_supported("https://m.youtube.com/watch?v=abc"));
        assert!(registry.is_supported("http://youtu.be/abc"));
        assert!(registry.is_supported("  https://VIMEO.com/123  "));
        assert!(registry.is_supported("https://x.com/user/status/1"));
    }

    #[test]
    fn lookalike_hosts_are_rejected() {
        let registry = PlatformRegistry::default();

        assert!(!registry.is_supported("https://notyoutube.com/watch"));
        assert!(!registry.is_supported("https://youtube.com.evil.example/watch"));
        assert!(!registry.is_supported("https://example.com/youtube.com"));
    }

    #[test]
    fn malformed_or_non_http_input_fails_closed() {
        let registry = PlatformRegistry::default();

        for input in [
            "",
            "   ",
            "not a url",
            "youtube.com/watch?v=abc",
            "ftp://youtube.com/file",
            "file:///etc/passwd",
            "javascript:alert(1)",
            "https://",
        ] {
            assert!(!registry.is_supported(input), "accepted {input:?}");
        }
    }

    #[test]
    fn custom_list_is_normalized() {
        let registry = PlatformRegistry::new(vec![
            "www.Example.org".to_string(),
            ".media.test".to_string(),
            "".to_string(),
        ]);

        assert_eq!(registry.domains(), &["example.org", "media.test"]);
        assert!(registry.is_supported("https://cdn.example.org/v"));
        assert!(registry.is_supported("https://media.test/v"));
        assert!(!registry.is_supported("https://www.youtube.com/watch?v=a"));
    }

    #[test]
    fn repeated_domains_are_listed_once_in_first_seen_order() {
        let registry = PlatformRegistry::new(
            ["youtube.com", "vimeo.com", "www.youtube.com", "VIMEO.com"]
                .iter()
                .map(|d| d.to_string()),
        );

        assert_eq!(registry.domains(), &["youtube.com", "vimeo.com"]);
    }

    #[test]
    fn host_of_reports_lowercased_host() {
        let registry = PlatformRegistry::default();

        assert_eq!(
            registry.host_of("https://WWW.Example.COM/path").as_deref(),
            Some("www.example.com")
        );
        assert_eq!(registry.host_of("mailto:a@b.c"), None);
    }
}
