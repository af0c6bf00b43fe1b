//! Configuration options for the scraping client and image cache.
//!
//! The `Options` struct controls network behavior and the thumbnail
//! degradation filter. All fields are public; use `Default::default()`
//! for standard settings.

use std::path::PathBuf;
use std::time::Duration;

/// Default browser user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Configuration for [`Client`](crate::Client) and [`ImageCache`](crate::ImageCache).
///
/// # Example
///
/// ```rust
/// use xxxgfporn_api::Options;
/// use std::time::Duration;
///
/// let options = Options {
///     max_retries: 5,
///     timeout: Duration::from_secs(10),
///     ..Options::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Options {
    /// Proxy URL routed through for every request (e.g. `http://127.0.0.1:7890`).
    ///
    /// Default: `None`
    pub proxy: Option<String>,

    /// Per-request timeout.
    ///
    /// Default: 30 seconds
    pub timeout: Duration,

    /// Total number of attempts per fetch (first try included).
    ///
    /// Default: `3`
    pub max_retries: u32,

    /// Base delay for exponential backoff between attempts.
    ///
    /// Attempt `n` sleeps `retry_backoff * 2^n` before retrying, so the
    /// default of 1s gives the 1s, 2s, 4s... schedule.
    ///
    /// Default: 1 second
    pub retry_backoff: Duration,

    /// Cap on concurrently in-flight requests across the whole client.
    ///
    /// Default: `10`
    pub max_connections: usize,

    /// Cap on pooled idle connections kept per host.
    ///
    /// Default: `5`
    pub max_connections_per_host: usize,

    /// Thumbnail degradation intensity: 0 = off, 1 = light blur,
    /// 2 = medium blur, 3 = heavy blur plus pixelation.
    ///
    /// Values above 3 are clamped to 3.
    ///
    /// Default: `0`
    pub filter_level: u8,

    /// Directory for the content-addressed image cache.
    ///
    /// When `None`, downloaded images land in kept temporary files and
    /// nothing is ever reused.
    ///
    /// Default: `None`
    pub cache_dir: Option<PathBuf>,

    /// User agent header sent with every request.
    ///
    /// Default: [`DEFAULT_USER_AGENT`]
    pub user_agent: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            proxy: None,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_backoff: Duration::from_secs(1),
            max_connections: 10,
            max_connections_per_host: 5,
            filter_level: 0,
            cache_dir: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Options {
    /// Filter level clamped to the supported 0..=3 range.
    #[must_use]
    pub fn effective_filter_level(&self) -> u8 {
        self.filter_level.min(3)
    }
}
