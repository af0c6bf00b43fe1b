//! Error types for xxxgfporn-api.
//!
//! This module defines the error types surfaced by fetch and extraction
//! operations. List scans never error on individual items; they simply
//! yield fewer records.

/// Error type for client and cache operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The detail page indicates the video was removed or never existed.
    #[error("video not found: {0}")]
    NotFound(String),

    /// The server answered 429. Surfaced immediately, never retried.
    #[error("rate limited by server")]
    RateLimited,

    /// Connecting through the configured proxy failed. Never retried.
    #[error("proxy connection failed: {0}")]
    ProxyFailure(String),

    /// Transport error, timeout, or non-2xx status after exhausting retries.
    #[error("network request failed: {0}")]
    NetworkFailure(String),

    /// The supplied video id or URL could not be normalized to an id.
    #[error("invalid video id: {0:?}")]
    InvalidVideoId(String),

    /// Client construction failed (bad proxy URL, TLS setup, ...).
    #[error("invalid client configuration: {0}")]
    Config(String),

    /// Filesystem failure while persisting to the image cache.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for client and cache operations.
pub type Result<T> = std::result::Result<T, Error>;
