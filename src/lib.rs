//! # xxxgfporn-api
//!
//! Async scraping client for xxxgfporn.com - video metadata, listings,
//! search, and thumbnail handling.
//!
//! The site has no API, so everything here is best-effort extraction over
//! uncontrolled markup: list pages go through a cascade of strategies (card
//! containers, link scans, a tight markup template, then bare id matches),
//! and detail pages prefer JSON-LD structured data with page regexes and a
//! DOM walk as fallbacks.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xxxgfporn_api::{Client, Options};
//!
//! # async fn run() -> Result<(), xxxgfporn_api::Error> {
//! let client = Client::new(Options::default())?;
//!
//! let results = client.search("amateur", 1).await?;
//! for summary in &results {
//!     println!("{}: {:?}", summary.id, summary.title);
//! }
//!
//! let video = client.video("12345").await?;
//! println!("{:?} ({:?})", video.title(), video.duration());
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Listings**: search, categories, latest, popular, top rated, random
//! - **Detail pages**: lazily extracted metadata, JSON-LD first
//! - **Resilient fetching**: retries with exponential backoff, rate-limit
//!   and proxy-failure detection
//! - **Thumbnails**: md5-addressed disk cache with an optional blur or
//!   pixelation filter

mod client;
mod error;
mod image_cache;
mod list;
mod options;
mod patterns;
mod result;
mod structured;
mod url_utils;
mod video;

pub use client::{Client, SortOrder, TimeFilter};
pub use error::{Error, Result};
pub use image_cache::ImageCache;
pub use list::{parse_categories, parse_video_list, total_pages};
pub use options::{Options, DEFAULT_USER_AGENT};
pub use result::{CategoryEntry, VideoSummary};
pub use video::Video;
