//! Output records produced by list-page scans.
//!
//! These are plain data carriers: the extractor fills in whatever the
//! markup offered and leaves the rest `None`.

use serde::{Deserialize, Serialize};

/// One video entry recovered from a listing page.
///
/// Only `id` and `url` are guaranteed; everything else depends on which
/// extraction strategy produced the record and how much the markup exposed.
/// Records are emitted in document order, deduplicated by `id` within one
/// page scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSummary {
    /// Numeric id or slug extracted from the detail link.
    pub id: String,

    /// Absolute detail-page URL.
    pub url: String,

    /// Display title, if the card exposed one.
    pub title: Option<String>,

    /// Absolute thumbnail URL (`data-src` preferred over `src`).
    pub thumbnail: Option<String>,

    /// Animated preview URL (`data-preview`/`data-gif`), if present.
    pub preview: Option<String>,

    /// Duration badge text, e.g. `12:34`.
    pub duration: Option<String>,

    /// View counter text as displayed.
    pub views: Option<String>,

    /// Rating badge text as displayed.
    pub rating: Option<String>,
}

/// One category entry from the categories listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    /// Display name.
    pub name: String,

    /// Taxonomy slug from the link path.
    pub slug: String,

    /// Absolute category-page URL.
    pub url: String,
}
