//! Detail-page record with lazily computed fields.
//!
//! A [`Video`] is created from an id or a URL, populated by a single fetch,
//! and then answers field accessors from the stored page. Every field is
//! computed at most once: JSON-LD structured data is consulted first, page
//! regexes second, and for the thumbnail a DOM walk third.

use std::fmt;
use std::sync::OnceLock;

use dom_query::{Document, Selection};
use regex::Regex;
use serde_json::{json, Map, Value};

use crate::client::Client;
use crate::error::{Error, Result};
use crate::patterns::{
    DETAIL_CATEGORIES, DETAIL_DISLIKES, DETAIL_DURATION, DETAIL_DURATION_ALT, DETAIL_LIKES,
    DETAIL_PREVIEW, DETAIL_RATING, DETAIL_SOURCE, DETAIL_SOURCE_ALT, DETAIL_TAGS,
    DETAIL_THUMBNAIL, DETAIL_THUMBNAIL_ALT, DETAIL_TITLE, DETAIL_TITLE_TAG, DETAIL_UPLOADER,
    DETAIL_UPLOAD_DATE, DETAIL_VIEWS, DETAIL_VIEWS_ALT, ICON_CLASS, PLAYER_CLASS, ROOT_URL,
    SLUG_TRAILING_ID, THUMB_HINT, TITLE_SITE_SUFFIX, VIDEO_PATH_ID, VIDEO_TOKEN_ID, VIDEO_URL,
};
use crate::structured;
use crate::url_utils::{absolute_url, is_http_url};

/// How many leading characters of a page are checked for a 404 marker.
const NOT_FOUND_WINDOW: usize = 500;

/// A single video's detail page.
///
/// Accessors return `None` until [`Video::fetch`] has run (or the client
/// hydrated the record), and afterwards return whatever the page exposed.
/// Each field is extracted on first access and memoized.
#[derive(Debug, Default)]
pub struct Video {
    id: String,
    custom_url: Option<String>,
    html: Option<String>,
    structured: Option<Map<String, Value>>,

    title: OnceLock<Option<String>>,
    duration: OnceLock<Option<String>>,
    views: OnceLock<Option<String>>,
    rating: OnceLock<Option<String>>,
    likes: OnceLock<Option<String>>,
    dislikes: OnceLock<Option<String>>,
    uploader: OnceLock<Option<String>>,
    upload_date: OnceLock<Option<String>>,
    thumbnail: OnceLock<Option<String>>,
    preview: OnceLock<Option<String>>,
    categories: OnceLock<Vec<String>>,
    tags: OnceLock<Vec<String>>,
    source_url: OnceLock<Option<String>>,
    description: OnceLock<Option<String>>,
}

impl Video {
    /// Create a record from a video id, a slug, or a full detail URL.
    ///
    /// The id is normalized once here and never changes: a trailing `.html`
    /// is stripped, a purely numeric value is kept as-is, a slug with a
    /// trailing `-12345` collapses to the digits, and any other slug is kept
    /// whole. URLs keep their exact address for the later fetch.
    pub fn new(id_or_url: &str) -> Result<Self> {
        let raw = id_or_url.trim();
        if raw.is_empty() {
            return Err(Error::InvalidVideoId(id_or_url.to_string()));
        }

        let (candidate, custom_url) = if is_http_url(raw) {
            (id_from_url(raw), Some(raw.to_string()))
        } else if raw.contains('/') {
            (id_from_url(raw), None)
        } else {
            (raw.to_string(), None)
        };

        let id = normalize_id(&candidate);
        if id.is_empty() {
            return Err(Error::InvalidVideoId(id_or_url.to_string()));
        }

        Ok(Self {
            id,
            custom_url,
            ..Self::default()
        })
    }

    /// Normalized video id (numeric id or slug).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Detail-page URL this record fetches.
    #[must_use]
    pub fn url(&self) -> String {
        if let Some(url) = &self.custom_url {
            return url.clone();
        }
        if self.id.bytes().all(|b| b.is_ascii_digit()) {
            format!("{VIDEO_URL}{}/", self.id)
        } else {
            format!("{ROOT_URL}/{}/", self.id)
        }
    }

    /// True once the detail page has been fetched and stored.
    #[must_use]
    pub fn is_fetched(&self) -> bool {
        self.html.is_some()
    }

    /// Fetch the detail page and store it for field extraction.
    ///
    /// # Errors
    ///
    /// Propagates fetch failures, and returns [`Error::NotFound`] when the
    /// page is empty or carries a removed/404 marker.
    pub async fn fetch(&mut self, client: &Client) -> Result<()> {
        let html = client.fetch(&self.url()).await?;
        self.hydrate(html)
    }

    /// Store a fetched detail page after checking not-found markers.
    pub(crate) fn hydrate(&mut self, html: String) -> Result<()> {
        if html.trim().is_empty() {
            return Err(Error::NotFound(self.id.clone()));
        }

        let lower = html.to_lowercase();
        if lower.contains("video has been removed") || lower.contains("video not found") {
            return Err(Error::NotFound(self.id.clone()));
        }
        let head: String = lower.chars().take(NOT_FOUND_WINDOW).collect();
        if head.contains("404") {
            return Err(Error::NotFound(self.id.clone()));
        }

        let html = unescape_entities(&html);
        self.structured = structured::extract_video_object(&html);
        self.html = Some(html);
        Ok(())
    }

    /// Title with the site-brand suffix removed.
    pub fn title(&self) -> Option<&str> {
        self.title
            .get_or_init(|| {
                let raw = self
                    .structured_string("name")
                    .or_else(|| self.first_capture(&[&*DETAIL_TITLE, &*DETAIL_TITLE_TAG]))?;
                let cleaned = TITLE_SITE_SUFFIX.replace(&raw, "").trim().to_string();
                if cleaned.is_empty() { None } else { Some(cleaned) }
            })
            .as_deref()
    }

    /// Duration as a clock string, e.g. `5:30` or `1:05:09`.
    pub fn duration(&self) -> Option<&str> {
        self.duration
            .get_or_init(|| {
                if let Some(iso) = self.structured_string("duration") {
                    if let Some(formatted) = format_iso_duration(&iso) {
                        return Some(formatted);
                    }
                }
                self.first_capture(&[&*DETAIL_DURATION, &*DETAIL_DURATION_ALT])
            })
            .as_deref()
    }

    /// Duration in whole seconds, parsed from the clock string.
    pub fn duration_seconds(&self) -> Option<u64> {
        let mut total = 0u64;
        for part in self.duration()?.split(':') {
            total = total.checked_mul(60)?.checked_add(part.parse().ok()?)?;
        }
        Some(total)
    }

    /// View counter as displayed, e.g. `1,234,567`.
    pub fn views(&self) -> Option<&str> {
        self.views
            .get_or_init(|| {
                self.structured
                    .as_ref()
                    .and_then(structured::interaction_count)
                    .or_else(|| self.first_capture(&[&*DETAIL_VIEWS, &*DETAIL_VIEWS_ALT]))
            })
            .as_deref()
    }

    /// View counter as a number, separators stripped.
    pub fn views_count(&self) -> Option<u64> {
        let digits: String = self
            .views()?
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        digits.parse().ok()
    }

    /// Rating as a percentage string, e.g. `87%`.
    pub fn rating(&self) -> Option<&str> {
        self.rating
            .get_or_init(|| {
                if let Some(value) = self.structured.as_ref().and_then(structured::rating_value) {
                    let value = value.trim_end_matches('%').to_string();
                    return Some(format!("{value}%"));
                }
                self.first_capture(&[&*DETAIL_RATING])
            })
            .as_deref()
    }

    /// Like counter as displayed.
    pub fn likes(&self) -> Option<&str> {
        self.likes
            .get_or_init(|| self.first_capture(&[&*DETAIL_LIKES]))
            .as_deref()
    }

    /// Dislike counter as displayed.
    pub fn dislikes(&self) -> Option<&str> {
        self.dislikes
            .get_or_init(|| self.first_capture(&[&*DETAIL_DISLIKES]))
            .as_deref()
    }

    /// Uploader name.
    pub fn uploader(&self) -> Option<&str> {
        self.uploader
            .get_or_init(|| {
                self.structured
                    .as_ref()
                    .and_then(structured::author_name)
                    .or_else(|| self.first_capture(&[&*DETAIL_UPLOADER]))
            })
            .as_deref()
    }

    /// Upload date as the page states it.
    pub fn upload_date(&self) -> Option<&str> {
        self.upload_date
            .get_or_init(|| {
                self.structured_string("uploadDate")
                    .or_else(|| self.structured_string("datePublished"))
                    .or_else(|| self.first_capture(&[&*DETAIL_UPLOAD_DATE]))
            })
            .as_deref()
    }

    /// Thumbnail URL, resolved to absolute.
    ///
    /// Precedence: JSON-LD `thumbnailUrl`, thumb-classed `<img>`, inline
    /// JSON, `og:image`, `twitter:image`, the player `poster`, an image
    /// inside the player container, then any image whose source path hints
    /// at a thumbnail (chrome images excluded by class).
    pub fn thumbnail(&self) -> Option<&str> {
        self.thumbnail
            .get_or_init(|| {
                if let Some(url) = self.structured_string("thumbnailUrl") {
                    return Some(absolute_url(&url));
                }
                if let Some(url) =
                    self.first_capture(&[&*DETAIL_THUMBNAIL, &*DETAIL_THUMBNAIL_ALT])
                {
                    return Some(absolute_url(&url));
                }
                self.html.as_deref().and_then(dom_thumbnail)
            })
            .as_deref()
    }

    /// Animated preview URL from `data-preview`, resolved to absolute.
    pub fn preview(&self) -> Option<&str> {
        self.preview
            .get_or_init(|| {
                self.first_capture(&[&*DETAIL_PREVIEW])
                    .map(|url| absolute_url(&url))
            })
            .as_deref()
    }

    /// Category names from the page's taxonomy links, deduplicated.
    pub fn categories(&self) -> &[String] {
        self.categories.get_or_init(|| {
            let Some(html) = self.html.as_deref() else {
                return Vec::new();
            };
            dedup_trimmed(
                DETAIL_CATEGORIES
                    .captures_iter(html)
                    .map(|caps| caps[1].to_string()),
            )
        })
    }

    /// Tag names, JSON-LD `keywords` first, taxonomy links as fallback.
    pub fn tags(&self) -> &[String] {
        self.tags.get_or_init(|| {
            if let Some(data) = &self.structured {
                let keywords = structured::string_list(data, "keywords");
                if !keywords.is_empty() {
                    return dedup_trimmed(keywords.into_iter());
                }
            }
            let Some(html) = self.html.as_deref() else {
                return Vec::new();
            };
            dedup_trimmed(
                DETAIL_TAGS
                    .captures_iter(html)
                    .map(|caps| caps[1].to_string()),
            )
        })
    }

    /// Direct media URL (`contentUrl` or a `<source>` element).
    pub fn source_url(&self) -> Option<&str> {
        self.source_url
            .get_or_init(|| {
                self.structured_string("contentUrl")
                    .or_else(|| self.first_capture(&[&*DETAIL_SOURCE, &*DETAIL_SOURCE_ALT]))
                    .map(|url| absolute_url(&url))
            })
            .as_deref()
    }

    /// Description from structured data.
    pub fn description(&self) -> Option<&str> {
        self.description
            .get_or_init(|| self.structured_string("description"))
            .as_deref()
    }

    /// Serialize every field into one JSON object, forcing extraction.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id(),
            "url": self.url(),
            "title": self.title(),
            "duration": self.duration(),
            "duration_seconds": self.duration_seconds(),
            "views": self.views(),
            "views_count": self.views_count(),
            "rating": self.rating(),
            "likes": self.likes(),
            "dislikes": self.dislikes(),
            "uploader": self.uploader(),
            "upload_date": self.upload_date(),
            "thumbnail": self.thumbnail(),
            "preview": self.preview(),
            "categories": self.categories(),
            "tags": self.tags(),
            "source_url": self.source_url(),
            "description": self.description(),
        })
    }

    fn structured_string(&self, key: &str) -> Option<String> {
        self.structured
            .as_ref()
            .and_then(|data| structured::single_string(data, key))
    }

    /// First non-empty capture group across the given patterns, in order.
    fn first_capture(&self, patterns: &[&Regex]) -> Option<String> {
        let html = self.html.as_deref()?;
        patterns.iter().find_map(|re| {
            re.captures(html)
                .map(|caps| caps[1].trim().to_string())
                .filter(|s| !s.is_empty())
        })
    }
}

impl fmt::Display for Video {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title().unwrap_or("Unknown"), self.id)
    }
}

/// Extract an id candidate from a detail URL or path.
fn id_from_url(input: &str) -> String {
    if let Some(caps) = VIDEO_PATH_ID.captures(input) {
        return caps[1].to_string();
    }
    if let Some(caps) = VIDEO_TOKEN_ID.captures(input) {
        return caps[1].to_string();
    }
    input
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(input)
        .to_string()
}

/// Normalize a raw id candidate: strip `.html`, collapse trailing `-digits`.
fn normalize_id(candidate: &str) -> String {
    let candidate = candidate
        .trim()
        .trim_end_matches('/')
        .trim_end_matches(".html");
    if candidate.bytes().all(|b| b.is_ascii_digit()) {
        return candidate.to_string();
    }
    if let Some(caps) = SLUG_TRAILING_ID.captures(candidate) {
        return caps[1].to_string();
    }
    candidate.to_string()
}

/// Trim, drop empties, and dedup case-insensitively, keeping first spellings.
fn dedup_trimmed(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let item = item.trim().to_string();
        if item.is_empty() || !seen.insert(item.to_lowercase()) {
            continue;
        }
        out.push(item);
    }
    out
}

/// Decode the handful of entities the site leaves in titles and attributes.
///
/// `&amp;` is decoded last so it cannot manufacture new entities.
fn unescape_entities(html: &str) -> String {
    html.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Convert an ISO-8601 `PT#H#M#S` duration into a clock string.
fn format_iso_duration(value: &str) -> Option<String> {
    let rest = value.trim().strip_prefix("PT")?;
    let (mut hours, mut minutes, mut seconds) = (0u64, 0u64, 0u64);
    let mut buf = String::new();
    let mut matched = false;

    for ch in rest.chars() {
        if ch.is_ascii_digit() || ch == '.' {
            buf.push(ch);
            continue;
        }
        let number: f64 = buf.parse().ok()?;
        buf.clear();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let whole = number as u64;
        match ch.to_ascii_uppercase() {
            'H' => hours = whole,
            'M' => minutes = whole,
            'S' => seconds = whole,
            _ => return None,
        }
        matched = true;
    }

    if !matched {
        return None;
    }
    Some(if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    })
}

/// DOM fallback chain for the thumbnail when regexes found nothing.
fn dom_thumbnail(html: &str) -> Option<String> {
    let doc = Document::from(html);

    for selector in [r#"meta[property="og:image"]"#, r#"meta[name="twitter:image"]"#] {
        if let Some(content) = doc.select(selector).attr("content") {
            let content = content.trim().to_string();
            if !content.is_empty() {
                return Some(absolute_url(&content));
            }
        }
    }

    if let Some(poster) = doc.select("video[poster]").attr("poster") {
        let poster = poster.trim().to_string();
        if !poster.is_empty() {
            return Some(absolute_url(&poster));
        }
    }

    for node in doc.select("div[class]").nodes() {
        let sel = Selection::from(*node);
        let class = sel.attr("class").map(|c| c.to_string()).unwrap_or_default();
        if !PLAYER_CLASS.is_match(&class) {
            continue;
        }
        let img = sel.select("img");
        for attr in ["data-src", "src"] {
            if let Some(src) = img.attr(attr) {
                let src = src.trim().to_string();
                if !src.is_empty() && !src.starts_with("data:") {
                    return Some(absolute_url(&src));
                }
            }
        }
    }

    for node in doc.select("img").nodes() {
        let sel = Selection::from(*node);
        let class = sel.attr("class").map(|c| c.to_string()).unwrap_or_default();
        if ICON_CLASS.is_match(&class) {
            continue;
        }
        let src = sel
            .attr("data-src")
            .or_else(|| sel.attr("src"))
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        if src.is_empty() || src.starts_with("data:") {
            continue;
        }
        if THUMB_HINT.is_match(&src) {
            return Some(absolute_url(&src));
        }
    }

    None
}
