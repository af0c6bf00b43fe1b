//! Compiled regex patterns, site URLs, and exclusion tables.
//!
//! All patterns are compiled once at startup using `LazyLock`. The site's
//! markup is not under our control, so every pattern here is a best-effort
//! heuristic with documented precedence, not a guaranteed contract.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use regex::Regex;

// =============================================================================
// Site URLs
// =============================================================================

/// Site root, no trailing slash.
pub const ROOT_URL: &str = "https://www.xxxgfporn.com";

/// Detail-page prefix; numeric ids append directly.
pub const VIDEO_URL: &str = "https://www.xxxgfporn.com/video/";

/// Path-format search prefix.
pub const SEARCH_URL: &str = "https://www.xxxgfporn.com/search/";

/// Category listing prefix.
pub const CATEGORY_URL: &str = "https://www.xxxgfporn.com/categories/";

// =============================================================================
// Video Id Extraction
// =============================================================================

/// Numeric id inside a detail path: `/video/12345/`.
pub static VIDEO_PATH_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/video/(\d+)").expect("VIDEO_PATH_ID regex"));

/// Numeric id at the end of a detail path: `/video/12345/` or `/video/12345`.
pub static VIDEO_PATH_ID_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/video/(\d+)/?$").expect("VIDEO_PATH_ID_END regex"));

/// Numeric id glued to a `video` token: `video_12345`, `video-12345`.
pub static VIDEO_TOKEN_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"video[_-]?(\d+)").expect("VIDEO_TOKEN_ID regex"));

/// Slug segment at the end of a detail path, `.html` suffix stripped.
pub static VIDEO_SLUG_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?:video|videos|watch|v)/([^/]+?)(?:\.html)?/?$").expect("VIDEO_SLUG_END regex")
});

/// Numeric suffix of a dash-separated slug: `some-title-12345`.
pub static SLUG_TRAILING_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-(\d+)$").expect("SLUG_TRAILING_ID regex"));

/// Detail-URL shapes accepted by the link scan, tried in order.
pub static DETAIL_LINK_SHAPES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"/video/\d+", r"/videos/[^/]+", r"/watch/[^/]+", r"/v/[^/]+"]
        .iter()
        .map(|p| Regex::new(p).expect("DETAIL_LINK_SHAPES regex"))
        .collect()
});

// =============================================================================
// List-Page Class Heuristics
// =============================================================================

/// Class names marking a video card / grid entry container.
pub static CONTAINER_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(video[_-]?item|vid-item|video-block|thumb|\bitem\b|\bpost\b|col-|grid-item|card)")
        .expect("CONTAINER_CLASS regex")
});

/// Looser container classes whose inner links are still worth id-extracting
/// when no anchor on the page matches a known detail-URL shape.
pub static LINK_CONTAINER_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(video|thumb|item|post)").expect("LINK_CONTAINER_CLASS regex")
});

/// Class names marking a title/name element inside a container.
pub static TITLE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(title|name)").expect("TITLE_CLASS regex"));

/// Class names marking a duration badge.
pub static DURATION_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(duration|\btime\b|length)").expect("DURATION_CLASS regex")
});

/// Class names marking a view counter.
pub static VIEWS_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(views|view-count)").expect("VIEWS_CLASS regex"));

/// Class names marking a rating badge.
pub static RATING_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(rating|percent)").expect("RATING_CLASS regex"));

/// Class names marking the player area on a detail page.
pub static PLAYER_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(player|video-container|video-wrapper)").expect("PLAYER_CLASS regex")
});

/// Class names marking chrome images (never thumbnails).
pub static ICON_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(icon|logo|avatar|\bad\b)").expect("ICON_CLASS regex"));

/// Source-path hints that an image is a thumbnail/poster.
pub static THUMB_HINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(thumb|poster|preview|player)").expect("THUMB_HINT regex"));

// =============================================================================
// Detail-Page Field Patterns (regex fallbacks after JSON-LD)
// =============================================================================

/// `<h1 class="...title...">` heading.
pub static DETAIL_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<h1[^>]*class="[^"]*title[^"]*"[^>]*>([^<]+)</h1>"#)
        .expect("DETAIL_TITLE regex")
});

/// `<title>` element, cleaned of the site suffix afterwards.
pub static DETAIL_TITLE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<title>([^<]+)</title>").expect("DETAIL_TITLE_TAG regex"));

/// Trailing site-brand suffix on titles: `- Free Porn Video at XXXGFPORN`.
pub static TITLE_SITE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*[-|\x{2013}\x{2014}]\s*(Free\s+)?(Porn\s+)?(Video\s+)?(at\s+)?XXXGFPORN.*$")
        .expect("TITLE_SITE_SUFFIX regex")
});

/// Duration badge on the detail page.
pub static DETAIL_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<span[^>]*class="[^"]*duration[^"]*"[^>]*>(\d+:\d+(?::\d+)?)</span>"#)
        .expect("DETAIL_DURATION regex")
});

/// Duration in inline player config or escaped JSON.
pub static DETAIL_DURATION_ALT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"duration"[:\s]*"?(\d+:\d+(?::\d+)?)"?"#).expect("DETAIL_DURATION_ALT regex")
});

/// View counter on the detail page.
pub static DETAIL_VIEWS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<span[^>]*class="[^"]*views[^"]*"[^>]*>([0-9,]+)</span>"#)
        .expect("DETAIL_VIEWS regex")
});

/// View counter in inline JSON.
pub static DETAIL_VIEWS_ALT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"viewCount"[:\s]*"?([0-9,]+)"?"#).expect("DETAIL_VIEWS_ALT regex")
});

/// Rating badge.
pub static DETAIL_RATING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<span[^>]*class="[^"]*rating[^"]*"[^>]*>([0-9.]+%?)</span>"#)
        .expect("DETAIL_RATING regex")
});

/// Like counter.
pub static DETAIL_LIKES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<span[^>]*class="[^"]*likes[^"]*"[^>]*>([0-9,]+)</span>"#)
        .expect("DETAIL_LIKES regex")
});

/// Dislike counter.
pub static DETAIL_DISLIKES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<span[^>]*class="[^"]*dislikes[^"]*"[^>]*>([0-9,]+)</span>"#)
        .expect("DETAIL_DISLIKES regex")
});

/// Uploader link into the members area.
pub static DETAIL_UPLOADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a[^>]*href="[^"]*members[^"]*"[^>]*>([^<]+)</a>"#)
        .expect("DETAIL_UPLOADER regex")
});

/// Upload date badge.
pub static DETAIL_UPLOAD_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<span[^>]*class="[^"]*date[^"]*"[^>]*>([^<]+)</span>"#)
        .expect("DETAIL_UPLOAD_DATE regex")
});

/// Category taxonomy links.
pub static DETAIL_CATEGORIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a[^>]*href="[^"]*categor[^"]*"[^>]*>([^<]+)</a>"#)
        .expect("DETAIL_CATEGORIES regex")
});

/// Tag taxonomy links.
pub static DETAIL_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a[^>]*href="[^"]*tag[^"]*"[^>]*>([^<]+)</a>"#).expect("DETAIL_TAGS regex")
});

/// Thumbnail image with a thumb-classed `<img>`.
pub static DETAIL_THUMBNAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img[^>]*class="[^"]*thumb[^"]*"[^>]*src="([^"]+)""#)
        .expect("DETAIL_THUMBNAIL regex")
});

/// Thumbnail URL in inline JSON.
pub static DETAIL_THUMBNAIL_ALT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"thumbnailUrl"[:\s]*"([^"]+)""#).expect("DETAIL_THUMBNAIL_ALT regex")
});

/// Animated preview attribute.
pub static DETAIL_PREVIEW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)data-preview="([^"]+)""#).expect("DETAIL_PREVIEW regex")
});

/// Direct mp4 source element.
pub static DETAIL_SOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<source[^>]*src="([^"]+)"[^>]*type="video/mp4""#)
        .expect("DETAIL_SOURCE regex")
});

/// Direct source URL in inline JSON.
pub static DETAIL_SOURCE_ALT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"contentUrl"[:\s]*"([^"]+)""#).expect("DETAIL_SOURCE_ALT regex")
});

// =============================================================================
// List-Page Template and Pagination
// =============================================================================

/// Tight list-item template: container, link, image, title span.
///
/// Strategy 3 of the list cascade; all three captures are required.
pub static LIST_ITEM_TEMPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<div[^>]*class="[^"]*video[_-]?item[^"]*"[^>]*>.*?<a[^>]*href="([^"]+)"[^>]*>.*?<img[^>]*src="([^"]+)"[^>]*>.*?<span[^>]*class="[^"]*title[^"]*"[^>]*>([^<]+)</span>"#,
    )
    .expect("LIST_ITEM_TEMPLATE regex")
});

/// "Last" pagination link carrying the total page count.
pub static PAGINATION_LAST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a[^>]*href="[^"]*[?&]page=(\d+)"[^>]*>(?:Last|\x{bb}|>>)</a>"#)
        .expect("PAGINATION_LAST regex")
});

/// Category taxonomy path with slug capture.
pub static CATEGORY_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/categor[yi]/([^/]+)").expect("CATEGORY_SLUG regex"));

// =============================================================================
// Exclusion Tables
// =============================================================================

/// Known category/tag/navigation slugs that are never video ids.
pub const EXCLUDED_SLUGS: &[&str] = &[
    "amateur", "anal", "asian", "bbw", "big-tits", "blonde", "blowjob", "brunette", "creampie",
    "cumshot", "hardcore", "lesbian", "mature", "milf", "teen", "threesome", "categories", "tags",
    "channels", "pornstars", "popular", "latest", "top-rated", "most-viewed", "random", "search",
    "login", "register", "contact", "privacy", "terms", "dmca", "2257", "about", "girlfriend",
    "homemade", "pov", "interracial", "redhead", "ebony", "latina", "category", "tag",
];

/// Path fragments marking navigation/taxonomy links skipped by the link scan.
pub const EXCLUDED_PATHS: &[&str] = &[
    "/category", "/tag", "/search", "/page/", "javascript:", "/login", "/register", "/categories/",
    "/tags/", "/pornstars/", "/channels/",
];

/// True when an extracted id collides with a known taxonomy slug.
#[must_use]
pub fn is_excluded_slug(id: &str) -> bool {
    let lower = id.to_lowercase();
    EXCLUDED_SLUGS.contains(&lower.as_str())
}

/// True when an href points at navigation rather than a video.
#[must_use]
pub fn is_excluded_path(href: &str) -> bool {
    let lower = href.to_lowercase();
    EXCLUDED_PATHS.iter().any(|p| lower.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_path_id_matches_numeric_paths() {
        let caps = VIDEO_PATH_ID_END.captures("/video/12345/");
        assert_eq!(caps.and_then(|c| c.get(1)).map(|m| m.as_str()), Some("12345"));
        assert!(VIDEO_PATH_ID_END.captures("/video/slug-name/").is_none());
    }

    #[test]
    fn slug_end_strips_html_suffix() {
        let caps = VIDEO_SLUG_END.captures("/video/hot-scene-991.html");
        assert_eq!(caps.and_then(|c| c.get(1)).map(|m| m.as_str()), Some("hot-scene-991"));
    }

    #[test]
    fn title_suffix_strips_site_brand() {
        let cleaned = TITLE_SITE_SUFFIX.replace("Hot Scene - Free Porn Video at XXXGFPORN", "");
        assert_eq!(cleaned, "Hot Scene");

        let cleaned = TITLE_SITE_SUFFIX.replace("Some Clip | XXXGFPORN.com", "");
        assert_eq!(cleaned, "Some Clip");

        let untouched = TITLE_SITE_SUFFIX.replace("Plain Title - Part 2", "");
        assert_eq!(untouched, "Plain Title - Part 2");
    }

    #[test]
    fn list_item_template_captures_three_groups() {
        let html = r#"<div class="video_item"><a href="/video/7/"><img src="/t/7.jpg"><span class="title">Seven</span></a></div>"#;
        let caps = LIST_ITEM_TEMPLATE.captures(html).expect("template match");
        assert_eq!(&caps[1], "/video/7/");
        assert_eq!(&caps[2], "/t/7.jpg");
        assert_eq!(&caps[3], "Seven");
    }

    #[test]
    fn excluded_slug_check_is_case_insensitive() {
        assert!(is_excluded_slug("Amateur"));
        assert!(is_excluded_slug("top-rated"));
        assert!(!is_excluded_slug("12345"));
        assert!(!is_excluded_slug("hot-scene-991"));
    }

    #[test]
    fn excluded_path_flags_navigation_links() {
        assert!(is_excluded_path("/categories/teen/"));
        assert!(is_excluded_path("https://example.com/Login"));
        assert!(!is_excluded_path("/video/42/"));
    }

    #[test]
    fn container_class_accepts_common_card_markup() {
        assert!(CONTAINER_CLASS.is_match("video-item"));
        assert!(CONTAINER_CLASS.is_match("video_item thumb"));
        assert!(CONTAINER_CLASS.is_match("col-md-4"));
        assert!(CONTAINER_CLASS.is_match("grid-item"));
        assert!(!CONTAINER_CLASS.is_match("navbar"));
    }

    #[test]
    fn detail_duration_matches_clock_strings() {
        let html = r#"<span class="duration">12:34</span>"#;
        assert_eq!(
            DETAIL_DURATION.captures(html).map(|c| c[1].to_string()),
            Some("12:34".to_string())
        );
        let html = r#"<span class="video-duration">1:02:03</span>"#;
        assert_eq!(
            DETAIL_DURATION.captures(html).map(|c| c[1].to_string()),
            Some("1:02:03".to_string())
        );
    }

    #[test]
    fn pagination_last_extracts_page_count() {
        let html = r#"<a href="/latest/?page=17">Last</a>"#;
        assert_eq!(
            PAGINATION_LAST.captures(html).map(|c| c[1].to_string()),
            Some("17".to_string())
        );
    }
}
