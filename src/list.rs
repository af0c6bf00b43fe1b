//! Listing-page extraction: the video-list strategy cascade.
//!
//! The target site's markup varies across page types and changes without
//! notice, so extraction runs a fixed cascade of strategies ordered from
//! highest to lowest precision, stopping at the first one that yields at
//! least one record:
//!
//! 1. container scan - class-matched card/grid elements
//! 2. link scan - any anchor shaped like a detail URL, else any anchor
//!    inside a card-like container
//! 3. template scan - one tight container/link/img/title regex
//! 4. bare-id scan - every distinct `/video/<digits>` occurrence
//!
//! Per-item extraction failures are skipped silently; a page where every
//! strategy comes up empty yields an empty vec, not an error.

use std::collections::HashSet;

use dom_query::{Document, Selection};
use regex::Regex;
use tracing::debug;

use crate::patterns::{
    is_excluded_path, is_excluded_slug, CATEGORY_SLUG, CONTAINER_CLASS, DETAIL_LINK_SHAPES,
    DURATION_CLASS, LINK_CONTAINER_CLASS, LIST_ITEM_TEMPLATE, PAGINATION_LAST, RATING_CLASS,
    SLUG_TRAILING_ID, TITLE_CLASS, VIDEO_PATH_ID, VIDEO_PATH_ID_END, VIDEO_SLUG_END, VIDEO_URL,
    VIEWS_CLASS,
};
use crate::result::{CategoryEntry, VideoSummary};
use crate::url_utils::absolute_url;

/// Extract video summaries from one listing page.
///
/// Finite and not restartable: re-invoke with the same HTML to re-scan.
/// Records follow document order and are deduplicated by id.
#[must_use]
pub fn parse_video_list(html: &str) -> Vec<VideoSummary> {
    let doc = Document::from(html);

    let found = scan_containers(&doc);
    if !found.is_empty() {
        debug!(count = found.len(), strategy = "container", "video list parsed");
        return found;
    }

    let found = scan_links(&doc);
    if !found.is_empty() {
        debug!(count = found.len(), strategy = "link", "video list parsed");
        return found;
    }

    let found = scan_template(html);
    if !found.is_empty() {
        debug!(count = found.len(), strategy = "template", "video list parsed");
        return found;
    }

    let found = scan_bare_ids(html);
    debug!(count = found.len(), strategy = "bare-id", "video list parsed");
    found
}

/// Extract the category index from the categories listing page.
#[must_use]
pub fn parse_categories(html: &str) -> Vec<CategoryEntry> {
    let doc = Document::from(html);
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for node in doc.select("a[href]").nodes() {
        let link = Selection::from(*node);
        let Some(href) = link.attr("href").map(|h| h.to_string()) else {
            continue;
        };
        let Some(caps) = CATEGORY_SLUG.captures(&href) else {
            continue;
        };
        let slug = caps[1].to_string();
        let name = link.text().trim().to_string();
        if name.is_empty() || !seen.insert(slug.clone()) {
            continue;
        }
        out.push(CategoryEntry {
            name,
            slug,
            url: absolute_url(&href),
        });
    }

    out
}

/// Total page count from the pagination footer, 1 when absent.
#[must_use]
pub fn total_pages(html: &str) -> u32 {
    PAGINATION_LAST
        .captures(html)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(1)
}

/// Derive a video id from a detail href.
///
/// A trailing numeric path segment wins; otherwise the slug's trailing
/// `-digits` suffix; otherwise the slug itself unless it collides with a
/// known taxonomy slug.
pub(crate) fn extract_video_id(href: &str) -> Option<String> {
    if let Some(caps) = VIDEO_PATH_ID_END.captures(href) {
        return Some(caps[1].to_string());
    }

    let caps = VIDEO_SLUG_END.captures(href)?;
    let slug = caps.get(1)?.as_str();
    if let Some(caps) = SLUG_TRAILING_ID.captures(slug) {
        return Some(caps[1].to_string());
    }
    if is_excluded_slug(slug) {
        None
    } else {
        Some(slug.to_string())
    }
}

// === Strategy 1: container scan ===

fn scan_containers(doc: &Document) -> Vec<VideoSummary> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for node in doc.select("div[class], article[class], li[class]").nodes() {
        let container = Selection::from(*node);
        let Some(class) = container.attr("class").map(|c| c.to_string()) else {
            continue;
        };
        if !CONTAINER_CLASS.is_match(&class) {
            continue;
        }
        let Some(summary) = summary_from_container(&container) else {
            continue;
        };
        if is_excluded_slug(&summary.id) || !seen.insert(summary.id.clone()) {
            continue;
        }
        out.push(summary);
    }

    out
}

fn summary_from_container(container: &Selection) -> Option<VideoSummary> {
    let links = container.select(r#"a[href*="/video/"]"#);
    let link = Selection::from(*links.nodes().first()?);
    let href = link.attr("href")?.to_string();
    let id = extract_video_id(&href)?;

    let mut summary = VideoSummary {
        id,
        url: absolute_url(&href),
        ..VideoSummary::default()
    };

    let images = container.select("img");
    if let Some(img_node) = images.nodes().first() {
        let img = Selection::from(*img_node);
        if let Some(src) = preferred_image_src(&img) {
            summary.thumbnail = Some(absolute_url(&src));
        }
        for attr in ["data-preview", "data-gif"] {
            if let Some(preview) = img.attr(attr) {
                summary.preview = Some(absolute_url(&preview));
                break;
            }
        }
    }

    summary.title = find_title(container, &link);
    summary.duration = text_by_class(container, &DURATION_CLASS);
    summary.views = text_by_class(container, &VIEWS_CLASS);
    summary.rating = text_by_class(container, &RATING_CLASS);

    Some(summary)
}

// === Strategy 2: link scan ===

fn scan_links(doc: &Document) -> Vec<VideoSummary> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for node in doc.select("a[href]").nodes() {
        let link = Selection::from(*node);
        let Some(href) = link.attr("href").map(|h| h.to_string()) else {
            continue;
        };
        if !DETAIL_LINK_SHAPES.iter().any(|shape| shape.is_match(&href)) {
            continue;
        }
        collect_link(&link, &href, &mut seen, &mut out);
    }

    // No anchor matched a known detail shape. Links inside card-like
    // containers still count, with the shape check relaxed; this is what
    // recovers plain-slug detail paths like `/video/some-slug/`.
    if out.is_empty() {
        for node in doc.select("div[class], article[class], li[class]").nodes() {
            let container = Selection::from(*node);
            let Some(class) = container.attr("class").map(|c| c.to_string()) else {
                continue;
            };
            if !LINK_CONTAINER_CLASS.is_match(&class) {
                continue;
            }
            for link_node in container.select("a[href]").nodes() {
                let link = Selection::from(*link_node);
                let Some(href) = link.attr("href").map(|h| h.to_string()) else {
                    continue;
                };
                collect_link(&link, &href, &mut seen, &mut out);
            }
        }
    }

    out
}

/// Vet one candidate link and append its summary if it yields a new id.
fn collect_link(
    link: &Selection,
    href: &str,
    seen: &mut HashSet<String>,
    out: &mut Vec<VideoSummary>,
) {
    if href.is_empty() || href == "#" || href == "/" || is_excluded_path(href) {
        return;
    }
    let Some(id) = extract_video_id(href) else {
        return;
    };
    if is_excluded_slug(&id) || !seen.insert(id.clone()) {
        return;
    }

    let mut summary = VideoSummary {
        id,
        url: absolute_url(href),
        ..VideoSummary::default()
    };

    if let Some(block) = nearest_block(link) {
        let images = block.select("img");
        if let Some(img_node) = images.nodes().first() {
            if let Some(src) = preferred_image_src(&Selection::from(*img_node)) {
                summary.thumbnail = Some(absolute_url(&src));
            }
        }
        summary.title = find_title(&block, link);
    } else {
        summary.title = link_title(link);
    }

    out.push(summary);
}

/// Walk up to the nearest block-level ancestor that could be a video card.
fn nearest_block<'a>(sel: &Selection<'a>) -> Option<Selection<'a>> {
    let mut current = sel.parent();
    for _ in 0..5 {
        let node = *current.nodes().first()?;
        if let Some(tag) = node.node_name() {
            if matches!(tag.as_ref(), "div" | "article" | "li" | "section") {
                return Some(current);
            }
        }
        current = current.parent();
    }
    None
}

// === Strategy 3: template scan ===

fn scan_template(html: &str) -> Vec<VideoSummary> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for caps in LIST_ITEM_TEMPLATE.captures_iter(html) {
        let href = &caps[1];
        let Some(id) = VIDEO_PATH_ID.captures(href).map(|c| c[1].to_string()) else {
            continue;
        };
        if !seen.insert(id.clone()) {
            continue;
        }
        out.push(VideoSummary {
            url: absolute_url(href),
            thumbnail: Some(absolute_url(&caps[2])),
            title: Some(caps[3].trim().to_string()),
            id,
            ..VideoSummary::default()
        });
    }

    out
}

// === Strategy 4: bare-id scan ===

fn scan_bare_ids(html: &str) -> Vec<VideoSummary> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for caps in VIDEO_PATH_ID.captures_iter(html) {
        let id = caps[1].to_string();
        if seen.insert(id.clone()) {
            out.push(VideoSummary {
                url: format!("{VIDEO_URL}{id}/"),
                id,
                ..VideoSummary::default()
            });
        }
    }

    out
}

// === Shared heuristics ===

/// Image source attribute priority: `data-src`, then `src`, then
/// `data-lazy-src`. Inline `data:` URIs are rejected.
fn preferred_image_src(img: &Selection) -> Option<String> {
    for attr in ["data-src", "src", "data-lazy-src"] {
        if let Some(src) = img.attr(attr) {
            let src = src.trim().to_string();
            if !src.is_empty() && !src.starts_with("data:") {
                return Some(src);
            }
        }
    }
    None
}

/// First descendant whose class matches, with non-empty trimmed text.
fn text_by_class(scope: &Selection, class_pattern: &Regex) -> Option<String> {
    for node in scope.select("[class]").nodes() {
        let el = Selection::from(*node);
        let Some(class) = el.attr("class") else {
            continue;
        };
        if !class_pattern.is_match(&class) {
            continue;
        }
        let text = el.text().trim().to_string();
        if !text.is_empty() {
            return Some(text);
        }
    }
    None
}

/// Title heuristic: title-classed element, else the link's own title/text.
fn find_title(scope: &Selection, link: &Selection) -> Option<String> {
    text_by_class(scope, &TITLE_CLASS).or_else(|| link_title(link))
}

fn link_title(link: &Selection) -> Option<String> {
    if let Some(title) = link.attr("title") {
        let title = title.trim().to_string();
        if !title.is_empty() {
            return Some(title);
        }
    }
    let text = link.text().trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
