//! JSON-LD structured data extraction for detail pages.
//!
//! Modern pages embed a Schema.org `VideoObject` in `application/ld+json`
//! scripts; when present it beats any regex heuristic. This module scans all
//! such scripts, keeps the first block whose declared type names a video, and
//! otherwise shallow-merges every object found so partial data still helps.

use dom_query::{Document, Selection};
use serde_json::{Map, Value};

/// Find the structured-data object describing the page's video.
///
/// Scans every `application/ld+json` script: invalid JSON blocks are
/// skipped; `@graph` wrappers and top-level arrays are flattened one level.
/// The first object whose `@type` names a video wins outright; failing
/// that, all objects found are shallow-merged in document order (later
/// values overwrite earlier ones).
#[must_use]
pub(crate) fn extract_video_object(html: &str) -> Option<Map<String, Value>> {
    let doc = Document::from(html);
    let mut merged: Option<Map<String, Value>> = None;

    for script in doc.select(r#"script[type="application/ld+json"]"#).nodes() {
        let script_sel = Selection::from(*script);
        let json_text = script_sel.text().trim().to_string();
        if json_text.is_empty() {
            continue;
        }

        let data: Value = match serde_json::from_str(&json_text) {
            Ok(v) => v,
            Err(_) => continue,
        };

        for obj in flatten_objects(&data) {
            if is_video_type(obj) {
                return Some(obj.clone());
            }
            merged.get_or_insert_with(Map::new).extend(obj.clone());
        }
    }

    merged
}

/// Flatten a parsed JSON-LD value into its candidate objects.
fn flatten_objects(value: &Value) -> Vec<&Map<String, Value>> {
    match value {
        Value::Object(map) => {
            if let Some(Value::Array(graph)) = map.get("@graph") {
                let mut objs: Vec<&Map<String, Value>> =
                    graph.iter().filter_map(Value::as_object).collect();
                if objs.is_empty() {
                    objs.push(map);
                }
                objs
            } else {
                vec![map]
            }
        }
        Value::Array(arr) => arr.iter().filter_map(Value::as_object).collect(),
        _ => Vec::new(),
    }
}

/// True when the object's `@type` (string or array) names a video.
fn is_video_type(obj: &Map<String, Value>) -> bool {
    match obj.get("@type") {
        Some(Value::String(t)) => t.to_lowercase().contains("video"),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| t.to_lowercase().contains("video")),
        _ => false,
    }
}

/// Get a single trimmed string value; arrays yield their first string.
#[must_use]
pub(crate) fn single_string(data: &Map<String, Value>, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() { None } else { Some(s.to_string()) }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Array(arr) => arr
            .first()
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

/// Get a list of strings; a single string is split on commas.
#[must_use]
pub(crate) fn string_list(data: &Map<String, Value>, key: &str) -> Vec<String> {
    match data.get(key) {
        Some(Value::String(s)) => s
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        Some(Value::Array(arr)) => arr
            .iter()
            .filter_map(Value::as_str)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// View count from `interactionCount` or the nested interaction statistic.
#[must_use]
pub(crate) fn interaction_count(data: &Map<String, Value>) -> Option<String> {
    if let Some(count) = single_string(data, "interactionCount") {
        return Some(count);
    }

    let stat = data.get("interactionStatistic")?;
    let stats: Vec<&Map<String, Value>> = match stat {
        Value::Object(map) => vec![map],
        Value::Array(arr) => arr.iter().filter_map(Value::as_object).collect(),
        _ => Vec::new(),
    };
    stats
        .iter()
        .find_map(|s| single_string(s, "userInteractionCount"))
}

/// Rating percentage from `aggregateRating.ratingValue`.
#[must_use]
pub(crate) fn rating_value(data: &Map<String, Value>) -> Option<String> {
    let rating = data.get("aggregateRating")?.as_object()?;
    single_string(rating, "ratingValue")
}

/// Author name from a string or a nested `Person` object.
#[must_use]
pub(crate) fn author_name(data: &Map<String, Value>) -> Option<String> {
    match data.get("author")? {
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() { None } else { Some(s.to_string()) }
        }
        Value::Object(obj) => single_string(obj, "name"),
        _ => None,
    }
}
