//! Lenient accessors for the loosely shaped JSON embedded in store pages.

use serde_json::{Map, Value};

pub type JsonObject = Map<String, Value>;

const TRACK_NUMBER_KEYS: [&str; 6] = [
    "trackNumber",
    "track_number",
    "position",
    "number",
    "index",
    "trackNo",
];

/// First of `keys` that holds a string, trimmed.
pub fn get_string(obj: &JsonObject, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Accepts `"A"`, `{"name": "A"}` or a list of either, joined with `, `.
pub fn parse_artists_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Object(obj)) => get_string(obj, &["name"]),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Object(obj) => Some(get_string(obj, &["name"])),
                _ => None,
            })
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        _ => String::new(),
    }
}

/// First value that reads as an integer: positive numbers, or numeric strings.
pub fn parse_int_from_any<'a>(values: impl IntoIterator<Item = Option<&'a Value>>) -> i64 {
    for value in values.into_iter().flatten() {
        match value {
            Value::Number(n) => {
                if let Some(f) = n.as_f64() {
                    if f > 0.0 {
                        return f as i64;
                    }
                }
            }
            Value::String(s) => {
                if let Ok(n) = s.trim().parse::<i64>() {
                    return n;
                }
            }
            _ => {}
        }
    }
    0
}

/// Returns the number and whether any track-number key was present at all.
pub fn extract_track_number_from_obj(obj: &JsonObject) -> (i64, bool) {
    let present: Vec<&Value> = TRACK_NUMBER_KEYS.iter().filter_map(|key| obj.get(*key)).collect();
    if present.is_empty() {
        return (0, false);
    }
    (parse_int_from_any(present.into_iter().map(Some)), true)
}

pub fn extract_track_id_from_obj(obj: &JsonObject) -> i64 {
    parse_int_from_any([obj.get("id"), obj.get("trackId"), obj.get("track_id")])
}

pub fn extract_release_id_from_obj(obj: &JsonObject) -> i64 {
    if let Some(v) = obj.get("releaseId") {
        return parse_int_from_any([Some(v)]);
    }
    if let Some(v) = obj.get("release_id") {
        return parse_int_from_any([Some(v)]);
    }
    if let Some(Value::Object(release)) = obj.get("release") {
        return parse_int_from_any([
            release.get("id"),
            release.get("releaseId"),
            release.get("release_id"),
        ]);
    }
    0
}

/// Numeric last path segment, e.g. `.../release/name/4242` -> 4242.
pub fn id_from_url(url: &str) -> i64 {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|last| last.parse::<i64>().ok())
        .unwrap_or(0)
}

pub fn extract_track_id_from_any(value: &Value) -> i64 {
    match value {
        Value::String(s) => id_from_url(s),
        Value::Object(obj) => {
            let id = extract_track_id_from_obj(obj);
            if id != 0 {
                return id;
            }
            obj.get("url").and_then(Value::as_str).map(id_from_url).unwrap_or(0)
        }
        Value::Number(_) => parse_int_from_any([Some(value)]),
        _ => 0,
    }
}
