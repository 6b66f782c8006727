//! Beatport release pages. Track lists are read from whichever embedded data
//! source is present: JSON-LD, the Next.js `__NEXT_DATA__` blob, or the older
//! `span[data-json]` markup.

use crate::adapters::http::HttpFetcher;
use crate::adapters::json_fields::{
    extract_release_id_from_obj, extract_track_id_from_any, extract_track_id_from_obj,
    extract_track_number_from_obj, get_string, id_from_url, parse_artists_field,
    parse_int_from_any, JsonObject,
};
use crate::adapters::selector;
use crate::domain::model::{AlbumData, AlbumTrack, StoreKind};
use crate::domain::ports::AlbumSource;
use crate::utils::error::{RenamerError, Result};
use async_trait::async_trait;
use scraper::Html;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Track id -> 1-based position on the release.
type OrderMap = HashMap<i64, i64>;

/// `"Title by Artist on Beatport"` -> `("Title", "Artist")`
pub fn parse_meta_title(s: &str) -> (String, String) {
    let s = s.replace(" on Beatport", "");
    let s = s.trim();
    match s.split_once(" by ") {
        Some((title, artist)) => (title.trim().to_string(), artist.trim().to_string()),
        None => (s.to_string(), String::new()),
    }
}

fn with_mix_name(title: String, obj: &JsonObject) -> String {
    let mix_name = get_string(obj, &["mixName", "mix_name"]);
    if !mix_name.is_empty() && !title.to_lowercase().contains(&mix_name.to_lowercase()) {
        format!("{} ({})", title.trim(), mix_name)
    } else {
        title
    }
}

fn artist_with_fallback(obj: &JsonObject) -> String {
    let artist = parse_artists_field(obj.get("artists"));
    if artist.is_empty() {
        parse_artists_field(obj.get("artist"))
    } else {
        artist
    }
}

/// Builds an album track from a Beatport track object. `position` is used when
/// neither the object nor the release order gives a number.
fn album_track_from_obj(
    obj: &JsonObject,
    title: String,
    artist: String,
    position: usize,
    order: &OrderMap,
) -> Option<AlbumTrack> {
    let track_id = extract_track_id_from_obj(obj);
    let title = with_mix_name(title, obj);
    let (mut track_num, mut explicit) = extract_track_number_from_obj(obj);
    if track_num == 0 && track_id != 0 {
        if let Some(&n) = order.get(&track_id) {
            track_num = n;
            explicit = true;
        }
    }
    if track_num == 0 {
        track_num = position as i64;
    }
    if title.is_empty() {
        return None;
    }
    Some(AlbumTrack {
        title,
        artist,
        track_num,
        track_num_explicit: explicit,
        track_id,
    })
}

fn tracks_from_objects(objs: &[&JsonObject], order: &OrderMap) -> Vec<AlbumTrack> {
    objs.iter()
        .enumerate()
        .filter_map(|(i, obj)| {
            album_track_from_obj(
                obj,
                get_string(obj, &["name", "title"]),
                artist_with_fallback(obj),
                i + 1,
                order,
            )
        })
        .collect()
}

// --- JSON-LD ---

#[derive(Debug, Default)]
struct LdRelease {
    tracks: Vec<AlbumTrack>,
    title: String,
    artist: String,
}

fn parse_ld_tracks(value: Option<&Value>) -> Vec<AlbumTrack> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let obj = item.as_object()?;
            let title = get_string(obj, &["name", "title"]);
            let mut artist = parse_artists_field(obj.get("byArtist"));
            if artist.is_empty() {
                artist = parse_artists_field(obj.get("artist"));
            }
            let (mut track_num, explicit) = extract_track_number_from_obj(obj);
            if track_num == 0 {
                track_num = i as i64 + 1;
            }
            if title.is_empty() {
                return None;
            }
            Some(AlbumTrack {
                title,
                artist,
                track_num,
                track_num_explicit: explicit,
                track_id: 0,
            })
        })
        .collect()
}

fn parse_ld_data(data: &Value) -> LdRelease {
    match data {
        Value::Array(items) => {
            let mut best = LdRelease::default();
            for item in items {
                let candidate = parse_ld_data(item);
                if candidate.tracks.len() > best.tracks.len() {
                    best = candidate;
                }
            }
            best
        }
        Value::Object(obj) => {
            if let Some(graph) = obj.get("@graph") {
                return parse_ld_data(graph);
            }
            let kind = get_string(obj, &["@type"]);
            if matches!(kind.as_str(), "MusicAlbum" | "MusicRelease" | "MusicPlaylist") {
                let mut artist = parse_artists_field(obj.get("byArtist"));
                if artist.is_empty() {
                    artist = parse_artists_field(obj.get("artist"));
                }
                return LdRelease {
                    tracks: parse_ld_tracks(obj.get("track")),
                    title: get_string(obj, &["name", "title"]),
                    artist,
                };
            }
            LdRelease::default()
        }
        _ => LdRelease::default(),
    }
}

fn parse_json_ld(document: &Html) -> Result<LdRelease> {
    let mut best = LdRelease::default();
    for script in document.select(&selector("script[type='application/ld+json']")?) {
        let raw: String = script.text().collect();
        let Ok(data) = serde_json::from_str::<Value>(raw.trim()) else {
            continue;
        };
        let candidate = parse_ld_data(&data);
        if candidate.tracks.len() > best.tracks.len() {
            best = candidate;
        }
    }
    Ok(best)
}

// --- __NEXT_DATA__ ---

fn build_order_map(value: &Value) -> OrderMap {
    let mut order = OrderMap::new();
    let Value::Array(items) = value else {
        return order;
    };
    let mut pos = 1;
    for item in items {
        let id = extract_track_id_from_any(item);
        if id != 0 && !order.contains_key(&id) {
            order.insert(id, pos);
            pos += 1;
        }
    }
    order
}

/// Finds the release object with the given id and reads its track order.
fn find_release_track_order(value: &Value, release_id: i64) -> OrderMap {
    match value {
        Value::Object(obj) => {
            if release_id != 0 && parse_int_from_any([obj.get("id")]) == release_id {
                if let Some(tracks) = obj.get("tracks") {
                    let order = build_order_map(tracks);
                    if !order.is_empty() {
                        return order;
                    }
                }
            }
            obj.values()
                .map(|nested| find_release_track_order(nested, release_id))
                .find(|order| !order.is_empty())
                .unwrap_or_default()
        }
        Value::Array(items) => items
            .iter()
            .map(|item| find_release_track_order(item, release_id))
            .find(|order| !order.is_empty())
            .unwrap_or_default(),
        _ => OrderMap::new(),
    }
}

fn tracks_from_dehydrated_state(data: &Value, release_id: i64, order: &OrderMap) -> Vec<AlbumTrack> {
    let queries = data
        .pointer("/props/pageProps/dehydratedState/queries")
        .and_then(Value::as_array);
    let Some(queries) = queries else {
        return Vec::new();
    };

    for query in queries {
        let Some(key) = query.get("queryKey").and_then(Value::as_array) else {
            continue;
        };
        if key.len() < 2 || key[0].as_str() != Some("tracks") {
            continue;
        }
        let Some(params) = key[1].as_object() else {
            continue;
        };
        if release_id != 0
            && parse_int_from_any([params.get("release_id"), params.get("releaseId")]) != release_id
        {
            continue;
        }
        let results = query
            .pointer("/state/data/results")
            .and_then(Value::as_array)
            .filter(|results| !results.is_empty());
        let Some(results) = results else {
            continue;
        };

        let objs: Vec<&JsonObject> = results.iter().filter_map(Value::as_object).collect();
        return tracks_from_objects(&objs, order);
    }
    Vec::new()
}

fn is_track_like(obj: &JsonObject) -> bool {
    !get_string(obj, &["name", "title"]).is_empty()
        && (obj.contains_key("artists") || obj.contains_key("artist"))
}

/// Every array whose elements are all track-like objects, depth first.
fn collect_track_arrays<'a>(value: &'a Value, out: &mut Vec<Vec<&'a JsonObject>>) {
    match value {
        Value::Object(obj) => {
            for nested in obj.values() {
                collect_track_arrays(nested, out);
            }
        }
        Value::Array(items) => {
            if !items.is_empty() {
                let objs: Option<Vec<&JsonObject>> = items
                    .iter()
                    .map(|item| item.as_object().filter(|obj| is_track_like(obj)))
                    .collect();
                if let Some(objs) = objs {
                    out.push(objs);
                }
            }
            for nested in items {
                collect_track_arrays(nested, out);
            }
        }
        _ => {}
    }
}

pub fn is_sequential_from_one(nums: &[i64], expected: usize) -> bool {
    if nums.is_empty() || nums.iter().any(|&n| n <= 0) {
        return false;
    }
    let seen: HashSet<i64> = nums.iter().copied().collect();
    if seen.len() != nums.len() {
        return false;
    }
    let expected = if expected == 0 { nums.len() } else { expected };
    (1..=expected as i64).all(|i| seen.contains(&i))
}

fn score_track_candidate(arr: &[&JsonObject], release_id: i64, order: &OrderMap) -> usize {
    let mut score = arr.len();
    let mut nums = Vec::new();
    let mut artist_count = 0;
    let mut release_match = 0;
    let mut release_seen = 0;
    let mut order_matches = 0;

    for obj in arr {
        let (num, _) = extract_track_number_from_obj(obj);
        if num > 0 {
            nums.push(num);
        }
        if obj.contains_key("artists") || obj.contains_key("artist") {
            artist_count += 1;
        }
        if release_id != 0 {
            let obj_release = extract_release_id_from_obj(obj);
            if obj_release != 0 {
                release_seen += 1;
                if obj_release == release_id {
                    release_match += 1;
                }
            }
        }
        let id = extract_track_id_from_obj(obj);
        if id != 0 && order.contains_key(&id) {
            order_matches += 1;
        }
    }

    score += artist_count;
    if !nums.is_empty() {
        score += nums.len() * 3;
        if is_sequential_from_one(&nums, arr.len()) {
            score += 200;
        } else if is_sequential_from_one(&nums, nums.len()) {
            score += 100;
        }
    }
    if release_id != 0 && release_seen > 0 {
        if release_match == release_seen && release_match >= arr.len() / 2 {
            score += 1000;
        } else if release_match > 0 {
            score += release_match * 10;
        }
    }
    if order_matches > 0 {
        score += order_matches * 5;
        if order_matches >= arr.len() / 2 {
            score += 50;
        }
    }
    score
}

/// Puts track objects in release order, falling back to their own numbering.
/// Returns the input order when neither gives a complete ordering.
fn order_track_objects<'a>(arr: &[&'a JsonObject], order: &OrderMap) -> Vec<&'a JsonObject> {
    if arr.is_empty() {
        return Vec::new();
    }

    if !order.is_empty() {
        let mut ordered = Vec::with_capacity(arr.len());
        let mut used = vec![false; arr.len()];
        for pos in 1..=order.len() as i64 {
            let found = arr.iter().enumerate().find(|(idx, obj)| {
                let id = extract_track_id_from_obj(obj);
                !used[*idx] && id != 0 && order.get(&id) == Some(&pos)
            });
            if let Some((idx, obj)) = found {
                ordered.push(*obj);
                used[idx] = true;
            }
        }
        if ordered.len() >= arr.len() / 2 {
            ordered.extend(
                arr.iter()
                    .enumerate()
                    .filter(|(idx, _)| !used[*idx])
                    .map(|(_, obj)| *obj),
            );
            return ordered;
        }
    }

    let nums: Vec<i64> = arr
        .iter()
        .map(|obj| extract_track_number_from_obj(obj).0)
        .filter(|&n| n > 0)
        .collect();
    if nums.is_empty() {
        return arr.to_vec();
    }
    if !is_sequential_from_one(&nums, arr.len()) && nums.len() < arr.len() / 2 {
        return arr.to_vec();
    }

    let mut ordered = Vec::with_capacity(arr.len());
    let mut used = vec![false; arr.len()];
    for pos in 1..=arr.len() as i64 {
        let found = arr
            .iter()
            .enumerate()
            .find(|(idx, obj)| !used[*idx] && extract_track_number_from_obj(obj).0 == pos);
        match found {
            Some((idx, obj)) => {
                ordered.push(*obj);
                used[idx] = true;
            }
            None => break,
        }
    }
    if ordered.len() == arr.len() {
        ordered
    } else {
        arr.to_vec()
    }
}

fn find_track_list_in_json(data: &Value, release_id: i64, order: &OrderMap) -> Vec<AlbumTrack> {
    let mut candidates = Vec::new();
    collect_track_arrays(data, &mut candidates);

    let mut best: Option<(&Vec<&JsonObject>, usize)> = None;
    for candidate in &candidates {
        let score = score_track_candidate(candidate, release_id, order);
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((candidate, score));
        }
    }
    let Some((best, _)) = best else {
        return Vec::new();
    };

    tracks_from_objects(&order_track_objects(best, order), order)
}

fn parse_next_data(document: &Html, release_id: i64) -> Result<(Vec<AlbumTrack>, OrderMap)> {
    let raw: String = document
        .select(&selector("script#__NEXT_DATA__")?)
        .next()
        .map(|script| script.text().collect())
        .unwrap_or_default();
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok((Vec::new(), OrderMap::new()));
    }
    let Ok(data) = serde_json::from_str::<Value>(raw) else {
        tracing::debug!("__NEXT_DATA__ is not valid JSON");
        return Ok((Vec::new(), OrderMap::new()));
    };

    let order = find_release_track_order(&data, release_id);
    let tracks = tracks_from_dehydrated_state(&data, release_id, &order);
    if !tracks.is_empty() {
        return Ok((tracks, order));
    }
    let tracks = find_track_list_in_json(&data, release_id, &order);
    Ok((tracks, order))
}

// --- span[data-json] ---

fn parse_data_json_spans(document: &Html, release_id: i64, order: &OrderMap) -> Result<Vec<AlbumTrack>> {
    let mut tracks = Vec::new();
    for span in document.select(&selector("span[data-json]")?) {
        let data = span.value().attr("data-json").unwrap_or_default().trim();
        if data.is_empty() {
            continue;
        }
        let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(data) else {
            continue;
        };
        if release_id != 0 {
            let obj_release = extract_release_id_from_obj(&obj);
            if obj_release != 0 && obj_release != release_id {
                continue;
            }
        }
        let track = album_track_from_obj(
            &obj,
            get_string(&obj, &["title", "name"]),
            parse_artists_field(obj.get("artists")),
            tracks.len() + 1,
            order,
        );
        tracks.extend(track);
    }
    Ok(tracks)
}

pub fn parse_beatport_page(html: &str, url: &str) -> Result<AlbumData> {
    let document = Html::parse_document(html);
    let mut album = AlbumData::new(StoreKind::Beatport);
    let release_id = id_from_url(url);

    let og_title = document
        .select(&selector("meta[property='og:title']")?)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .unwrap_or_default()
        .trim();
    if !og_title.is_empty() {
        let (title, artist) = parse_meta_title(og_title);
        album.title = title;
        album.artist = artist;
    }

    let ld = parse_json_ld(&document)?;
    if !ld.tracks.is_empty() {
        tracing::debug!("Beatport tracks read from JSON-LD");
        if album.title.is_empty() {
            album.title = ld.title;
        }
        if album.artist.is_empty() {
            album.artist = ld.artist;
        }
        album.tracks = ld.tracks;
        return Ok(album);
    }

    let (tracks, order) = parse_next_data(&document, release_id)?;
    if !tracks.is_empty() {
        tracing::debug!("Beatport tracks read from __NEXT_DATA__");
        album.tracks = tracks;
        return Ok(album);
    }

    let tracks = parse_data_json_spans(&document, release_id, &order)?;
    if !tracks.is_empty() {
        tracing::debug!("Beatport tracks read from data-json spans");
        album.tracks = tracks;
        return Ok(album);
    }

    Err(RenamerError::scrape("could not find Beatport track data on page"))
}

pub struct BeatportSource {
    fetcher: HttpFetcher,
}

impl BeatportSource {
    pub fn new(fetcher: HttpFetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl AlbumSource for BeatportSource {
    async fn fetch_album(&self, url: &str) -> Result<AlbumData> {
        let html = self.fetcher.get_html(url).await?;
        let album = parse_beatport_page(&html, url)?;
        tracing::info!(
            "💿 Beatport: '{}' by '{}' with {} track(s)",
            album.title,
            album.artist,
            album.tracks.len()
        );
        Ok(album)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(head: &str, body: &str) -> String {
        format!("<html><head>{}</head><body>{}</body></html>", head, body)
    }

    #[test]
    fn test_parse_meta_title() {
        assert_eq!(
            parse_meta_title("Night Moves EP by DJ One, DJ Two on Beatport"),
            ("Night Moves EP".to_string(), "DJ One, DJ Two".to_string())
        );
        assert_eq!(
            parse_meta_title("Untitled on Beatport"),
            ("Untitled".to_string(), String::new())
        );
    }

    #[test]
    fn test_json_ld_release() {
        let ld = json!({
            "@context": "https://schema.org",
            "@graph": [
                {"@type": "WebPage", "name": "ignored"},
                {
                    "@type": "MusicAlbum",
                    "name": "Deep Cuts",
                    "byArtist": [{"name": "Alpha"}, {"name": "Beta"}],
                    "track": [
                        {"name": "First", "byArtist": {"name": "Alpha"}},
                        {"name": "Second", "position": 2}
                    ]
                }
            ]
        });
        let html = page(
            &format!(
                r#"<meta property="og:title" content="Deep Cuts by Alpha on Beatport"><script type="application/ld+json">{}</script>"#,
                ld
            ),
            "",
        );

        let album = parse_beatport_page(&html, "https://www.beatport.com/release/deep-cuts/100").unwrap();
        assert_eq!(album.source, StoreKind::Beatport);
        assert_eq!(album.title, "Deep Cuts");
        assert_eq!(album.artist, "Alpha");
        assert_eq!(album.tracks.len(), 2);
        assert_eq!(album.tracks[0].artist, "Alpha");
        assert_eq!(album.tracks[0].track_num, 1);
        assert!(!album.tracks[0].track_num_explicit);
        assert_eq!(album.tracks[1].track_num, 2);
        assert!(album.tracks[1].track_num_explicit);
    }

    #[test]
    fn test_next_data_dehydrated_query_with_release_order() {
        let next = json!({
            "props": {"pageProps": {
                "release": {"id": 555, "tracks": [
                    "https://api.beatport.com/v4/catalog/tracks/12/",
                    "https://api.beatport.com/v4/catalog/tracks/11/"
                ]},
                "dehydratedState": {"queries": [
                    {"queryKey": ["release", {"id": 555}], "state": {"data": {}}},
                    {"queryKey": ["tracks", {"release_id": 555}], "state": {"data": {"results": [
                        {"id": 11, "name": "Later Tune", "mix_name": "Original Mix", "artists": [{"name": "Gamma"}]},
                        {"id": 12, "name": "Opener", "mix_name": "Extended Mix", "artists": [{"name": "Delta"}]}
                    ]}}}
                ]}
            }}
        });
        let html = page(
            "",
            &format!(r#"<script id="__NEXT_DATA__" type="application/json">{}</script>"#, next),
        );

        let album = parse_beatport_page(&html, "https://www.beatport.com/release/x/555").unwrap();
        assert_eq!(album.tracks.len(), 2);
        assert_eq!(album.tracks[0].title, "Later Tune (Original Mix)");
        assert_eq!(album.tracks[0].track_num, 2);
        assert!(album.tracks[0].track_num_explicit);
        assert_eq!(album.tracks[1].title, "Opener (Extended Mix)");
        assert_eq!(album.tracks[1].artist, "Delta");
        assert_eq!(album.tracks[1].track_num, 1);
    }

    #[test]
    fn test_next_data_generic_track_array_is_scored_and_ordered() {
        let next = json!({
            "props": {"pageProps": {
                "related": [
                    {"name": "Other", "artist": "X", "release": {"id": 9}}
                ],
                "tracks": [
                    {"id": 2, "name": "B Side", "artists": "Eps", "number": 2, "release": {"id": 77}},
                    {"id": 1, "name": "A Side", "artists": "Eps", "number": 1, "release": {"id": 77}}
                ]
            }}
        });
        let html = page(
            "",
            &format!(r#"<script id="__NEXT_DATA__" type="application/json">{}</script>"#, next),
        );

        let album = parse_beatport_page(&html, "https://www.beatport.com/release/x/77").unwrap();
        let titles: Vec<&str> = album.tracks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["A Side", "B Side"]);
        assert_eq!(album.tracks[0].track_id, 1);
    }

    #[test]
    fn test_data_json_spans_filter_by_release() {
        let html = page(
            "",
            r#"<span data-json='{"id": 1, "title": "Keep", "mixName": "Dub", "artists": ["Eta"], "release": {"id": 5}}'></span>
<span data-json='{"id": 2, "title": "Drop", "artists": ["Eta"], "release": {"id": 6}}'></span>
<span data-json='{"id": 3, "title": "Keep Too (Dub)", "mixName": "Dub", "artists": ["Eta"]}'></span>"#,
        );

        let album = parse_beatport_page(&html, "https://www.beatport.com/release/x/5").unwrap();
        assert_eq!(album.tracks.len(), 2);
        assert_eq!(album.tracks[0].title, "Keep (Dub)");
        assert_eq!(album.tracks[0].track_num, 1);
        assert!(!album.tracks[0].track_num_explicit);
        assert_eq!(album.tracks[1].title, "Keep Too (Dub)");
        assert_eq!(album.tracks[1].track_num, 2);
    }

    #[test]
    fn test_no_track_data_is_an_error() {
        let err = parse_beatport_page(&page("", "<p>empty</p>"), "https://www.beatport.com/release/x/1")
            .unwrap_err();
        assert_eq!(err.to_string(), "could not find Beatport track data on page");
    }

    #[test]
    fn test_is_sequential_from_one() {
        assert!(is_sequential_from_one(&[2, 1, 3], 3));
        assert!(!is_sequential_from_one(&[1, 1, 2], 3));
        assert!(!is_sequential_from_one(&[1, 3], 2));
        assert!(!is_sequential_from_one(&[], 0));
    }
}
