use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub const STATUS_MATCHED: &str = "Matched";
pub const STATUS_NO_MATCH: &str = "No Match";

/// 欄位存在但為 null 時視同缺少
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Gemini 從檔名推測出的曲目資訊
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedTrack {
    #[serde(deserialize_with = "null_as_default")]
    pub original_filename: String,
    #[serde(deserialize_with = "null_as_default")]
    pub artist: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub track_number: String,
}

/// 資料夾中的音訊檔，附帶內嵌的標籤
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocalTrack {
    #[serde(deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(deserialize_with = "null_as_default")]
    pub original_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tag_artist: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tag_title: String,
}

/// 一個本地檔案的改名提案
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchedTrack {
    #[serde(deserialize_with = "null_as_default")]
    pub local_path: String,
    #[serde(deserialize_with = "null_as_default")]
    pub original_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub proposed_new_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub confidence: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
}

impl MatchedTrack {
    /// 沒有任何推測時，保留原檔名
    pub fn unmatched(local: &LocalTrack) -> Self {
        Self {
            local_path: local.path.clone(),
            original_name: local.original_name.clone(),
            proposed_new_name: local.original_name.clone(),
            confidence: 0.0,
            status: STATUS_NO_MATCH.to_string(),
        }
    }

    pub fn is_unchanged(&self) -> bool {
        self.original_name == self.proposed_new_name
    }
}

/// Builds a record from a loosely typed source: a JSON object, a JSON-encoded
/// string of one, or null. Missing keys become empty values.
pub trait FromSource: DeserializeOwned + Default {
    fn create_from(source: serde_json::Value) -> Result<Self> {
        match source {
            serde_json::Value::Null => Ok(Self::default()),
            serde_json::Value::String(raw) => Self::from_json_str(&raw),
            other => Ok(serde_json::from_value(other)?),
        }
    }

    /// `"null"` gives the empty record, like a null source does.
    fn from_json_str(raw: &str) -> Result<Self> {
        match serde_json::from_str::<serde_json::Value>(raw)? {
            serde_json::Value::Null => Ok(Self::default()),
            other => Ok(serde_json::from_value(other)?),
        }
    }
}

impl FromSource for ParsedTrack {}
impl FromSource for LocalTrack {}
impl FromSource for MatchedTrack {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreKind {
    Bandcamp,
    Beatport,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Bandcamp => write!(f, "Bandcamp"),
            StoreKind::Beatport => write!(f, "Beatport"),
        }
    }
}

/// 命名格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum NameFormat {
    /// `NN. Artist - Title.ext`
    #[default]
    TrackArtistTitle,
    /// `NN. Title.ext`
    TrackTitle,
}

impl FromStr for NameFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "Track. Title" | "track-title" => Ok(NameFormat::TrackTitle),
            "Track. Artist - Title" | "track-artist-title" => Ok(NameFormat::TrackArtistTitle),
            other => Err(format!("unknown name format: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlbumTrack {
    pub title: String,
    pub artist: String,
    pub track_num: i64,
    /// true when the store published the number; false when it is the list position
    pub track_num_explicit: bool,
    pub track_id: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlbumData {
    pub artist: String,
    pub title: String,
    pub tracks: Vec<AlbumTrack>,
    pub source: StoreKind,
}

impl AlbumData {
    pub fn new(source: StoreKind) -> Self {
        Self {
            artist: String::new(),
            title: String::new(),
            tracks: Vec::new(),
            source,
        }
    }
}

/// 可供檢視後再套用的改名計畫檔
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenamePlan {
    pub created_at: DateTime<Utc>,
    pub source: String,
    pub tracks: Vec<MatchedTrack>,
}

impl RenamePlan {
    pub fn new(source: impl Into<String>, tracks: Vec<MatchedTrack>) -> Self {
        Self {
            created_at: Utc::now(),
            source: source.into(),
            tracks,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenameSummary {
    pub renamed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl fmt::Display for RenameSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Successfully renamed {} track(s).", self.renamed)
    }
}
