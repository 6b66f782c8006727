use crate::domain::model::LocalTrack;
use crate::utils::error::{RenamerError, Result};
use lofty::prelude::{Accessor, TaggedFileExt};
use std::path::Path;
use walkdir::WalkDir;

pub const DEFAULT_EXTENSIONS: [&str; 4] = ["flac", "mp3", "wav", "aiff"];

fn is_audio_file(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            extensions
                .iter()
                .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
                .any(|e| e == ext)
        })
        .unwrap_or(false)
}

/// 讀取內嵌標籤；讀不到就留空
fn read_tags(path: &Path) -> (String, String) {
    let tagged = match lofty::read_from_path(path) {
        Ok(tagged) => tagged,
        Err(e) => {
            tracing::debug!("No readable tags in {}: {}", path.display(), e);
            return (String::new(), String::new());
        }
    };

    match tagged.primary_tag().or_else(|| tagged.first_tag()) {
        Some(tag) => (
            tag.artist().map(|v| v.to_string()).unwrap_or_default(),
            tag.title().map(|v| v.to_string()).unwrap_or_default(),
        ),
        None => (String::new(), String::new()),
    }
}

/// Lists the audio files directly inside `dir` (no recursion), sorted by name.
pub fn scan_folder(dir: &Path, extensions: &[String]) -> Result<Vec<LocalTrack>> {
    if !dir.is_dir() {
        return Err(RenamerError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Not a directory: {}", dir.display()),
        )));
    }

    let mut tracks = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            RenamerError::IoError(e.into_io_error().unwrap_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::Other, "directory walk failed")
            }))
        })?;
        let path = entry.path();
        // 跟隨符號連結，指向目錄或斷掉的連結都略過
        if !path.is_file() || !is_audio_file(path, extensions) {
            continue;
        }

        let (tag_artist, tag_title) = read_tags(path);
        tracks.push(LocalTrack {
            path: path.to_string_lossy().into_owned(),
            original_name: entry.file_name().to_string_lossy().into_owned(),
            tag_artist,
            tag_title,
        });
    }

    tracing::info!("📂 Found {} audio file(s) in {}", tracks.len(), dir.display());
    Ok(tracks)
}
