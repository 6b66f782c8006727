use crate::core::normalize::{
    clean_track_title, extract_track_number, has_token_overlap, normalize_for_match, split_extension,
};
use crate::domain::model::{AlbumData, AlbumTrack, LocalTrack, MatchedTrack, StoreKind};

/// Ratings below this are not boosted by a matching track number.
const TRACK_NUMBER_BOOST_CEILING: f64 = 0.9;
const TRACK_NUMBER_BOOST: f64 = 0.12;
const BEATPORT_MIN_CONFIDENCE: f64 = 0.25;

/// Case-insensitive Sørensen–Dice similarity; only counted when the two
/// normalized strings share at least one token. Bigrams are taken with
/// whitespace removed, so word boundaries do not affect the score.
fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || !has_token_overlap(a, b) {
        return 0.0;
    }
    strsim::sorensen_dice(&a.to_lowercase(), &b.to_lowercase())
}

pub fn is_various_artists(album_artist: &str, url: &str) -> bool {
    let lower = album_artist.to_lowercase();
    lower.contains("various") || lower.contains("v.a.") || lower.contains("va ") || url.contains("/va-")
}

fn album_track_full_name(album: &AlbumData, track: &AlbumTrack) -> String {
    let artist = track.artist.trim();
    if !artist.is_empty() {
        normalize_for_match(&format!("{} - {}", track.artist, track.title))
    } else if !album.artist.is_empty() {
        normalize_for_match(&format!("{} - {}", album.artist, track.title))
    } else {
        String::new()
    }
}

fn rate_local_track(album: &AlbumData, track: &AlbumTrack, local: &LocalTrack) -> f64 {
    let (stem, _) = split_extension(&local.original_name);
    let normalized_local = normalize_for_match(stem);
    let normalized_title = normalize_for_match(&track.title);
    let normalized_full = album_track_full_name(album, track);

    let rating_filename =
        similarity(&normalized_title, &normalized_local).max(similarity(&normalized_full, &normalized_local));

    let mut rating_tags = 0.0;
    if !local.tag_title.is_empty() {
        let tag_base = normalize_for_match(&local.tag_title);
        if !tag_base.is_empty() {
            rating_tags = similarity(&normalized_title, &tag_base);
        }
        if !local.tag_artist.is_empty() && !normalized_full.is_empty() {
            let tag_full = normalize_for_match(&format!("{} - {}", local.tag_artist, local.tag_title));
            if !tag_full.is_empty() {
                rating_tags = f64::max(rating_tags, similarity(&normalized_full, &tag_full));
            }
        }
    }

    let mut rating = rating_filename;
    if rating_tags > rating {
        rating = rating_tags;
        tracing::debug!("  Higher match found using tags for '{}': {:.3}", local.original_name, rating);
    }

    tracing::debug!(
        "  Comparing album '{}' with local '{}' (tags: '{}' - '{}'): {:.3}",
        track.title,
        stem,
        local.tag_artist,
        local.tag_title,
        rating
    );

    if track.track_num_explicit && track.track_num > 0 {
        let local_num = extract_track_number(stem).and_then(|n| n.parse::<i64>().ok());
        if local_num == Some(track.track_num) && rating < TRACK_NUMBER_BOOST_CEILING {
            rating = (rating + TRACK_NUMBER_BOOST).min(1.0);
        }
    }

    rating
}

fn album_artist_for_name(album: &AlbumData) -> String {
    let artist = album.artist.trim();
    if !artist.is_empty() {
        return artist.to_string();
    }
    match album.title.split_once(" - ") {
        Some((artist, _)) => artist.to_string(),
        None => String::new(),
    }
}

fn propose_name(album: &AlbumData, track: &AlbumTrack, local: &LocalTrack) -> String {
    let (stem, ext) = split_extension(&local.original_name);

    let mut track_num = track.track_num;
    if let Some(local_num) = extract_track_number(stem).and_then(|n| n.parse::<i64>().ok()) {
        let beatport_mismatch =
            album.source == StoreKind::Beatport && track.track_num_explicit && track.track_num != local_num;
        if beatport_mismatch || !track.track_num_explicit {
            track_num = local_num;
        }
    }

    let title = if track.track_num_explicit && track.track_num > 0 {
        clean_track_title(&track.title, track.track_num)
    } else {
        track.title.clone()
    };

    let track_artist = track.artist.trim();
    let album_artist = album_artist_for_name(album);

    if title.contains('-') {
        format!("{:02}. {}{}", track_num, title, ext)
    } else if !track_artist.is_empty() {
        format!("{:02}. {} - {}{}", track_num, track_artist, title, ext)
    } else if !album_artist.is_empty() {
        format!("{:02}. {} - {}{}", track_num, album_artist, title, ext)
    } else {
        format!("{:02}. {}{}", track_num, title, ext)
    }
}

/// Pairs every album track with the most similar unused local file and
/// proposes `NN. Artist - Title.ext` names for the pairs.
pub fn match_album(album: &AlbumData, url: &str, locals: &[LocalTrack]) -> Vec<MatchedTrack> {
    tracing::info!(
        "🎵 Matching {} local file(s) against {} {} track(s)",
        locals.len(),
        album.tracks.len(),
        album.source
    );
    tracing::debug!("Album URL: {}", url);
    tracing::debug!("Album artist: {}", album.artist);
    tracing::debug!("Is VA album: {}", is_various_artists(&album.artist, url));

    let min_confidence = match album.source {
        StoreKind::Beatport => BEATPORT_MIN_CONFIDENCE,
        StoreKind::Bandcamp => 0.0,
    };

    let mut available: Vec<&LocalTrack> = locals.iter().collect();
    let mut matched = Vec::new();

    for track in &album.tracks {
        if available.is_empty() {
            break;
        }
        tracing::debug!("Processing album track: {} (Num: {})", track.title, track.track_num);

        let mut best: Option<(usize, f64)> = None;
        for (idx, local) in available.iter().enumerate() {
            let rating = rate_local_track(album, track, local);
            if best.map_or(true, |(_, best_rating)| rating > best_rating) {
                best = Some((idx, rating));
            }
        }

        let Some((idx, rating)) = best.filter(|(_, rating)| *rating >= min_confidence) else {
            continue;
        };

        let local = available.remove(idx);
        matched.push(MatchedTrack {
            local_path: local.path.clone(),
            original_name: local.original_name.clone(),
            proposed_new_name: propose_name(album, track, local),
            confidence: rating,
            status: format!("{} Match", album.source),
        });
    }

    matched
}
