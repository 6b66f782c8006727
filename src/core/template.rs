use crate::core::normalize::{
    append_bpm_if_missing, collapse_spaces, extract_bpm, extract_track_prefix, format_track_prefix,
    has_token_overlap, is_digits_only, is_label_part, normalize_for_match, normalize_template_base,
    split_extension, split_template_parts, split_template_parts_loose, strip_trailing_code_tokens,
    Bpm, BpmStyle,
};
pub use crate::domain::model::NameFormat;
use crate::domain::model::{LocalTrack, MatchedTrack, STATUS_MATCHED};
use regex::Regex;
use std::sync::LazyLock;

static RE_LEGACY_TEMPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?i)(?P<artist>.+?)\s+-\s+(?P<album>.+?)\s+-\s+(?P<track>\d+)\s+(?P<title>.+?)(?:\s+\((?P<bpm>\d+)\))?$",
    )
    .unwrap()
});

/// One guess at the artist/title/track of a filename.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateCandidate {
    pub artist: String,
    pub title: String,
    pub track: String,
    pub bpm: Option<Bpm>,
    pub confidence: f64,
}

impl TemplateCandidate {
    fn new(artist: &str, title: String, track: &str, confidence: f64) -> Self {
        Self {
            artist: artist.to_string(),
            title,
            track: track.to_string(),
            bpm: None,
            confidence,
        }
    }

    fn is_complete(&self) -> bool {
        !self.artist.is_empty() && !self.title.is_empty()
    }
}

fn parse_legacy_template(base: &str) -> Option<TemplateCandidate> {
    let caps = RE_LEGACY_TEMPLATE.captures(base)?;
    let group = |name: &str| caps.name(name).map(|m| m.as_str()).unwrap_or("");

    let mut cand = TemplateCandidate::new(group("artist"), group("title").to_string(), group("track"), 0.9);
    let bpm = group("bpm").trim();
    if !bpm.is_empty() {
        cand.bpm = Some(Bpm {
            value: bpm.to_string(),
            style: BpmStyle::Compact,
        });
    }
    Some(cand)
}

fn parse_template_from_parts(parts: &[String]) -> Option<TemplateCandidate> {
    let (first, last) = (parts.first()?, parts.last()?);

    if parts.len() >= 3 && is_digits_only(first) {
        return Some(TemplateCandidate::new(&parts[1], parts[2..].join(" - "), first, 0.8));
    }
    if let Some((track, rest)) = extract_track_prefix(last) {
        return Some(TemplateCandidate::new(first, rest, &track, 0.8));
    }
    if let Some((track, rest)) = extract_track_prefix(first) {
        if !rest.is_empty() {
            // 兩段時第二段為標題，三段以上取最後一段
            return Some(TemplateCandidate::new(&rest, last.clone(), &track, 0.7));
        }
    }
    if parts.len() >= 3 {
        if is_label_part(first) {
            return Some(TemplateCandidate::new(&parts[1], parts[2..].join(" - "), "", 0.95));
        }
        return Some(TemplateCandidate::new(first, parts[1..].join(" - "), "", 0.55));
    }
    if parts.len() == 2 {
        return Some(TemplateCandidate::new(first, last.clone(), "", 0.6));
    }
    None
}

fn is_vs(token: &str) -> bool {
    token.eq_ignore_ascii_case("vs") || token.eq_ignore_ascii_case("vs.")
}

fn parse_template_from_tokens(s: &str) -> Option<TemplateCandidate> {
    let (track, base) = match extract_track_prefix(s) {
        Some((track, rest)) => (track, rest),
        None => (String::new(), s.to_string()),
    };
    let base = strip_trailing_code_tokens(base.trim());
    if base.is_empty() {
        return None;
    }

    let mut tokens: Vec<&str> = base.split_whitespace().collect();
    if tokens.len() >= 2 && tokens[0].eq_ignore_ascii_case(tokens[1]) {
        tokens.remove(0);
    }
    if tokens.is_empty() {
        return None;
    }
    let n = tokens.len();

    if let Some(i) = tokens.iter().position(|t| is_vs(t)).filter(|i| i + 1 < n - 1) {
        let artist: Vec<&str> = tokens[..i + 2]
            .iter()
            .map(|t| if is_vs(t) { "Vs." } else { *t })
            .collect();
        return Some(TemplateCandidate::new(
            &artist.join(" "),
            tokens[i + 2..].join(" "),
            &track,
            0.55,
        ));
    }

    if let Some(i) = (0..n).rev().find(|&i| tokens[i] == "&" && i + 1 < n - 1) {
        return Some(TemplateCandidate::new(
            &tokens[..i + 2].join(" "),
            tokens[i + 2..].join(" "),
            &track,
            0.5,
        ));
    }

    if n >= 2 {
        return Some(TemplateCandidate::new(tokens[0], tokens[1..].join(" "), &track, 0.4));
    }
    None
}

fn choose_best_candidate(
    candidates: impl IntoIterator<Item = Option<TemplateCandidate>>,
) -> Option<TemplateCandidate> {
    let mut best: Option<TemplateCandidate> = None;
    for cand in candidates.into_iter().flatten() {
        if !cand.is_complete() {
            continue;
        }
        if best.as_ref().map_or(true, |b| cand.confidence > b.confidence) {
            best = Some(cand);
        }
    }
    best
}

/// Infers artist, title, track number and BPM for one local file. Returns
/// `None` when neither the filename nor the tags give both artist and title.
pub fn build_template_candidate(local: &LocalTrack) -> Option<TemplateCandidate> {
    let (base, _) = split_extension(&local.original_name);
    let (bpm, base_no_bpm) = extract_bpm(base);
    let normalized = strip_trailing_code_tokens(&normalize_template_base(&base_no_bpm));

    let mut parts = split_template_parts(&normalized);
    if parts.len() <= 1 {
        parts = split_template_parts_loose(&normalized);
    }
    if bpm.is_none() && parts.len() >= 3 && parts.last().is_some_and(|p| is_digits_only(p)) {
        // Numeric tail without a BPM marker is ambiguous
        return None;
    }

    let file_cand = choose_best_candidate([
        parse_legacy_template(&base_no_bpm),
        parse_template_from_parts(&parts),
        parse_template_from_tokens(&normalized),
    ])
    .map(|mut cand| {
        cand.bpm = bpm.clone();
        cand
    });

    if file_cand.is_none() {
        let tag_artist = local.tag_artist.trim();
        let tag_title = local.tag_title.trim();
        if !tag_artist.is_empty() && !tag_title.is_empty() {
            let tag_norm = normalize_for_match(&format!("{} - {}", tag_artist, tag_title));
            let filename_norm = normalize_for_match(&base_no_bpm);
            if has_token_overlap(&tag_norm, &filename_norm) {
                tracing::debug!("Using tags for '{}'", local.original_name);
                return Some(TemplateCandidate {
                    artist: tag_artist.to_string(),
                    title: tag_title.to_string(),
                    track: String::new(),
                    bpm,
                    confidence: 0.85,
                });
            }
        }
    }

    file_cand
}

pub fn generate_template_renames(locals: &[LocalTrack], format: NameFormat) -> Vec<MatchedTrack> {
    locals
        .iter()
        .map(|local| {
            let Some(cand) = build_template_candidate(local) else {
                tracing::debug!("No template match for '{}'", local.original_name);
                return MatchedTrack::unmatched(local);
            };

            let title = append_bpm_if_missing(&cand.title, cand.bpm.as_ref());
            let base = match format {
                NameFormat::TrackTitle => title,
                NameFormat::TrackArtistTitle => format!("{} - {}", cand.artist, title),
            };
            let proposed = format!("{}{}", format_track_prefix(&cand.track), base);
            let (_, ext) = split_extension(&local.original_name);

            MatchedTrack {
                local_path: local.path.clone(),
                original_name: local.original_name.clone(),
                proposed_new_name: format!("{}{}", collapse_spaces(proposed.trim()), ext),
                confidence: cand.confidence,
                status: STATUS_MATCHED.to_string(),
            }
        })
        .collect()
}
