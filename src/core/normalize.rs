//! Text helpers shared by the template parser and the store matcher.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static RE_BPM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{2,3})\s*[-_ ]*bpm").unwrap());
static RE_TRACK_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d{1,2})[.\s_-]+(.+)$").unwrap());
static RE_TRACK_ONLY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(\d{1,2})\b").unwrap());
static RE_DIGITS_ONLY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{1,3}$").unwrap());
static RE_LABEL_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(records?|recordings|music|label|netlabel|rec|recs)\b").unwrap()
});
static RE_MULTI_DASH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"--+").unwrap());
static RE_SPACED_DASH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+-\s+").unwrap());
static RE_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static RE_NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BpmStyle {
    /// `(128 bpm)`
    Space,
    /// `(128Bpm)`
    Compact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bpm {
    pub value: String,
    pub style: BpmStyle,
}

impl Bpm {
    pub fn format(&self) -> String {
        match self.style {
            BpmStyle::Compact => format!("({}Bpm)", self.value),
            BpmStyle::Space => format!("({} bpm)", self.value),
        }
    }
}

/// Splits `name.ext` into stem and extension (with its dot).
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) => (&name[..idx], &name[idx..]),
        None => (name, ""),
    }
}

pub fn collapse_spaces(s: &str) -> String {
    RE_SPACES.replace_all(s, " ").into_owned()
}

pub fn normalize_template_base(raw: &str) -> String {
    let s = raw
        .replace('_', " ")
        .replace('\u{2014}', " - ")
        .replace('\u{2013}', " - ");
    let s = RE_MULTI_DASH.replace_all(&s, " - ");
    let s = RE_SPACED_DASH.replace_all(&s, " - ");
    let s = RE_SPACES.replace_all(&s, " ");
    s.trim().to_string()
}

/// Removes the first BPM marker from `raw` and reports how it was written.
pub fn extract_bpm(raw: &str) -> (Option<Bpm>, String) {
    let Some(caps) = RE_BPM.captures(raw) else {
        return (None, raw.to_string());
    };
    let (Some(whole), Some(num)) = (caps.get(0), caps.get(1)) else {
        return (None, raw.to_string());
    };

    let matched = whole.as_str();
    let style = if matched.contains("Bpm") && !matched.contains(" bpm") && !matched.contains(" Bpm")
    {
        BpmStyle::Compact
    } else {
        BpmStyle::Space
    };
    let cleaned = format!("{} {}", &raw[..whole.start()], &raw[whole.end()..]);

    (
        Some(Bpm {
            value: num.as_str().to_string(),
            style,
        }),
        cleaned.trim().to_string(),
    )
}

/// `"03 - Title"` -> `("03", "Title")`
pub fn extract_track_prefix(s: &str) -> Option<(String, String)> {
    let caps = RE_TRACK_PREFIX.captures(s)?;
    Some((caps[1].to_string(), caps[2].trim().to_string()))
}

pub fn extract_track_number(s: &str) -> Option<String> {
    RE_TRACK_ONLY.captures(s).map(|caps| caps[1].to_string())
}

pub fn is_digits_only(s: &str) -> bool {
    RE_DIGITS_ONLY.is_match(s)
}

/// Catalog numbers such as `ABC123`: ascii letters and digits, both present.
pub fn is_catalog_code_token(token: &str) -> bool {
    if token.len() < 4 {
        return false;
    }
    let mut has_digit = false;
    let mut has_letter = false;
    for c in token.chars() {
        if c.is_ascii_digit() {
            has_digit = true;
        } else if c.is_ascii_alphabetic() {
            has_letter = true;
        } else {
            return false;
        }
    }
    has_digit && has_letter
}

pub fn strip_trailing_code_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    while let Some(last) = tokens.last() {
        if last.chars().count() == 1 || is_catalog_code_token(last) {
            tokens.pop();
        } else {
            break;
        }
    }
    tokens.join(" ")
}

pub fn is_label_part(s: &str) -> bool {
    RE_LABEL_KEYWORDS.is_match(&s.to_lowercase())
}

fn collect_parts<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut parts: Vec<String> = raw
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    if parts.len() > 1 && parts.last().is_some_and(|p| is_catalog_code_token(p)) {
        parts.pop();
    }
    parts
}

pub fn split_template_parts(s: &str) -> Vec<String> {
    collect_parts(s.split(" - "))
}

/// Like [`split_template_parts`], but falls back to bare dashes when the name
/// has at least two of them.
pub fn split_template_parts_loose(s: &str) -> Vec<String> {
    if s.contains(" - ") {
        return split_template_parts(s);
    }
    if s.matches('-').count() < 2 {
        return vec![s.trim().to_string()];
    }
    collect_parts(s.split('-'))
}

pub fn normalize_for_match(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let (_, base) = extract_bpm(raw);
    let mut base = normalize_template_base(&base);
    if let Some((_, rest)) = extract_track_prefix(&base) {
        base = rest;
    }
    let base = strip_trailing_code_tokens(&base).to_lowercase();
    let base = RE_NON_WORD.replace_all(&base, " ");
    let base = RE_SPACES.replace_all(&base, " ");
    base.trim().to_string()
}

pub fn has_token_overlap(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let set: HashSet<&str> = a.split_whitespace().collect();
    b.split_whitespace().any(|t| set.contains(t))
}

pub fn format_track_prefix(track: &str) -> String {
    if track.is_empty() {
        return String::new();
    }
    match track.parse::<i64>() {
        Ok(n) => format!("{:02}. ", n),
        Err(_) => format!("{}. ", track),
    }
}

pub fn append_bpm_if_missing(title: &str, bpm: Option<&Bpm>) -> String {
    let Some(bpm) = bpm else {
        return title.to_string();
    };
    if title.to_lowercase().contains("bpm") {
        return title.to_string();
    }
    format!("{} {}", title.trim(), bpm.format())
}

/// Stores sometimes repeat the track number inside the title ("3. Song").
pub fn clean_track_title(title: &str, track_num: i64) -> String {
    let prefixes = [
        format!("{}. ", track_num),
        format!("{:02}. ", track_num),
        format!("{} - ", track_num),
        format!("{:02} - ", track_num),
    ];
    let cleaned = prefixes
        .iter()
        .find_map(|prefix| title.strip_prefix(prefix.as_str()))
        .unwrap_or(title);
    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_template_base() {
        assert_eq!(
            normalize_template_base("Artist__Name--Some_Title"),
            "Artist Name - Some Title"
        );
        assert_eq!(normalize_template_base("A \u{2013} B"), "A - B");
        assert_eq!(normalize_template_base("  A   -   B  "), "A - B");
    }

    #[test]
    fn test_extract_bpm_styles() {
        let (bpm, rest) = extract_bpm("Artist - Title 128 bpm");
        let bpm = bpm.unwrap();
        assert_eq!(bpm.value, "128");
        assert_eq!(bpm.style, BpmStyle::Space);
        assert_eq!(rest, "Artist - Title");
        assert_eq!(bpm.format(), "(128 bpm)");

        let (bpm, rest) = extract_bpm("Artist - Title 140Bpm");
        let bpm = bpm.unwrap();
        assert_eq!(bpm.style, BpmStyle::Compact);
        assert_eq!(bpm.format(), "(140Bpm)");
        assert_eq!(rest, "Artist - Title");

        let (bpm, rest) = extract_bpm("No tempo here");
        assert!(bpm.is_none());
        assert_eq!(rest, "No tempo here");
    }

    #[test]
    fn test_track_prefix_and_number() {
        assert_eq!(
            extract_track_prefix("03 - Song"),
            Some(("03".to_string(), "Song".to_string()))
        );
        assert_eq!(
            extract_track_prefix("7. Song Name"),
            Some(("7".to_string(), "Song Name".to_string()))
        );
        assert_eq!(extract_track_prefix("Song"), None);
        assert_eq!(extract_track_number("12 Song"), Some("12".to_string()));
        assert_eq!(extract_track_number("123 Song"), None);
    }

    #[test]
    fn test_catalog_codes_are_stripped() {
        assert!(is_catalog_code_token("ABC123"));
        assert!(!is_catalog_code_token("A12"));
        assert!(!is_catalog_code_token("ABCDEF"));
        assert!(!is_catalog_code_token("AB-123"));
        assert_eq!(strip_trailing_code_tokens("Artist Title CAT001 x"), "Artist Title");
    }

    #[test]
    fn test_split_parts() {
        assert_eq!(
            split_template_parts("Artist - Title - CAT042"),
            vec!["Artist".to_string(), "Title".to_string()]
        );
        assert_eq!(
            split_template_parts_loose("Artist-Album-Title"),
            vec!["Artist".to_string(), "Album".to_string(), "Title".to_string()]
        );
        assert_eq!(
            split_template_parts_loose("Jay-Z Song"),
            vec!["Jay-Z Song".to_string()]
        );
    }

    #[test]
    fn test_normalize_for_match() {
        assert_eq!(
            normalize_for_match("01 - Daft_Punk -- One More Time (128 bpm) CAT001"),
            "daft punk one more time"
        );
        assert_eq!(normalize_for_match(""), "");
    }

    #[test]
    fn test_token_overlap() {
        assert!(has_token_overlap("one more time", "time after time"));
        assert!(!has_token_overlap("one more", "two less"));
        assert!(!has_token_overlap("", "two"));
    }

    #[test]
    fn test_naming_helpers() {
        assert_eq!(format_track_prefix("3"), "03. ");
        assert_eq!(format_track_prefix("A1"), "A1. ");
        assert_eq!(format_track_prefix(""), "");

        let bpm = Bpm {
            value: "120".to_string(),
            style: BpmStyle::Space,
        };
        assert_eq!(append_bpm_if_missing("Song ", Some(&bpm)), "Song (120 bpm)");
        assert_eq!(append_bpm_if_missing("Song 120 BPM", Some(&bpm)), "Song 120 BPM");
        assert_eq!(append_bpm_if_missing("Song", None), "Song");

        assert_eq!(clean_track_title("3. Song", 3), "Song");
        assert_eq!(clean_track_title("03 - Song", 3), "Song");
        assert_eq!(clean_track_title("13. Song", 3), "13. Song");
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("a.b.flac"), ("a.b", ".flac"));
        assert_eq!(split_extension("noext"), ("noext", ""));
    }
}
