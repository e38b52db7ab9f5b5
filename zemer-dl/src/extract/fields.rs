//! Label-anchored field extraction from one recording-detail fragment
//!
//! The site's markup is irregular enough that each field is matched by an
//! ordered list of patterns, first match wins. Absent labels are normal and
//! yield the field's default, so this module never fails.

use super::RecordingMetadata;
use once_cell::sync::Lazy;
use regex::Regex;

/// Performer label variants, in priority order: the "ביצוע" (performance)
/// label, the "נגינה" (playing) label, and the font-color span variant of
/// the playing label seen on older pages.
static PERFORMER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"<b>ביצוע:</b>[\s\S]*?<a[^>]*>([^<]+)</a>").expect("performer pattern"),
        Regex::new(r"<b>נגינה:</b>[\s\S]*?<a[^>]*>([^<]+)</a>").expect("playing pattern"),
        Regex::new(r"<font color[^>]*><b>נגינה: </b><a[^>]*>([^<]+)</a>")
            .expect("font playing pattern"),
    ]
});

static YEAR_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<b>שנת הקלטה:</b>\s*([^<]+)").expect("year label pattern"));
static YEAR_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").expect("year digits pattern"));

static COMPOSER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<b>לחן:</b>[\s\S]*?<a[^>]*>([^<]+)</a>").expect("composer pattern"));
static POET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<b>מילים:</b>[\s\S]*?<a[^>]*>([^<]+)</a>").expect("poet pattern"));
static SOLOIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<b>סולן:</b>[\s\S]*?<a[^>]*>([^<]+)</a>").expect("soloist pattern"));
static ARRANGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<b>עיבוד:</b>[\s\S]*?<a[^>]*>([^<]+)</a>").expect("arranger pattern"));

// Free-text fields run to the next tag rather than an anchor element.
static SOURCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<b>מקור:</b>\s*([^<]+?)(?:<br|</)").expect("source pattern"));
static ALBUM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<b>אלבום:</b>\s*([^<]+?)(?:<br|</)").expect("album pattern"));
static NOTES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<b>הערות:</b>\s*([^<]+?)(?:<br|</)").expect("notes pattern"));

/// Decode the handful of entities the site actually emits in field values.
fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ").replace("&amp;", "&")
}

fn clean(value: &str) -> String {
    decode_entities(value).trim().to_string()
}

/// First successful capture across an ordered pattern list.
fn first_capture(patterns: &[Regex], fragment: &str) -> Option<String> {
    patterns.iter().find_map(|pattern| {
        pattern
            .captures(fragment)
            .and_then(|caps| caps.get(1))
            .map(|m| clean(m.as_str()))
    })
}

fn capture(pattern: &Regex, fragment: &str) -> Option<String> {
    pattern
        .captures(fragment)
        .and_then(|caps| caps.get(1))
        .map(|m| clean(m.as_str()))
}

/// Performer lookup shared with the block locator, which runs it against the
/// template (or parent) scope before field extraction narrows the fragment.
pub(super) fn extract_performer(fragment: &str) -> Option<String> {
    first_capture(&PERFORMER_PATTERNS, fragment)
}

/// Extract every labeled field from one detail fragment.
///
/// Year is two-staged: the free text after the recording-year label is
/// captured first, then a 4-digit run is extracted from within it. A label
/// match without a 4-digit run leaves the year empty. When no notes label
/// matched but an arrangement label did, notes is synthesized from the
/// arranger name.
pub fn extract_fields(fragment: &str) -> RecordingMetadata {
    let mut meta = RecordingMetadata::default();

    if let Some(performer) = extract_performer(fragment) {
        meta.performer = performer;
    }

    if let Some(year_text) = capture(&YEAR_LABEL, fragment) {
        if let Some(digits) = YEAR_DIGITS.find(&year_text) {
            meta.year = digits.as_str().to_string();
        }
    }

    if let Some(composer) = capture(&COMPOSER, fragment) {
        meta.composer = composer;
    }
    if let Some(poet) = capture(&POET, fragment) {
        meta.poet = poet;
    }
    if let Some(source) = capture(&SOURCE, fragment) {
        meta.source = source;
    }
    if let Some(soloist) = capture(&SOLOIST, fragment) {
        meta.soloist = soloist;
    }
    if let Some(album) = capture(&ALBUM, fragment) {
        meta.album = album;
    }
    if let Some(notes) = capture(&NOTES, fragment) {
        meta.notes = notes;
    }

    if meta.notes.is_empty() {
        if let Some(arranger) = capture(&ARRANGER, fragment) {
            meta.notes = format!("עיבוד: {arranger}");
        }
    }

    meta
}
