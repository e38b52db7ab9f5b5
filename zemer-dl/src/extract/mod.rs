//! HTML-to-structured-data extraction for Zemereshet song pages
//!
//! The core pipeline: discover player URLs from inline scripts, discover
//! recording-detail blocks from two markup shapes, then pair the two lists
//! by ordinal position. There is no shared identifier between the lists in
//! the observed markup, so position is the only available correlation; when
//! the counts diverge, excess URLs get default metadata and excess blocks
//! are dropped.

pub mod blocks;
pub mod fields;
pub mod player;

pub use blocks::locate_recording_blocks;
pub use fields::extract_fields;
pub use player::{collect_player_urls, normalize_player_url, PlayerUrlEntry, PlayerUrls};

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::info;

/// The one site this extractor understands.
pub const SITE_ORIGIN: &str = "https://www.zemereshet.co.il";

pub const DEFAULT_PERFORMER: &str = "Unknown";
pub const DEFAULT_TITLE: &str = "Song";

static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h1.bigttl").expect("title selector"));

/// Descriptive fields for one recording. Everything defaults to empty
/// except the performer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingMetadata {
    pub performer: String,
    /// Exactly 4 ASCII digits when present, empty otherwise
    pub year: String,
    pub composer: String,
    pub poet: String,
    pub source: String,
    pub soloist: String,
    pub album: String,
    pub notes: String,
}

impl Default for RecordingMetadata {
    fn default() -> Self {
        Self {
            performer: DEFAULT_PERFORMER.to_string(),
            year: String::new(),
            composer: String::new(),
            poet: String::new(),
            source: String::new(),
            soloist: String::new(),
            album: String::new(),
            notes: String::new(),
        }
    }
}

/// One performed version of the song: audio URL plus metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    pub meta: RecordingMetadata,
    /// Absolute URL of the audio asset
    pub url: String,
    /// 1-based, contiguous in final output order
    pub index: usize,
}

/// Everything extracted from one song page.
#[derive(Debug, Clone, Default)]
pub struct SongExtraction {
    pub title: String,
    pub recordings: Vec<Recording>,
}

fn extract_title(document: &Html) -> String {
    document
        .select(&TITLE)
        .next()
        .map(|heading| {
            let text: String = heading.text().collect();
            text.trim()
                .split('\n')
                .next()
                .unwrap_or_default()
                .trim()
                .to_string()
        })
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

/// Extract the song title and all recordings from one page.
///
/// The recording count always equals the player-URL count: the Nth URL is
/// paired with the Nth detail block, and a missing block at that position
/// degrades to default metadata.
pub fn extract_song(html: &str) -> SongExtraction {
    let document = Html::parse_document(html);

    let title = extract_title(&document);
    let urls = collect_player_urls(&document);
    let blocks = locate_recording_blocks(&document);

    info!(
        "Extracted song '{title}': {} player urls, {} detail blocks",
        urls.len(),
        blocks.len()
    );

    let recordings = urls
        .iter()
        .enumerate()
        .map(|(position, entry)| Recording {
            meta: blocks.get(position).cloned().unwrap_or_default(),
            url: entry.url.clone(),
            index: position + 1,
        })
        .collect();

    SongExtraction { title, recordings }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_takes_first_line_of_first_matching_heading() {
        let html = "<html><body><h1 class=\"bigttl\">שיר העמק\nתת כותרת</h1></body></html>";
        let song = extract_song(html);
        assert_eq!(song.title, "שיר העמק");
    }

    #[test]
    fn missing_title_defaults() {
        let song = extract_song("<html><body><h1>plain heading</h1></body></html>");
        assert_eq!(song.title, "Song");
        assert!(song.recordings.is_empty());
    }

    #[test]
    fn template_and_script_pair_into_one_recording() {
        let html = r#"<html><body>
            <h1 class="bigttl">Evening Song</h1>
            <script>setJplayer("p1","../mp3/song.mp3");</script>
            <template id="perf_details_1">
                <b>ביצוע:</b> <a href="/artist/3">John</a>
                <div id="perfdet1">
                    <b>שנת הקלטה:</b> 1950 (approx)<br>
                </div>
            </template>
        </body></html>"#;
        let song = extract_song(html);
        assert_eq!(song.title, "Evening Song");
        assert_eq!(song.recordings.len(), 1);
        let rec = &song.recordings[0];
        assert_eq!(rec.url, "https://www.zemereshet.co.il/mp3/song.mp3");
        assert_eq!(rec.meta.performer, "John");
        assert_eq!(rec.meta.year, "1950");
        assert_eq!(rec.index, 1);
    }

    #[test]
    fn excess_urls_get_default_metadata() {
        let html = r#"<html><body>
            <script>
                setJplayer("p1","/mp3/a.mp3");
                setJplayer("p2","/mp3/b.mp3");
            </script>
            <template id="perf_details_1">
                <b>ביצוע:</b> <a>Rivka</a>
            </template>
        </body></html>"#;
        let song = extract_song(html);
        assert_eq!(song.recordings.len(), 2);
        assert_eq!(song.recordings[0].meta.performer, "Rivka");
        assert_eq!(song.recordings[1].meta.performer, "Unknown");
        assert_eq!(song.recordings[1].meta.year, "");
        assert_eq!(song.recordings[1].index, 2);
    }

    #[test]
    fn excess_detail_blocks_are_dropped() {
        let html = r#"<html><body>
            <script>setJplayer("p1","/mp3/a.mp3");</script>
            <template id="perf_details_1"><b>ביצוע:</b> <a>Kept</a></template>
            <template id="perf_details_2"><b>ביצוע:</b> <a>Dropped</a></template>
        </body></html>"#;
        let song = extract_song(html);
        assert_eq!(song.recordings.len(), 1);
        assert_eq!(song.recordings[0].meta.performer, "Kept");
    }

    #[test]
    fn recording_count_tracks_url_count_and_indices_are_contiguous() {
        let html = r#"<html><body>
            <script>
                setJplayer("p1","/1.mp3");
                setJplayer("p2","/2.mp3");
                setJplayer("p3","/3.mp3");
            </script>
        </body></html>"#;
        let song = extract_song(html);
        assert_eq!(song.recordings.len(), 3);
        let indices: Vec<usize> = song.recordings.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }
}
