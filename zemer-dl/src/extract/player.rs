//! Player-URL discovery from inline scripts
//!
//! The site wires each audio widget with a `setJplayer("<key>","<url>")`
//! call in an inline script. Every script block is scanned in document
//! order; keys are de-duplicated with first-appearance ordering and
//! last-value-wins semantics, and URLs are normalized to absolute https
//! form against the site origin.

use super::SITE_ORIGIN;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashMap;

static SET_JPLAYER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"setJplayer\s*\(\s*["']([^"']+)["']\s*,\s*["']([^"']+)["']\s*\)"#)
        .expect("setJplayer pattern")
});

/// Runs of slashes anywhere except right after the scheme colon.
static DOUBLE_SLASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([^:])/{2,}").expect("double slash pattern"));

static SCRIPT: Lazy<Selector> = Lazy::new(|| Selector::parse("script").expect("script selector"));

/// One discovered (key, url) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerUrlEntry {
    pub key: String,
    pub url: String,
}

/// Ordered key→url set with first-appearance ordering
#[derive(Debug, Default)]
pub struct PlayerUrls {
    entries: Vec<PlayerUrlEntry>,
    slots: HashMap<String, usize>,
}

impl PlayerUrls {
    /// Insert keeps the slot of the key's first appearance; a repeated key
    /// overwrites the stored URL in place.
    fn insert(&mut self, key: String, url: String) {
        match self.slots.get(&key) {
            Some(&slot) => self.entries[slot].url = url,
            None => {
                self.slots.insert(key.clone(), self.entries.len());
                self.entries.push(PlayerUrlEntry { key, url });
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerUrlEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PlayerUrlEntry> {
        self.entries.get(index)
    }
}

/// Rewrite relative player URL forms to absolute https, then collapse any
/// doubled slashes that survive (the site mixes `..//mp3` style paths in).
pub fn normalize_player_url(raw: &str) -> String {
    let absolute = if raw.starts_with("../") {
        // "../mp3/x.mp3" → origin + "/mp3/x.mp3"
        format!("{SITE_ORIGIN}{}", &raw[2..])
    } else if raw.starts_with('/') {
        format!("{SITE_ORIGIN}{raw}")
    } else if !raw.starts_with("http") {
        format!("{SITE_ORIGIN}/{raw}")
    } else {
        raw.to_string()
    };
    DOUBLE_SLASH.replace_all(&absolute, "${1}/").into_owned()
}

/// Scan every inline script for player wiring calls, in document order.
pub fn collect_player_urls(document: &Html) -> PlayerUrls {
    let mut urls = PlayerUrls::default();
    for script in document.select(&SCRIPT) {
        let content: String = script.text().collect();
        for caps in SET_JPLAYER.captures_iter(&content) {
            let key = caps[1].to_string();
            let url = normalize_player_url(&caps[2]);
            urls.insert(key, url);
        }
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(html: &str) -> Vec<(String, String)> {
        let doc = Html::parse_document(html);
        collect_player_urls(&doc)
            .iter()
            .map(|e| (e.key.clone(), e.url.clone()))
            .collect()
    }

    #[test]
    fn no_matching_calls_yields_empty_set() {
        assert!(collect("<html><body><script>var x = 1;</script></body></html>").is_empty());
        assert!(collect("<html><body>no scripts at all</body></html>").is_empty());
    }

    #[test]
    fn parent_relative_url_is_rooted_at_site_domain() {
        assert_eq!(
            normalize_player_url("../mp3/song.mp3"),
            "https://www.zemereshet.co.il/mp3/song.mp3"
        );
    }

    #[test]
    fn absolute_path_gets_origin_prefix() {
        assert_eq!(
            normalize_player_url("/mp3/song.mp3"),
            "https://www.zemereshet.co.il/mp3/song.mp3"
        );
    }

    #[test]
    fn schemeless_url_is_treated_as_site_relative() {
        assert_eq!(
            normalize_player_url("mp3/song.mp3"),
            "https://www.zemereshet.co.il/mp3/song.mp3"
        );
    }

    #[test]
    fn normalization_is_idempotent_on_clean_absolute_urls() {
        let url = "https://www.zemereshet.co.il/mp3/song.mp3";
        assert_eq!(normalize_player_url(url), url);

        let once = normalize_player_url("../mp3/a.mp3");
        assert_eq!(normalize_player_url(&once), once);
    }

    #[test]
    fn doubled_slashes_collapse_except_after_scheme() {
        assert_eq!(
            normalize_player_url("..//mp3//song.mp3"),
            "https://www.zemereshet.co.il/mp3/song.mp3"
        );
    }

    #[test]
    fn both_quote_styles_and_loose_whitespace_match() {
        let html = r#"<script>
            setJplayer("p1", "../mp3/a.mp3");
            setJplayer ( 'p2' , '/mp3/b.mp3' );
        </script>"#;
        let urls = collect(html);
        assert_eq!(
            urls,
            vec![
                (
                    "p1".to_string(),
                    "https://www.zemereshet.co.il/mp3/a.mp3".to_string()
                ),
                (
                    "p2".to_string(),
                    "https://www.zemereshet.co.il/mp3/b.mp3".to_string()
                ),
            ]
        );
    }

    #[test]
    fn matches_collected_across_script_blocks_in_document_order() {
        let html = r#"
            <script>setJplayer("a","/1.mp3");</script>
            <p>text</p>
            <script>setJplayer("b","/2.mp3"); setJplayer("c","/3.mp3");</script>
        "#;
        let keys: Vec<String> = collect(html).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn repeated_key_keeps_first_position_but_takes_last_url() {
        let html = r#"<script>
            setJplayer("a","/first.mp3");
            setJplayer("b","/b.mp3");
            setJplayer("a","/second.mp3");
        </script>"#;
        let urls = collect(html);
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].0, "a");
        assert_eq!(urls[0].1, "https://www.zemereshet.co.il/second.mp3");
        assert_eq!(urls[1].0, "b");
    }
}
