//! Recording-block discovery
//!
//! Detail blocks appear under two markup shapes: wrapped in a
//! `<template id="perf_details_N">` element, or as a bare element with a
//! `perfdet`-prefixed id. Both passes share one seen-id set (the template
//! suffix and the bare id strip to the same identifier space) so a block is
//! never counted twice. Output order is all template matches, then all
//! standalone matches, each in document order.

use super::fields::{extract_fields, extract_performer};
use super::{RecordingMetadata, DEFAULT_PERFORMER};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::debug;

static TEMPLATE_BLOCKS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"template[id^="perf_details_"]"#).expect("template block selector")
});
static STANDALONE_BLOCKS: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"[id^="perfdet"]"#).expect("standalone block selector"));

/// Nested detail element inside a template; when present, field extraction
/// is narrowed to its contents instead of the whole template.
static PERFDET_DIV: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<div id="perfdet\d+"[^>]*>([\s\S]*?)</div>"#).expect("perfdet div pattern")
});

/// Find every detail block in the document and extract its metadata.
pub fn locate_recording_blocks(document: &Html) -> Vec<RecordingMetadata> {
    let mut blocks = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    // Pass 1: template-wrapped blocks (the common shape).
    for template in document.select(&TEMPLATE_BLOCKS) {
        let Some(id) = template.value().attr("id") else {
            continue;
        };
        let block_id = id.trim_start_matches("perf_details_").to_string();
        let template_html = template.inner_html();
        debug!("Found template detail block (id={block_id})");
        seen_ids.insert(block_id);

        // Performer is looked up across the whole template before the
        // fragment narrows; it takes precedence over whatever the field
        // extractor sees inside.
        let performer = extract_performer(&template_html);

        let fragment = PERFDET_DIV
            .captures(&template_html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| template_html.clone());

        let mut meta = extract_fields(&fragment);
        meta.performer = performer.unwrap_or_else(|| DEFAULT_PERFORMER.to_string());
        blocks.push(meta);
    }

    // Pass 2: standalone blocks not already covered by a template.
    for element in document.select(&STANDALONE_BLOCKS) {
        let Some(id) = element.value().attr("id") else {
            continue;
        };
        let block_id = id.trim_start_matches("perfdet").to_string();
        if seen_ids.contains(&block_id) {
            continue;
        }
        debug!("Found standalone detail block (id={block_id})");
        seen_ids.insert(block_id);

        // Performer sits in the surrounding markup, not the block itself.
        let parent_html = element
            .parent()
            .and_then(ElementRef::wrap)
            .map(|parent| parent.inner_html())
            .unwrap_or_default();
        let performer = extract_performer(&parent_html);

        let mut meta = extract_fields(&element.inner_html());
        meta.performer = performer.unwrap_or_else(|| DEFAULT_PERFORMER.to_string());
        blocks.push(meta);
    }

    blocks
}
