//! Typed progress events for the download push channel
//!
//! Events are broadcast per correlation id and serialized for SSE
//! transmission. They are observational only: archive correctness never
//! depends on whether anyone is listening.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress notification categories emitted during extraction and archiving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressKind {
    /// General status (page fetched, song identified)
    Info,
    /// One recording fetch started
    Download,
    /// One recording archived
    Success,
    /// Recoverable problem (fetch failed, undersized payload skipped)
    Warning,
    /// Fatal problem, the request is aborting
    Error,
    /// All entries encoded into the archive
    Complete,
    /// Archive fully flushed to the output stream
    Done,
}

impl ProgressKind {
    /// SSE event name for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressKind::Info => "info",
            ProgressKind::Download => "download",
            ProgressKind::Success => "success",
            ProgressKind::Warning => "warning",
            ProgressKind::Error => "error",
            ProgressKind::Complete => "complete",
            ProgressKind::Done => "done",
        }
    }
}

/// One progress notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub kind: ProgressKind,
    pub message: String,

    /// 1-based position of the recording being processed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<usize>,

    /// Total number of recordings in this request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,

    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    fn new(kind: ProgressKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            current: None,
            total: None,
            timestamp: Utc::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(ProgressKind::Info, message)
    }

    pub fn download(message: impl Into<String>, current: usize, total: usize) -> Self {
        Self {
            current: Some(current),
            total: Some(total),
            ..Self::new(ProgressKind::Download, message)
        }
    }

    pub fn success(message: impl Into<String>, current: usize, total: usize) -> Self {
        Self {
            current: Some(current),
            total: Some(total),
            ..Self::new(ProgressKind::Success, message)
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(ProgressKind::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ProgressKind::Error, message)
    }

    pub fn complete(archived: usize, total: usize) -> Self {
        Self {
            current: Some(archived),
            total: Some(total),
            ..Self::new(
                ProgressKind::Complete,
                format!("{archived}/{total} recordings archived"),
            )
        }
    }

    pub fn done() -> Self {
        Self::new(ProgressKind::Done, "archive ready")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_match_sse_event_names() {
        assert_eq!(ProgressKind::Info.as_str(), "info");
        assert_eq!(ProgressKind::Download.as_str(), "download");
        assert_eq!(ProgressKind::Done.as_str(), "done");
    }

    #[test]
    fn serializes_with_snake_case_kind_and_optional_counters() {
        let ev = ProgressEvent::download("fetching", 2, 5);
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["kind"], "download");
        assert_eq!(json["current"], 2);
        assert_eq!(json["total"], 5);

        let ev = ProgressEvent::info("hello");
        let json = serde_json::to_value(&ev).unwrap();
        assert!(json.get("current").is_none());
        assert!(json.get("total").is_none());
    }

    #[test]
    fn complete_carries_counts() {
        let ev = ProgressEvent::complete(3, 4);
        assert_eq!(ev.kind, ProgressKind::Complete);
        assert_eq!(ev.current, Some(3));
        assert_eq!(ev.total, Some(4));
    }
}
