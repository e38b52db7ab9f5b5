//! Correlation-keyed progress broadcaster
//!
//! Each download request may carry a client-chosen correlation id; progress
//! events for that request are broadcast on the id's channel and streamed
//! to any SSE subscriber. Publishing is lossy: a request with no listener
//! (or no correlation id at all) proceeds identically.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::debug;
use zemer_common::events::ProgressEvent;

/// Events buffered per channel before slow subscribers start lagging
const CHANNEL_CAPACITY: usize = 100;

/// Registry of per-correlation-id broadcast channels
#[derive(Clone, Default)]
pub struct ProgressHub {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<ProgressEvent>>>>,
}

impl ProgressHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, correlation_id: &str) -> broadcast::Sender<ProgressEvent> {
        let mut channels = self.channels.lock().expect("progress hub poisoned");
        channels
            .entry(correlation_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Handle used by the download pipeline to publish progress. With no
    /// correlation id the emitter is inert.
    pub fn emitter(&self, correlation_id: Option<&str>) -> ProgressEmitter {
        ProgressEmitter {
            tx: correlation_id.map(|id| self.sender(id)),
        }
    }

    /// Subscribe an SSE client to a correlation id's events.
    pub fn subscribe(&self, correlation_id: &str) -> broadcast::Receiver<ProgressEvent> {
        self.sender(correlation_id).subscribe()
    }

    /// Drop a finished request's channel.
    pub fn remove(&self, correlation_id: &str) {
        let mut channels = self.channels.lock().expect("progress hub poisoned");
        if channels.remove(correlation_id).is_some() {
            debug!("Removed progress channel {correlation_id}");
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.lock().expect("progress hub poisoned").len()
    }
}

/// Publishing handle for one request's progress
#[derive(Clone, Default)]
pub struct ProgressEmitter {
    tx: Option<broadcast::Sender<ProgressEvent>>,
}

impl ProgressEmitter {
    /// An emitter that drops everything (no correlation id supplied).
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Broadcast an event, ignoring whether anyone is connected.
    pub fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zemer_common::events::ProgressKind;

    #[test]
    fn disabled_emitter_is_a_no_op() {
        ProgressEmitter::disabled().emit(ProgressEvent::info("nobody hears this"));
    }

    #[tokio::test]
    async fn subscriber_receives_published_events() {
        let hub = ProgressHub::new();
        let mut rx = hub.subscribe("req-1");
        let emitter = hub.emitter(Some("req-1"));

        emitter.emit(ProgressEvent::info("fetching"));
        emitter.emit(ProgressEvent::done());

        assert_eq!(rx.recv().await.unwrap().kind, ProgressKind::Info);
        assert_eq!(rx.recv().await.unwrap().kind, ProgressKind::Done);
    }

    #[tokio::test]
    async fn channels_are_isolated_by_correlation_id() {
        let hub = ProgressHub::new();
        let mut rx_other = hub.subscribe("other");
        hub.emitter(Some("req-1")).emit(ProgressEvent::info("hi"));
        assert!(rx_other.try_recv().is_err());
    }

    #[test]
    fn remove_drops_the_channel() {
        let hub = ProgressHub::new();
        let _ = hub.subscribe("req-1");
        assert_eq!(hub.channel_count(), 1);
        hub.remove("req-1");
        assert_eq!(hub.channel_count(), 0);
    }
}
