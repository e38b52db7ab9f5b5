//! Server-Sent Events progress stream
//!
//! One stream per correlation id. The stream is observational: it reports
//! download progress but the archive response is correct whether or not
//! anyone subscribes. Outside the auth gate because EventSource cannot
//! send custom headers.

use crate::AppState;
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

/// GET /api/events/:correlation_id - SSE progress stream
pub async fn event_stream(
    State(state): State<AppState>,
    Path(correlation_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("New SSE client for correlation id {correlation_id}");
    let rx = state.hub.subscribe(&correlation_id);

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("connected").data("connected"));

        let mut events = BroadcastStream::new(rx);
        while let Some(result) = events.next().await {
            match result {
                Ok(progress) => match serde_json::to_string(&progress) {
                    Ok(json) => {
                        yield Ok(Event::default().event(progress.kind.as_str()).data(json));
                    }
                    Err(e) => warn!("Failed to serialize progress event: {e}"),
                },
                // Lagged receiver: drop the missed events and continue
                Err(e) => warn!("SSE stream error: {e:?}"),
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
