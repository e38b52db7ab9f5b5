//! Request handlers for the download API

use crate::api::ApiError;
use crate::{archive, extract, AppState};
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tracing::{info, warn};
use url::Url;
use zemer_common::events::ProgressEvent;
use zemer_common::Error;

/// Buffer between the archive assembler and the HTTP response body
const ARCHIVE_BODY_BUFFER: usize = 64 * 1024;

/// Body of POST /api/download
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub url: String,
    /// Client-chosen id tying this request to an SSE progress stream
    #[serde(default)]
    pub correlation_id: Option<String>,
}

/// GET /health - liveness probe, no auth
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "zemer-dl",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Accept only well-formed http(s) URLs pointing at the target site.
/// Runs before any network call.
pub fn validate_song_url(raw: &str, allowed_hosts: &[String]) -> Result<Url, Error> {
    let url = Url::parse(raw).map_err(|_| Error::InvalidInput("invalid URL".to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::InvalidInput("invalid URL scheme".to_string()));
    }
    match url.host_str() {
        Some(host) if allowed_hosts.iter().any(|allowed| allowed == host) => Ok(url),
        _ => Err(Error::InvalidInput(
            "only zemereshet.co.il song pages can be downloaded".to_string(),
        )),
    }
}

/// POST /api/download - fetch a song page, extract its recordings and
/// stream them back as one zip archive.
pub async fn download(
    State(state): State<AppState>,
    Json(request): Json<DownloadRequest>,
) -> Result<Response, ApiError> {
    let emitter = state.hub.emitter(request.correlation_id.as_deref());

    let url =
        validate_song_url(&request.url, &state.config.site.allowed_hosts).map_err(|e| {
            emitter.emit(ProgressEvent::error(e.to_string()));
            e
        })?;

    info!("Download requested: {url}");
    emitter.emit(ProgressEvent::info("Fetching song page"));

    let html = state.fetcher.fetch_page(url.as_str()).await.map_err(|e| {
        emitter.emit(ProgressEvent::error(e.to_string()));
        e
    })?;

    let song = extract::extract_song(&html);
    if song.recordings.is_empty() {
        let error = Error::NotFound("no recordings found on page".to_string());
        emitter.emit(ProgressEvent::error(error.to_string()));
        return Err(error.into());
    }
    emitter.emit(ProgressEvent::info(format!(
        "{}: {} recordings",
        song.title,
        song.recordings.len()
    )));

    let disposition = attachment_disposition(&song.title);

    let (body_writer, body_reader) = tokio::io::duplex(ARCHIVE_BODY_BUFFER);
    let fetcher = state.fetcher.clone();
    let hub = state.hub.clone();
    let correlation_id = request.correlation_id.clone();
    let delay = Duration::from_millis(state.config.fetch.inter_fetch_delay_ms);

    tokio::spawn(async move {
        let result =
            archive::stream_archive(&song, fetcher.as_ref(), delay, body_writer, &emitter).await;
        match result {
            Ok(summary) => {
                info!(
                    "Archive for '{}' finished: {}/{} recordings",
                    song.title, summary.archived, summary.total
                );
                emitter.emit(ProgressEvent::done());
            }
            Err(e) => {
                // Most often the client went away mid-stream; the response
                // is already underway, so there is nothing left to report.
                warn!("Archive streaming aborted: {e}");
                emitter.emit(ProgressEvent::error(e.to_string()));
            }
        }
        if let Some(id) = correlation_id {
            hub.remove(&id);
        }
    });

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from_stream(ReaderStream::new(body_reader)))
        .map_err(|e| Error::Internal(format!("response build failed: {e}")))?;
    Ok(response)
}

/// Attachment disposition with an ASCII fallback name plus the RFC 5987
/// UTF-8 form for the (usually Hebrew) real title.
fn attachment_disposition(title: &str) -> String {
    let clean = archive::sanitize_filename(title);
    let ascii: String = clean
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '_' })
        .collect();
    let fallback = if ascii.trim_matches(&['_', ' '][..]).is_empty() {
        "zemereshet".to_string()
    } else {
        ascii
    };
    format!(
        "attachment; filename=\"{fallback}.zip\"; filename*=UTF-8''{}.zip",
        urlencoding::encode(&clean)
    )
}
