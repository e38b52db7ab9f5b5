//! Archive assembly and streaming
//!
//! Builds one zip per request: a human-readable metadata document first,
//! then one audio entry per successfully-fetched recording. Assets are
//! fetched strictly sequentially with a fixed pause between fetches, and a
//! failed or undersized payload skips that entry without aborting the rest.
//!
//! The compressor and the output sink complete independently: the zip
//! writer finishes once the central directory is encoded, while the sink
//! finishes once every buffered byte has been accepted and flushed. The
//! assembler reports completion only after both signals.

use crate::extract::{Recording, SongExtraction, SITE_ORIGIN};
use crate::fetch::AssetSource;
use crate::sse::ProgressEmitter;
use async_zip::tokio::write::ZipFileWriter;
use async_zip::{Compression, ZipEntryBuilder};
use chrono::Local;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt, DuplexStream};
use tracing::{info, warn};
use zemer_common::events::ProgressEvent;
use zemer_common::{Error, Result};

/// Payloads at or below this size are placeholder/error responses, not audio.
pub const MIN_ASSET_BYTES: usize = 1000;

/// Name of the metadata document inside the archive
pub const METADATA_ENTRY_NAME: &str = "מידע_על_השיר.txt";

/// Buffer between the zip encoder and the sink pump
const PIPE_CAPACITY: usize = 64 * 1024;

/// Outcome of one archive run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub total: usize,
    pub archived: usize,
}

/// Replace the characters Windows filenames reject with underscores.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        })
        .collect()
}

/// Archive entry name for one recording.
pub fn entry_filename(title: &str, recording: &Recording) -> String {
    let title = sanitize_filename(title);
    let performer = sanitize_filename(&recording.meta.performer);
    if recording.meta.year.is_empty() {
        format!("{:02} - {} - {}.mp3", recording.index, title, performer)
    } else {
        format!(
            "{:02} - {} - {} {}.mp3",
            recording.index, title, performer, recording.meta.year
        )
    }
}

/// Render the metadata document summarizing every recording, fetched or not.
pub fn render_metadata_doc(song: &SongExtraction) -> String {
    let mut doc = String::new();
    doc.push_str(&format!("🎵 שם השיר: {}\n", song.title));
    doc.push_str(&format!("מספר הקלטות: {}\n", song.recordings.len()));
    doc.push_str(&format!("הורדה מאתר: {SITE_ORIGIN}\n"));
    doc.push_str(&format!(
        "תאריך הורדה: {}\n",
        Local::now().format("%d.%m.%Y, %H:%M:%S")
    ));
    doc.push_str(&format!("\n{}\n\n", "═".repeat(60)));

    for (position, recording) in song.recordings.iter().enumerate() {
        let meta = &recording.meta;
        let padded = format!("{:02}", recording.index);

        doc.push_str(&format!("📀 הקלטה {padded}:\n"));
        doc.push_str(&format!("   🎤 ביצוע: {}\n", meta.performer));
        if !meta.year.is_empty() {
            doc.push_str(&format!("   📅 שנה: {}\n", meta.year));
        }
        if !meta.composer.is_empty() {
            doc.push_str(&format!("   🎼 לחן: {}\n", meta.composer));
        }
        if !meta.poet.is_empty() {
            doc.push_str(&format!("   ✍️ מילים: {}\n", meta.poet));
        }
        if !meta.source.is_empty() {
            doc.push_str(&format!("   📚 מקור: {}\n", meta.source));
        }
        if !meta.soloist.is_empty() {
            doc.push_str(&format!("   🎙️ סולן: {}\n", meta.soloist));
        }
        if !meta.album.is_empty() {
            doc.push_str(&format!("   💿 אלבום: {}\n", meta.album));
        }
        if !meta.notes.is_empty() {
            doc.push_str(&format!("   📝 הערות: {}\n", meta.notes));
        }

        let display = if meta.year.is_empty() {
            format!("{padded} - {} - {}", song.title, meta.performer)
        } else {
            format!("{padded} - {} - {} {}", song.title, meta.performer, meta.year)
        };
        doc.push_str(&format!("   💾 שם קובץ: {display}.mp3\n"));

        if position + 1 < song.recordings.len() {
            doc.push_str(&format!("\n{}\n\n", "-".repeat(60)));
        }
    }

    doc
}

/// Fetch every recording and stream the assembled archive into `sink`.
///
/// Returns once the zip encoder has finished AND the sink has accepted and
/// flushed every byte; the two completions are observed separately and the
/// later one gates the return. Per-recording fetch failures reduce the
/// summary's archived count but never fail the archive.
pub async fn stream_archive<W>(
    song: &SongExtraction,
    source: &dyn AssetSource,
    inter_fetch_delay: Duration,
    sink: W,
    progress: &ProgressEmitter,
) -> Result<ArchiveSummary>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (pipe_w, mut pipe_r) = tokio::io::duplex(PIPE_CAPACITY);

    // Sink half: pump compressed bytes out and flush. Runs concurrently
    // with encoding and finishes on its own schedule.
    let mut sink = sink;
    let pump = tokio::spawn(async move {
        tokio::io::copy(&mut pipe_r, &mut sink).await?;
        sink.flush().await?;
        sink.shutdown().await?;
        Ok::<(), std::io::Error>(())
    });

    let encode_result = write_entries(song, source, inter_fetch_delay, pipe_w, progress).await;

    // The encoder's pipe end is closed by now (success or failure), so the
    // pump always reaches EOF. Await its completion signal before reporting.
    let pump_result = pump.await;

    let archived = encode_result?;
    match pump_result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(Error::Archive(format!("archive output not flushed: {e}"))),
        Err(e) => return Err(Error::Archive(format!("archive output task failed: {e}"))),
    }

    Ok(ArchiveSummary {
        total: song.recordings.len(),
        archived,
    })
}

async fn write_entries(
    song: &SongExtraction,
    source: &dyn AssetSource,
    inter_fetch_delay: Duration,
    pipe: DuplexStream,
    progress: &ProgressEmitter,
) -> Result<usize> {
    let mut zip = ZipFileWriter::with_tokio(pipe);

    let doc = render_metadata_doc(song);
    let entry = ZipEntryBuilder::new(METADATA_ENTRY_NAME.to_string().into(), Compression::Deflate);
    zip.write_entry_whole(entry, doc.as_bytes())
        .await
        .map_err(|e| Error::Archive(format!("metadata entry failed: {e}")))?;

    let total = song.recordings.len();
    let mut archived = 0;
    for (position, recording) in song.recordings.iter().enumerate() {
        progress.emit(ProgressEvent::download(
            format!("Fetching {}", recording.meta.performer),
            recording.index,
            total,
        ));

        match source.fetch_asset(&recording.url).await {
            Ok(payload) if payload.len() > MIN_ASSET_BYTES => {
                let name = entry_filename(&song.title, recording);
                info!(
                    "[{}/{}] {} bytes -> {}",
                    recording.index,
                    total,
                    payload.len(),
                    name
                );
                // Audio is already compressed; store it as-is.
                let entry = ZipEntryBuilder::new(name.clone().into(), Compression::Stored);
                zip.write_entry_whole(entry, &payload)
                    .await
                    .map_err(|e| Error::Archive(format!("entry '{name}' failed: {e}")))?;
                archived += 1;
                progress.emit(ProgressEvent::success(name, recording.index, total));
            }
            Ok(payload) => {
                warn!(
                    "[{}/{}] undersized payload ({} bytes), skipping",
                    recording.index,
                    total,
                    payload.len()
                );
                progress.emit(ProgressEvent::warning(format!(
                    "Recording {} skipped: payload too small ({} bytes)",
                    recording.index,
                    payload.len()
                )));
            }
            Err(e) => {
                warn!("[{}/{}] fetch failed: {e}", recording.index, total);
                progress.emit(ProgressEvent::warning(format!(
                    "Recording {} skipped: {e}",
                    recording.index
                )));
            }
        }

        if position + 1 < total {
            tokio::time::sleep(inter_fetch_delay).await;
        }
    }

    let writer = zip
        .close()
        .await
        .map_err(|e| Error::Archive(format!("archive finalize failed: {e}")))?;
    // Dropping the returned pipe end signals EOF to the pump.
    drop(writer);

    progress.emit(ProgressEvent::complete(archived, total));
    Ok(archived)
}
