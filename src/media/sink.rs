//! Utilities for creating `rodio` sinks from local files or fetched bytes.
//!
//! Opening/decoding a source and preparing a paused `Sink` at a requested
//! start position lives here so both source loads and seek fallbacks share
//! it.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink, Source};

use super::MediaError;

/// Decodable audio that can be reopened for a rebuild.
#[derive(Clone)]
pub(super) enum SourceData {
    File(PathBuf),
    /// A remote body, fetched once and kept for seeks and restarts.
    Memory { url: String, bytes: Arc<[u8]> },
}

impl SourceData {
    pub fn describe(&self) -> String {
        match self {
            SourceData::File(path) => path.display().to_string(),
            SourceData::Memory { url, .. } => url.clone(),
        }
    }
}

/// A paused sink plus what the decoder knows about the source length.
pub(super) struct PreparedSink {
    pub sink: Sink,
    pub total_duration: Option<Duration>,
}

/// Create a paused `Sink` for `source` that starts playback at `start_at`.
pub(super) fn create_sink_at(
    stream: &OutputStream,
    source: &SourceData,
    start_at: Duration,
    volume: f32,
) -> Result<PreparedSink, MediaError> {
    match source {
        SourceData::File(path) => {
            let file = File::open(path).map_err(|source| MediaError::Open {
                locator: path.display().to_string(),
                source,
            })?;
            prepare(stream, BufReader::new(file), source, start_at, volume)
        }
        SourceData::Memory { bytes, .. } => {
            prepare(stream, Cursor::new(bytes.clone()), source, start_at, volume)
        }
    }
}

fn prepare<R>(
    stream: &OutputStream,
    reader: R,
    source: &SourceData,
    start_at: Duration,
    volume: f32,
) -> Result<PreparedSink, MediaError>
where
    R: Read + Seek + Send + Sync + 'static,
{
    let decoder = Decoder::new(reader).map_err(|e| MediaError::Decode {
        locator: source.describe(),
        message: e.to_string(),
    })?;
    let total_duration = decoder.total_duration();

    let sink = Sink::connect_new(stream.mixer());
    sink.set_volume(volume);
    // `skip_duration` is our fallback seeking primitive; Duration::ZERO is fine.
    sink.append(decoder.skip_duration(start_at));
    sink.pause();

    Ok(PreparedSink {
        sink,
        total_duration,
    })
}

/// Read the duration from tags when the decoder cannot tell (VBR mp3 etc).
pub(super) fn tag_duration(source: &SourceData) -> Option<Duration> {
    use lofty::prelude::*;
    use lofty::probe::Probe;

    let tagged = match source {
        SourceData::File(path) => lofty::read_from_path(path).ok()?,
        SourceData::Memory { bytes, .. } => Probe::new(Cursor::new(bytes.clone()))
            .guess_file_type()
            .ok()?
            .read()
            .ok()?,
    };
    Some(tagged.properties().duration()).filter(|d| !d.is_zero())
}
