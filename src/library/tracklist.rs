use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

use super::model::Track;

/// Either a bare array of songs or a paginated response wrapping one.
#[derive(Deserialize)]
#[serde(untagged)]
enum TrackList {
    Plain(Vec<Track>),
    Paged { results: Vec<Track> },
}

/// Parse a JSON track list.
pub fn parse_track_list(json: &str) -> Result<Vec<Track>> {
    let list: TrackList = serde_json::from_str(json)?;
    let tracks = match list {
        TrackList::Plain(tracks) => tracks,
        TrackList::Paged { results } => results,
    };

    let missing = tracks.iter().filter(|t| t.locator().is_none()).count();
    if missing > 0 {
        tracing::warn!(missing, "track list contains tracks without a media locator");
    }
    Ok(tracks)
}

/// Read and parse the JSON track list at `path`.
pub fn load_track_list(path: &Path) -> Result<Vec<Track>> {
    let json = fs::read_to_string(path)?;
    parse_track_list(&json)
}
