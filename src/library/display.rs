use std::path::Path;

use crate::config::TrackDisplayField;

use super::model::Track;

/// Build a display string for `track` according to `fields` and `sep`.
///
/// Fields that are empty for this track are skipped; when nothing at all is
/// produced the title is used.
pub fn display_from_fields(track: &Track, fields: &[TrackDisplayField], sep: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    let title = track.title.trim();
    let artist = Some(track.artist.trim()).filter(|s| !s.is_empty());

    for f in fields {
        match f {
            TrackDisplayField::Display => {
                // "display" on its own means "artist - title".
                if let Some(a) = artist {
                    parts.push(a.to_string());
                }
                if !title.is_empty() {
                    parts.push(title.to_string());
                }
            }
            TrackDisplayField::Title => {
                if !title.is_empty() {
                    parts.push(title.to_string());
                }
            }
            TrackDisplayField::Artist => {
                if let Some(a) = artist {
                    parts.push(a.to_string());
                }
            }
            TrackDisplayField::Album => {
                if let Some(a) = track.album.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                    parts.push(a.to_string());
                }
            }
            TrackDisplayField::Filename => {
                if let Some(stem) = track
                    .locator()
                    .and_then(|l| Path::new(l).file_stem())
                    .and_then(|s| s.to_str())
                {
                    if !stem.trim().is_empty() {
                        parts.push(stem.to_string());
                    }
                }
            }
            TrackDisplayField::Locator => {
                if let Some(l) = track.locator() {
                    parts.push(l.to_string());
                }
            }
        }
    }

    if parts.is_empty() {
        track.title.clone()
    } else {
        parts.join(sep)
    }
}
