//! Track sources: the `Track` model plus the loaders that produce queues.
//!
//! Tracks come either from a local directory scan or from a JSON track list
//! exported by the music backend. The player never mutates them.

mod display;
mod model;
mod scan;
mod tracklist;

use std::path::Path;

use crate::config::LibrarySettings;
use crate::error::{Error, Result};

pub use display::display_from_fields;
pub use model::Track;
pub use scan::scan;
pub use tracklist::{load_track_list, parse_track_list};

/// Load tracks from `path`: a directory is scanned, anything else is read as
/// a JSON track list.
pub fn load(path: &Path, settings: &LibrarySettings) -> Result<Vec<Track>> {
    let tracks = if path.is_dir() {
        scan(path, settings)
    } else {
        load_track_list(path)?
    };

    if tracks.is_empty() {
        return Err(Error::NoTracks(path.to_path_buf()));
    }
    tracing::info!(count = tracks.len(), path = %path.display(), "loaded tracks");
    Ok(tracks)
}
