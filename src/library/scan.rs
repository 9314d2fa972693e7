use std::path::Path;

use lofty::prelude::*;
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::display::display_from_fields;
use super::model::Track;

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn non_blank(v: Option<std::borrow::Cow<'_, str>>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Build a `Track` for a local audio file. Unreadable tags leave the file
/// stem as title and the duration unknown.
fn read_track(path: &Path) -> Track {
    let mut title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();
    let mut artist = String::new();
    let mut album: Option<String> = None;
    let mut duration = 0.0;

    match lofty::read_from_path(path) {
        Ok(tagged) => {
            duration = tagged.properties().duration().as_secs_f64();

            if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                if let Some(v) = non_blank(tag.title()) {
                    title = v;
                }
                if let Some(v) = non_blank(tag.artist()) {
                    artist = v;
                }
                album = non_blank(tag.album());
            }
        }
        Err(e) => tracing::debug!(path = %path.display(), error = %e, "no readable tags"),
    }

    let locator = path.display().to_string();
    Track {
        id: locator.clone(),
        title,
        artist,
        album,
        media_url: Some(locator),
        duration,
    }
}

/// Walk `dir` and collect every audio file as a `Track`, sorted by its
/// display string (case-insensitive).
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<Track> {
    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    let mut keyed: Vec<(String, Track)> = walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
        .filter(|entry| {
            let path = entry.path();
            path.is_file()
                && (settings.include_hidden || !is_hidden(path))
                && is_audio_file(path, settings)
        })
        .map(|entry| {
            let track = read_track(entry.path());
            let key = display_from_fields(
                &track,
                &settings.display_fields,
                &settings.display_separator,
            )
            .to_lowercase();
            (key, track)
        })
        .collect();

    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, t)| t).collect()
}
