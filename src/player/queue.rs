//! The play queue and its navigation rules.

use crate::library::Track;

use super::state::RepeatMode;

/// Ordered tracks plus a pointer to the current one.
///
/// A `Some` index is always a valid position: constructors and `select`
/// clamp, and an empty queue never has a current index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Queue {
    tracks: Vec<Track>,
    current: Option<usize>,
}

impl Queue {
    pub fn new(tracks: Vec<Track>, current: Option<usize>) -> Self {
        let current = clamp_index(current, tracks.len());
        Self { tracks, current }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&Track> {
        self.current.and_then(|i| self.tracks.get(i))
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Position of the track with the same id as `track`.
    pub fn position_of(&self, track: &Track) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == track.id)
    }

    /// Point at `index`, clamped into range. Returns the selected track.
    pub(super) fn select(&mut self, index: usize) -> Option<&Track> {
        self.current = clamp_index(Some(index), self.tracks.len());
        self.current()
    }
}

fn clamp_index(index: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    index.map(|i| i.min(len - 1))
}

/// Index after `current` in queue order, or `None` when playback should
/// stop because the end was reached without `RepeatMode::All`.
///
/// Manual skips never repeat the current track; `RepeatMode::One` only
/// matters when a track ends on its own.
pub(super) fn next_index(current: Option<usize>, len: usize, repeat: RepeatMode) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let candidate = current.map_or(0, |i| i + 1);
    if candidate < len {
        Some(candidate)
    } else if repeat == RepeatMode::All {
        Some(0)
    } else {
        None
    }
}

/// Index before `current`: wraps to the end under `RepeatMode::All`,
/// otherwise stays at 0.
pub(super) fn previous_index(current: Option<usize>, len: usize, repeat: RepeatMode) -> usize {
    match current {
        Some(0) if repeat == RepeatMode::All && len > 0 => len - 1,
        Some(0) | None => 0,
        Some(i) => (i - 1).min(len.saturating_sub(1)),
    }
}
