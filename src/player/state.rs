//! Playback state types.

use crate::config::RepeatSetting;
use crate::library::Track;

use super::queue::Queue;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum RepeatMode {
    /// Stop at the end of the queue.
    #[default]
    None,
    /// Restart the current track when it ends.
    One,
    /// Wrap around to the start of the queue.
    All,
}

impl RepeatMode {
    /// The mode after this one in the `None -> One -> All -> None` cycle.
    pub fn cycled(self) -> Self {
        match self {
            Self::None => Self::One,
            Self::One => Self::All,
            Self::All => Self::None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::One => "one",
            Self::All => "all",
        }
    }
}

impl From<RepeatSetting> for RepeatMode {
    fn from(setting: RepeatSetting) -> Self {
        match setting {
            RepeatSetting::None => Self::None,
            RepeatSetting::One => Self::One,
            RepeatSetting::All => Self::All,
        }
    }
}

/// Coarse transport state, as shown to remote controls.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Transport {
    /// Nothing has been loaded yet.
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Everything the controller knows about playback.
///
/// Time values are seconds. `current_time` and `duration` mirror what the
/// media element reports; `duration` starts from the track's own metadata
/// and is replaced once the media element knows better.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub current_track: Option<Track>,
    pub is_playing: bool,
    pub volume: f32,
    pub current_time: f64,
    pub duration: f64,
    pub queue: Queue,
    pub shuffle: bool,
    pub repeat: RepeatMode,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_track: None,
            is_playing: false,
            volume: 1.0,
            current_time: 0.0,
            duration: 0.0,
            queue: Queue::default(),
            shuffle: false,
            repeat: RepeatMode::None,
        }
    }
}

impl PlaybackState {
    pub fn current_index(&self) -> Option<usize> {
        self.queue.current_index()
    }

    pub fn transport(&self) -> Transport {
        match (&self.current_track, self.is_playing) {
            (None, _) => Transport::Stopped,
            (Some(_), true) => Transport::Playing,
            (Some(_), false) => Transport::Paused,
        }
    }
}
