use serde::{Deserialize, Serialize};

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/harmony/config.toml` or `~/.config/harmony/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `HARMONY__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub playback: PlaybackSettings,
    pub controls: ControlsSettings,
    pub library: LibrarySettings,
    pub log: LogSettings,
    pub mpris: MprisSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// How often the audio watcher reports progress (milliseconds). Also the
    /// runtime's command poll interval.
    pub tick_ms: u64,
    /// Fade-out duration when quitting (milliseconds).
    /// Set to 0 to stop immediately.
    pub quit_fade_out_ms: u64,
    /// Timeout for downloading `http(s)://` sources (seconds).
    pub http_timeout_secs: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            tick_ms: 250,
            quit_fade_out_ms: 500,
            http_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Whether shuffle starts enabled.
    pub shuffle: bool,
    /// Initial repeat mode.
    pub repeat: RepeatSetting,
    /// Initial volume in `[0, 1]`.
    pub volume: f32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            shuffle: false,
            repeat: RepeatSetting::None,
            volume: 1.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepeatSetting {
    #[serde(alias = "off", alias = "no_loop", alias = "no-loop")]
    None,
    #[serde(alias = "track", alias = "repeat-one", alias = "loop-one", alias = "loop_one")]
    One,
    #[serde(
        alias = "playlist",
        alias = "loop-all",
        alias = "loop_all",
        alias = "loop-around"
    )]
    All,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Seconds moved by `ff`/`rew` and by `seek +`/`seek -` without a number.
    pub scrub_seconds: u64,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self { scrub_seconds: 5 }
    }
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackDisplayField {
    /// "artist - title".
    Display,
    Title,
    Artist,
    Album,
    Filename,
    #[serde(alias = "path", alias = "url")]
    Locator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,

    /// Which fields make up a track's display string (scan order, MPRIS
    /// title, status output).
    ///
    /// Example: ["artist", "title"] -> "Artist - Title"
    pub display_fields: Vec<TrackDisplayField>,
    /// Separator used to join `display_fields`.
    pub display_separator: String,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            follow_links: true,
            include_hidden: true,
            recursive: true,
            max_depth: None,
            display_fields: vec![TrackDisplayField::Artist, TrackDisplayField::Title],
            display_separator: " - ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `tracing` filter directive used when `RUST_LOG` is not set.
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "harmony=info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MprisSettings {
    /// Whether to expose the player on the D-Bus session bus.
    pub enabled: bool,
}

impl Default for MprisSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}
