//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;
use serde::de::value::{Error as ValueError, StrDeserializer};

use crate::config::{RepeatSetting, Settings};

/// Headless music player controlled from stdin and MPRIS.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Music directory or JSON track list (defaults to the current directory)
    pub path: Option<PathBuf>,

    /// Queue position to start from
    #[arg(short, long, default_value_t = 0)]
    pub start: usize,

    /// Load the queue without starting playback
    #[arg(long)]
    pub paused: bool,

    /// Start with shuffle on
    #[arg(long)]
    pub shuffle: bool,

    /// Repeat mode: none, one or all
    #[arg(long, value_parser = parse_repeat)]
    pub repeat: Option<RepeatSetting>,

    /// Initial volume between 0 and 1
    #[arg(long, value_parser = parse_volume)]
    pub volume: Option<f32>,

    /// Config file to use instead of the default location
    #[arg(short, long, env = "HARMONY_CONFIG_PATH")]
    pub config: Option<PathBuf>,

    /// Do not register on the session bus
    #[arg(long)]
    pub no_mpris: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// Apply flags that override the loaded settings.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if self.shuffle {
            settings.playback.shuffle = true;
        }
        if let Some(repeat) = self.repeat {
            settings.playback.repeat = repeat;
        }
        if let Some(volume) = self.volume {
            settings.playback.volume = volume;
        }
        if self.no_mpris {
            settings.mpris.enabled = false;
        }
    }
}

/// Accept the same spellings as the config file (`all`, `loop-all`, ...).
fn parse_repeat(value: &str) -> Result<RepeatSetting, String> {
    RepeatSetting::deserialize(StrDeserializer::<ValueError>::new(value))
        .map_err(|_| format!("unknown repeat mode `{value}` (expected none, one or all)"))
}

fn parse_volume(value: &str) -> Result<f32, String> {
    let volume: f32 = value.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&volume) {
        Ok(volume)
    } else {
        Err(format!("volume must be between 0 and 1, got {volume}"))
    }
}
