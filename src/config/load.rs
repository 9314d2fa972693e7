use std::{env, path::Path, path::PathBuf};

use super::schema::Settings;
use crate::error::{Error, Result};

/// Configuration loading helpers.
///
/// `Settings::load` reads an optional config file, then lets environment
/// variables (prefix `HARMONY__`) override it, and falls back to struct
/// defaults for anything unset.
impl Settings {
    /// Load settings from the resolved config path and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(resolve_config_path().as_deref())
    }

    /// Load settings using `config_path` instead of the resolved default.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(::config::File::from(path).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("HARMONY")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<()> {
        if self.audio.tick_ms == 0 {
            return Err(Error::invalid_config("audio.tick_ms must be >= 1"));
        }
        if self.audio.http_timeout_secs == 0 {
            return Err(Error::invalid_config("audio.http_timeout_secs must be >= 1"));
        }
        if !(0.0..=1.0).contains(&self.playback.volume) {
            return Err(Error::invalid_config(
                "playback.volume must be between 0 and 1",
            ));
        }
        Ok(())
    }

    /// Render the effective settings as TOML.
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Resolve the config path from `HARMONY_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("HARMONY_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/harmony/config.toml`
/// or `~/.config/harmony/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join("harmony").join("config.toml"))
}
