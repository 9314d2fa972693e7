//! Application-wide error types.
//!
//! Playback operations themselves never fail: bad inputs are clamped and
//! media failures are downgraded to "not playing". Errors only surface when
//! loading settings, loading tracks, or talking to the audio device.

use std::path::PathBuf;

use crate::media::MediaError;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings could not be read or deserialized
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    /// Settings were read but failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A track list file is not valid JSON for the expected shape
    #[error("Track list error: {0}")]
    Json(#[from] serde_json::Error),

    /// The audio primitive rejected an operation
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// A track source produced nothing playable
    #[error("No tracks found in {0}")]
    NoTracks(PathBuf),
}

impl Error {
    /// Create a validation error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}
