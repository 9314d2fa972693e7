//! The media primitive the playback controller drives.
//!
//! `MediaElement` is the seam between player logic and whatever actually
//! decodes audio. The controller only ever talks to this trait; `RodioMedia`
//! is the implementation used at runtime.
//!
//! Progress reporting flows the other way: the element pushes `MediaEvent`s
//! to whoever holds a live `Subscription`. Dropping the subscription
//! unregisters the handler.

mod backend;
mod fetch;
mod locator;
mod sink;
mod subscription;

use std::time::Duration;

pub use backend::RodioMedia;
pub use locator::{Locator, resolve_locator};
pub use subscription::{EventHandler, Listeners, Subscription};

/// Notifications pushed by a media element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaEvent {
    /// Periodic playback progress, in seconds.
    TimeUpdate { current_time: f64 },
    /// Metadata for the current source became available.
    LoadedMetadata { duration: f64 },
    /// The current source played to its end.
    Ended,
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// `play()` was called with nothing loaded
    #[error("no media source loaded")]
    NoSource,

    /// The locator names something this element cannot fetch
    #[error("unsupported media locator: {0}")]
    UnsupportedLocator(String),

    /// The locator resolved to a file that could not be opened
    #[error("failed to open {locator}: {source}")]
    Open {
        locator: String,
        #[source]
        source: std::io::Error,
    },

    /// A remote locator could not be downloaded
    #[error("failed to fetch {locator}: {message}")]
    Fetch { locator: String, message: String },

    /// The file opened but is not decodable audio
    #[error("failed to decode {locator}: {message}")]
    Decode { locator: String, message: String },

    /// The audio output device is unavailable
    #[error("audio output unavailable: {0}")]
    Output(String),
}

/// An audio playback primitive.
///
/// Implementations must never block on `play`/`pause`/seeking; failures to
/// start are reported as `Err` and the caller treats them as "not playing".
pub trait MediaElement {
    /// Load a new source, stopping whatever was loaded before. The new
    /// source starts paused at time 0.
    fn set_source(&mut self, locator: &str) -> Result<(), MediaError>;

    /// Start or resume output of the loaded source.
    ///
    /// Once the source has played to its end (after `Ended` was emitted),
    /// `play` restarts it from time 0. The controller relies on this to
    /// replay the same entry without reloading it.
    fn play(&mut self) -> Result<(), MediaError>;

    fn pause(&mut self);

    /// Current position in seconds.
    fn current_time(&self) -> f64;

    fn set_current_time(&mut self, seconds: f64);

    fn volume(&self) -> f32;

    fn set_volume(&mut self, volume: f32);

    /// Register `handler` for time-update, loaded-metadata and ended events
    /// until the returned `Subscription` is dropped.
    fn subscribe(&mut self, handler: EventHandler) -> Subscription;

    /// Ramp the output down to silence over `duration` before shutdown.
    fn fade_out(&mut self, _duration: Duration) {}
}
