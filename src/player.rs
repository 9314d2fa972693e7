//! The playback controller.
//!
//! `Player` owns the single `PlaybackState` of the application: current
//! track, queue, transport, shuffle/repeat, position and volume. Callers
//! issue commands through its methods and read state through
//! [`Player::state`]; the media element underneath is driven as a side
//! effect and reports progress back through a subscription that is renewed
//! every time the loaded track changes.

mod controller;
mod queue;
mod state;

pub use controller::Player;
pub use queue::Queue;
pub use state::{PlaybackState, RepeatMode, Transport};

#[cfg(test)]
mod tests;
