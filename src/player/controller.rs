use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::library::Track;
use crate::media::{MediaElement, MediaEvent, Subscription};

use super::queue::{Queue, next_index, previous_index};
use super::state::{PlaybackState, RepeatMode};

/// A media event tagged with the subscription that produced it.
#[derive(Debug)]
struct MediaNotice {
    generation: u64,
    event: MediaEvent,
}

/// What was last handed to the media element.
#[derive(Debug, Clone, PartialEq)]
struct LoadedKey {
    id: String,
    locator: Option<String>,
}

/// The playback controller.
///
/// All operations are synchronous, never fail and never block: bad inputs
/// are clamped, transport commands without a track are no-ops, and a media
/// element that refuses to start leaves the player paused at time 0.
pub struct Player<M: MediaElement> {
    media: M,
    state: PlaybackState,
    rng: StdRng,

    loaded: Option<LoadedKey>,
    source_ready: bool,

    // Held for as long as `loaded` is current. `generation` tags the
    // notices it produces so queued ones from a previous track are dropped.
    subscription: Option<Subscription>,
    generation: u64,
    notices_tx: Sender<MediaNotice>,
    notices_rx: Receiver<MediaNotice>,
}

impl<M: MediaElement> Player<M> {
    pub fn new(media: M) -> Self {
        Self::with_rng(media, StdRng::from_os_rng())
    }

    /// Construct with an explicit RNG for shuffle picks.
    pub fn with_rng(mut media: M, rng: StdRng) -> Self {
        let state = PlaybackState::default();
        media.set_volume(state.volume);
        let (notices_tx, notices_rx) = mpsc::channel();

        Self {
            media,
            state,
            rng,
            loaded: None,
            source_ready: false,
            subscription: None,
            generation: 0,
            notices_tx,
            notices_rx,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    /// Play `track`, replacing the queue with `queue` when one is given
    /// (and non-empty) or with just `[track]` otherwise.
    pub fn play_track(&mut self, track: Track, queue: Option<Vec<Track>>) {
        let tracks = match queue {
            Some(q) if !q.is_empty() => q,
            _ => vec![track.clone()],
        };
        let mut queue = Queue::new(tracks, Some(0));
        let index = queue.position_of(&track).unwrap_or(0);
        queue.select(index);
        tracing::debug!(id = %track.id, index, len = queue.len(), "play track");

        self.state.queue = queue;
        self.state.current_track = Some(track);
        self.state.is_playing = true;
        self.start_playback();
    }

    /// Make `tracks` the queue with `index` (clamped) current, without
    /// starting output. A later `resume` loads and plays it.
    pub fn cue(&mut self, tracks: Vec<Track>, index: usize) {
        if tracks.is_empty() {
            return;
        }
        self.state.queue = Queue::new(tracks, Some(index));
        self.state.current_track = self.state.queue.current().cloned();
        self.state.is_playing = false;
        self.state.current_time = 0.0;
        self.state.duration = self
            .state
            .current_track
            .as_ref()
            .map_or(0.0, |t| t.duration.max(0.0));
        // Force a fresh load on resume so playback starts at 0, and stop
        // listening to the track that was loaded before.
        self.release_subscription();
        self.loaded = None;
        self.source_ready = false;
        self.media.pause();
    }

    /// Play the queue entry at `index` (clamped). No-op on an empty queue.
    pub fn play_index(&mut self, index: usize) {
        if self.state.queue.is_empty() {
            return;
        }
        self.select(index);
    }

    pub fn pause(&mut self) {
        if self.state.current_track.is_none() {
            return;
        }
        self.state.is_playing = false;
        self.media.pause();
    }

    pub fn resume(&mut self) {
        if self.state.current_track.is_none() {
            return;
        }
        self.state.is_playing = true;
        self.start_playback();
    }

    pub fn toggle_play_pause(&mut self) {
        if self.state.is_playing {
            self.pause();
        } else {
            self.resume();
        }
    }

    /// Pause and rewind to the start of the current track.
    pub fn stop(&mut self) {
        if self.state.current_track.is_none() {
            return;
        }
        self.pause();
        self.seek(0.0);
    }

    /// Advance to the next track.
    ///
    /// With shuffle on, any queue position may be picked, including the
    /// current one. Otherwise the queue order is followed and running off
    /// the end either wraps (`RepeatMode::All`) or pauses on the last track.
    pub fn skip_next(&mut self) {
        let len = self.state.queue.len();
        if len == 0 {
            return;
        }

        let next = if self.state.shuffle {
            Some(self.rng.random_range(0..len))
        } else {
            next_index(self.state.queue.current_index(), len, self.state.repeat)
        };

        match next {
            Some(i) => self.select(i),
            None => {
                tracing::debug!("end of queue");
                self.state.is_playing = false;
                self.media.pause();
            }
        }
    }

    pub fn skip_previous(&mut self) {
        let len = self.state.queue.len();
        if len == 0 {
            return;
        }
        let prev = previous_index(self.state.queue.current_index(), len, self.state.repeat);
        self.select(prev);
    }

    /// Jump to `seconds`, clamped into the current track.
    pub fn seek(&mut self, seconds: f64) {
        if self.state.current_track.is_none() {
            return;
        }
        let target = clamp_seek(seconds, self.state.duration);
        self.state.current_time = target;
        self.media.set_current_time(target);
    }

    pub fn seek_by(&mut self, delta: f64) {
        self.seek(self.state.current_time + delta);
    }

    pub fn set_volume(&mut self, volume: f32) {
        let volume = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };
        self.state.volume = volume;
        self.media.set_volume(volume);
    }

    pub fn toggle_shuffle(&mut self) {
        self.set_shuffle(!self.state.shuffle);
    }

    pub fn set_shuffle(&mut self, shuffle: bool) {
        self.state.shuffle = shuffle;
    }

    pub fn toggle_repeat(&mut self) {
        self.set_repeat(self.state.repeat.cycled());
    }

    pub fn set_repeat(&mut self, repeat: RepeatMode) {
        self.state.repeat = repeat;
    }

    /// Apply every media notification received since the last call.
    /// Notices from a subscription that has since been released are
    /// discarded. Returns how many were applied.
    pub fn drain_media_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(notice) = self.notices_rx.try_recv() {
            if notice.generation != self.generation {
                tracing::trace!(?notice, "dropping stale media event");
                continue;
            }
            self.on_media_event(notice.event);
            applied += 1;
        }
        applied
    }

    /// Fade out, stop output and release the media subscription.
    pub fn shutdown(&mut self, fade_out: Duration) {
        if self.state.is_playing {
            self.media.fade_out(fade_out);
        }
        self.media.pause();
        self.state.is_playing = false;
        self.release_subscription();
    }

    fn on_media_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::TimeUpdate { current_time } if current_time.is_finite() => {
                self.state.current_time = current_time.max(0.0);
            }
            MediaEvent::LoadedMetadata { duration } if duration.is_finite() && duration > 0.0 => {
                self.state.duration = duration;
            }
            MediaEvent::Ended => self.on_ended(),
            _ => {}
        }
    }

    fn on_ended(&mut self) {
        if self.state.current_track.is_none() {
            return;
        }

        if self.state.repeat == RepeatMode::One {
            tracing::debug!("repeating current track");
            self.state.current_time = 0.0;
            self.state.is_playing = true;
            self.media.set_current_time(0.0);
            self.start_playback();
            return;
        }

        let before = self.state.queue.current_index();
        self.skip_next();
        if self.state.is_playing && self.state.queue.current_index() == before {
            // Same entry again (one-track queue or shuffle pick): it starts over.
            self.state.current_time = 0.0;
        }
    }

    fn select(&mut self, index: usize) {
        self.state.current_track = self.state.queue.select(index).cloned();
        self.state.is_playing = true;
        self.start_playback();
    }

    /// Make the media element output the current track, or fall back to
    /// paused at 0 when it cannot.
    fn start_playback(&mut self) {
        if !self.load_current() {
            self.downgrade();
            return;
        }
        if let Err(e) = self.media.play() {
            tracing::warn!(error = %e, "playback did not start");
            self.downgrade();
        }
    }

    /// Hand the current track to the media element unless it already has
    /// its locator. Returns whether a source is ready to play.
    ///
    /// A different track resubscribes either way, but `set_source` is only
    /// called when the locator differs from the one already loaded.
    fn load_current(&mut self) -> bool {
        let Some(track) = self.state.current_track.as_ref() else {
            return false;
        };
        let key = LoadedKey {
            id: track.id.clone(),
            locator: track.locator().map(str::to_owned),
        };
        let duration = track.duration;

        if self.loaded.as_ref() != Some(&key) {
            let same_source = self.source_ready
                && key.locator.is_some()
                && self.loaded.as_ref().is_some_and(|k| k.locator == key.locator);

            self.resubscribe();
            self.state.duration = if duration.is_finite() {
                duration.max(0.0)
            } else {
                0.0
            };
            self.loaded = Some(key.clone());
            if same_source {
                self.state.current_time = self.media.current_time();
                return true;
            }
            self.state.current_time = 0.0;
            self.source_ready = false;
        } else if self.source_ready {
            return true;
        }

        self.source_ready = match key.locator.as_deref() {
            Some(locator) => match self.media.set_source(locator) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(id = %key.id, error = %e, "could not load media source");
                    false
                }
            },
            None => {
                tracing::warn!(id = %key.id, "track has no media locator");
                false
            }
        };
        self.source_ready
    }

    /// Release the previous track's handlers and subscribe for the new one.
    fn resubscribe(&mut self) {
        self.release_subscription();

        let generation = self.generation;
        let tx = self.notices_tx.clone();
        self.subscription = Some(self.media.subscribe(Box::new(move |event| {
            let _ = tx.send(MediaNotice { generation, event });
        })));
    }

    /// Drop the current handlers. Notices they already queued become stale.
    fn release_subscription(&mut self) {
        self.subscription = None;
        self.generation += 1;
    }

    fn downgrade(&mut self) {
        self.state.is_playing = false;
        self.state.current_time = 0.0;
        self.media.pause();
        if self.source_ready {
            self.media.set_current_time(0.0);
        }
    }
}

fn clamp_seek(seconds: f64, duration: f64) -> f64 {
    if !seconds.is_finite() {
        return if seconds == f64::INFINITY && duration > 0.0 {
            duration
        } else {
            0.0
        };
    }
    let t = seconds.max(0.0);
    if duration > 0.0 { t.min(duration) } else { t }
}
