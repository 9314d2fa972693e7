use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::library::Track;
use crate::media::{EventHandler, Listeners, MediaElement, MediaError, MediaEvent, Subscription};

use super::queue::{next_index, previous_index};
use super::{Player, Queue, RepeatMode, Transport};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    SetSource(String),
    Play,
    Pause,
    Seek(f64),
    Volume(f32),
    FadeOut,
}

/// Records every call; the test keeps clones of `calls` and `listeners` to
/// inspect the log and to emit events as the "device". `at_end` is set when
/// the device reports `Ended`, and `play` then restarts from 0.
#[derive(Default)]
struct FakeMedia {
    calls: Arc<Mutex<Vec<Call>>>,
    listeners: Listeners,
    at_end: Arc<AtomicBool>,
    fail_play: bool,
    fail_source: bool,
    time: f64,
    volume: f32,
}

impl MediaElement for FakeMedia {
    fn set_source(&mut self, locator: &str) -> Result<(), MediaError> {
        self.calls.lock().unwrap().push(Call::SetSource(locator.to_string()));
        if self.fail_source {
            return Err(MediaError::UnsupportedLocator(locator.to_string()));
        }
        self.time = 0.0;
        self.at_end.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn play(&mut self) -> Result<(), MediaError> {
        self.calls.lock().unwrap().push(Call::Play);
        if self.fail_play {
            return Err(MediaError::Output("blocked".into()));
        }
        if self.at_end.swap(false, Ordering::SeqCst) {
            self.time = 0.0;
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.calls.lock().unwrap().push(Call::Pause);
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.calls.lock().unwrap().push(Call::Seek(seconds));
        self.time = seconds;
        self.at_end.store(false, Ordering::SeqCst);
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.calls.lock().unwrap().push(Call::Volume(volume));
        self.volume = volume;
    }

    fn subscribe(&mut self, handler: EventHandler) -> Subscription {
        self.listeners.subscribe(handler)
    }

    fn fade_out(&mut self, _duration: Duration) {
        self.calls.lock().unwrap().push(Call::FadeOut);
    }
}

struct Harness {
    player: Player<FakeMedia>,
    calls: Arc<Mutex<Vec<Call>>>,
    device: Listeners,
    at_end: Arc<AtomicBool>,
}

impl Harness {
    fn new() -> Self {
        Self::with_media(FakeMedia::default())
    }

    fn with_media(media: FakeMedia) -> Self {
        let calls = media.calls.clone();
        let device = media.listeners.clone();
        let at_end = media.at_end.clone();
        let player = Player::with_rng(media, StdRng::seed_from_u64(7));
        calls.lock().unwrap().clear();
        Self {
            player,
            calls,
            device,
            at_end,
        }
    }

    fn emit(&mut self, event: MediaEvent) {
        if event == MediaEvent::Ended {
            self.at_end.store(true, Ordering::SeqCst);
        }
        self.device.emit(event);
        self.player.drain_media_events();
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

fn track(id: &str) -> Track {
    Track {
        id: id.to_string(),
        title: format!("Title {id}"),
        artist: "Artist".to_string(),
        album: None,
        media_url: Some(format!("/music/{id}.mp3")),
        duration: 180.0,
    }
}

fn abc() -> Vec<Track> {
    vec![track("a"), track("b"), track("c")]
}

fn current_id(p: &Player<FakeMedia>) -> Option<&str> {
    p.state().current_track.as_ref().map(|t| t.id.as_str())
}

#[test]
fn starts_idle() {
    let h = Harness::new();
    let s = h.player.state();
    assert!(s.current_track.is_none());
    assert!(!s.is_playing);
    assert_eq!(s.volume, 1.0);
    assert!(s.queue.is_empty());
    assert_eq!(s.current_index(), None);
    assert_eq!(s.transport(), Transport::Stopped);
}

#[test]
fn play_track_without_queue_queues_only_that_track() {
    let mut h = Harness::new();
    h.player.play_track(track("a"), None);

    let s = h.player.state();
    assert_eq!(s.queue.tracks(), &[track("a")]);
    assert_eq!(s.current_index(), Some(0));
    assert!(s.is_playing);
    assert_eq!(s.transport(), Transport::Playing);
    assert_eq!(
        h.calls(),
        vec![Call::SetSource("/music/a.mp3".into()), Call::Play]
    );
}

#[test]
fn play_track_with_empty_queue_queues_only_that_track() {
    let mut h = Harness::new();
    h.player.play_track(track("a"), Some(Vec::new()));
    assert_eq!(h.player.state().queue.len(), 1);
    assert_eq!(h.player.state().current_index(), Some(0));
}

#[test]
fn play_track_points_at_the_track_in_the_given_queue() {
    let mut h = Harness::new();
    h.player.play_track(track("b"), Some(abc()));
    assert_eq!(h.player.state().current_index(), Some(1));
    assert_eq!(current_id(&h.player), Some("b"));
}

#[test]
fn play_track_absent_from_queue_keeps_queue_and_index_zero() {
    let mut h = Harness::new();
    h.player.play_track(track("z"), Some(abc()));

    let s = h.player.state();
    assert_eq!(s.queue.tracks(), abc().as_slice());
    assert_eq!(s.current_index(), Some(0));
    assert_eq!(current_id(&h.player), Some("z"));
    assert!(h.calls().contains(&Call::SetSource("/music/z.mp3".into())));
}

#[test]
fn skip_next_at_end_without_repeat_stops_in_place() {
    let mut h = Harness::new();
    h.player.play_track(track("c"), Some(abc()));
    h.clear_calls();

    h.player.skip_next();

    let s = h.player.state();
    assert!(!s.is_playing);
    assert_eq!(s.current_index(), Some(2));
    assert_eq!(current_id(&h.player), Some("c"));
    assert_eq!(h.calls(), vec![Call::Pause]);
}

#[test]
fn skip_next_at_end_with_repeat_all_wraps() {
    let mut h = Harness::new();
    h.player.set_repeat(RepeatMode::All);
    h.player.play_track(track("c"), Some(abc()));

    h.player.skip_next();

    assert_eq!(h.player.state().current_index(), Some(0));
    assert_eq!(current_id(&h.player), Some("a"));
    assert!(h.player.state().is_playing);
}

#[test]
fn skip_next_advances_and_loads_the_next_track() {
    let mut h = Harness::new();
    h.player.play_track(track("a"), Some(abc()));
    h.clear_calls();

    h.player.skip_next();

    assert_eq!(h.player.state().current_index(), Some(1));
    assert_eq!(
        h.calls(),
        vec![Call::SetSource("/music/b.mp3".into()), Call::Play]
    );
}

#[test]
fn skip_previous_at_start_with_repeat_all_wraps_to_last() {
    let mut h = Harness::new();
    h.player.set_repeat(RepeatMode::All);
    h.player.play_track(track("a"), Some(abc()));

    h.player.skip_previous();

    assert_eq!(h.player.state().current_index(), Some(2));
    assert_eq!(current_id(&h.player), Some("c"));
}

#[test]
fn skip_previous_at_start_without_repeat_stays_on_first() {
    let mut h = Harness::new();
    h.player.play_track(track("a"), Some(abc()));
    h.player.skip_previous();
    assert_eq!(h.player.state().current_index(), Some(0));
    assert!(h.player.state().is_playing);
}

#[test]
fn navigation_on_empty_queue_is_a_no_op() {
    let mut h = Harness::new();
    h.player.skip_next();
    h.player.skip_previous();
    h.player.play_index(3);
    h.player.pause();
    h.player.resume();
    h.player.seek(10.0);
    assert!(h.player.state().current_track.is_none());
    assert!(h.calls().is_empty());
}

#[test]
fn shuffle_picks_within_the_queue() {
    let mut h = Harness::new();
    h.player.play_track(track("a"), Some(abc()));
    h.player.toggle_shuffle();
    assert!(h.player.state().shuffle);

    for _ in 0..50 {
        h.player.skip_next();
        let s = h.player.state();
        let i = s.current_index().unwrap();
        assert!(i < 3);
        assert_eq!(s.current_track.as_ref(), s.queue.get(i));
        assert!(s.is_playing);
    }
}

#[test]
fn toggle_repeat_cycles_back_after_three_steps() {
    let mut h = Harness::new();
    let start = h.player.state().repeat;
    h.player.toggle_repeat();
    assert_eq!(h.player.state().repeat, RepeatMode::One);
    h.player.toggle_repeat();
    assert_eq!(h.player.state().repeat, RepeatMode::All);
    h.player.toggle_repeat();
    assert_eq!(h.player.state().repeat, start);
}

#[test]
fn ended_with_repeat_one_restarts_the_same_track() {
    let mut h = Harness::new();
    h.player.set_repeat(RepeatMode::One);
    h.player.play_track(track("b"), Some(abc()));
    h.emit(MediaEvent::TimeUpdate {
        current_time: 179.5,
    });
    h.clear_calls();

    h.emit(MediaEvent::Ended);

    let s = h.player.state();
    assert_eq!(current_id(&h.player), Some("b"));
    assert_eq!(s.current_index(), Some(1));
    assert_eq!(s.current_time, 0.0);
    assert!(s.is_playing);
    assert_eq!(h.calls(), vec![Call::Seek(0.0), Call::Play]);
}

#[test]
fn ended_advances_through_the_queue() {
    let mut h = Harness::new();
    h.player.play_track(track("a"), Some(abc()));

    h.emit(MediaEvent::Ended);
    assert_eq!(current_id(&h.player), Some("b"));

    h.emit(MediaEvent::Ended);
    assert_eq!(current_id(&h.player), Some("c"));

    h.emit(MediaEvent::Ended);
    assert_eq!(current_id(&h.player), Some("c"));
    assert!(!h.player.state().is_playing);
}

#[test]
fn ended_on_single_track_with_repeat_all_starts_over() {
    let mut h = Harness::new();
    h.player.set_repeat(RepeatMode::All);
    h.player.play_track(track("a"), None);
    h.emit(MediaEvent::TimeUpdate { current_time: 90.0 });

    h.emit(MediaEvent::Ended);

    let s = h.player.state();
    assert!(s.is_playing);
    assert_eq!(s.current_time, 0.0);
    assert_eq!(s.current_index(), Some(0));
}

#[test]
fn same_entry_after_ended_replays_from_the_start_without_reloading() {
    let mut h = Harness::new();
    h.player.set_repeat(RepeatMode::All);
    h.player.play_track(track("a"), None);
    h.player.seek(180.0);
    h.clear_calls();

    h.emit(MediaEvent::Ended);

    assert!(h.player.state().is_playing);
    assert_eq!(h.player.media().current_time(), 0.0);
    assert_eq!(h.calls(), vec![Call::Play]);
}

#[test]
fn pause_then_resume_restores_playing_only() {
    let mut h = Harness::new();
    h.player.play_track(track("b"), Some(abc()));
    h.emit(MediaEvent::TimeUpdate { current_time: 42.0 });
    let before = h.player.state().clone();
    h.clear_calls();

    h.player.pause();
    assert!(!h.player.state().is_playing);
    assert_eq!(h.player.state().transport(), Transport::Paused);
    h.player.resume();

    let after = h.player.state();
    assert!(after.is_playing);
    assert_eq!(after.current_track, before.current_track);
    assert_eq!(after.current_index(), before.current_index());
    assert_eq!(after.current_time, 42.0);
    // Resuming does not reload the source.
    assert_eq!(h.calls(), vec![Call::Pause, Call::Play]);
}

#[test]
fn toggle_play_pause_flips_transport() {
    let mut h = Harness::new();
    h.player.play_track(track("a"), None);
    h.player.toggle_play_pause();
    assert!(!h.player.state().is_playing);
    h.player.toggle_play_pause();
    assert!(h.player.state().is_playing);
}

#[test]
fn stop_pauses_and_rewinds() {
    let mut h = Harness::new();
    h.player.play_track(track("a"), None);
    h.emit(MediaEvent::TimeUpdate { current_time: 30.0 });

    h.player.stop();

    let s = h.player.state();
    assert!(!s.is_playing);
    assert_eq!(s.current_time, 0.0);
    assert_eq!(current_id(&h.player), Some("a"));
}

#[test]
fn time_and_metadata_events_update_state() {
    let mut h = Harness::new();
    h.player.play_track(track("a"), None);
    assert_eq!(h.player.state().duration, 180.0);

    h.emit(MediaEvent::LoadedMetadata { duration: 181.25 });
    h.emit(MediaEvent::TimeUpdate { current_time: 12.5 });

    assert_eq!(h.player.state().duration, 181.25);
    assert_eq!(h.player.state().current_time, 12.5);
}

#[test]
fn non_finite_media_values_are_ignored() {
    let mut h = Harness::new();
    h.player.play_track(track("a"), None);
    h.emit(MediaEvent::TimeUpdate { current_time: 5.0 });
    h.emit(MediaEvent::TimeUpdate {
        current_time: f64::NAN,
    });
    h.emit(MediaEvent::LoadedMetadata {
        duration: f64::INFINITY,
    });
    assert_eq!(h.player.state().current_time, 5.0);
    assert_eq!(h.player.state().duration, 180.0);
}

#[test]
fn changing_track_releases_the_previous_subscription() {
    let mut h = Harness::new();
    h.player.play_track(track("a"), Some(abc()));
    assert_eq!(h.device.len(), 1);

    h.player.skip_next();
    assert_eq!(h.device.len(), 1);

    h.player.shutdown(Duration::ZERO);
    assert!(h.device.is_empty());
}

#[test]
fn stale_events_from_a_previous_track_are_dropped() {
    let mut h = Harness::new();
    h.player.play_track(track("a"), Some(abc()));
    // Queued before the switch but not yet applied.
    h.device.emit(MediaEvent::Ended);
    h.player.skip_next();
    assert_eq!(current_id(&h.player), Some("b"));

    h.player.drain_media_events();

    assert_eq!(current_id(&h.player), Some("b"));
    assert_eq!(h.player.state().current_index(), Some(1));
}

#[test]
fn replaying_the_loaded_track_keeps_its_subscription() {
    let mut h = Harness::new();
    h.player.play_track(track("a"), None);
    h.clear_calls();
    h.player.play_track(track("a"), None);
    assert_eq!(h.calls(), vec![Call::Play]);
    assert_eq!(h.device.len(), 1);
}

#[test]
fn play_failure_leaves_player_paused_at_zero() {
    let mut h = Harness::with_media(FakeMedia {
        fail_play: true,
        ..FakeMedia::default()
    });
    h.player.play_track(track("a"), Some(abc()));

    let s = h.player.state();
    assert!(!s.is_playing);
    assert_eq!(s.current_time, 0.0);
    assert_eq!(current_id(&h.player), Some("a"));
    assert_eq!(s.current_index(), Some(0));
}

#[test]
fn source_failure_leaves_player_paused() {
    let mut h = Harness::with_media(FakeMedia {
        fail_source: true,
        ..FakeMedia::default()
    });
    h.player.play_track(track("a"), None);
    assert!(!h.player.state().is_playing);
    assert!(!h.calls().contains(&Call::Play));

    // A later resume tries the source again.
    h.clear_calls();
    h.player.resume();
    assert_eq!(h.calls()[0], Call::SetSource("/music/a.mp3".into()));
}

#[test]
fn track_without_locator_does_not_play() {
    let mut h = Harness::new();
    let mut silent = track("s");
    silent.media_url = Some("   ".into());
    h.player.play_track(silent, None);

    assert!(!h.player.state().is_playing);
    assert!(h.calls().iter().all(|c| !matches!(c, Call::SetSource(_) | Call::Play)));
}

#[test]
fn seek_clamps_into_the_track() {
    let mut h = Harness::new();
    h.player.play_track(track("a"), None);

    h.player.seek(-4.0);
    assert_eq!(h.player.state().current_time, 0.0);
    h.player.seek(500.0);
    assert_eq!(h.player.state().current_time, 180.0);
    h.player.seek(f64::NAN);
    assert_eq!(h.player.state().current_time, 0.0);
    h.player.seek(61.5);
    assert_eq!(h.player.state().current_time, 61.5);
    assert_eq!(h.player.media().current_time(), 61.5);
}

#[test]
fn seek_by_is_relative_to_the_current_time() {
    let mut h = Harness::new();
    h.player.play_track(track("a"), None);
    h.emit(MediaEvent::TimeUpdate { current_time: 20.0 });
    h.player.seek_by(5.0);
    assert_eq!(h.player.state().current_time, 25.0);
    h.player.seek_by(-30.0);
    assert_eq!(h.player.state().current_time, 0.0);
}

#[test]
fn seek_with_unknown_duration_only_floors_at_zero() {
    let mut h = Harness::new();
    let mut t = track("a");
    t.duration = 0.0;
    h.player.play_track(t, None);
    h.player.seek(1000.0);
    assert_eq!(h.player.state().current_time, 1000.0);
}

#[test]
fn set_volume_nan_is_silence() {
    let mut h = Harness::new();
    h.player.set_volume(f32::NAN);
    assert_eq!(h.player.state().volume, 0.0);
    assert_eq!(h.player.media().volume(), 0.0);
}

#[test]
fn shutdown_fades_only_while_playing() {
    let mut h = Harness::new();
    h.player.play_track(track("a"), None);
    h.clear_calls();
    h.player.shutdown(Duration::from_millis(10));
    assert_eq!(h.calls(), vec![Call::FadeOut, Call::Pause]);
    assert!(!h.player.state().is_playing);

    h.clear_calls();
    h.player.shutdown(Duration::from_millis(10));
    assert_eq!(h.calls(), vec![Call::Pause]);
}

#[test]
fn cue_loads_without_playing_until_resume() {
    let mut h = Harness::new();
    h.player.cue(abc(), 1);

    let s = h.player.state();
    assert_eq!(current_id(&h.player), Some("b"));
    assert_eq!(s.current_index(), Some(1));
    assert!(!s.is_playing);
    assert_eq!(s.transport(), Transport::Paused);
    assert_eq!(h.calls(), vec![Call::Pause]);

    h.clear_calls();
    h.player.resume();
    assert!(h.player.state().is_playing);
    assert_eq!(
        h.calls(),
        vec![Call::SetSource("/music/b.mp3".into()), Call::Play]
    );
}

#[test]
fn cue_drops_events_queued_for_the_previous_track() {
    let mut h = Harness::new();
    h.player.play_track(track("a"), Some(abc()));
    h.device.emit(MediaEvent::TimeUpdate { current_time: 99.0 });
    h.device.emit(MediaEvent::Ended);

    h.player.cue(vec![track("x"), track("y")], 0);
    assert!(h.device.is_empty());
    h.player.drain_media_events();

    let s = h.player.state();
    assert_eq!(current_id(&h.player), Some("x"));
    assert_eq!(s.current_index(), Some(0));
    assert!(!s.is_playing);
    assert_eq!(s.current_time, 0.0);
}

#[test]
fn entries_sharing_a_locator_do_not_reload_the_source() {
    let mut h = Harness::new();
    let mut alias = track("b");
    alias.media_url = Some("/music/a.mp3".into());
    h.player.play_track(track("a"), Some(vec![track("a"), alias]));
    h.player.seek(42.0);
    h.device.emit(MediaEvent::Ended);
    h.clear_calls();

    h.player.skip_next();

    assert_eq!(current_id(&h.player), Some("b"));
    assert_eq!(h.calls(), vec![Call::Play]);
    assert_eq!(h.device.len(), 1);
    assert_eq!(h.player.state().current_time, 42.0);

    // The Ended queued for "a" belongs to the old subscription.
    h.player.drain_media_events();
    assert_eq!(current_id(&h.player), Some("b"));
    assert!(h.player.state().is_playing);
}

#[test]
fn play_index_clamps() {
    let mut h = Harness::new();
    h.player.play_track(track("a"), Some(abc()));
    h.player.play_index(99);
    assert_eq!(h.player.state().current_index(), Some(2));
    assert_eq!(current_id(&h.player), Some("c"));
}

#[test]
fn queue_clamps_its_index() {
    let q = Queue::new(abc(), Some(10));
    assert_eq!(q.current_index(), Some(2));
    assert_eq!(q.position_of(&track("b")), Some(1));
    assert_eq!(Queue::new(Vec::new(), Some(0)).current_index(), None);
}

#[test]
fn next_and_previous_index_rules() {
    assert_eq!(next_index(Some(0), 3, RepeatMode::None), Some(1));
    assert_eq!(next_index(Some(2), 3, RepeatMode::None), None);
    assert_eq!(next_index(Some(2), 3, RepeatMode::One), None);
    assert_eq!(next_index(Some(2), 3, RepeatMode::All), Some(0));
    assert_eq!(next_index(None, 3, RepeatMode::None), Some(0));
    assert_eq!(next_index(Some(0), 0, RepeatMode::All), None);

    assert_eq!(previous_index(Some(2), 3, RepeatMode::None), 1);
    assert_eq!(previous_index(Some(0), 3, RepeatMode::None), 0);
    assert_eq!(previous_index(Some(0), 3, RepeatMode::All), 2);
    assert_eq!(previous_index(None, 3, RepeatMode::All), 0);
}

proptest! {
    #[test]
    fn volume_is_always_clamped(v in proptest::num::f32::ANY) {
        let mut h = Harness::new();
        h.player.set_volume(v);
        let got = h.player.state().volume;
        prop_assert!((0.0..=1.0).contains(&got));
        if v.is_nan() {
            prop_assert_eq!(got, 0.0);
        } else {
            prop_assert_eq!(got, v.clamp(0.0, 1.0));
        }
    }

    #[test]
    fn index_stays_in_range(
        len in 1usize..6,
        start in 0usize..6,
        ops in proptest::collection::vec(0u8..6, 0..40),
    ) {
        let tracks: Vec<Track> = (0..len).map(|i| track(&i.to_string())).collect();
        let mut h = Harness::new();
        h.player.play_track(tracks[start.min(len - 1)].clone(), Some(tracks.clone()));

        for op in ops {
            match op {
                0 => h.player.skip_next(),
                1 => h.player.skip_previous(),
                2 => h.player.toggle_shuffle(),
                3 => h.player.toggle_repeat(),
                4 => h.emit(MediaEvent::Ended),
                _ => h.player.toggle_play_pause(),
            }
            let s = h.player.state();
            let i = s.current_index().unwrap();
            prop_assert!(i < len);
            prop_assert_eq!(s.current_track.as_ref(), s.queue.get(i));
        }
    }
}
