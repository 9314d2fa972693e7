use crate::mpris::MprisHandle;
use crate::player::{PlaybackState, RepeatMode, Transport};

/// What was last pushed to MPRIS, so unchanged properties are not
/// re-signalled every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    index: Option<usize>,
    track_id: Option<String>,
    duration: f64,
    transport: Transport,
    volume: f32,
    shuffle: bool,
    repeat: RepeatMode,
}

impl Published {
    fn of(state: &PlaybackState) -> Self {
        Self {
            index: state.current_index(),
            track_id: state.current_track.as_ref().map(|t| t.id.clone()),
            duration: state.duration,
            transport: state.transport(),
            volume: state.volume,
            shuffle: state.shuffle,
            repeat: state.repeat,
        }
    }
}

/// Push `state` to MPRIS, touching only what differs from `last`.
pub fn update_mpris(mpris: &MprisHandle, state: &PlaybackState, last: &mut Option<Published>) {
    let now = Published::of(state);
    let prev = last.as_ref();

    if prev.is_none_or(|p| p.index != now.index || p.track_id != now.track_id) {
        mpris.set_track_metadata(now.index, state.current_track.as_ref());
        mpris.set_length(now.duration);
    } else if prev.is_some_and(|p| p.duration != now.duration) {
        mpris.set_length(now.duration);
    }
    if prev.is_none_or(|p| p.transport != now.transport) {
        mpris.set_playback(now.transport);
    }
    if prev.is_none_or(|p| p.volume != now.volume) {
        mpris.set_volume(now.volume);
    }
    if prev.is_none_or(|p| p.shuffle != now.shuffle) {
        mpris.set_shuffle(now.shuffle);
    }
    if prev.is_none_or(|p| p.repeat != now.repeat) {
        mpris.set_loop_status(now.repeat);
    }
    mpris.set_position(state.current_time);

    *last = Some(now);
}
