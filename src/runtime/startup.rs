use crate::config;
use crate::library::Track;
use crate::media::MediaElement;
use crate::player::Player;

pub fn apply_playback_defaults<M: MediaElement>(player: &mut Player<M>, settings: &config::Settings) {
    player.set_shuffle(settings.playback.shuffle);
    player.set_repeat(settings.playback.repeat.into());
    player.set_volume(settings.playback.volume);
}

/// Queue `tracks` and start at `start` (clamped), or only cue it when
/// `paused` is set.
pub fn start_queue<M: MediaElement>(
    player: &mut Player<M>,
    tracks: Vec<Track>,
    start: usize,
    paused: bool,
) {
    if tracks.is_empty() {
        return;
    }
    let start = start.min(tracks.len() - 1);

    if paused {
        player.cue(tracks, start);
    } else {
        let first = tracks[start].clone();
        player.play_track(first, Some(tracks));
    }
}
