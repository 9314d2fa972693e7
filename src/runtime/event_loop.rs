use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use crate::config;
use crate::control::ControlCmd;
use crate::library;
use crate::media::MediaElement;
use crate::mpris::MprisHandle;
use crate::player::{PlaybackState, Player, Transport};
use crate::runtime::mpris_sync::{Published, update_mpris};

/// Whether the loop keeps going after a command.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Owns the player for the lifetime of the process. Everything that wants
/// to change playback goes through `handle`.
pub struct EventLoop<M: MediaElement> {
    player: Player<M>,
    settings: config::Settings,
    mpris: Option<MprisHandle>,
    published: Option<Published>,
}

impl<M: MediaElement> EventLoop<M> {
    pub fn new(player: Player<M>, settings: config::Settings, mpris: Option<MprisHandle>) -> Self {
        let mut this = Self {
            player,
            settings,
            mpris,
            published: None,
        };
        this.publish();
        this
    }

    pub fn player(&self) -> &Player<M> {
        &self.player
    }

    /// Serve commands until `Quit` or until every sender is gone, then
    /// fade out.
    pub fn run(&mut self, commands: &Receiver<ControlCmd>) {
        let tick = Duration::from_millis(self.settings.audio.tick_ms.max(1));

        loop {
            match commands.recv_timeout(tick) {
                Ok(cmd) => {
                    if self.handle(cmd) == Flow::Quit {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::debug!("all control surfaces are gone");
                    break;
                }
            }
            self.tick();
        }

        self.shutdown();
    }

    /// Apply pending media notifications and republish state.
    pub fn tick(&mut self) {
        self.player.drain_media_events();
        self.publish();
    }

    pub fn handle(&mut self, cmd: ControlCmd) -> Flow {
        tracing::debug!(?cmd, "control command");
        let mut seeked = false;

        match cmd {
            ControlCmd::Quit => return Flow::Quit,
            ControlCmd::Play => self.player.resume(),
            ControlCmd::Pause => self.player.pause(),
            ControlCmd::PlayPause => self.player.toggle_play_pause(),
            ControlCmd::Stop => {
                self.player.stop();
                seeked = true;
            }
            ControlCmd::Next => self.player.skip_next(),
            ControlCmd::Prev => self.player.skip_previous(),
            ControlCmd::PlayIndex(i) => self.player.play_index(i),
            ControlCmd::Seek(secs) => {
                self.player.seek(secs);
                seeked = true;
            }
            ControlCmd::SeekBy(delta) => {
                self.player.seek_by(delta);
                seeked = true;
            }
            ControlCmd::SetVolume(v) => self.player.set_volume(v),
            ControlCmd::ToggleShuffle => self.player.toggle_shuffle(),
            ControlCmd::SetShuffle(on) => self.player.set_shuffle(on),
            ControlCmd::ToggleRepeat => self.player.toggle_repeat(),
            ControlCmd::SetRepeat(mode) => self.player.set_repeat(mode),
            ControlCmd::Open(path) => match library::load(&path, &self.settings.library) {
                Ok(tracks) => {
                    if let Some(first) = tracks.first().cloned() {
                        self.player.play_track(first, Some(tracks));
                    }
                }
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "open failed"),
            },
            ControlCmd::Status => println!("{}", status_line(self.player.state())),
        }

        self.publish();
        if seeked && self.player.state().current_track.is_some() {
            if let Some(mpris) = &self.mpris {
                mpris.seeked(self.player.state().current_time);
            }
        }
        Flow::Continue
    }

    fn publish(&mut self) {
        if let Some(mpris) = &self.mpris {
            update_mpris(mpris, self.player.state(), &mut self.published);
        }
    }

    fn shutdown(&mut self) {
        let fade = Duration::from_millis(self.settings.audio.quit_fade_out_ms);
        self.player.shutdown(fade);
        self.publish();
        tracing::info!("playback stopped");
    }
}

/// One-line human summary, as printed by the `status` command.
pub fn status_line(state: &PlaybackState) -> String {
    let transport = match state.transport() {
        Transport::Stopped => "stopped",
        Transport::Playing => "playing",
        Transport::Paused => "paused",
    };
    let Some(track) = state.current_track.as_ref() else {
        return format!("[{transport}] nothing loaded");
    };

    let position = state
        .current_index()
        .map(|i| format!("{}/{}", i + 1, state.queue.len()))
        .unwrap_or_else(|| "-".to_string());
    let name = if track.artist.is_empty() {
        track.title.clone()
    } else {
        format!("{} - {}", track.artist, track.title)
    };

    format!(
        "[{transport}] {position} {name} {}/{} vol {:.0}% shuffle {} repeat {}",
        clock(state.current_time),
        clock(state.duration),
        state.volume * 100.0,
        if state.shuffle { "on" } else { "off" },
        state.repeat.as_str(),
    )
}

fn clock(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}
