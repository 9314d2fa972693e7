use std::env;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use crate::cli::Cli;
use crate::config::Settings;
use crate::control::ControlCmd;
use crate::error::Result;
use crate::library;
use crate::media::RodioMedia;
use crate::player::Player;

mod event_loop;
mod mpris_sync;
mod settings;
mod startup;
mod stdin;

use event_loop::EventLoop;
pub use settings::load_settings;

/// Wire everything together and run until a `Quit` command arrives.
pub fn run(cli: &Cli, settings: Settings) -> Result<()> {
    let dir = cli
        .path
        .clone()
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("Music"));

    let tracks = library::load(&dir, &settings.library)?;

    let tick = Duration::from_millis(settings.audio.tick_ms);
    let http_timeout = Duration::from_secs(settings.audio.http_timeout_secs);
    let media = RodioMedia::open(tick, http_timeout)?;
    let mut player = Player::new(media);
    startup::apply_playback_defaults(&mut player, &settings);

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = settings
        .mpris
        .enabled
        .then(|| crate::mpris::spawn_mpris(control_tx.clone()));
    stdin::spawn_reader(control_tx.clone(), settings.controls.scrub_seconds);

    startup::start_queue(&mut player, tracks, cli.start, cli.paused);

    let mut event_loop = EventLoop::new(player, settings, mpris);
    event_loop.run(&control_rx);

    // Held until here so the loop never sees a disconnect while the
    // optional surfaces come and go.
    drop(control_tx);
    Ok(())
}
