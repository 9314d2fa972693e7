//! MPRIS (`org.mpris.MediaPlayer2`) service on the session bus.
//!
//! The service runs on its own thread. D-Bus method calls and property
//! writes become `ControlCmd`s on the runtime channel; the runtime pushes
//! the resulting playback state back through `MprisHandle`, which also
//! wakes the service so it can emit `PropertiesChanged`.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use zbus::object_server::SignalEmitter;
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::control::ControlCmd;
use crate::library::Track;
use crate::player::{RepeatMode, Transport};

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.harmony";
const NO_TRACK: &str = "/org/mpris/MediaPlayer2/TrackList/NoTrack";

/// Which part of the exported state changed.
#[derive(Copy, Clone, Debug, PartialEq)]
enum Changed {
    Playback,
    Metadata,
    Volume,
    Shuffle,
    LoopStatus,
    /// Position jumped; carries the new position in microseconds.
    Seeked(i64),
}

#[derive(Debug, Default)]
struct SharedState {
    playback: Transport,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    url: Option<String>,
    length_micros: Option<i64>,
    track_id: Option<OwnedObjectPath>,
    position_micros: i64,
    volume: f64,
    shuffle: bool,
    loop_status: RepeatMode,
}

/// Runtime-side handle for publishing playback state.
pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<Changed>,
}

impl MprisHandle {
    fn update(&self, changed: Changed, f: impl FnOnce(&mut SharedState)) {
        if let Ok(mut s) = self.state.lock() {
            f(&mut s);
        }
        let _ = self.notify.send(changed);
    }

    /// Publish the now-playing track; `index` is its queue position and
    /// becomes the MPRIS track id.
    pub fn set_track_metadata(&self, index: Option<usize>, track: Option<&Track>) {
        self.update(Changed::Metadata, |s| match track {
            Some(t) => {
                s.title = Some(t.title.clone());
                s.artist = if t.artist.is_empty() {
                    Vec::new()
                } else {
                    vec![t.artist.clone()]
                };
                s.album = t.album.clone();
                s.url = t.locator().map(locator_to_url);
                s.length_micros = seconds_to_micros(t.duration);
                s.track_id = index.and_then(|i| {
                    OwnedObjectPath::try_from(format!("{OBJECT_PATH}/track/{i}")).ok()
                });
            }
            None => {
                s.title = None;
                s.artist.clear();
                s.album = None;
                s.url = None;
                s.length_micros = None;
                s.track_id = None;
            }
        });
    }

    /// Replace the track length once the media element has measured it.
    pub fn set_length(&self, seconds: f64) {
        self.update(Changed::Metadata, |s| {
            s.length_micros = seconds_to_micros(seconds);
        });
    }

    pub fn set_playback(&self, playback: Transport) {
        self.update(Changed::Playback, |s| s.playback = playback);
    }

    /// Position is polled by clients and never signalled on its own.
    pub fn set_position(&self, seconds: f64) {
        if let Ok(mut s) = self.state.lock() {
            s.position_micros = seconds_to_micros(seconds).unwrap_or(0);
        }
    }

    /// Record a discontinuous position change and emit `Seeked`.
    pub fn seeked(&self, seconds: f64) {
        let micros = seconds_to_micros(seconds).unwrap_or(0);
        self.update(Changed::Seeked(micros), |s| s.position_micros = micros);
    }

    pub fn set_volume(&self, volume: f32) {
        self.update(Changed::Volume, |s| s.volume = f64::from(volume));
    }

    pub fn set_shuffle(&self, shuffle: bool) {
        self.update(Changed::Shuffle, |s| s.shuffle = shuffle);
    }

    pub fn set_loop_status(&self, repeat: RepeatMode) {
        self.update(Changed::LoopStatus, |s| s.loop_status = repeat);
    }
}

fn seconds_to_micros(seconds: f64) -> Option<i64> {
    (seconds.is_finite() && seconds > 0.0).then(|| (seconds * 1_000_000.0).round() as i64)
}

/// `xesam:url` wants a URI; bare paths become `file://` URIs.
fn locator_to_url(locator: &str) -> String {
    if locator.contains("://") {
        return locator.to_string();
    }
    let encoded: Vec<String> = locator
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("file://{}", encoded.join("/"))
}

fn loop_status_str(repeat: RepeatMode) -> &'static str {
    match repeat {
        RepeatMode::None => "None",
        RepeatMode::One => "Track",
        RepeatMode::All => "Playlist",
    }
}

fn parse_loop_status(value: &str) -> Option<RepeatMode> {
    match value {
        "None" => Some(RepeatMode::None),
        "Track" => Some(RepeatMode::One),
        "Playlist" => Some(RepeatMode::All),
        _ => None,
    }
}

fn owned<'a>(value: impl Into<Value<'a>>) -> Option<OwnedValue> {
    OwnedValue::try_from(value.into()).ok()
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No window to raise.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "harmony"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        ["file", "http", "https"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        ["audio/mpeg", "audio/flac", "audio/ogg", "audio/wav", "audio/mp4"]
            .into_iter()
            .map(String::from)
            .collect()
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

impl PlayerIface {
    fn send(&self, cmd: ControlCmd) {
        if self.tx.send(cmd).is_err() {
            tracing::debug!("mpris: runtime is gone, dropping command");
        }
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        self.send(ControlCmd::Next);
    }

    fn previous(&self) {
        self.send(ControlCmd::Prev);
    }

    fn play(&self) {
        self.send(ControlCmd::Play);
    }

    fn pause(&self) {
        self.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        self.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        self.send(ControlCmd::Stop);
    }

    /// Relative seek, in microseconds.
    fn seek(&self, offset: i64) {
        self.send(ControlCmd::SeekBy(offset as f64 / 1_000_000.0));
    }

    /// Absolute seek; ignored unless `track_id` is the current track.
    fn set_position(&self, track_id: ObjectPath<'_>, position: i64) {
        let current = self
            .state
            .lock()
            .ok()
            .and_then(|s| s.track_id.clone());
        let is_current = current.as_ref().is_some_and(|p| p.as_str() == track_id.as_str());
        if !is_current || position < 0 {
            tracing::debug!(%track_id, position, "mpris: ignoring SetPosition");
            return;
        }
        self.send(ControlCmd::Seek(position as f64 / 1_000_000.0));
    }

    #[zbus(signal)]
    async fn seeked(emitter: &SignalEmitter<'_>, position: i64) -> zbus::Result<()>;

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "Stopped";
        };
        match s.playback {
            Transport::Stopped => "Stopped",
            Transport::Playing => "Playing",
            Transport::Paused => "Paused",
        }
    }

    #[zbus(property)]
    fn loop_status(&self) -> &str {
        self.state
            .lock()
            .map(|s| loop_status_str(s.loop_status))
            .unwrap_or("None")
    }

    #[zbus(property)]
    fn set_loop_status(&mut self, value: String) {
        match parse_loop_status(&value) {
            Some(mode) => self.send(ControlCmd::SetRepeat(mode)),
            None => tracing::warn!(%value, "mpris: unknown LoopStatus"),
        }
    }

    #[zbus(property)]
    fn shuffle(&self) -> bool {
        self.state.lock().map(|s| s.shuffle).unwrap_or(false)
    }

    #[zbus(property)]
    fn set_shuffle(&mut self, value: bool) {
        self.send(ControlCmd::SetShuffle(value));
    }

    #[zbus(property)]
    fn volume(&self) -> f64 {
        self.state.lock().map(|s| s.volume).unwrap_or(1.0)
    }

    #[zbus(property)]
    fn set_volume(&mut self, value: f64) {
        self.send(ControlCmd::SetVolume(value as f32));
    }

    #[zbus(property(emits_changed_signal = "false"))]
    fn position(&self) -> i64 {
        self.state.lock().map(|s| s.position_micros).unwrap_or(0)
    }

    #[zbus(property)]
    fn rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn minimum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn maximum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        let track_id = s
            .track_id
            .clone()
            .map(OwnedObjectPath::into_inner)
            .or_else(|| ObjectPath::try_from(NO_TRACK).ok());
        if let Some(v) = track_id.and_then(owned) {
            map.insert("mpris:trackid".to_string(), v);
        }
        if let Some(v) = s.title.clone().and_then(owned) {
            map.insert("xesam:title".to_string(), v);
        }
        if !s.artist.is_empty() {
            if let Some(v) = owned(s.artist.clone()) {
                map.insert("xesam:artist".to_string(), v);
            }
        }
        if let Some(v) = s.album.clone().and_then(owned) {
            map.insert("xesam:album".to_string(), v);
        }
        if let Some(v) = s.url.clone().and_then(owned) {
            map.insert("xesam:url".to_string(), v);
        }
        if let Some(v) = s.length_micros.and_then(owned) {
            map.insert("mpris:length".to_string(), v);
        }
        map
    }
}

/// Start the service thread. Failures to reach the bus are logged and the
/// player keeps running without MPRIS.
pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState {
        volume: 1.0,
        ..SharedState::default()
    }));
    let (notify_tx, notify_rx) = mpsc::channel::<Changed>();

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        block_on(async move {
            if let Err(e) = serve(tx, state_for_thread, notify_rx).await {
                tracing::warn!(error = %e, "mpris: service unavailable");
            }
        });
    });

    MprisHandle {
        state,
        notify: notify_tx,
    }
}

async fn serve(
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
    notify: Receiver<Changed>,
) -> zbus::Result<()> {
    let connection = Connection::session().await?;
    connection.request_name(BUS_NAME).await?;

    let object_server = connection.object_server();
    object_server
        .at(OBJECT_PATH, RootIface { tx: tx.clone() })
        .await?;
    object_server
        .at(OBJECT_PATH, PlayerIface { tx, state })
        .await?;
    tracing::info!(name = BUS_NAME, "mpris: service registered");

    let iface_ref = object_server
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await?;

    loop {
        Timer::after(Duration::from_millis(100)).await;

        loop {
            let changed = match notify.try_recv() {
                Ok(c) => c,
                Err(TryRecvError::Empty) => break,
                // Runtime dropped its handle: shut the service down.
                Err(TryRecvError::Disconnected) => return Ok(()),
            };

            let emitter = iface_ref.signal_emitter();
            let iface = iface_ref.get().await;
            let result = match changed {
                Changed::Playback => iface.playback_status_changed(emitter).await,
                Changed::Metadata => iface.metadata_changed(emitter).await,
                Changed::Volume => iface.volume_changed(emitter).await,
                Changed::Shuffle => iface.shuffle_changed(emitter).await,
                Changed::LoopStatus => iface.loop_status_changed(emitter).await,
                Changed::Seeked(position) => PlayerIface::seeked(emitter, position).await,
            };
            if let Err(e) = result {
                tracing::warn!(error = %e, ?changed, "mpris: failed to emit signal");
            }
        }
    }
}
