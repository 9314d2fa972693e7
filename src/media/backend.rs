use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rodio::{OutputStream, OutputStreamBuilder, Sink};

use super::fetch::fetch;
use super::locator::{Locator, resolve_locator};
use super::sink::{SourceData, create_sink_at, tag_duration};
use super::subscription::{EventHandler, Listeners, Subscription};
use super::{MediaElement, MediaError, MediaEvent};

/// The sink currently fed to the mixer.
///
/// `offset` is non-zero when the sink was rebuilt with `skip_duration`:
/// rodio then counts positions from the skip point, not from the start of
/// the file.
struct Loaded {
    sink: Arc<Sink>,
    offset: Duration,
}

impl Loaded {
    fn position(&self) -> Duration {
        self.offset + self.sink.get_pos()
    }
}

struct Shared {
    loaded: Mutex<Option<Loaded>>,
    ended_reported: AtomicBool,
    shutdown: AtomicBool,
}

/// `MediaElement` backed by a `rodio` output stream.
///
/// rodio has no callbacks, so a watcher thread polls the sink every tick,
/// publishes progress and reports end-of-media exactly once per load.
/// Remote sources are downloaded in `set_source` with `http_timeout`.
pub struct RodioMedia {
    stream: OutputStream,
    shared: Arc<Shared>,
    listeners: Listeners,
    source: Option<SourceData>,
    volume: f32,
    http_timeout: Duration,
    watcher: Option<JoinHandle<()>>,
}

impl RodioMedia {
    /// Open the default output device and start the watcher.
    pub fn open(tick: Duration, http_timeout: Duration) -> Result<Self, MediaError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| MediaError::Output(e.to_string()))?;
        // rodio logs to stderr when the stream is dropped; we have tracing.
        stream.log_on_drop(false);

        let shared = Arc::new(Shared {
            loaded: Mutex::new(None),
            ended_reported: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
        });
        let listeners = Listeners::new();
        let watcher = spawn_watcher(shared.clone(), listeners.clone(), tick);

        Ok(Self {
            stream,
            shared,
            listeners,
            source: None,
            volume: 1.0,
            http_timeout,
            watcher: Some(watcher),
        })
    }

    fn current_sink(&self) -> Option<Arc<Sink>> {
        self.shared
            .loaded
            .lock()
            .ok()
            .and_then(|l| l.as_ref().map(|l| l.sink.clone()))
    }

    fn install(&self, loaded: Option<Loaded>) {
        let old = match self.shared.loaded.lock() {
            Ok(mut slot) => std::mem::replace(&mut *slot, loaded),
            Err(_) => None,
        };
        if let Some(old) = old {
            old.sink.stop();
        }
        self.shared.ended_reported.store(false, Ordering::SeqCst);
    }

    /// Replace the sink with a fresh one positioned at `position`, keeping
    /// the play/pause state.
    fn rebuild_at(&mut self, position: Duration) -> Result<(), MediaError> {
        let source = self.source.clone().ok_or(MediaError::NoSource)?;
        let was_paused = self.current_sink().is_none_or(|s| s.is_paused());

        let prepared = create_sink_at(&self.stream, &source, position, self.volume)?;
        if !was_paused {
            prepared.sink.play();
        }
        self.install(Some(Loaded {
            sink: Arc::new(prepared.sink),
            offset: position,
        }));
        Ok(())
    }
}

impl MediaElement for RodioMedia {
    fn set_source(&mut self, locator: &str) -> Result<(), MediaError> {
        // Whatever happens next, the previous source must stop.
        self.install(None);
        self.source = None;

        let source = match resolve_locator(locator)? {
            Locator::File(path) => SourceData::File(path),
            Locator::Remote(url) => {
                let bytes = fetch(&url, self.http_timeout)?;
                SourceData::Memory { url, bytes }
            }
        };
        let prepared = create_sink_at(&self.stream, &source, Duration::ZERO, self.volume)?;
        let duration = prepared
            .total_duration
            .or_else(|| tag_duration(&source))
            .filter(|d| !d.is_zero());

        tracing::debug!(source = %source.describe(), ?duration, "media source loaded");
        self.source = Some(source);
        self.install(Some(Loaded {
            sink: Arc::new(prepared.sink),
            offset: Duration::ZERO,
        }));

        if let Some(d) = duration {
            self.listeners.emit(MediaEvent::LoadedMetadata {
                duration: d.as_secs_f64(),
            });
        }
        self.listeners
            .emit(MediaEvent::TimeUpdate { current_time: 0.0 });
        Ok(())
    }

    fn play(&mut self) -> Result<(), MediaError> {
        let sink = self.current_sink().ok_or(MediaError::NoSource)?;
        if sink.empty() {
            // Played to the end: start over from 0.
            self.rebuild_at(Duration::ZERO)?;
        }
        if let Some(sink) = self.current_sink() {
            sink.play();
        }
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = self.current_sink() {
            sink.pause();
        }
    }

    fn current_time(&self) -> f64 {
        self.shared
            .loaded
            .lock()
            .ok()
            .and_then(|l| l.as_ref().map(|l| l.position().as_secs_f64()))
            .unwrap_or(0.0)
    }

    fn set_current_time(&mut self, seconds: f64) {
        let target = Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or_default();

        let seeked = match self.shared.loaded.lock() {
            Ok(slot) => match slot.as_ref() {
                Some(l) if l.offset.is_zero() && !l.sink.empty() => l.sink.try_seek(target).is_ok(),
                Some(_) => false,
                None => return,
            },
            Err(_) => return,
        };

        if seeked {
            self.shared.ended_reported.store(false, Ordering::SeqCst);
        } else if let Err(e) = self.rebuild_at(target) {
            tracing::warn!(error = %e, "seek failed");
        }
        self.listeners.emit(MediaEvent::TimeUpdate {
            current_time: target.as_secs_f64(),
        });
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(sink) = self.current_sink() {
            sink.set_volume(volume);
        }
    }

    fn subscribe(&mut self, handler: EventHandler) -> Subscription {
        self.listeners.subscribe(handler)
    }

    fn fade_out(&mut self, duration: Duration) {
        let Some(sink) = self.current_sink() else {
            return;
        };
        let fade_out_ms = duration.as_millis() as u64;
        if fade_out_ms == 0 || sink.is_paused() {
            sink.set_volume(0.0);
            return;
        }
        let steps: u64 = 20;
        let step_ms = (fade_out_ms / steps).max(1);
        let start = self.volume;
        for step in 1..=steps {
            let t = step as f32 / steps as f32;
            sink.set_volume(start * (1.0 - t));
            thread::sleep(Duration::from_millis(step_ms));
        }
        sink.set_volume(0.0);
    }
}

impl Drop for RodioMedia {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::SeqCst);
        if let Some(h) = self.watcher.take() {
            let _ = h.join();
        }
        self.install(None);
    }
}

fn spawn_watcher(shared: Arc<Shared>, listeners: Listeners, tick: Duration) -> JoinHandle<()> {
    thread::spawn(move || {
        while !shared.shutdown.load(Ordering::SeqCst) {
            thread::sleep(tick);

            let (position, playing, drained) = {
                let Ok(slot) = shared.loaded.lock() else {
                    break;
                };
                match slot.as_ref() {
                    Some(l) => (l.position(), !l.sink.is_paused(), l.sink.empty()),
                    None => continue,
                }
            };

            if !playing {
                continue;
            }
            listeners.emit(MediaEvent::TimeUpdate {
                current_time: position.as_secs_f64(),
            });
            if drained && !shared.ended_reported.swap(true, Ordering::SeqCst) {
                listeners.emit(MediaEvent::Ended);
            }
        }
    })
}
