use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::{
    error::PlaybackError,
    sequencer::{
        driver::SequencerHandle,
        engine::MediaEvent,
        types::{PreloadIntent, VideoClip},
    },
};

/// Contract the sequencer needs from a video element
///
/// Implementations report `loaded`, `ended` and `error` notifications back
/// through a [`SequencerHandle`] as [`MediaEvent`]s tagged with their index.
pub trait MediaHandle: Send {
    /// Locator of the clip this element plays
    fn locator(&self) -> &str;

    /// Start or resume playback; may be rejected by the environment
    fn play(&mut self) -> Result<(), PlaybackError>;

    /// Pause, keeping the position
    fn pause(&mut self);

    /// Seek to a position in seconds
    fn set_current_time(&mut self, seconds: f64);

    /// Current position in seconds
    fn current_time(&self) -> f64;

    /// Clip length in seconds, once known
    fn duration(&self) -> Option<f64>;

    /// Change how much of the clip may be buffered
    fn set_preload(&mut self, intent: PreloadIntent);

    /// Current buffering intent
    fn preload(&self) -> PreloadIntent;
}

/// Whether the environment currently allows unsolicited playback
///
/// Shared by every element on a page; a user gesture opens it.
#[derive(Debug, Clone, Default)]
pub struct AutoplayGate {
    open: Arc<AtomicBool>,
}

impl AutoplayGate {
    /// A gate that allows playback from the start
    pub fn open() -> Self {
        let gate = Self::default();
        gate.allow();
        gate
    }

    /// A gate that rejects playback until [`allow`](Self::allow) is called
    pub fn blocked() -> Self {
        Self::default()
    }

    /// Record a user activation
    pub fn allow(&self) {
        self.open.store(true, Ordering::SeqCst);
    }

    /// Whether playback is currently allowed
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

/// In-process media element with a fixed clip length
///
/// Plays on the tokio clock, so it works with paused time in tests and as a
/// stand-in player in the CLI.
pub struct SimulatedMedia {
    index: usize,
    clip: VideoClip,
    length: Duration,
    broken: bool,
    gate: AutoplayGate,
    events: SequencerHandle,

    position: Duration,
    started_at: Option<Instant>,
    preload: PreloadIntent,
    playback: Option<JoinHandle<()>>,
}

impl SimulatedMedia {
    /// Create an element for the clip at `index`
    pub fn new(
        index: usize,
        clip: VideoClip,
        length: Duration,
        gate: AutoplayGate,
        events: SequencerHandle,
    ) -> Self {
        Self {
            index,
            clip,
            length,
            broken: false,
            gate,
            events,
            position: Duration::ZERO,
            started_at: None,
            preload: PreloadIntent::Deferred,
            playback: None,
        }
    }

    /// Make every play attempt fail to decode
    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    /// Whether the element is currently playing
    pub fn is_playing(&self) -> bool {
        self.started_at.is_some()
    }

    fn elapsed(&self) -> Duration {
        let running = self.started_at.map(|t| t.elapsed()).unwrap_or_default();
        (self.position + running).min(self.length)
    }

    fn stop_task(&mut self) {
        if let Some(task) = self.playback.take() {
            task.abort();
        }
    }
}

impl MediaHandle for SimulatedMedia {
    fn locator(&self) -> &str {
        &self.clip.locator
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        if !self.gate.is_open() {
            return Err(PlaybackError::AutoplayRejected {
                locator: self.clip.locator.clone(),
            });
        }

        if self.broken {
            self.events.media(
                self.index,
                MediaEvent::Failed(PlaybackError::DecodeFailed {
                    locator: self.clip.locator.clone(),
                    reason: "simulated decoder fault".to_string(),
                }),
            );
            return Ok(());
        }

        if self.is_playing() {
            return Ok(());
        }

        self.events.media(self.index, MediaEvent::Loaded);

        let remaining = self.length.saturating_sub(self.position);
        let events = self.events.clone();
        let index = self.index;
        self.started_at = Some(Instant::now());
        self.playback = Some(tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            events.media(index, MediaEvent::Ended);
        }));
        debug!("Simulated clip {} playing, {:?} left", self.index, remaining);
        Ok(())
    }

    fn pause(&mut self) {
        self.position = self.elapsed();
        self.started_at = None;
        self.stop_task();
    }

    fn set_current_time(&mut self, seconds: f64) {
        let was_playing = self.is_playing();
        self.pause();
        self.position = Duration::from_secs_f64(seconds.max(0.0)).min(self.length);
        if was_playing {
            if let Err(e) = self.play() {
                debug!("Resume after seek on clip {} failed: {}", self.index, e);
            }
        }
    }

    fn current_time(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    fn duration(&self) -> Option<f64> {
        (!self.broken).then(|| self.length.as_secs_f64())
    }

    fn set_preload(&mut self, intent: PreloadIntent) {
        self.preload = intent;
    }

    fn preload(&self) -> PreloadIntent {
        self.preload
    }
}

impl Drop for SimulatedMedia {
    fn drop(&mut self) {
        self.stop_task();
    }
}
