use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{
    config::SequencerConfig,
    error::PlaybackError,
    sequencer::types::{Phase, PreloadIntent, PreloadWindow, SequencerState},
};

/// Notifications a media element reports about itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEvent {
    /// First frame is available
    Loaded,
    /// Playback reached the natural end
    Ended,
    /// The clip could not be loaded or decoded
    Failed(PlaybackError),
}

/// Explicit user navigation exposed by carousel controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Next,
    Previous,
    GoTo(usize),
}

/// Everything that can drive the sequencer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequencerEvent {
    /// Begin playback at the given index (taken modulo the clip count)
    Start { start_index: usize },
    /// A media element reported on itself
    Media { index: usize, event: MediaEvent },
    /// `play()` was rejected by the environment
    PlayRejected { index: usize },
    /// The safety cap armed for activation `epoch` elapsed
    CapElapsed { epoch: u64 },
    /// The transition window opened for activation `epoch` closed
    TransitionSettled { epoch: u64 },
    /// Dot/arrow navigation
    Navigate(Navigation),
    /// Pointer click or touch anywhere on the page
    UserGesture,
    /// Tear everything down
    Stop,
}

/// Side effects the sequencer asks its host to perform
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play { index: usize },
    Pause { index: usize },
    Rewind { index: usize },
    /// One intent per clip, indexed by clip position
    ApplyPreload(Vec<PreloadIntent>),
    ArmCapTimer { epoch: u64, after: Duration },
    CancelCapTimer,
    ScheduleSettle { epoch: u64, after: Duration },
    AttachGestureListener,
    DetachGestureListener,
}

/// Single bounded autoplay retry, gated on a user gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryPolicy {
    /// No rejection seen for the active clip
    Ready,
    /// Rejected once, listening for the next gesture
    AwaitingGesture,
    /// The one retry has been used
    Spent,
}

/// Why the active index is moving
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdvanceReason {
    NaturalEnd,
    SafetyCap,
    ClipFailed,
    User,
}

/// Circular background-video sequencer
///
/// A synchronous state machine with phases `Idle`, `Loading`, `Playing` and
/// `Transitioning`. It consumes [`SequencerEvent`]s and returns the
/// [`Command`]s the host must execute; it owns no timers and performs no I/O.
///
/// Every activation of a clip gets a fresh epoch. Timer events carry the epoch
/// they were armed for, media events carry their clip index, and anything that
/// does not match the active clip is dropped. While `Transitioning`, further
/// advance triggers have no transition, so near-simultaneous triggers always
/// collapse into a single index change.
#[derive(Debug)]
pub struct VideoSequencer {
    len: usize,
    window_size: usize,
    loop_single: bool,
    transition: Duration,
    max_clip: Option<Duration>,

    current: usize,
    phase: Phase,
    epoch: u64,
    played: u64,
    loaded: bool,
    pending_skip: Option<AdvanceReason>,
    retry: RetryPolicy,
}

impl VideoSequencer {
    /// Create a sequencer for `len` clips
    pub fn new(len: usize, config: &SequencerConfig) -> Self {
        Self {
            len,
            window_size: config.window_size,
            loop_single: config.loop_single,
            transition: config.transition(),
            max_clip: config.max_clip(),
            current: 0,
            phase: Phase::Idle,
            epoch: 0,
            played: 0,
            loaded: false,
            pending_skip: None,
            retry: RetryPolicy::Ready,
        }
    }

    /// Snapshot of the visual state
    pub fn state(&self) -> SequencerState {
        SequencerState {
            current_index: self.current,
            phase: self.phase,
            played: self.played,
        }
    }

    /// Epoch of the active clip
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Number of clips
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether there are no clips
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current preload window
    pub fn window(&self) -> PreloadWindow {
        PreloadWindow::new(self.len, self.current, self.window_size)
    }

    /// Feed one event through the state machine
    pub fn handle(&mut self, event: SequencerEvent) -> Vec<Command> {
        match event {
            SequencerEvent::Start { start_index } => self.start(start_index),
            SequencerEvent::Media { index, event } => self.on_media(index, event),
            SequencerEvent::PlayRejected { index } => self.on_play_rejected(index),
            SequencerEvent::CapElapsed { epoch } => {
                if epoch != self.epoch {
                    debug!("Ignoring stale cap timer (epoch {} vs {})", epoch, self.epoch);
                    return Vec::new();
                }
                self.skip_active(AdvanceReason::SafetyCap)
            }
            SequencerEvent::TransitionSettled { epoch } => self.on_settled(epoch),
            SequencerEvent::Navigate(nav) => self.navigate(nav),
            SequencerEvent::UserGesture => self.on_gesture(),
            SequencerEvent::Stop => self.stop(),
        }
    }

    fn start(&mut self, start_index: usize) -> Vec<Command> {
        if self.len == 0 {
            debug!("No clips to sequence; staying idle");
            return Vec::new();
        }

        let previous = (self.phase != Phase::Idle).then_some(self.current);
        self.current = start_index % self.len;
        self.played = 0;
        info!("Starting sequence at clip {} of {}", self.current, self.len);

        let commands = self.activate(previous);
        self.phase = Phase::Loading;
        commands
    }

    fn navigate(&mut self, nav: Navigation) -> Vec<Command> {
        if self.len == 0 {
            return Vec::new();
        }

        let target = match nav {
            Navigation::Next => self.next_index(),
            Navigation::Previous => (self.current + self.len - 1) % self.len,
            Navigation::GoTo(index) if index < self.len => index,
            Navigation::GoTo(index) => {
                warn!("Ignoring navigation to clip {} (clips: {})", index, self.len);
                return Vec::new();
            }
        };

        if matches!(nav, Navigation::GoTo(_)) && target == self.current {
            return Vec::new();
        }

        self.advance(target, AdvanceReason::User)
    }

    fn next_index(&self) -> usize {
        (self.current + 1) % self.len.max(1)
    }

    /// Move to `target`, unless a transition is already in flight
    fn advance(&mut self, target: usize, reason: AdvanceReason) -> Vec<Command> {
        match self.phase {
            Phase::Idle => {
                debug!("Advance ({:?}) ignored while idle", reason);
                return Vec::new();
            }
            Phase::Transitioning => {
                debug!("Advance ({:?}) coalesced into transition to clip {}", reason, self.current);
                return Vec::new();
            }
            Phase::Loading | Phase::Playing => {}
        }

        let previous = self.current;
        self.current = target;
        self.played += 1;
        debug!("Clip {} -> {} ({:?})", previous, target, reason);

        let mut commands = self.activate(Some(previous));
        self.phase = Phase::Transitioning;
        commands.push(Command::ScheduleSettle {
            epoch: self.epoch,
            after: self.transition,
        });
        commands
    }

    /// Begin the lifetime of the clip at `self.current`
    fn activate(&mut self, previous: Option<usize>) -> Vec<Command> {
        self.epoch += 1;
        self.loaded = false;
        self.pending_skip = None;

        let mut commands = Vec::new();
        if self.retry == RetryPolicy::AwaitingGesture {
            commands.push(Command::DetachGestureListener);
        }
        self.retry = RetryPolicy::Ready;

        if let Some(previous) = previous {
            commands.push(Command::Pause { index: previous });
            commands.push(Command::Rewind { index: previous });
        }

        commands.push(Command::CancelCapTimer);
        commands.push(Command::ApplyPreload(self.window().plan()));
        commands.push(Command::Play { index: self.current });

        // A lone clip has nowhere to go, so the cap would only restart it
        if let Some(after) = self.max_clip.filter(|_| self.len > 1) {
            commands.push(Command::ArmCapTimer { epoch: self.epoch, after });
        }

        commands
    }

    fn on_media(&mut self, index: usize, event: MediaEvent) -> Vec<Command> {
        if self.phase == Phase::Idle || index != self.current {
            debug!("Ignoring {:?} from inactive clip {}", event, index);
            return Vec::new();
        }

        match event {
            MediaEvent::Loaded => {
                self.loaded = true;
                if self.phase == Phase::Loading {
                    self.phase = Phase::Playing;
                }
                Vec::new()
            }
            MediaEvent::Ended if self.loop_single => {
                debug!("Looping clip {}", index);
                self.played += 1;
                vec![Command::Rewind { index }, Command::Play { index }]
            }
            MediaEvent::Ended => self.skip_active(AdvanceReason::NaturalEnd),
            MediaEvent::Failed(error) => {
                warn!("Clip {} failed, skipping: {}", index, error);
                if self.len == 1 {
                    warn!("Only clip in the sequence failed; parking sequencer");
                    return self.park();
                }
                self.skip_active(AdvanceReason::ClipFailed)
            }
        }
    }

    /// Leave the active clip; deferred until the window closes if it is still opening
    fn skip_active(&mut self, reason: AdvanceReason) -> Vec<Command> {
        if self.phase == Phase::Transitioning {
            debug!("Clip {} finished inside its transition window; deferring", self.current);
            self.pending_skip = Some(reason);
            return Vec::new();
        }
        let target = self.next_index();
        self.advance(target, reason)
    }

    fn on_settled(&mut self, epoch: u64) -> Vec<Command> {
        if epoch != self.epoch || self.phase != Phase::Transitioning {
            return Vec::new();
        }

        self.phase = if self.loaded { Phase::Playing } else { Phase::Loading };
        if let Some(reason) = self.pending_skip.take() {
            let target = self.next_index();
            return self.advance(target, reason);
        }
        Vec::new()
    }

    fn on_play_rejected(&mut self, index: usize) -> Vec<Command> {
        if self.phase == Phase::Idle || index != self.current {
            return Vec::new();
        }

        match self.retry {
            RetryPolicy::Ready => {
                info!("Autoplay blocked for clip {}; waiting for a user gesture", index);
                self.retry = RetryPolicy::AwaitingGesture;
                vec![Command::AttachGestureListener]
            }
            RetryPolicy::AwaitingGesture => Vec::new(),
            RetryPolicy::Spent => {
                warn!("Retry for clip {} was also rejected; giving up on this clip", index);
                Vec::new()
            }
        }
    }

    fn on_gesture(&mut self) -> Vec<Command> {
        if self.retry != RetryPolicy::AwaitingGesture {
            return Vec::new();
        }

        debug!("User gesture received; retrying clip {}", self.current);
        self.retry = RetryPolicy::Spent;
        vec![
            Command::DetachGestureListener,
            Command::Play { index: self.current },
        ]
    }

    fn park(&mut self) -> Vec<Command> {
        let mut commands = vec![
            Command::Pause { index: self.current },
            Command::CancelCapTimer,
        ];
        if self.retry == RetryPolicy::AwaitingGesture {
            commands.push(Command::DetachGestureListener);
        }
        self.retry = RetryPolicy::Ready;
        self.phase = Phase::Idle;
        // Invalidate any timer still in flight
        self.epoch += 1;
        commands
    }

    fn stop(&mut self) -> Vec<Command> {
        if self.phase == Phase::Idle {
            return Vec::new();
        }
        info!("Stopping sequence at clip {}", self.current);
        self.park()
    }
}
