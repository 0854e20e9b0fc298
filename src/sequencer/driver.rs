use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    config::SequencerConfig,
    error::Result,
    sequencer::{
        engine::{Command, MediaEvent, Navigation, SequencerEvent, VideoSequencer},
        media::MediaHandle,
        types::{Phase, SequencerState},
    },
};

/// Create the event queue shared by a driver and everything that feeds it
pub fn event_queue() -> (SequencerHandle, EventQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SequencerHandle { tx }, EventQueue { rx })
}

/// Cloneable sender side of the sequencer's event queue
#[derive(Debug, Clone)]
pub struct SequencerHandle {
    tx: mpsc::UnboundedSender<SequencerEvent>,
}

impl SequencerHandle {
    /// Queue an event; dropped silently once the driver has stopped
    pub fn send(&self, event: SequencerEvent) {
        if self.tx.send(event).is_err() {
            debug!("Sequencer already stopped; event dropped");
        }
    }

    /// Report a media notification for the clip at `index`
    pub fn media(&self, index: usize, event: MediaEvent) {
        self.send(SequencerEvent::Media { index, event });
    }

    /// Dot/arrow navigation
    pub fn navigate(&self, nav: Navigation) {
        self.send(SequencerEvent::Navigate(nav));
    }

    /// Pointer click or touch on the page
    pub fn user_gesture(&self) {
        self.send(SequencerEvent::UserGesture);
    }

    /// Ask the driver to tear down and return
    pub fn stop(&self) {
        self.send(SequencerEvent::Stop);
    }
}

/// Receiver side of the sequencer's event queue
#[derive(Debug)]
pub struct EventQueue {
    rx: mpsc::UnboundedReceiver<SequencerEvent>,
}

impl EventQueue {
    /// Next queued event
    pub async fn recv(&mut self) -> Option<SequencerEvent> {
        self.rx.recv().await
    }
}

/// Runs a [`VideoSequencer`] against real media handles
///
/// Drains the event queue on a single task, executes the sequencer's commands,
/// owns the cap and transition timers, and publishes every state change on a
/// `watch` channel for the rendering layer.
pub struct SequencerDriver<M: MediaHandle> {
    engine: VideoSequencer,
    media: Vec<M>,
    handle: SequencerHandle,
    queue: EventQueue,
    state_tx: watch::Sender<SequencerState>,
    cap_timer: Option<JoinHandle<()>>,
    settle_timer: Option<JoinHandle<()>>,
    gesture_listener: bool,
}

impl<M: MediaHandle> SequencerDriver<M> {
    /// Create a driver over one media element per clip
    pub fn new(
        media: Vec<M>,
        config: &SequencerConfig,
        handle: SequencerHandle,
        queue: EventQueue,
    ) -> Self {
        let engine = VideoSequencer::new(media.len(), config);
        let (state_tx, _) = watch::channel(engine.state());
        Self {
            engine,
            media,
            handle,
            queue,
            state_tx,
            cap_timer: None,
            settle_timer: None,
            gesture_listener: false,
        }
    }

    /// Subscribe to published state
    pub fn subscribe(&self) -> watch::Receiver<SequencerState> {
        self.state_tx.subscribe()
    }

    /// Sender for navigation, gestures and stop requests
    pub fn handle(&self) -> SequencerHandle {
        self.handle.clone()
    }

    /// Play from `start_index` until a stop event arrives
    pub async fn run(mut self, start_index: usize) -> Result<Vec<M>> {
        if self.media.is_empty() {
            info!("No clips to play");
            return Ok(self.media);
        }

        info!("Sequencer running with {} clips", self.media.len());
        self.dispatch(SequencerEvent::Start { start_index });

        while let Some(event) = self.queue.recv().await {
            if event == SequencerEvent::UserGesture && !self.gesture_listener {
                continue;
            }
            let stop = event == SequencerEvent::Stop;
            self.dispatch(event);
            if stop {
                break;
            }
        }

        self.teardown();
        Ok(self.media)
    }

    fn dispatch(&mut self, event: SequencerEvent) {
        let commands = self.engine.handle(event);
        for command in commands {
            self.execute(command);
        }
        self.state_tx.send_replace(self.engine.state());
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::Play { index } => {
                let Some(media) = self.media.get_mut(index) else {
                    warn!("Play requested for missing clip {}", index);
                    return;
                };
                if let Err(e) = media.play() {
                    debug!("{}", e);
                    self.handle.send(SequencerEvent::PlayRejected { index });
                }
            }
            Command::Pause { index } => {
                if let Some(media) = self.media.get_mut(index) {
                    media.pause();
                }
            }
            Command::Rewind { index } => {
                if let Some(media) = self.media.get_mut(index) {
                    media.set_current_time(0.0);
                }
            }
            Command::ApplyPreload(plan) => {
                for (media, intent) in self.media.iter_mut().zip(plan) {
                    if media.preload() != intent {
                        debug!("Preload {} -> {}", media.locator(), intent.as_attr());
                        media.set_preload(intent);
                    }
                }
            }
            Command::ArmCapTimer { epoch, after } => {
                abort(&mut self.cap_timer);
                let handle = self.handle.clone();
                self.cap_timer = Some(tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    handle.send(SequencerEvent::CapElapsed { epoch });
                }));
            }
            Command::CancelCapTimer => abort(&mut self.cap_timer),
            Command::ScheduleSettle { epoch, after } => {
                abort(&mut self.settle_timer);
                let handle = self.handle.clone();
                self.settle_timer = Some(tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    handle.send(SequencerEvent::TransitionSettled { epoch });
                }));
            }
            Command::AttachGestureListener => self.gesture_listener = true,
            Command::DetachGestureListener => self.gesture_listener = false,
        }
    }

    fn teardown(&mut self) {
        abort(&mut self.cap_timer);
        abort(&mut self.settle_timer);
        self.gesture_listener = false;
        for media in &mut self.media {
            media.pause();
        }
        info!("Sequencer stopped");
    }
}

/// Follow published state until `target` clips have played
///
/// Calls `on_activation` with the active index every time a new activation is
/// observed, replays of the same clip included. Returns `false` if the
/// sequencer parked or the driver went away first.
pub async fn follow_plays<F>(
    state: &mut watch::Receiver<SequencerState>,
    target: u64,
    mut on_activation: F,
) -> bool
where
    F: FnMut(usize),
{
    let mut last: Option<(usize, u64)> = None;
    while state.changed().await.is_ok() {
        let current = *state.borrow_and_update();
        if current.phase == Phase::Idle {
            return current.played >= target;
        }
        if last != Some((current.current_index, current.played)) {
            last = Some((current.current_index, current.played));
            on_activation(current.current_index);
        }
        if current.played >= target {
            return true;
        }
    }
    false
}

fn abort(timer: &mut Option<JoinHandle<()>>) {
    if let Some(task) = timer.take() {
        task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::sequencer::{
        media::{AutoplayGate, SimulatedMedia},
        types::{Phase, PreloadIntent, VideoSource},
    };

    fn config() -> SequencerConfig {
        SequencerConfig {
            window_size: 3,
            loop_single: false,
            transition_ms: 100,
            max_clip_seconds: 30.0,
        }
    }

    fn simulated(
        source: &VideoSource,
        length: Duration,
        gate: &AutoplayGate,
        handle: &SequencerHandle,
    ) -> Vec<SimulatedMedia> {
        source
            .iter()
            .enumerate()
            .map(|(i, clip)| SimulatedMedia::new(i, clip.clone(), length, gate.clone(), handle.clone()))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_plays_through_and_wraps() {
        let source = VideoSource::from_locators(["a.mp4", "b.mp4", "c.mp4"]);
        let (handle, queue) = event_queue();
        let media = simulated(&source, Duration::from_secs(2), &AutoplayGate::open(), &handle);

        let driver = SequencerDriver::new(media, &config(), handle.clone(), queue);
        let state = driver.subscribe();
        let task = tokio::spawn(driver.run(0));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(state.borrow().current_index, 0);
        assert_eq!(state.borrow().phase, Phase::Playing);

        tokio::time::sleep(Duration::from_millis(1550)).await;
        assert_eq!(state.borrow().current_index, 1);
        assert!(state.borrow().is_transitioning());

        tokio::time::sleep(Duration::from_millis(4450)).await;
        assert_eq!(state.borrow().current_index, 0);

        handle.stop();
        let media = task.await.unwrap().unwrap();
        assert_eq!(state.borrow().phase, Phase::Idle);
        assert!(media.iter().all(|m| !m.is_playing()));
        assert_eq!(media[0].preload(), PreloadIntent::Eager);
        assert_eq!(media[1].preload(), PreloadIntent::Metadata);
        assert_eq!(media[2].preload(), PreloadIntent::Metadata);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cap_cuts_long_clips() {
        let source = VideoSource::from_locators(["long-a.mp4", "long-b.mp4"]);
        let (handle, queue) = event_queue();
        let media = simulated(&source, Duration::from_secs(120), &AutoplayGate::open(), &handle);

        let mut cfg = config();
        cfg.max_clip_seconds = 10.0;
        let driver = SequencerDriver::new(media, &cfg, handle.clone(), queue);
        let state = driver.subscribe();
        let task = tokio::spawn(driver.run(0));

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(state.borrow().current_index, 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(state.borrow().current_index, 0);

        handle.stop();
        let media = task.await.unwrap().unwrap();
        // The clip that was left got rewound
        assert_eq!(media[1].current_time(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocked_autoplay_waits_for_gesture() {
        let source = VideoSource::from_locators(["a.mp4", "b.mp4"]);
        let gate = AutoplayGate::blocked();
        let (handle, queue) = event_queue();
        let media = simulated(&source, Duration::from_secs(5), &gate, &handle);

        let driver = SequencerDriver::new(media, &config(), handle.clone(), queue);
        let state = driver.subscribe();
        let task = tokio::spawn(driver.run(0));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(state.borrow().phase, Phase::Loading);

        gate.allow();
        handle.user_gesture();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(state.borrow().phase, Phase::Playing);
        assert_eq!(state.borrow().current_index, 0);

        handle.stop();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_broken_clip_is_skipped() {
        let (handle, queue) = event_queue();
        let gate = AutoplayGate::open();
        let media = vec![
            SimulatedMedia::new(0, "a.mp4".into(), Duration::from_secs(2), gate.clone(), handle.clone()),
            SimulatedMedia::new(1, "b.mp4".into(), Duration::from_secs(2), gate.clone(), handle.clone()).broken(),
            SimulatedMedia::new(2, "c.mp4".into(), Duration::from_secs(2), gate.clone(), handle.clone()),
        ];

        let driver = SequencerDriver::new(media, &config(), handle.clone(), queue);
        let state = driver.subscribe();
        let task = tokio::spawn(driver.run(0));

        // a ends at 2s, b fails at once and is skipped when its window closes
        tokio::time::sleep(Duration::from_millis(2300)).await;
        assert_eq!(state.borrow().current_index, 2);

        handle.stop();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_clip_completes_its_cycles() {
        let source = VideoSource::from_locators(["only.mp4"]);
        let (handle, queue) = event_queue();
        let media = simulated(&source, Duration::from_millis(500), &AutoplayGate::open(), &handle);

        let driver = SequencerDriver::new(media, &config(), handle.clone(), queue);
        let mut state = driver.subscribe();
        let task = tokio::spawn(driver.run(0));

        let mut seen = Vec::new();
        assert!(follow_plays(&mut state, 2, |index| seen.push(index)).await);
        assert!(seen.iter().all(|&index| index == 0));
        assert!(seen.len() >= 2);

        handle.stop();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_single_completes_its_cycles() {
        let source = VideoSource::from_locators(["a.mp4", "b.mp4"]);
        let (handle, queue) = event_queue();
        let media = simulated(&source, Duration::from_millis(500), &AutoplayGate::open(), &handle);

        let mut cfg = config();
        cfg.loop_single = true;
        let driver = SequencerDriver::new(media, &cfg, handle.clone(), queue);
        let mut state = driver.subscribe();
        let task = tokio::spawn(driver.run(0));

        assert!(follow_plays(&mut state, 4, |_| {}).await);
        assert_eq!(state.borrow().current_index, 0);

        handle.stop();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_follow_plays_stops_when_parked() {
        let (handle, queue) = event_queue();
        let media = vec![SimulatedMedia::new(
            0,
            "a.mp4".into(),
            Duration::from_secs(2),
            AutoplayGate::open(),
            handle.clone(),
        )
        .broken()];

        let driver = SequencerDriver::new(media, &config(), handle.clone(), queue);
        let mut state = driver.subscribe();
        let task = tokio::spawn(driver.run(0));

        assert!(!follow_plays(&mut state, 1, |_| {}).await);

        handle.stop();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_empty_source_returns_immediately() {
        let (handle, queue) = event_queue();
        let driver: SequencerDriver<SimulatedMedia> =
            SequencerDriver::new(Vec::new(), &config(), handle, queue);
        let state = driver.subscribe();

        let media = driver.run(0).await.unwrap();
        assert!(media.is_empty());
        assert_eq!(state.borrow().phase, Phase::Idle);
    }
}
