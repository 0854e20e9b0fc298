//! # Video Sequencer
//!
//! Plays an ordered, circular list of background clips one at a time,
//! advancing on natural end, on a safety cap, or on user navigation, while
//! keeping a small window of upcoming clips buffered.
//!
//! The sequencer is split in two:
//!
//! - [`VideoSequencer`] - synchronous state machine (`Idle`, `Loading`,
//!   `Playing`, `Transitioning`) turning events into commands
//! - [`SequencerDriver`] - tokio task owning the media handles and timers,
//!   executing commands and publishing [`SequencerState`]
//!
//! One sequencer covers every carousel variant: `window_size` picks the
//! preload window (1, 2 or 3 clips) and `loop_single` turns natural end into a
//! replay of the same clip.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use showreel::config::SequencerConfig;
//! use showreel::sequencer::{event_queue, AutoplayGate, SequencerDriver, SimulatedMedia, VideoSource};
//!
//! # #[tokio::main]
//! # async fn main() -> showreel::Result<()> {
//! let source = VideoSource::from_locators(["intro.mp4", "reel.mp4"]);
//! let (handle, queue) = event_queue();
//! let gate = AutoplayGate::open();
//! let media = source
//!     .iter()
//!     .enumerate()
//!     .map(|(i, clip)| SimulatedMedia::new(i, clip.clone(), Duration::from_secs(8), gate.clone(), handle.clone()))
//!     .collect::<Vec<_>>();
//!
//! let driver = SequencerDriver::new(media, &SequencerConfig::default(), handle, queue);
//! let mut state = driver.subscribe();
//! tokio::spawn(driver.run(0));
//! state.changed().await.ok();
//! println!("Now showing clip {}", state.borrow().current_index);
//! # Ok(())
//! # }
//! ```

pub mod driver;
pub mod engine;
pub mod media;
pub mod types;

pub use driver::{event_queue, follow_plays, EventQueue, SequencerDriver, SequencerHandle};
pub use engine::{Command, MediaEvent, Navigation, SequencerEvent, VideoSequencer};
pub use media::{AutoplayGate, MediaHandle, SimulatedMedia};
pub use types::{Phase, PreloadIntent, PreloadWindow, SequencerState, VideoClip, VideoSource};
