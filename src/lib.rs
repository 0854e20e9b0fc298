//! # Showreel
//!
//! Media layer for a film production company's portfolio site: seamless
//! looping background video and a responsive masonry photo gallery.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use showreel::{
//!     config::Config,
//!     gallery::{place_balanced, GalleryImage},
//! };
//!
//! let config = Config::default();
//! let columns = config.gallery.column_count(1440);
//!
//! let images: Vec<GalleryImage> = ["01.jpg", "02.jpg", "03.jpg"]
//!     .into_iter()
//!     .map(GalleryImage::new)
//!     .collect();
//! let assignment = place_balanced(&images, columns, config.gallery.fallback_ratio);
//! assert_eq!(assignment.image_count(), 3);
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - [`sequencer`] - Circular background-video sequencing with preload windows
//! - [`gallery`] - Masonry layout, dimension probing and the lightbox viewer
//! - [`content`] - CMS fetch boundary with an injected, time-bounded cache
//! - [`config`] - Configuration management
//!
//! Both engines absorb their own failures. A blocked autoplay, a broken clip,
//! an unreadable image or an empty CMS response all degrade the rendered
//! state and get logged; none of them reach the caller as an error.

pub mod config;
pub mod content;
pub mod error;
pub mod gallery;
pub mod sequencer;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    error::{Result, ShowreelError},
    gallery::Masonry,
    sequencer::{SequencerDriver, VideoSequencer},
};
