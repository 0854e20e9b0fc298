//! # Masonry Gallery
//!
//! Distributes a flat, ordered list of photographs over a responsive number
//! of columns so the columns stay balanced by accumulated height, without
//! waiting for every image to be measured.
//!
//! - [`layout`] - column policy, round-robin and balanced placement, [`Masonry`]
//! - [`probe`] - off-thread dimension probing with the `image` crate
//! - [`lightbox`] - full-screen viewer navigating the flat list
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use showreel::config::GalleryConfig;
//! use showreel::gallery::{probe_all, ImageFileProbe, Masonry};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mut masonry = Masonry::new(GalleryConfig::default(), 1440);
//! masonry.set_images(["stills/01.jpg", "stills/02.jpg", "stills/03.jpg"]);
//!
//! // Round-robin until every probe settles, balanced afterwards
//! probe_all(Arc::new(ImageFileProbe::new()), &mut masonry).await;
//! for (column, images) in masonry.assignment().columns().iter().enumerate() {
//!     println!("column {}: {} images", column, images.len());
//! }
//! # }
//! ```

pub mod layout;
pub mod lightbox;
pub mod probe;

pub use layout::{place_balanced, place_round_robin, ColumnAssignment, GalleryImage, Masonry, PlacedImage};
pub use lightbox::{Lightbox, LightboxKey, PageScroll, ScrollGuard};
pub use probe::{aspect_ratio, probe_all, spawn_probes, DimensionProbe, ImageFileProbe, ProbeResult};
