//! # CMS Content
//!
//! The data-fetch boundary between the site and its headless CMS. The core
//! engines only ever see plain locators; this module turns CMS entries into
//! those and makes sure a missing, empty or failing CMS degrades to "no
//! content yet" instead of an error.
//!
//! Caching is an injected collaborator ([`ContentCache`]) with an explicit
//! TTL, explicit invalidation and a pluggable [`Clock`].

pub mod cache;
pub mod source;
pub mod types;

pub use cache::{Clock, ContentCache, ManualClock, SystemClock};
pub use source::{ContentFetcher, ContentSource, JsonFileSource};
pub use types::{gallery_locators, video_source, ContentItem};
