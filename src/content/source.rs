use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    content::{
        cache::{Clock, ContentCache, SystemClock},
        types::ContentItem,
    },
    error::{ContentError, Result},
};

/// Where CMS entries come from
///
/// `Ok(None)` and an empty list both mean "no content yet".
pub trait ContentSource: Send + Sync {
    fn fetch(&self, content_type: &str) -> Result<Option<Vec<ContentItem>>>;
}

/// Reads `<dir>/<content_type>.json` exports of the CMS
///
/// Accepts either a bare array of entries or an object with an `items` array.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    dir: PathBuf,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Export {
    List(Vec<ContentItem>),
    Wrapped { items: Vec<ContentItem> },
}

impl JsonFileSource {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, content_type: &str) -> Result<PathBuf> {
        let valid = !content_type.is_empty()
            && content_type
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ContentError::InvalidContentType { name: content_type.to_string() }.into());
        }
        Ok(self.dir.join(format!("{}.json", content_type)))
    }
}

impl ContentSource for JsonFileSource {
    fn fetch(&self, content_type: &str) -> Result<Option<Vec<ContentItem>>> {
        let path = self.path_for(content_type)?;
        if !path.exists() {
            debug!("No export for '{}' at {:?}", content_type, path);
            return Ok(None);
        }

        let raw = std::fs::read_to_string(&path)
            .map_err(|_| ContentError::ReadFailed { path: path.display().to_string() })?;
        let export: Export = serde_json::from_str(&raw).map_err(|e| ContentError::ParseFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let items = match export {
            Export::List(items) | Export::Wrapped { items } => items,
        };
        Ok(Some(items))
    }
}

/// The single data-fetch contract in front of a [`ContentSource`]
///
/// Serves fresh cached entries, falls through to the source otherwise, and
/// absorbs every source failure: an error serves the last stale entry if one
/// exists and an empty list if not.
pub struct ContentFetcher<S: ContentSource, C: Clock = SystemClock> {
    source: S,
    cache: ContentCache<C>,
}

impl<S: ContentSource, C: Clock> ContentFetcher<S, C> {
    pub fn new(source: S, cache: ContentCache<C>) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &ContentCache<C> {
        &self.cache
    }

    /// Items for `content_type`; empty means "no content yet"
    pub fn fetch(&self, content_type: &str) -> Vec<ContentItem> {
        if let Some(items) = self.cache.get(content_type) {
            debug!("Serving '{}' from cache ({} items)", content_type, items.len());
            return items;
        }

        match self.source.fetch(content_type) {
            Ok(Some(items)) if !items.is_empty() => {
                debug!("Fetched {} '{}' items", items.len(), content_type);
                self.cache.put(content_type, items.clone());
                items
            }
            Ok(_) => {
                debug!("No '{}' content yet", content_type);
                Vec::new()
            }
            Err(e) => {
                warn!("Fetching '{}' failed: {}", content_type, e);
                self.cache.get_stale(content_type).unwrap_or_default()
            }
        }
    }

    /// Drop the cached entry and fetch again
    pub fn refresh(&self, content_type: &str) -> Vec<ContentItem> {
        self.cache.invalidate(content_type);
        self.fetch(content_type)
    }
}
