use serde::{Deserialize, Serialize};

use crate::sequencer::{VideoClip, VideoSource};

/// One entry delivered by the CMS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub thumbnail_url: Option<String>,

    #[serde(default)]
    pub media_url: Option<String>,

    #[serde(default)]
    pub video_url: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

impl ContentItem {
    pub fn new<S: Into<String>, T: Into<String>>(id: S, title: T) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            thumbnail_url: None,
            media_url: None,
            video_url: None,
            description: None,
        }
    }

    /// Locator to play for this item, preferring the dedicated video field
    pub fn video_locator(&self) -> Option<&str> {
        self.video_url.as_deref().or(self.media_url.as_deref())
    }

    /// Locator to show in a gallery, preferring full media over the thumbnail
    pub fn image_locator(&self) -> Option<&str> {
        self.media_url.as_deref().or(self.thumbnail_url.as_deref())
    }
}

/// Background clips for the items that carry a video
pub fn video_source(items: &[ContentItem]) -> VideoSource {
    items
        .iter()
        .filter_map(|item| {
            let locator = item.video_locator()?;
            let mut clip = VideoClip::new(locator);
            if !item.title.is_empty() {
                clip = clip.with_title(item.title.clone());
            }
            if let Some(poster) = &item.thumbnail_url {
                clip = clip.with_poster(poster.clone());
            }
            Some(clip)
        })
        .collect()
}

/// Gallery locators for the items that carry an image
pub fn gallery_locators(items: &[ContentItem]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.image_locator().map(str::to_string))
        .collect()
}
