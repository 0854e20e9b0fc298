use serde::{Deserialize, Serialize};

/// A single background clip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoClip {
    /// URL or local asset path
    pub locator: String,

    /// Display title, if the source carries one
    pub title: Option<String>,

    /// Poster frame shown before the first frame decodes
    pub poster: Option<String>,
}

impl VideoClip {
    /// Create a clip from a locator with no metadata
    pub fn new<S: Into<String>>(locator: S) -> Self {
        Self {
            locator: locator.into(),
            title: None,
            poster: None,
        }
    }

    /// Attach a title
    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Attach a poster image
    pub fn with_poster<S: Into<String>>(mut self, poster: S) -> Self {
        self.poster = Some(poster.into());
        self
    }

    /// Whether the locator points at a remote resource
    pub fn is_remote(&self) -> bool {
        self.locator.starts_with("http://") || self.locator.starts_with("https://")
    }
}

impl From<&str> for VideoClip {
    fn from(locator: &str) -> Self {
        Self::new(locator)
    }
}

/// Ordered, immutable list of clips played by one sequencer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoSource {
    clips: Vec<VideoClip>,
}

impl VideoSource {
    /// Build a source from plain locators
    pub fn from_locators<I, S>(locators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        locators.into_iter().map(VideoClip::new).collect()
    }

    /// Get all clips in play order
    pub fn clips(&self) -> &[VideoClip] {
        &self.clips
    }

    /// Get a clip by position
    pub fn get(&self, index: usize) -> Option<&VideoClip> {
        self.clips.get(index)
    }

    /// Get the total number of clips
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// Check if the source is empty
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Iterate clips in play order
    pub fn iter(&self) -> impl Iterator<Item = &VideoClip> {
        self.clips.iter()
    }
}

impl FromIterator<VideoClip> for VideoSource {
    fn from_iter<I: IntoIterator<Item = VideoClip>>(iter: I) -> Self {
        Self {
            clips: iter.into_iter().collect(),
        }
    }
}

/// How much of a clip the player may buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PreloadIntent {
    /// Buffer the whole clip eagerly
    Eager,
    /// Fetch only enough to know duration and dimensions
    Metadata,
    /// Release buffered data and fetch nothing
    Deferred,
}

impl PreloadIntent {
    /// Equivalent value of the HTML `preload` attribute
    pub fn as_attr(&self) -> &'static str {
        match self {
            Self::Eager => "auto",
            Self::Metadata => "metadata",
            Self::Deferred => "none",
        }
    }
}

/// The set of clip indices kept ready around the active clip
///
/// Derived from the active index on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreloadWindow {
    len: usize,
    current: usize,
    size: usize,
}

impl PreloadWindow {
    /// Window of `size` (1, 2 or 3) around `current` in a list of `len` clips
    pub fn new(len: usize, current: usize, size: usize) -> Self {
        Self {
            len,
            current,
            size: size.clamp(1, 3),
        }
    }

    fn next(&self) -> usize {
        (self.current + 1) % self.len
    }

    fn previous(&self) -> usize {
        (self.current + self.len - 1) % self.len
    }

    /// Buffering intent for one clip index
    pub fn intent_for(&self, index: usize) -> PreloadIntent {
        if self.len == 0 || index >= self.len {
            return PreloadIntent::Deferred;
        }

        if index == self.current {
            PreloadIntent::Eager
        } else if (self.size >= 2 && index == self.next())
            || (self.size >= 3 && index == self.previous())
        {
            PreloadIntent::Metadata
        } else {
            PreloadIntent::Deferred
        }
    }

    /// Indices inside the window, deduplicated, active clip first
    pub fn indices(&self) -> Vec<usize> {
        if self.len == 0 {
            return Vec::new();
        }

        let mut indices = vec![self.current];
        if self.size >= 2 {
            indices.push(self.next());
        }
        if self.size >= 3 {
            indices.push(self.previous());
        }
        let mut seen = Vec::with_capacity(indices.len());
        indices.retain(|i| {
            let fresh = !seen.contains(i);
            seen.push(*i);
            fresh
        });
        indices
    }

    /// Intent for every clip, indexed by clip position
    pub fn plan(&self) -> Vec<PreloadIntent> {
        (0..self.len).map(|i| self.intent_for(i)).collect()
    }
}

/// Explicit phases of the sequencer state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    /// Not started, stopped, or parked after an unrecoverable clip
    #[default]
    Idle,
    /// Active clip requested, waiting for its first frame
    Loading,
    /// Active clip is on screen
    Playing,
    /// An index change happened within the transition window
    Transitioning,
}

/// Visual state published to the rendering layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SequencerState {
    /// Active clip, always below the clip count while not idle
    pub current_index: usize,

    /// Current state-machine phase
    pub phase: Phase,

    /// Clips finished, cut or replayed since the last start
    pub played: u64,
}

impl SequencerState {
    /// Whether advance triggers are currently being coalesced
    pub fn is_transitioning(&self) -> bool {
        self.phase == Phase::Transitioning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_from_locators() {
        let source = VideoSource::from_locators(["a.mp4", "https://cdn.example.com/b.mp4"]);
        assert_eq!(source.len(), 2);
        assert!(!source.get(0).unwrap().is_remote());
        assert!(source.get(1).unwrap().is_remote());
        assert!(source.get(2).is_none());
    }

    #[test]
    fn test_window_of_three() {
        let window = PreloadWindow::new(5, 0, 3);
        assert_eq!(
            window.plan(),
            vec![
                PreloadIntent::Eager,
                PreloadIntent::Metadata,
                PreloadIntent::Deferred,
                PreloadIntent::Deferred,
                PreloadIntent::Metadata,
            ]
        );
        assert_eq!(window.indices(), vec![0, 1, 4]);
    }

    #[test]
    fn test_window_of_two() {
        let window = PreloadWindow::new(4, 3, 2);
        assert_eq!(
            window.plan(),
            vec![
                PreloadIntent::Metadata,
                PreloadIntent::Deferred,
                PreloadIntent::Deferred,
                PreloadIntent::Eager,
            ]
        );
    }

    #[test]
    fn test_window_of_one() {
        let window = PreloadWindow::new(3, 1, 1);
        assert_eq!(window.indices(), vec![1]);
        assert_eq!(window.intent_for(0), PreloadIntent::Deferred);
        assert_eq!(window.intent_for(2), PreloadIntent::Deferred);
    }

    #[test]
    fn test_window_wider_than_list() {
        // next and previous are the same clip
        let window = PreloadWindow::new(2, 0, 3);
        assert_eq!(window.plan(), vec![PreloadIntent::Eager, PreloadIntent::Metadata]);
        assert_eq!(window.indices(), vec![0, 1]);

        let single = PreloadWindow::new(1, 0, 3);
        assert_eq!(single.indices(), vec![0]);
    }

    #[test]
    fn test_empty_window() {
        let window = PreloadWindow::new(0, 0, 3);
        assert!(window.plan().is_empty());
        assert!(window.indices().is_empty());
    }
}
