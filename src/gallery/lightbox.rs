use std::sync::Arc;

use tracing::debug;

/// Page-level scrolling the lightbox suspends while open
pub trait PageScroll: Send + Sync {
    fn suspend(&self);
    fn restore(&self);
}

/// Scroll suspension that lasts exactly as long as this value
///
/// Restores scrolling when dropped, so an unexpected teardown still pairs
/// every suspend with a restore.
pub struct ScrollGuard {
    page: Arc<dyn PageScroll>,
}

impl ScrollGuard {
    pub fn acquire(page: Arc<dyn PageScroll>) -> Self {
        page.suspend();
        Self { page }
    }
}

impl Drop for ScrollGuard {
    fn drop(&mut self) {
        self.page.restore();
    }
}

/// Keys the lightbox reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightboxKey {
    Escape,
    ArrowLeft,
    ArrowRight,
    Other,
}

impl LightboxKey {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_key_name(name: &str) -> Self {
        match name {
            "Escape" | "Esc" => Self::Escape,
            "ArrowLeft" | "Left" => Self::ArrowLeft,
            "ArrowRight" | "Right" => Self::ArrowRight,
            _ => Self::Other,
        }
    }
}

/// Full-screen viewer over the flat image list
///
/// The selected index always refers to the original order, never to a
/// column position.
pub struct Lightbox {
    len: usize,
    selected: Option<usize>,
    page: Arc<dyn PageScroll>,
    scroll: Option<ScrollGuard>,
}

impl Lightbox {
    /// Viewer over a list of `len` images
    pub fn new(len: usize, page: Arc<dyn PageScroll>) -> Self {
        Self {
            len,
            selected: None,
            page,
            scroll: None,
        }
    }

    /// Currently shown image
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_open(&self) -> bool {
        self.selected.is_some()
    }

    /// Open on `index`; returns false when there is nothing to show there
    pub fn open(&mut self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        if self.scroll.is_none() {
            self.scroll = Some(ScrollGuard::acquire(Arc::clone(&self.page)));
        }
        debug!("Lightbox opened at {}", index);
        self.selected = Some(index);
        true
    }

    pub fn close(&mut self) {
        if self.selected.take().is_some() {
            debug!("Lightbox closed");
        }
        self.scroll = None;
    }

    /// Show the following image, wrapping to the first
    pub fn next(&mut self) -> Option<usize> {
        let current = self.selected?;
        self.selected = Some((current + 1) % self.len);
        self.selected
    }

    /// Show the preceding image, wrapping to the last
    pub fn previous(&mut self) -> Option<usize> {
        let current = self.selected?;
        self.selected = Some((current + self.len - 1) % self.len);
        self.selected
    }

    /// Apply a key press while open
    pub fn handle_key(&mut self, key: LightboxKey) {
        if !self.is_open() {
            return;
        }
        match key {
            LightboxKey::Escape => self.close(),
            LightboxKey::ArrowRight => {
                self.next();
            }
            LightboxKey::ArrowLeft => {
                self.previous();
            }
            LightboxKey::Other => {}
        }
    }

    /// A click on the dimmed area around the image
    pub fn backdrop_click(&mut self) {
        self.close();
    }

    /// The image list changed underneath the viewer
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        if self.selected.is_some_and(|i| i >= len) {
            self.close();
        }
    }
}
