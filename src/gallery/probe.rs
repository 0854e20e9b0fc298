use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    error::{GalleryError, Result},
    gallery::layout::Masonry,
};

/// Reads the intrinsic pixel size of an image
pub trait DimensionProbe: Send + Sync + 'static {
    /// Width and height in pixels
    fn dimensions(&self, locator: &str) -> Result<(u32, u32)>;
}

/// Height divided by width
pub fn aspect_ratio(locator: &str, (width, height): (u32, u32)) -> Result<f32> {
    if width == 0 {
        return Err(GalleryError::ZeroWidth { locator: locator.to_string() }.into());
    }
    Ok(height as f32 / width as f32)
}

/// Probes local image files with the `image` crate
///
/// Only the header is decoded. Relative locators resolve against `root`.
#[derive(Debug, Clone, Default)]
pub struct ImageFileProbe {
    root: Option<PathBuf>,
}

impl ImageFileProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative locators against `root`
    pub fn with_root<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: Some(root.into()) }
    }

    fn resolve(&self, locator: &str) -> PathBuf {
        let path = Path::new(locator);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl DimensionProbe for ImageFileProbe {
    fn dimensions(&self, locator: &str) -> Result<(u32, u32)> {
        if locator.starts_with("http://") || locator.starts_with("https://") {
            return Err(GalleryError::RemoteLocator { locator: locator.to_string() }.into());
        }

        image::image_dimensions(self.resolve(locator)).map_err(|e| {
            GalleryError::ProbeFailed {
                locator: locator.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}

/// One settled probe, ready to be applied to a layout
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub index: usize,
    pub locator: String,
    /// `None` when the image could not be measured
    pub ratio: Option<f32>,
}

impl ProbeResult {
    /// Record this result in `masonry`
    ///
    /// Ignored when the image at `index` is no longer the one that was probed.
    /// Returns whether this result completed the probe set.
    pub fn apply(&self, masonry: &mut Masonry) -> bool {
        match masonry.images().get(self.index) {
            Some(image) if image.locator == self.locator => {
                masonry.record_probe(self.index, self.ratio)
            }
            _ => {
                debug!("Dropping probe for replaced image {}", self.locator);
                false
            }
        }
    }
}

/// Probe every locator off the async thread
///
/// Results arrive in completion order. The caller keeps ownership of the
/// layout and can resize or re-render between results. Every locator yields
/// exactly one result; the channel closes once all have settled.
pub fn spawn_probes<P, I>(probe: Arc<P>, locators: I) -> mpsc::UnboundedReceiver<ProbeResult>
where
    P: DimensionProbe,
    I: IntoIterator<Item = String>,
{
    let (tx, rx) = mpsc::unbounded_channel();
    for (index, locator) in locators.into_iter().enumerate() {
        let probe = Arc::clone(&probe);
        let tx = tx.clone();
        tokio::spawn(async move {
            let path = locator.clone();
            let measured = tokio::task::spawn_blocking(move || {
                probe.dimensions(&path).and_then(|size| aspect_ratio(&path, size))
            })
            .await;

            let ratio = match measured {
                Ok(Ok(ratio)) => {
                    debug!("Probe {} settled at ratio {:.3}", index, ratio);
                    Some(ratio)
                }
                Ok(Err(e)) => {
                    warn!("{}; using fallback ratio", e);
                    None
                }
                Err(e) => {
                    warn!("Probe task for {} aborted: {}", locator, e);
                    None
                }
            };
            if tx.send(ProbeResult { index, locator, ratio }).is_err() {
                debug!("Layout dropped before probe {} settled", index);
            }
        });
    }
    rx
}

/// Probe every image in `masonry` and apply results as they settle
///
/// The layout switches from round-robin to balanced placement when the last
/// result lands. Failures record the fallback ratio. Returns the number of
/// failed probes.
pub async fn probe_all<P: DimensionProbe>(probe: Arc<P>, masonry: &mut Masonry) -> usize {
    let total = masonry.images().len();
    if total == 0 {
        return 0;
    }

    info!("Probing {} gallery images", total);
    let locators: Vec<String> = masonry.images().iter().map(|i| i.locator.clone()).collect();
    let mut results = spawn_probes(probe, locators);

    let mut failed = 0;
    while let Some(result) = results.recv().await {
        if result.ratio.is_none() {
            failed += 1;
        }
        result.apply(masonry);
    }
    failed
}
