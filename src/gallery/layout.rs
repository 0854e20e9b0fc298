use serde::Serialize;
use tracing::debug;

use crate::config::GalleryConfig;

/// One gallery image and its measured shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryImage {
    /// URL or local path
    pub locator: String,

    /// Height divided by width, once probed
    pub aspect_ratio: Option<f32>,
}

impl GalleryImage {
    /// An image whose dimensions are not known yet
    pub fn new<S: Into<String>>(locator: S) -> Self {
        Self {
            locator: locator.into(),
            aspect_ratio: None,
        }
    }

    /// Ratio used for placement, falling back when unknown
    pub fn ratio_or(&self, fallback: f32) -> f32 {
        self.aspect_ratio.unwrap_or(fallback)
    }
}

/// An image placed in a column, remembering its position in the flat list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedImage {
    pub original_index: usize,
    pub locator: String,
}

/// Column index to the images stacked in it, top to bottom
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnAssignment {
    columns: Vec<Vec<PlacedImage>>,
}

impl ColumnAssignment {
    /// All columns, leftmost first
    pub fn columns(&self) -> &[Vec<PlacedImage>] {
        &self.columns
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Total number of placed images
    pub fn image_count(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    /// Original indices per column
    pub fn indices(&self) -> Vec<Vec<usize>> {
        self.columns
            .iter()
            .map(|col| col.iter().map(|p| p.original_index).collect())
            .collect()
    }

    /// Every placed image back in original order
    pub fn flatten(&self) -> Vec<PlacedImage> {
        let mut all: Vec<PlacedImage> = self.columns.iter().flatten().cloned().collect();
        all.sort_by_key(|p| p.original_index);
        all
    }
}

/// Provisional placement used while probes are still in flight
pub fn place_round_robin(images: &[GalleryImage], columns: usize) -> ColumnAssignment {
    let mut assignment = empty_columns(columns);
    if columns == 0 {
        return assignment;
    }

    for (index, image) in images.iter().enumerate() {
        assignment.columns[index % columns].push(PlacedImage {
            original_index: index,
            locator: image.locator.clone(),
        });
    }
    assignment
}

/// Height-balanced placement
///
/// Images are taken in original order and each goes to the column with the
/// smallest accumulated height, the leftmost one on ties. The image's ratio is
/// then added to that column's height. Greedy, O(N·C), deterministic.
pub fn place_balanced(images: &[GalleryImage], columns: usize, fallback_ratio: f32) -> ColumnAssignment {
    let mut assignment = empty_columns(columns);
    if columns == 0 {
        return assignment;
    }

    let mut heights = vec![0.0f32; columns];
    for (index, image) in images.iter().enumerate() {
        let mut shortest = 0;
        for (column, &height) in heights.iter().enumerate().skip(1) {
            // strict comparison keeps the leftmost column on ties
            if height < heights[shortest] {
                shortest = column;
            }
        }

        assignment.columns[shortest].push(PlacedImage {
            original_index: index,
            locator: image.locator.clone(),
        });
        heights[shortest] += image.ratio_or(fallback_ratio);
    }
    assignment
}

fn empty_columns(columns: usize) -> ColumnAssignment {
    ColumnAssignment {
        columns: vec![Vec::new(); columns],
    }
}

/// Responsive masonry layout over a flat image list
///
/// Holds the image list, the probe results and the viewport-driven column
/// count. Any change to one of them triggers a full re-placement: round-robin
/// while probes are outstanding, balanced once every probe has settled.
#[derive(Debug, Clone)]
pub struct Masonry {
    config: GalleryConfig,
    images: Vec<GalleryImage>,
    settled: Vec<bool>,
    columns: usize,
    assignment: ColumnAssignment,
}

impl Masonry {
    /// Create an empty layout sized for `viewport_width`
    pub fn new(config: GalleryConfig, viewport_width: u32) -> Self {
        let columns = config.column_count(viewport_width);
        Self {
            config,
            images: Vec::new(),
            settled: Vec::new(),
            columns,
            assignment: empty_columns(columns),
        }
    }

    /// Replace the image list; all probes start over
    pub fn set_images<I, S>(&mut self, locators: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.images = locators.into_iter().map(GalleryImage::new).collect();
        self.settled = vec![false; self.images.len()];
        debug!("Gallery list replaced with {} images", self.images.len());
        self.recompute();
    }

    /// React to a viewport resize; returns whether the column count changed
    pub fn set_viewport_width(&mut self, width: u32) -> bool {
        let columns = self.config.column_count(width);
        if columns == self.columns {
            return false;
        }
        debug!("Viewport {}px: {} -> {} columns", width, self.columns, columns);
        self.columns = columns;
        self.recompute();
        true
    }

    /// Record one probe outcome; `None` means the probe failed
    ///
    /// Out-of-range indices and repeated results are ignored. Returns whether
    /// this result completed the probe set.
    pub fn record_probe(&mut self, index: usize, ratio: Option<f32>) -> bool {
        if index >= self.images.len() || self.settled[index] {
            return false;
        }

        let ratio = ratio
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(self.config.fallback_ratio);
        self.images[index].aspect_ratio = Some(ratio);
        self.settled[index] = true;

        let complete = self.probes_complete();
        if complete {
            debug!("All {} probes settled; balancing columns", self.images.len());
            self.recompute();
        }
        complete
    }

    /// Whether every image has a settled probe
    pub fn probes_complete(&self) -> bool {
        self.settled.iter().all(|&s| s)
    }

    /// Images in original order
    pub fn images(&self) -> &[GalleryImage] {
        &self.images
    }

    /// Current column count
    pub fn column_count(&self) -> usize {
        self.columns
    }

    /// Current placement
    pub fn assignment(&self) -> &ColumnAssignment {
        &self.assignment
    }

    fn recompute(&mut self) {
        self.assignment = if self.probes_complete() {
            place_balanced(&self.images, self.columns, self.config.fallback_ratio)
        } else {
            place_round_robin(&self.images, self.columns)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_ratios(ratios: &[f32]) -> Vec<GalleryImage> {
        ratios
            .iter()
            .enumerate()
            .map(|(i, &r)| GalleryImage {
                locator: format!("photo-{}.jpg", i),
                aspect_ratio: Some(r),
            })
            .collect()
    }

    #[test]
    fn test_balanced_worked_example() {
        let images = with_ratios(&[2.0, 1.0, 1.0, 1.0, 3.0]);
        let assignment = place_balanced(&images, 2, 1.0);
        assert_eq!(assignment.indices(), vec![vec![0, 3], vec![1, 2, 4]]);
    }

    #[test]
    fn test_ties_go_left() {
        let images = with_ratios(&[1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        let assignment = place_balanced(&images, 3, 1.0);
        assert_eq!(assignment.indices(), vec![vec![0, 3], vec![1, 4], vec![2, 5]]);
    }

    #[test]
    fn test_unknown_ratio_uses_fallback() {
        let mut images = with_ratios(&[1.0, 1.0, 1.0]);
        images[0].aspect_ratio = None;
        let assignment = place_balanced(&images, 2, 5.0);
        assert_eq!(assignment.indices(), vec![vec![0], vec![1, 2]]);
    }

    #[test]
    fn test_every_image_placed_once() {
        let ratios: Vec<f32> = (0..37).map(|i| 0.5 + (i * 7 % 11) as f32 / 4.0).collect();
        let images = with_ratios(&ratios);

        for columns in 1..=5 {
            for assignment in [place_balanced(&images, columns, 1.0), place_round_robin(&images, columns)] {
                assert_eq!(assignment.column_count(), columns);
                assert_eq!(assignment.image_count(), images.len());

                let flat = assignment.flatten();
                let locators: Vec<&str> = flat.iter().map(|p| p.locator.as_str()).collect();
                let expected: Vec<&str> = images.iter().map(|i| i.locator.as_str()).collect();
                assert_eq!(locators, expected);
            }
        }
    }

    #[test]
    fn test_placement_is_deterministic() {
        let images = with_ratios(&[1.3, 0.7, 1.5, 1.5, 0.66, 1.0, 2.1]);
        let first = place_balanced(&images, 3, 1.0);
        for _ in 0..10 {
            assert_eq!(place_balanced(&images, 3, 1.0), first);
        }
    }

    #[test]
    fn test_round_robin() {
        let images = with_ratios(&[1.0; 5]);
        let assignment = place_round_robin(&images, 2);
        assert_eq!(assignment.indices(), vec![vec![0, 2, 4], vec![1, 3]]);
    }

    #[test]
    fn test_empty_list() {
        let assignment = place_balanced(&[], 4, 1.0);
        assert_eq!(assignment.column_count(), 4);
        assert_eq!(assignment.image_count(), 0);

        let masonry = Masonry::new(GalleryConfig::default(), 1440);
        assert!(masonry.probes_complete());
        assert_eq!(masonry.assignment().image_count(), 0);
    }

    #[test]
    fn test_masonry_round_robin_until_probes_settle() {
        let mut masonry = Masonry::new(GalleryConfig::default(), 500);
        masonry.set_images((0..5).map(|i| format!("{}.jpg", i)));
        assert_eq!(masonry.column_count(), 2);
        assert_eq!(masonry.assignment().indices(), vec![vec![0, 2, 4], vec![1, 3]]);

        let ratios = [2.0, 1.0, 1.0, 1.0, 3.0];
        for (i, r) in ratios.iter().enumerate().take(4) {
            assert!(!masonry.record_probe(i, Some(*r)));
        }
        assert_eq!(masonry.assignment().indices(), vec![vec![0, 2, 4], vec![1, 3]]);

        assert!(masonry.record_probe(4, Some(3.0)));
        assert_eq!(masonry.assignment().indices(), vec![vec![0, 3], vec![1, 2, 4]]);
    }

    #[test]
    fn test_masonry_failed_probe_is_square() {
        let mut masonry = Masonry::new(GalleryConfig::default(), 500);
        masonry.set_images(["a.jpg", "b.jpg"]);
        masonry.record_probe(0, None);
        masonry.record_probe(1, Some(f32::NAN));
        assert_eq!(masonry.images()[0].aspect_ratio, Some(1.0));
        assert_eq!(masonry.images()[1].aspect_ratio, Some(1.0));
        assert!(masonry.probes_complete());
    }

    #[test]
    fn test_masonry_ignores_repeat_and_stray_probes() {
        let mut masonry = Masonry::new(GalleryConfig::default(), 500);
        masonry.set_images(["a.jpg", "b.jpg"]);
        masonry.record_probe(0, Some(2.0));
        assert!(!masonry.record_probe(0, Some(9.0)));
        assert!(!masonry.record_probe(7, Some(1.0)));
        assert_eq!(masonry.images()[0].aspect_ratio, Some(2.0));
    }

    #[test]
    fn test_masonry_resize_recomputes() {
        let mut masonry = Masonry::new(GalleryConfig::default(), 1300);
        masonry.set_images((0..8).map(|i| format!("{}.jpg", i)));
        assert_eq!(masonry.assignment().column_count(), 4);

        assert!(!masonry.set_viewport_width(1500));
        assert!(masonry.set_viewport_width(800));
        assert_eq!(masonry.assignment().column_count(), 3);
        assert!(masonry.set_viewport_width(320));
        assert_eq!(masonry.assignment().column_count(), 2);
        assert_eq!(masonry.assignment().image_count(), 8);
    }

    #[test]
    fn test_new_list_resets_probes() {
        let mut masonry = Masonry::new(GalleryConfig::default(), 500);
        masonry.set_images(["a.jpg"]);
        masonry.record_probe(0, Some(1.5));
        assert!(masonry.probes_complete());

        masonry.set_images(["b.jpg", "c.jpg"]);
        assert!(!masonry.probes_complete());
        assert!(masonry.images().iter().all(|i| i.aspect_ratio.is_none()));
    }
}
