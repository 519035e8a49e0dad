use crate::error::{PipelineError, Result};
use image::{Rgb, RgbImage};

/// Smallest accepted minimum-area filter, in pixels
pub const MIN_AREA_FLOOR: u32 = 10;

/// Channel intensity above which a masked pixel counts as plant material
/// Leaves headroom for JPEG noise around the zeroed background
///
/// Only the segmenter uses this cutoff. The color analyzer treats nothing but
/// pure black `[0, 0, 0]` as background, so a near-black pixel such as
/// `[5, 5, 5]` is left out of every plant crop yet still gets clustered when
/// the whole masked image is analyzed.
pub const DEFAULT_FOREGROUND_THRESHOLD: u8 = 10;

/// Validated instance segmentation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentationParams {
    count: usize,
    min_area: Option<u32>,
    threshold: u8,
}

impl SegmentationParams {
    /// # Errors
    /// `InvalidInput` if `count` is 0 or `min_area` is below 10
    pub fn new(count: usize, min_area: Option<u32>) -> Result<Self> {
        if count < 1 {
            return Err(PipelineError::InvalidInput(
                "count must be greater than or equal to 1".to_string(),
            ));
        }
        if let Some(area) = min_area {
            if area < MIN_AREA_FLOOR {
                return Err(PipelineError::InvalidInput(format!(
                    "minimum area must be greater than or equal to {}, got {}",
                    MIN_AREA_FLOOR, area
                )));
            }
        }

        Ok(Self {
            count,
            min_area,
            threshold: DEFAULT_FOREGROUND_THRESHOLD,
        })
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn min_area(&self) -> Option<u32> {
        self.min_area
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self {
            count: 1,
            min_area: None,
            threshold: DEFAULT_FOREGROUND_THRESHOLD,
        }
    }
}

/// Axis-aligned bounding box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One connected foreground component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub label: u32,
    /// Pixel count of the component
    pub area: u32,
    pub bounds: Bounds,
}

/// Crop of the masked image around one plant
#[derive(Debug, Clone)]
pub struct PlantInstance {
    /// 1-based rank, 1 = largest plant
    pub index: usize,
    pub area: u32,
    pub bounds: Bounds,
    pub image: RgbImage,
}

/// Plants found in one image, largest first, plus the annotated overview
#[derive(Debug, Clone)]
pub struct Segmentation {
    pub instances: Vec<PlantInstance>,
    pub overview: RgbImage,
}

/// Presentation settings for the overview image
#[derive(Debug, Clone, Copy)]
pub struct OverviewStyle {
    pub box_color: Rgb<u8>,
    pub label_color: Rgb<u8>,
    /// Stroke width of bounding boxes
    pub thickness: u32,
    /// Size of one glyph cell of the index label
    pub label_scale: u32,
}

impl Default for OverviewStyle {
    fn default() -> Self {
        Self {
            box_color: Rgb([255, 0, 0]),
            label_color: Rgb([255, 255, 0]),
            thickness: 2,
            label_scale: 3,
        }
    }
}
