mod instances;
mod overview;
pub mod types;

pub use instances::{segment_plants, segment_plants_onto};
pub use types::{OverviewStyle, Segmentation, SegmentationParams};

use crate::error::{PipelineError, Result};
use std::path::Path;

fn load_rgb(path: &Path) -> Result<image::RgbImage> {
    Ok(image::open(path)
        .map_err(|e| PipelineError::image(path, e))?
        .to_rgb8())
}

/// Load a masked image from disk and segment it
///
/// With `original` set, the overview boxes are drawn on that image instead of
/// the masked one.
pub fn segment_file(
    input: &Path,
    original: Option<&Path>,
    params: &SegmentationParams,
    style: &OverviewStyle,
) -> Result<Segmentation> {
    let masked = load_rgb(input)?;
    match original {
        Some(path) => segment_plants_onto(&masked, &load_rgb(path)?, params, style),
        None => Ok(segment_plants(&masked, params, style)),
    }
}
