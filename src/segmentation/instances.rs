use super::overview::draw_overview;
use super::types::{Bounds, OverviewStyle, PlantInstance, Region, Segmentation, SegmentationParams};
use crate::error::{PipelineError, Result};
use image::{imageops, GrayImage, Luma, RgbImage};
use imageproc::region_labelling::{connected_components, Connectivity};
use std::collections::HashMap;

/// Foreground mask of a masked image: any channel above `threshold`
pub fn binarize(masked: &RgbImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(masked.width(), masked.height(), |x, y| {
        let pixel = masked.get_pixel(x, y);
        if pixel.0.iter().any(|&c| c > threshold) {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Label 8-connected foreground components and measure them
///
/// Returned regions are sorted by descending area, ties broken by label.
pub fn find_regions(binary: &GrayImage) -> Vec<Region> {
    let labeled = connected_components(binary, Connectivity::Eight, Luma([0u8]));

    // label -> (min_x, min_y, max_x, max_y, count)
    let mut stats: HashMap<u32, (u32, u32, u32, u32, u32)> = HashMap::new();
    for (x, y, label) in labeled.enumerate_pixels() {
        let label = label[0];
        if label == 0 {
            continue;
        }
        stats
            .entry(label)
            .and_modify(|(min_x, min_y, max_x, max_y, count)| {
                *min_x = (*min_x).min(x);
                *min_y = (*min_y).min(y);
                *max_x = (*max_x).max(x);
                *max_y = (*max_y).max(y);
                *count += 1;
            })
            .or_insert((x, y, x, y, 1));
    }

    let mut regions: Vec<Region> = stats
        .into_iter()
        .map(|(label, (min_x, min_y, max_x, max_y, count))| Region {
            label,
            area: count,
            bounds: Bounds {
                x: min_x,
                y: min_y,
                width: max_x - min_x + 1,
                height: max_y - min_y + 1,
            },
        })
        .collect();

    regions.sort_by(|a, b| b.area.cmp(&a.area).then(a.label.cmp(&b.label)));
    regions
}

/// Split a masked image into at most `params.count()` plant crops
///
/// Components under the minimum area are dropped before ranking. The overview is
/// `masked` with a numbered box around every selected plant; with no plants it is
/// an unmodified copy.
pub fn segment_plants(
    masked: &RgbImage,
    params: &SegmentationParams,
    style: &OverviewStyle,
) -> Segmentation {
    segment(masked, masked, params, style)
}

/// Same as [`segment_plants`], but the boxes are drawn on `base`
///
/// Crops still come from `masked`. `base` is usually the unmasked photograph.
///
/// # Errors
/// `ShapeMismatch` if `base` and `masked` differ in size
pub fn segment_plants_onto(
    masked: &RgbImage,
    base: &RgbImage,
    params: &SegmentationParams,
    style: &OverviewStyle,
) -> Result<Segmentation> {
    if base.dimensions() != masked.dimensions() {
        return Err(PipelineError::ShapeMismatch {
            expected: masked.dimensions(),
            actual: base.dimensions(),
        });
    }
    Ok(segment(masked, base, params, style))
}

fn segment(
    masked: &RgbImage,
    base: &RgbImage,
    params: &SegmentationParams,
    style: &OverviewStyle,
) -> Segmentation {
    let _span = tracing::debug_span!("segment_plants").entered();

    let binary = binarize(masked, params.threshold());
    let regions = find_regions(&binary);
    let found = regions.len();

    let selected: Vec<Region> = regions
        .into_iter()
        .filter(|r| params.min_area().map_or(true, |min| r.area >= min))
        .take(params.count())
        .collect();

    tracing::debug!(
        "Found {} components, kept {} (count={}, min_area={:?})",
        found,
        selected.len(),
        params.count(),
        params.min_area()
    );

    let instances: Vec<PlantInstance> = selected
        .iter()
        .enumerate()
        .map(|(i, region)| {
            let b = region.bounds;
            PlantInstance {
                index: i + 1,
                area: region.area,
                bounds: b,
                image: imageops::crop_imm(masked, b.x, b.y, b.width, b.height).to_image(),
            }
        })
        .collect();

    let overview = draw_overview(base, &instances, style);

    Segmentation {
        instances,
        overview,
    }
}
