use super::types::{BinaryMask, Classified, LabelDomain, LabelMask, LabelPolicy};
use crate::error::{PipelineError, Result};
use image::{DynamicImage, GrayImage, Luma, RgbImage};
use std::path::Path;

/// Map a label mask onto 0/255
///
/// Pixels equal to `domain.foreground` become 255, every other value becomes 0.
pub fn normalize(label: &LabelMask, domain: LabelDomain) -> BinaryMask {
    let _span = tracing::debug_span!("normalize").entered();

    let (width, height) = label.dimensions();
    BinaryMask::from_fn(width, height, |x, y| {
        label.get_pixel(x, y)[0] == domain.foreground
    })
}

/// Count label values outside `domain`, failing under the strict policy
pub fn check_labels(label: &LabelMask, domain: LabelDomain, policy: LabelPolicy) -> Result<usize> {
    let unexpected = label.pixels().filter(|p| !domain.contains(p[0])).count();

    if unexpected > 0 {
        match policy {
            LabelPolicy::Strict => {
                return Err(PipelineError::InvalidInput(format!(
                    "label mask has {} pixels outside {{{}, {}}}",
                    unexpected, domain.foreground, domain.background
                )));
            }
            LabelPolicy::Permissive => {
                tracing::warn!(
                    "Label mask has {} pixels outside {{{}, {}}}, treating them as background",
                    unexpected,
                    domain.foreground,
                    domain.background
                );
            }
        }
    }

    Ok(unexpected)
}

/// Read the raw label values out of a decoded label image
///
/// Unlike `DynamicImage::to_luma8`, no intensity rescaling or luma weighting is
/// applied: 16-bit values are saturated to 255 and colour images contribute their
/// first channel.
pub fn decode_label_image(image: DynamicImage) -> Result<LabelMask> {
    let (width, height) = (image.width(), image.height());

    let label = match image {
        DynamicImage::ImageLuma8(gray) => gray,
        DynamicImage::ImageLuma16(gray) => GrayImage::from_fn(width, height, |x, y| {
            Luma([gray.get_pixel(x, y)[0].min(u8::MAX as u16) as u8])
        }),
        DynamicImage::ImageLumaA8(gray) => {
            GrayImage::from_fn(width, height, |x, y| Luma([gray.get_pixel(x, y)[0]]))
        }
        DynamicImage::ImageRgb8(rgb) => {
            GrayImage::from_fn(width, height, |x, y| Luma([rgb.get_pixel(x, y)[0]]))
        }
        DynamicImage::ImageRgba8(rgba) => {
            GrayImage::from_fn(width, height, |x, y| Luma([rgba.get_pixel(x, y)[0]]))
        }
        other => {
            return Err(PipelineError::InvalidInput(format!(
                "unsupported label image layout {:?}",
                other.color()
            )));
        }
    };

    Ok(label)
}

/// Keep original pixels where the mask is set and zero everything else
///
/// Per-channel bitwise AND of the image with the mask replicated over R, G and B.
pub fn extract_foreground(original: &RgbImage, mask: &BinaryMask) -> Result<RgbImage> {
    if original.dimensions() != mask.dimensions() {
        return Err(PipelineError::ShapeMismatch {
            expected: original.dimensions(),
            actual: mask.dimensions(),
        });
    }

    let gray = mask.as_gray();
    let mut masked = original.clone();
    for (x, y, pixel) in masked.enumerate_pixels_mut() {
        let m = gray.get_pixel(x, y)[0];
        pixel.0 = pixel.0.map(|channel| channel & m);
    }

    Ok(masked)
}

/// Load the original image and its label export, then normalize and apply the mask
pub fn postprocess(input: &Path, label_path: &Path, policy: LabelPolicy) -> Result<Classified> {
    let original = image::open(input)
        .map_err(|e| PipelineError::image(input, e))?
        .to_rgb8();
    let label = decode_label_image(
        image::open(label_path).map_err(|e| PipelineError::image(label_path, e))?,
    )?;

    check_labels(&label, LabelDomain::CLASSIFIER, policy)?;
    let mask = normalize(&label, LabelDomain::CLASSIFIER);
    let masked = extract_foreground(&original, &mask)?;

    tracing::debug!(
        "Mask for {} covers {} of {} pixels",
        input.display(),
        mask.foreground_count(),
        original.width() * original.height()
    );

    Ok(Classified {
        mask,
        masked,
        label_path: label_path.to_path_buf(),
    })
}
