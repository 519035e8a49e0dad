use crate::error::{PipelineError, Result};
use image::{GrayImage, Luma, RgbImage};
use std::path::{Path, PathBuf};

/// Raw per-pixel label image produced by the pixel classifier
/// Single channel, values taken verbatim from the exported label file
pub type LabelMask = GrayImage;

/// Pair of label values a mask is expected to contain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelDomain {
    pub foreground: u8,
    pub background: u8,
}

impl LabelDomain {
    /// Label export of the pixel classifier: 1 = plant, 2 = backdrop
    pub const CLASSIFIER: LabelDomain = LabelDomain {
        foreground: 1,
        background: 2,
    };

    /// Already normalized masks: 255 = plant, 0 = backdrop
    #[cfg(test)]
    pub const BINARY: LabelDomain = LabelDomain {
        foreground: BinaryMask::FOREGROUND,
        background: BinaryMask::BACKGROUND,
    };

    pub fn contains(&self, value: u8) -> bool {
        value == self.foreground || value == self.background
    }
}

/// How label values outside the expected domain are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelPolicy {
    /// Unexpected values silently become background (logged as a warning)
    #[default]
    Permissive,
    /// Unexpected values reject the whole mask
    Strict,
}

/// Foreground/background mask holding only 0 and 255
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMask(GrayImage);

impl BinaryMask {
    pub const FOREGROUND: u8 = 255;
    pub const BACKGROUND: u8 = 0;

    /// Wrap a grey image, rejecting any value other than 0 or 255
    #[cfg(test)]
    pub fn from_gray(image: GrayImage) -> Result<Self> {
        if let Some(p) = image
            .pixels()
            .find(|p| p[0] != Self::FOREGROUND && p[0] != Self::BACKGROUND)
        {
            return Err(PipelineError::InvalidInput(format!(
                "binary mask contains non-binary value {}",
                p[0]
            )));
        }
        Ok(Self(image))
    }

    pub(crate) fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> bool) -> Self {
        Self(GrayImage::from_fn(width, height, |x, y| {
            if f(x, y) {
                Luma([Self::FOREGROUND])
            } else {
                Luma([Self::BACKGROUND])
            }
        }))
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    #[cfg(test)]
    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.0.get_pixel(x, y)[0] == Self::FOREGROUND
    }

    pub fn foreground_count(&self) -> usize {
        self.0.pixels().filter(|p| p[0] == Self::FOREGROUND).count()
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.0
    }
}

/// Output of the classify step: normalized mask plus the original with background removed
#[derive(Debug, Clone)]
pub struct Classified {
    pub mask: BinaryMask,
    pub masked: RgbImage,
    /// Label image the mask was derived from
    pub label_path: PathBuf,
}

/// Trait for pixel classification backends
/// The classifier is an external collaborator: image path in, label image file out
pub trait PixelClassifier {
    /// Classify `input` and write its label image into `output_dir`
    ///
    /// Returns the path of the written label image
    fn classify(&self, input: &Path, output_dir: &Path) -> Result<PathBuf>;
}
