mod ilastik;
mod mask;
pub mod types;

pub use ilastik::{IlastikClassifier, DEFAULT_EXECUTABLE, DEFAULT_PROJECT};
pub use mask::postprocess;
pub use types::{Classified, LabelPolicy, PixelClassifier};

use crate::error::{PipelineError, Result};
use std::path::{Path, PathBuf};

/// Run the classifier on `input` and turn its label export into a mask and masked image
pub fn classify(
    classifier: &dyn PixelClassifier,
    input: &Path,
    output_dir: &Path,
    policy: LabelPolicy,
) -> Result<Classified> {
    let label_path = classifier.classify(input, output_dir)?;
    tracing::debug!("Label image written to {}", label_path.display());
    postprocess(input, &label_path, policy)
}

/// Files written for one classified image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// `<input-stem>.mask.jpg`
    pub mask: PathBuf,
    /// `<label-stem>.mask.jpg`, next to the classifier's own export
    pub label_mask: PathBuf,
    /// `<input-stem>.masked.jpg`
    pub masked: PathBuf,
}

impl OutputPaths {
    pub fn new(input: &Path, label_path: &Path, output_dir: &Path) -> Self {
        let stem = |p: &Path| {
            p.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        };
        Self {
            mask: output_dir.join(format!("{}.mask.jpg", stem(input))),
            label_mask: output_dir.join(format!("{}.mask.jpg", stem(label_path))),
            masked: output_dir.join(format!("{}.masked.jpg", stem(input))),
        }
    }
}

/// Write the mask under both the input and label stems, then the masked image
pub fn save_outputs(classified: &Classified, input: &Path, output_dir: &Path) -> Result<OutputPaths> {
    let paths = OutputPaths::new(input, &classified.label_path, output_dir);
    let mask = classified.mask.as_gray();

    for path in [&paths.mask, &paths.label_mask] {
        mask.save(path).map_err(|e| PipelineError::image(path, e))?;
    }
    classified
        .masked
        .save(&paths.masked)
        .map_err(|e| PipelineError::image(&paths.masked, e))?;

    Ok(paths)
}
