use super::types::PixelClassifier;
use crate::error::{PipelineError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

pub const DEFAULT_EXECUTABLE: &str = "/opt/ilastik/ilastik-1.4.0b21-gpu-Linux/run_ilastik.sh";
pub const DEFAULT_PROJECT: &str = "/opt/pitcher-fx/pitcherplants.ilp";

/// Headless ilastik pixel classification
///
/// Runs a trained project against one image and exports the "Simple Segmentation"
/// source as a TIFF label image (1 = plant, 2 = background).
pub struct IlastikClassifier {
    executable: PathBuf,
    project: PathBuf,
}

impl IlastikClassifier {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(executable: P, project: Q) -> Self {
        Self {
            executable: executable.as_ref().to_path_buf(),
            project: project.as_ref().to_path_buf(),
        }
    }

    /// Path ilastik writes the label export to for `input`
    pub fn label_path(input: &Path, output_dir: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        output_dir.join(format!("{}.segmented.tiff", stem))
    }

    fn command(&self, input: &Path, output_dir: &Path) -> Command {
        let mut command = Command::new(&self.executable);
        command
            .arg("--headless")
            .arg(format!("--project={}", self.project.display()))
            .arg("--output_format=tiff")
            .arg(format!(
                "--output_filename_format={}/{{nickname}}.segmented.tiff",
                output_dir.display()
            ))
            .arg("--export_source=Simple Segmentation")
            .arg(input);
        command
    }
}

impl Default for IlastikClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_EXECUTABLE, DEFAULT_PROJECT)
    }
}

impl PixelClassifier for IlastikClassifier {
    fn classify(&self, input: &Path, output_dir: &Path) -> Result<PathBuf> {
        let _span = tracing::debug_span!("ilastik_classify").entered();

        let mut command = self.command(input, output_dir);
        tracing::info!("Running command: {:?}", command);

        let status = command.status().map_err(|e| {
            PipelineError::ExternalToolFailure(format!(
                "failed to launch {}: {}",
                self.executable.display(),
                e
            ))
        })?;

        if !status.success() {
            return Err(PipelineError::ExternalToolFailure(format!(
                "{} exited with {}",
                self.executable.display(),
                status
            )));
        }

        let label_path = Self::label_path(input, output_dir);
        if !label_path.is_file() {
            return Err(PipelineError::ExternalToolFailure(format!(
                "expected label export {} was not written",
                label_path.display()
            )));
        }

        Ok(label_path)
    }
}
