use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by the segmentation and color analysis pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Bad path, path kind or parameter; raised before any processing starts
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Nothing left to cluster after background and hue filtering
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("External tool failed: {0}")]
    ExternalToolFailure(String),

    #[error("Malformed file name {0} (expected date.treatment.name.ext)")]
    MalformedMetadata(String),

    #[error("Image error for {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Image {
            path: path.into(),
            source,
        }
    }

    /// Whether this error must abort a whole batch run rather than a single image
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidInput(_)
                | PipelineError::ExternalToolFailure(_)
                | PipelineError::Csv(_)
                | PipelineError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_image_errors_are_not_fatal() {
        assert!(!PipelineError::InsufficientData("empty".into()).is_fatal());
        assert!(!PipelineError::ShapeMismatch {
            expected: (2, 2),
            actual: (3, 3)
        }
        .is_fatal());
        assert!(!PipelineError::MalformedMetadata("x.png".into()).is_fatal());
    }

    #[test]
    fn test_run_level_errors_are_fatal() {
        assert!(PipelineError::InvalidInput("count".into()).is_fatal());
        assert!(PipelineError::ExternalToolFailure("exit 1".into()).is_fatal());
    }
}
