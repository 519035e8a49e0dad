use super::metadata::ImageMetadata;
use super::table::{ColorRow, ColorTable};
use crate::color::ColorAnalyzer;
use crate::error::{PipelineError, Result};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_EXTENSIONS: [&str; 2] = ["png", "jpg"];

/// Image that was left out of a batch table, with the reason
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedImage {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a directory run
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub table: ColorTable,
    pub skipped: Vec<SkippedImage>,
}

/// Files in `dir` whose extension matches one of `extensions` (case-insensitive),
/// sorted by path
///
/// An empty extension list selects `DEFAULT_EXTENSIONS`.
pub fn list_images(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let extensions: Vec<String> = if extensions.is_empty() {
        DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
    } else {
        extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect()
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .map_or(false, |e| extensions.contains(&e));
        if matches {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Drives the color analyzer over one file or a directory of files
pub struct BatchAggregator {
    analyzer: ColorAnalyzer,
    parallel: bool,
}

impl BatchAggregator {
    pub fn new(analyzer: ColorAnalyzer) -> Self {
        Self {
            analyzer,
            parallel: true,
        }
    }

    /// Process directory files on the rayon pool (default) or one after another
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn analyze_row(&self, path: &Path) -> Result<ColorRow> {
        tracing::info!("Performing color analysis for image {}", path.display());
        let analysis = self.analyzer.analyze_file(path)?;

        Ok(ColorRow {
            image: path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            metadata: ImageMetadata::parse_or_missing(path),
            counts: analysis.counts,
        })
    }

    /// Single-file mode: a one-row table, any failure is returned
    pub fn analyze_file(&self, path: &Path) -> Result<ColorTable> {
        if !path.is_file() {
            return Err(PipelineError::InvalidInput(format!(
                "{} is not a file",
                path.display()
            )));
        }
        let row = self.analyze_row(path)?;
        Ok(std::iter::once(row).collect())
    }

    /// Directory mode: one row per matching file, in sorted file order
    ///
    /// Per-image failures are logged and listed in the report; fatal errors abort.
    pub fn analyze_directory(&self, dir: &Path, extensions: &[String]) -> Result<BatchReport> {
        if !dir.is_dir() {
            return Err(PipelineError::InvalidInput(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        let files = list_images(dir, extensions)?;
        tracing::info!("Found {} images in {}", files.len(), dir.display());

        let results: Vec<Result<ColorRow>> = if self.parallel {
            files.par_iter().map(|path| self.analyze_row(path)).collect()
        } else {
            files.iter().map(|path| self.analyze_row(path)).collect()
        };

        let mut report = BatchReport::default();
        for (path, result) in files.into_iter().zip(results) {
            match result {
                Ok(row) => report.table.push(row),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    report.skipped.push(SkippedImage {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if !report.skipped.is_empty() {
            tracing::warn!(
                "{} of {} images skipped",
                report.skipped.len(),
                report.table.len() + report.skipped.len()
            );
        }

        Ok(report)
    }
}
