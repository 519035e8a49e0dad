mod batch;
mod classification;
mod color;
mod error;
mod logger;
mod segmentation;

use anyhow::{bail, Context, Result};
use batch::BatchAggregator;
use classification::{IlastikClassifier, LabelPolicy};
use clap::{Parser, Subcommand};
use color::{AnalyzerConfig, ColorAnalyzer, HueFilter};
use segmentation::{OverviewStyle, SegmentationParams};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about = "Carnivorous plant segmentation and color analysis", long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Separate plant material from background with the pixel classifier
    Classify {
        /// Input image
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// ilastik launcher script
        #[arg(long, default_value = classification::DEFAULT_EXECUTABLE)]
        classifier: PathBuf,

        /// Trained ilastik project
        #[arg(long, default_value = classification::DEFAULT_PROJECT)]
        project: PathBuf,

        /// Reject label images containing values other than 1 and 2
        #[arg(long)]
        strict_labels: bool,
    },

    /// Crop individual plants out of a masked image
    ///
    /// The numbered overview is drawn on the masked input unless --original is given.
    Segment {
        /// Masked input image
        #[arg(short, long)]
        input: PathBuf,

        /// Unmasked photograph to draw the overview on (same size as the input)
        #[arg(long)]
        original: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Number of plants to keep, largest first
        #[arg(short, long, default_value_t = 1)]
        count: usize,

        /// Minimum plant area in pixels (at least 10)
        #[arg(short, long)]
        min_area: Option<u32>,

        /// Channel intensity above which a pixel counts as plant
        #[arg(short, long, default_value_t = segmentation::types::DEFAULT_FOREGROUND_THRESHOLD)]
        threshold: u8,
    },

    /// Tabulate dominant color groups for one image or a directory of images
    Analyze {
        /// Input image or directory
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// File extensions to include in directory mode (default: png, jpg)
        #[arg(short = 'p', long = "filetypes")]
        filetypes: Vec<String>,

        /// Number of k-means clusters
        #[arg(short = 'k', long, default_value_t = color::DEFAULT_CLUSTERS)]
        clusters: usize,

        /// Hue range to exclude, as lower-upper in degrees or #rrggbb[:radius] (repeatable)
        #[arg(short, long = "filter")]
        filters: Vec<HueFilter>,

        /// k-means initialization seed
        #[arg(long, default_value_t = color::DEFAULT_SEED)]
        seed: u64,

        /// k-means iteration limit
        #[arg(long, default_value_t = color::DEFAULT_MAX_ITERATIONS)]
        max_iterations: usize,

        /// Analyze directory images one at a time
        #[arg(long)]
        sequential: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    logger::init(args.debug);

    match args.command {
        Command::Classify {
            input,
            output,
            classifier,
            project,
            strict_labels,
        } => {
            let policy = if strict_labels {
                LabelPolicy::Strict
            } else {
                LabelPolicy::Permissive
            };
            let classifier = IlastikClassifier::new(classifier, project);
            run_classify(&classifier, &input, &output, policy)
        }
        Command::Segment {
            input,
            original,
            output,
            count,
            min_area,
            threshold,
        } => {
            let params = SegmentationParams::new(count, min_area)?.with_threshold(threshold);
            run_segment(&input, original.as_deref(), &output, &params)
        }
        Command::Analyze {
            input,
            output,
            filetypes,
            clusters,
            filters,
            seed,
            max_iterations,
            sequential,
        } => {
            let config = AnalyzerConfig {
                clusters,
                filters,
                max_iterations,
                seed,
            };
            run_analyze(&input, &output, &filetypes, config, !sequential)
        }
    }
}

fn require_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("Input must be a valid file path: {}", path.display());
    }
    Ok(())
}

fn require_dir(path: &Path) -> Result<()> {
    if !path.is_dir() {
        bail!("Output must be a valid directory path: {}", path.display());
    }
    Ok(())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn run_classify(
    classifier: &dyn classification::PixelClassifier,
    input: &Path,
    output: &Path,
    policy: LabelPolicy,
) -> Result<()> {
    require_file(input)?;
    require_dir(output)?;

    let stem = file_stem(input);
    tracing::info!("Running pixel classification on image {}", stem);

    let classified = classification::classify(classifier, input, output, policy)
        .with_context(|| format!("Failed to classify {}", input.display()))?;

    let paths = classification::save_outputs(&classified, input, output)
        .with_context(|| format!("Failed to write outputs for {}", stem))?;

    tracing::info!(
        "Wrote {}, {} and {}",
        paths.mask.display(),
        paths.label_mask.display(),
        paths.masked.display()
    );
    Ok(())
}

fn run_segment(
    input: &Path,
    original: Option<&Path>,
    output: &Path,
    params: &SegmentationParams,
) -> Result<()> {
    require_file(input)?;
    if let Some(original) = original {
        require_file(original)?;
    }
    require_dir(output)?;

    let stem = file_stem(input);
    tracing::info!("Segmenting plants in image {}", stem);

    let segmentation =
        segmentation::segment_file(input, original, params, &OverviewStyle::default())
            .with_context(|| format!("Failed to segment {}", input.display()))?;

    let overview_path = output.join(format!("{}.plants.png", stem));
    segmentation
        .overview
        .save(&overview_path)
        .with_context(|| format!("Failed to write {}", overview_path.display()))?;

    for plant in &segmentation.instances {
        let plant_path = output.join(format!("{}.plant.{}.png", stem, plant.index));
        plant
            .image
            .save(&plant_path)
            .with_context(|| format!("Failed to write {}", plant_path.display()))?;
        tracing::debug!("Plant {}: area={} at {:?}", plant.index, plant.area, plant.bounds);
    }

    tracing::info!(
        "Found {} plants in {}",
        segmentation.instances.len(),
        stem
    );
    Ok(())
}

fn run_analyze(
    input: &Path,
    output: &Path,
    filetypes: &[String],
    config: AnalyzerConfig,
    parallel: bool,
) -> Result<()> {
    require_dir(output)?;
    for filter in &config.filters {
        let (lower, upper) = filter.bounds();
        tracing::info!("Excluding hues {:.1}-{:.1} from clustering", lower, upper);
    }
    let analyzer = ColorAnalyzer::new(config)?;
    let aggregator = BatchAggregator::new(analyzer).with_parallel(parallel);

    let stem = file_stem(input);
    let csv_path = output.join(format!("{}.colors.csv", stem));

    let table = if input.is_dir() {
        tracing::info!("Performing color analysis for directory {}", stem);
        let report = aggregator
            .analyze_directory(input, filetypes)
            .with_context(|| format!("Failed to analyze directory {}", input.display()))?;
        for skipped in &report.skipped {
            tracing::warn!("Not in table: {} ({})", skipped.path.display(), skipped.reason);
        }
        report.table
    } else if input.is_file() {
        aggregator
            .analyze_file(input)
            .with_context(|| format!("Failed to analyze {}", input.display()))?
    } else {
        bail!("Invalid input path: {}", input.display());
    };

    if table.is_empty() {
        tracing::warn!("No image could be analyzed, {} will only hold the header", csv_path.display());
    }
    table
        .save_csv(&csv_path)
        .with_context(|| format!("Failed to write {}", csv_path.display()))?;
    Ok(())
}
