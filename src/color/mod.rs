mod analyzer;
mod bands;
mod kmeans;
pub mod types;

pub use analyzer::ColorAnalyzer;
pub use types::{
    AnalyzerConfig, BandCounts, HueBand, HueFilter, DEFAULT_CLUSTERS, DEFAULT_MAX_ITERATIONS,
    DEFAULT_SEED,
};
