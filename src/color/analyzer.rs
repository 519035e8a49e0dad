use super::bands::{band_for, hue_degrees, is_chromatic};
use super::kmeans::kmeans;
use super::types::{rgb_to_hex, AnalyzerConfig, BandCounts, ClusterSummary, ColorAnalysis};
use crate::error::{PipelineError, Result};
use image::RgbImage;
use ndarray::Array2;
use std::path::Path;

/// Color cluster analyzer
///
/// Clusters the foreground colors of an image with k-means and reports how many
/// pixels fall into each named hue band.
pub struct ColorAnalyzer {
    config: AnalyzerConfig,
}

impl ColorAnalyzer {
    /// # Errors
    /// `InvalidInput` if the configuration is out of range
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Pixels that take part in clustering
    ///
    /// Pure black is masked-out background. Chromatic pixels whose hue falls in
    /// any configured filter are dropped; grays have no hue and are never filtered.
    pub fn eligible_pixels(&self, image: &RgbImage) -> Vec<[u8; 3]> {
        image
            .pixels()
            .map(|p| p.0)
            .filter(|&rgb| rgb != [0, 0, 0])
            .filter(|&rgb| {
                if self.config.filters.is_empty() || !is_chromatic(rgb) {
                    return true;
                }
                let hue = hue_degrees(rgb);
                !self.config.filters.iter().any(|f| f.contains(hue))
            })
            .collect()
    }

    /// Analyze an in-memory image
    ///
    /// # Errors
    /// `InsufficientData` if no pixel survives background and hue filtering
    pub fn analyze(&self, image: &RgbImage) -> Result<ColorAnalysis> {
        let pixels = self.eligible_pixels(image);
        let points = Array2::from_shape_fn((pixels.len(), 3), |(i, c)| pixels[i][c] as f32);

        let result = kmeans(
            &points,
            self.config.clusters,
            self.config.max_iterations,
            self.config.seed,
        )
        .ok_or_else(|| {
            PipelineError::InsufficientData(format!(
                "no foreground pixels left to cluster in {}x{} image",
                image.width(),
                image.height()
            ))
        })?;

        let mut counts = BandCounts::default();
        let clusters: Vec<ClusterSummary> = result
            .centers
            .outer_iter()
            .zip(result.cluster_sizes())
            .map(|(center, size)| {
                let rgb = [
                    center[0].round().clamp(0.0, 255.0) as u8,
                    center[1].round().clamp(0.0, 255.0) as u8,
                    center[2].round().clamp(0.0, 255.0) as u8,
                ];
                let band = band_for(rgb);
                counts.add(band, size);
                ClusterSummary {
                    center: rgb,
                    hex: rgb_to_hex(rgb),
                    band,
                    pixels: size,
                }
            })
            .collect();

        tracing::debug!(
            "k-means settled after {} iterations, {} pixels in {} clusters",
            result.iterations,
            counts.total(),
            clusters.len()
        );
        for cluster in &clusters {
            tracing::debug!(
                "Cluster {} {:?} -> {} ({} pixels)",
                cluster.hex,
                cluster.center,
                cluster.band,
                cluster.pixels
            );
        }

        Ok(ColorAnalysis {
            counts,
            clusters,
            eligible: pixels.len() as u64,
        })
    }

    /// Load an image file and analyze it
    pub fn analyze_file(&self, path: &Path) -> Result<ColorAnalysis> {
        let image = image::open(path)
            .map_err(|e| PipelineError::image(path, e))?
            .to_rgb8();
        self.analyze(&image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::types::{HueBand, HueFilter};
    use image::Rgb;

    fn analyzer(clusters: usize, filters: Vec<HueFilter>) -> ColorAnalyzer {
        ColorAnalyzer::new(AnalyzerConfig {
            clusters,
            filters,
            ..AnalyzerConfig::default()
        })
        .unwrap()
    }

    /// 4x4: top row red, second row green, bottom half background
    fn red_green_square() -> RgbImage {
        RgbImage::from_fn(4, 4, |_, y| match y {
            0 => Rgb([255, 0, 0]),
            1 => Rgb([0, 255, 0]),
            _ => Rgb([0, 0, 0]),
        })
    }

    #[test]
    fn test_red_green_square() {
        let analysis = analyzer(2, Vec::new()).analyze(&red_green_square()).unwrap();

        assert_eq!(analysis.counts.get(HueBand::Red), 4);
        assert_eq!(analysis.counts.get(HueBand::Green), 4);
        assert_eq!(analysis.counts.total(), 8);
        for (band, count) in analysis.counts.iter() {
            if band != HueBand::Red && band != HueBand::Green {
                assert_eq!(count, 0, "{} should be empty", band);
            }
        }
    }

    #[test]
    fn test_counts_sum_to_eligible_pixels() {
        let image = RgbImage::from_fn(20, 20, |x, y| {
            if (x + y) % 5 == 0 {
                Rgb([0, 0, 0])
            } else {
                Rgb([(x * 12) as u8, (y * 12) as u8, ((x * y) % 256) as u8])
            }
        });
        let analysis = analyzer(5, Vec::new()).analyze(&image).unwrap();

        let black = image.pixels().filter(|p| p.0 == [0, 0, 0]).count() as u64;
        assert_eq!(analysis.eligible, 400 - black);
        assert_eq!(analysis.counts.total(), analysis.eligible);
        assert_eq!(
            analysis.clusters.iter().map(|c| c.pixels).sum::<u64>(),
            analysis.eligible
        );
    }

    #[test]
    fn test_hue_filter_excludes_pixels() {
        let image = RgbImage::from_fn(4, 2, |x, _| {
            if x < 2 {
                Rgb([0, 0, 255])
            } else {
                Rgb([0, 200, 0])
            }
        });
        let blue = HueFilter::new(200.0, 290.0).unwrap();
        let analysis = analyzer(3, vec![blue]).analyze(&image).unwrap();

        assert_eq!(analysis.eligible, 4);
        assert_eq!(analysis.counts.get(HueBand::Blue), 0);
        assert_eq!(analysis.counts.get(HueBand::Green), 4);
    }

    #[test]
    fn test_filters_leave_grays_alone() {
        let image = RgbImage::from_pixel(3, 3, Rgb([120, 120, 120]));
        let red = HueFilter::new(340.0, 20.0).unwrap();
        let analysis = analyzer(2, vec![red]).analyze(&image).unwrap();
        assert_eq!(analysis.counts.get(HueBand::Neutral), 9);
    }

    #[test]
    fn test_background_only_is_insufficient_data() {
        let image = RgbImage::new(8, 8);
        let result = analyzer(3, Vec::new()).analyze(&image);
        assert!(matches!(result, Err(PipelineError::InsufficientData(_))));
    }

    #[test]
    fn test_fully_filtered_is_insufficient_data() {
        let image = RgbImage::from_pixel(2, 2, Rgb([0, 255, 0]));
        let green = HueFilter::new(90.0, 150.0).unwrap();
        let result = analyzer(3, vec![green]).analyze(&image);
        assert!(matches!(result, Err(PipelineError::InsufficientData(_))));
    }

    #[test]
    fn test_zero_clusters_rejected() {
        let result = ColorAnalyzer::new(AnalyzerConfig {
            clusters: 0,
            ..AnalyzerConfig::default()
        });
        assert!(matches!(result, Err(PipelineError::InvalidInput(_))));
    }
}
