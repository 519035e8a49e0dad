use crate::error::{PipelineError, Result};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_CLUSTERS: usize = 10;
pub const DEFAULT_MAX_ITERATIONS: usize = 100;
pub const DEFAULT_SEED: u64 = 42;
/// Half-width in degrees of a filter given as a bare `#rrggbb` color
pub const DEFAULT_HEX_RADIUS: f32 = 3.0;

/// Named hue band a cluster center is mapped onto
///
/// The declaration order is the column order of every feature table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HueBand {
    Red,
    Orange,
    Yellow,
    Green,
    Cyan,
    Blue,
    Purple,
    Pink,
    /// Unsaturated or very dark colors with no meaningful hue
    Neutral,
}

impl HueBand {
    pub const COUNT: usize = 9;

    pub const ALL: [HueBand; HueBand::COUNT] = [
        HueBand::Red,
        HueBand::Orange,
        HueBand::Yellow,
        HueBand::Green,
        HueBand::Cyan,
        HueBand::Blue,
        HueBand::Purple,
        HueBand::Pink,
        HueBand::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HueBand::Red => "red",
            HueBand::Orange => "orange",
            HueBand::Yellow => "yellow",
            HueBand::Green => "green",
            HueBand::Cyan => "cyan",
            HueBand::Blue => "blue",
            HueBand::Purple => "purple",
            HueBand::Pink => "pink",
            HueBand::Neutral => "neutral",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for HueBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pixel count per hue band, always covering every band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BandCounts([u64; HueBand::COUNT]);

impl BandCounts {
    pub fn add(&mut self, band: HueBand, pixels: u64) {
        self.0[band.index()] += pixels;
    }

    pub fn get(&self, band: HueBand) -> u64 {
        self.0[band.index()]
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    /// Counts in `HueBand::ALL` order
    pub fn iter(&self) -> impl Iterator<Item = (HueBand, u64)> + '_ {
        HueBand::ALL.iter().map(move |&band| (band, self.get(band)))
    }
}

/// Inclusive hue interval in degrees; pixels inside it are excluded from clustering
///
/// `lower > upper` wraps through 0, so `330-20` covers the reds on both sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HueFilter {
    lower: f32,
    upper: f32,
}

impl HueFilter {
    pub fn new(lower: f32, upper: f32) -> Result<Self> {
        for bound in [lower, upper] {
            if !(0.0..=360.0).contains(&bound) {
                return Err(PipelineError::InvalidInput(format!(
                    "hue bound {} outside 0-360",
                    bound
                )));
            }
        }
        Ok(Self { lower, upper })
    }

    /// Filter spanning `radius` degrees either side of the hue of a `#rrggbb` color
    pub fn around_hex(hex: &str, radius: f32) -> Result<Self> {
        let [r, g, b] = parse_hex(hex)?;
        let hue = super::bands::hue_degrees([r, g, b]);
        let lower = (hue - radius).rem_euclid(360.0);
        let upper = (hue + radius).rem_euclid(360.0);
        Self::new(lower, upper)
    }

    pub fn contains(&self, hue: f32) -> bool {
        if self.lower <= self.upper {
            hue >= self.lower && hue <= self.upper
        } else {
            hue >= self.lower || hue <= self.upper
        }
    }

    pub fn bounds(&self) -> (f32, f32) {
        (self.lower, self.upper)
    }
}

impl FromStr for HueFilter {
    type Err = PipelineError;

    /// Parses `lower-upper` in degrees, e.g. `200-290`, or a color as
    /// `#rrggbb[:radius]`, e.g. `#0000ff:10`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || {
            PipelineError::InvalidInput(format!(
                "invalid hue filter '{}', expected lower-upper or #rrggbb[:radius]",
                s
            ))
        };
        if s.starts_with('#') {
            return match s.split_once(':') {
                Some((hex, radius)) => {
                    let radius: f32 = radius.trim().parse().map_err(|_| invalid())?;
                    if !(0.0..=180.0).contains(&radius) {
                        return Err(invalid());
                    }
                    Self::around_hex(hex, radius)
                }
                None => Self::around_hex(s, DEFAULT_HEX_RADIUS),
            };
        }
        let (lower, upper) = s.split_once('-').ok_or_else(invalid)?;
        let lower: f32 = lower.trim().parse().map_err(|_| invalid())?;
        let upper: f32 = upper.trim().parse().map_err(|_| invalid())?;
        Self::new(lower, upper)
    }
}

fn parse_hex(hex: &str) -> Result<[u8; 3]> {
    let digits = hex.trim_start_matches('#');
    let invalid = || PipelineError::InvalidInput(format!("invalid hex color '{}'", hex));
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

/// Format an RGB triple as `#rrggbb`
pub fn rgb_to_hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

/// Color analysis settings
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    pub clusters: usize,
    pub filters: Vec<HueFilter>,
    pub max_iterations: usize,
    /// Seed for k-means++ initialization; fixed seeds give reproducible rows
    pub seed: u64,
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.clusters < 1 {
            return Err(PipelineError::InvalidInput(
                "cluster count must be greater than or equal to 1".to_string(),
            ));
        }
        if self.max_iterations < 1 {
            return Err(PipelineError::InvalidInput(
                "max iterations must be greater than or equal to 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            clusters: DEFAULT_CLUSTERS,
            filters: Vec::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            seed: DEFAULT_SEED,
        }
    }
}

/// One k-means cluster after labeling
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    pub center: [u8; 3],
    pub hex: String,
    pub band: HueBand,
    pub pixels: u64,
}

/// Color composition of one image
#[derive(Debug, Clone, PartialEq)]
pub struct ColorAnalysis {
    pub counts: BandCounts,
    pub clusters: Vec<ClusterSummary>,
    /// Pixels left after dropping background and filtered hues
    pub eligible: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_order_is_stable() {
        let names: Vec<&str> = HueBand::ALL.iter().map(|b| b.as_str()).collect();
        assert_eq!(
            names,
            vec!["red", "orange", "yellow", "green", "cyan", "blue", "purple", "pink", "neutral"]
        );
    }

    #[test]
    fn test_band_counts_cover_every_band() {
        let mut counts = BandCounts::default();
        counts.add(HueBand::Green, 5);
        counts.add(HueBand::Green, 2);
        counts.add(HueBand::Neutral, 1);

        assert_eq!(counts.iter().count(), HueBand::COUNT);
        assert_eq!(counts.get(HueBand::Green), 7);
        assert_eq!(counts.get(HueBand::Red), 0);
        assert_eq!(counts.total(), 8);
    }

    #[test]
    fn test_parse_filter() {
        let filter: HueFilter = "200-290".parse().unwrap();
        assert_eq!(filter.bounds(), (200.0, 290.0));
        assert!(filter.contains(240.0));
        assert!(!filter.contains(120.0));

        assert!("200".parse::<HueFilter>().is_err());
        assert!("a-b".parse::<HueFilter>().is_err());
        assert!("0-400".parse::<HueFilter>().is_err());
    }

    #[test]
    fn test_wrapping_filter() {
        let filter = HueFilter::new(330.0, 20.0).unwrap();
        assert!(filter.contains(350.0));
        assert!(filter.contains(5.0));
        assert!(!filter.contains(180.0));
    }

    #[test]
    fn test_filter_around_hex() {
        let filter = HueFilter::around_hex("#0000ff", 3.0).unwrap();
        let (lower, upper) = filter.bounds();
        assert!((lower - 237.0).abs() < 0.01);
        assert!((upper - 243.0).abs() < 0.01);

        let red = HueFilter::around_hex("ff0000", 10.0).unwrap();
        assert!(red.contains(355.0));
        assert!(red.contains(4.0));

        assert!(HueFilter::around_hex("#12345", 3.0).is_err());
    }

    #[test]
    fn test_parse_hex_filter() {
        let blue: HueFilter = "#0000ff".parse().unwrap();
        let (lower, upper) = blue.bounds();
        assert!((lower - (240.0 - DEFAULT_HEX_RADIUS)).abs() < 0.01);
        assert!((upper - (240.0 + DEFAULT_HEX_RADIUS)).abs() < 0.01);

        let wide: HueFilter = "#00ff00:30".parse().unwrap();
        let (lower, upper) = wide.bounds();
        assert!((lower - 90.0).abs() < 0.01);
        assert!((upper - 150.0).abs() < 0.01);
        assert!(wide.contains(100.0));

        assert!("#00ff00:wide".parse::<HueFilter>().is_err());
        assert!("#00ff00:500".parse::<HueFilter>().is_err());
        assert!("#zzzzzz".parse::<HueFilter>().is_err());
    }

    #[test]
    fn test_rgb_to_hex() {
        assert_eq!(rgb_to_hex([255, 8, 160]), "#ff08a0");
    }
}
