use super::types::HueBand;
use palette::{FromColor, Hsv, Srgb};

/// Saturation below which a color is considered neutral
const NEUTRAL_SATURATION: f32 = 0.2;

/// Value (brightness) below which a color is considered neutral
const NEUTRAL_VALUE: f32 = 0.15;

/// Upper hue bound (exclusive, degrees) of each chromatic band; red wraps past 345
const HUE_BANDS: [(f32, HueBand); 8] = [
    (15.0, HueBand::Red),
    (45.0, HueBand::Orange),
    (70.0, HueBand::Yellow),
    (165.0, HueBand::Green),
    (195.0, HueBand::Cyan),
    (255.0, HueBand::Blue),
    (285.0, HueBand::Purple),
    (345.0, HueBand::Pink),
];

/// Hue, saturation and value of an 8-bit RGB color
/// Hue in degrees [0, 360), saturation and value in [0, 1]
pub fn to_hsv(rgb: [u8; 3]) -> (f32, f32, f32) {
    let srgb = Srgb::new(rgb[0], rgb[1], rgb[2]).into_format::<f32>();
    let hsv: Hsv = Hsv::from_color(srgb);
    (hsv.hue.into_positive_degrees() % 360.0, hsv.saturation, hsv.value)
}

pub fn hue_degrees(rgb: [u8; 3]) -> f32 {
    to_hsv(rgb).0
}

/// Whether the color carries a hue at all (grays and black do not)
pub fn is_chromatic(rgb: [u8; 3]) -> bool {
    let max = rgb.iter().max().copied().unwrap_or(0);
    let min = rgb.iter().min().copied().unwrap_or(0);
    max != min
}

/// Map a color onto its named hue band
pub fn band_for(rgb: [u8; 3]) -> HueBand {
    let (hue, saturation, value) = to_hsv(rgb);
    if saturation < NEUTRAL_SATURATION || value < NEUTRAL_VALUE {
        return HueBand::Neutral;
    }
    band_for_hue(hue)
}

fn band_for_hue(hue: f32) -> HueBand {
    HUE_BANDS
        .iter()
        .find(|(upper, _)| hue < *upper)
        .map(|&(_, band)| band)
        .unwrap_or(HueBand::Red)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_hues() {
        assert!(hue_degrees([255, 0, 0]).abs() < 0.01);
        assert!((hue_degrees([0, 255, 0]) - 120.0).abs() < 0.01);
        assert!((hue_degrees([0, 0, 255]) - 240.0).abs() < 0.01);
    }

    #[test]
    fn test_band_lookup() {
        assert_eq!(band_for([255, 0, 0]), HueBand::Red);
        assert_eq!(band_for([255, 128, 0]), HueBand::Orange);
        assert_eq!(band_for([255, 255, 0]), HueBand::Yellow);
        assert_eq!(band_for([0, 255, 0]), HueBand::Green);
        assert_eq!(band_for([40, 160, 60]), HueBand::Green);
        assert_eq!(band_for([0, 255, 255]), HueBand::Cyan);
        assert_eq!(band_for([0, 0, 255]), HueBand::Blue);
        assert_eq!(band_for([128, 0, 255]), HueBand::Purple);
        assert_eq!(band_for([255, 0, 160]), HueBand::Pink);
        assert_eq!(band_for([255, 0, 20]), HueBand::Red);
    }

    #[test]
    fn test_unsaturated_and_dark_are_neutral() {
        assert_eq!(band_for([128, 128, 128]), HueBand::Neutral);
        assert_eq!(band_for([255, 255, 255]), HueBand::Neutral);
        assert_eq!(band_for([200, 190, 185]), HueBand::Neutral);
        assert_eq!(band_for([20, 5, 5]), HueBand::Neutral);
    }

    #[test]
    fn test_is_chromatic() {
        assert!(is_chromatic([10, 11, 10]));
        assert!(!is_chromatic([90, 90, 90]));
    }
}
