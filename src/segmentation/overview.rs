use super::types::{OverviewStyle, PlantInstance};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

/// 3x5 bitmap digits, one row per byte, bit 2 = leftmost column
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

/// Copy of `image` with a numbered bounding box around every plant
pub fn draw_overview(image: &RgbImage, plants: &[PlantInstance], style: &OverviewStyle) -> RgbImage {
    let mut canvas = image.clone();

    for plant in plants {
        let b = plant.bounds;
        for inset in 0..style.thickness {
            let width = b.width.saturating_sub(2 * inset);
            let height = b.height.saturating_sub(2 * inset);
            if width == 0 || height == 0 {
                break;
            }
            let rect = Rect::at((b.x + inset) as i32, (b.y + inset) as i32).of_size(width, height);
            draw_hollow_rect_mut(&mut canvas, rect, style.box_color);
        }

        let offset = style.thickness + 1;
        draw_number(
            &mut canvas,
            plant.index,
            b.x + offset,
            b.y + offset,
            style.label_scale,
            style.label_color,
        );
    }

    canvas
}

/// Render `value` in block digits with its top-left corner at (x, y)
fn draw_number(canvas: &mut RgbImage, value: usize, x: u32, y: u32, scale: u32, color: Rgb<u8>) {
    let scale = scale.max(1);
    let mut cursor = x;

    for digit in value.to_string().bytes().map(|b| (b - b'0') as usize) {
        for (row, bits) in DIGITS[digit].iter().enumerate() {
            for col in 0..3u32 {
                if bits & (0b100 >> col) == 0 {
                    continue;
                }
                let rect = Rect::at((cursor + col * scale) as i32, (y + row as u32 * scale) as i32)
                    .of_size(scale, scale);
                // Drawing clips against the canvas bounds
                draw_filled_rect_mut(canvas, rect, color);
            }
        }
        cursor += 4 * scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::types::Bounds;

    fn plant(index: usize, bounds: Bounds) -> PlantInstance {
        PlantInstance {
            index,
            area: bounds.width * bounds.height,
            bounds,
            image: RgbImage::new(bounds.width, bounds.height),
        }
    }

    #[test]
    fn test_box_outline_is_drawn() {
        let image = RgbImage::new(50, 50);
        let bounds = Bounds {
            x: 10,
            y: 10,
            width: 30,
            height: 30,
        };
        let style = OverviewStyle::default();
        let overview = draw_overview(&image, &[plant(1, bounds)], &style);

        assert_eq!(*overview.get_pixel(10, 10), style.box_color);
        assert_eq!(*overview.get_pixel(39, 25), style.box_color);
        assert_eq!(*overview.get_pixel(11, 25), style.box_color);
        assert_eq!(overview.get_pixel(25, 36).0, [0, 0, 0]);
    }

    #[test]
    fn test_index_label_is_drawn() {
        let image = RgbImage::new(60, 60);
        let bounds = Bounds {
            x: 0,
            y: 0,
            width: 60,
            height: 60,
        };
        let style = OverviewStyle::default();
        let overview = draw_overview(&image, &[plant(7, bounds)], &style);

        // top bar of the 7 starts just inside the box
        let origin = style.thickness + 1;
        assert_eq!(*overview.get_pixel(origin, origin), style.label_color);
        // 7 has an empty lower-left cell
        assert_eq!(
            overview.get_pixel(origin, origin + 4 * style.label_scale).0,
            [0, 0, 0]
        );
    }

    #[test]
    fn test_label_near_edge_does_not_panic() {
        let image = RgbImage::new(6, 6);
        let bounds = Bounds {
            x: 4,
            y: 4,
            width: 2,
            height: 2,
        };
        let overview = draw_overview(&image, &[plant(12, bounds)], &OverviewStyle::default());
        assert_eq!(overview.dimensions(), (6, 6));
    }
}
