// Erasure: flat-fill each text box with its mean color

use image::RgbImage;
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use crate::core::types::{BoundingBox, FillColor};

/// Per-channel mean of the pixels inside `bbox`, truncated.
///
/// Returns `None` for a zero-area box.
pub fn sample_fill_color(image: &RgbImage, bbox: &BoundingBox) -> Option<FillColor> {
    if bbox.is_empty() {
        return None;
    }

    let mut sums = [0u64; 3];
    for y in bbox.y_min..bbox.y_max {
        for x in bbox.x_min..bbox.x_max {
            let px = image.get_pixel(x, y);
            sums[0] += u64::from(px[0]);
            sums[1] += u64::from(px[1]);
            sums[2] += u64::from(px[2]);
        }
    }

    let count = bbox.area();
    Some(FillColor {
        r: (sums[0] / count) as u8,
        g: (sums[1] / count) as u8,
        b: (sums[2] / count) as u8,
    })
}

/// Paints every pixel of `bbox` with `fill`.
pub fn erase_region(canvas: &mut RgbImage, bbox: &BoundingBox, fill: FillColor) {
    if bbox.is_empty() {
        return;
    }

    let rect = Rect::at(bbox.x_min as i32, bbox.y_min as i32).of_size(bbox.width(), bbox.height());
    draw_filled_rect_mut(canvas, rect, fill.to_rgb());
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 2) as u8, (y * 3) as u8, ((x + y) % 256) as u8])
        })
    }

    #[test]
    fn test_fill_color_is_exact_mean() {
        let mut img = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        img.put_pixel(0, 0, Rgb([10, 20, 30]));
        img.put_pixel(1, 0, Rgb([11, 21, 31]));
        let bbox = BoundingBox {
            x_min: 0,
            y_min: 0,
            x_max: 2,
            y_max: 1,
        };
        // (10+11)/2 = 10.5 truncates to 10
        assert_eq!(
            sample_fill_color(&img, &bbox),
            Some(FillColor { r: 10, g: 20, b: 30 })
        );
    }

    #[test]
    fn test_erase_covers_box_only() {
        let source = gradient(100, 50);
        let mut canvas = source.clone();
        let bbox = BoundingBox {
            x_min: 8,
            y_min: 8,
            x_max: 62,
            y_max: 32,
        };
        let fill = sample_fill_color(&source, &bbox).unwrap();

        erase_region(&mut canvas, &bbox, fill);

        for (x, y, px) in canvas.enumerate_pixels() {
            let inside = (8..62).contains(&x) && (8..32).contains(&y);
            if inside {
                assert_eq!(*px, fill.to_rgb(), "pixel ({x},{y}) not erased");
            } else {
                assert_eq!(px, source.get_pixel(x, y), "pixel ({x},{y}) touched");
            }
        }
    }

    #[test]
    fn test_empty_box_is_noop() {
        let mut canvas = gradient(10, 10);
        let before = canvas.clone();
        let bbox = BoundingBox {
            x_min: 10,
            y_min: 3,
            x_max: 10,
            y_max: 7,
        };
        assert!(sample_fill_color(&canvas, &bbox).is_none());
        erase_region(&mut canvas, &bbox, FillColor { r: 1, g: 2, b: 3 });
        assert_eq!(canvas, before);
    }
}
