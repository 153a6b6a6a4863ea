//! Fallback detection of ear-worn accessories.
//!
//! Earbuds and headset cups show up as small, nearly white or nearly black
//! blobs next to the ears. The frame is segmented into those two colour
//! classes, small regions are kept, and a region whose centroid sits close
//! to either ear landmark is reported.

use image::RgbImage;

use crate::config::ThresholdConfig;
use crate::imaging::{connected_regions, Hsv, Mask};
use crate::landmarks::{LandmarkSet, FIRST_EAR, SECOND_EAR};

/// Maximum saturation of a "white-ish" pixel.
const WHITE_MAX_SATURATION: u8 = 30;
/// Minimum value of a "white-ish" pixel.
const WHITE_MIN_VALUE: u8 = 200;
/// Maximum value of a "black-ish" pixel.
const BLACK_MAX_VALUE: u8 = 50;

fn is_whiteish(hsv: Hsv) -> bool {
    hsv.s <= WHITE_MAX_SATURATION && hsv.v >= WHITE_MIN_VALUE
}

fn is_blackish(hsv: Hsv) -> bool {
    hsv.v <= BLACK_MAX_VALUE
}

/// Pixel positions of both ears, when the face carries those landmarks.
pub fn ear_positions(face: &LandmarkSet, width: u32, height: u32) -> Vec<(f64, f64)> {
    [FIRST_EAR, SECOND_EAR]
        .iter()
        .filter_map(|&i| face.get(i))
        .map(|p| p.to_pixels(width, height))
        .collect()
}

/// Whether an accessory-sized blob lies within the ear radius of an ear.
pub fn detect_ear_accessory(
    image: &RgbImage,
    ears: &[(f64, f64)],
    thresholds: &ThresholdConfig,
) -> bool {
    if ears.is_empty() {
        return false;
    }

    [Mask::from_hsv(image, is_whiteish), Mask::from_hsv(image, is_blackish)]
        .iter()
        .flat_map(connected_regions)
        .filter(|r| r.area > thresholds.blob_min_area && r.area < thresholds.blob_max_area)
        .any(|region| {
            let (cx, cy) = region.centroid;
            ears.iter().any(|&(ex, ey)| {
                ((cx - ex).powi(2) + (cy - ey).powi(2)).sqrt() < thresholds.ear_radius_px
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{Point, MESH_POINTS};
    use image::Rgb;

    const SKIN: Rgb<u8> = Rgb([200, 150, 120]);

    fn fill(image: &mut RgbImage, x0: u32, y0: u32, w: u32, h: u32, color: Rgb<u8>) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                image.put_pixel(x, y, color);
            }
        }
    }

    #[test]
    fn test_white_earbud_near_ear() {
        let mut image = RgbImage::from_pixel(320, 240, SKIN);
        // 10x10 = 100 px² blob centred on (105, 125)
        fill(&mut image, 100, 120, 10, 10, Rgb([250, 250, 250]));
        let ears = vec![(120.0, 120.0), (260.0, 120.0)];
        assert!(detect_ear_accessory(&image, &ears, &ThresholdConfig::default()));
    }

    #[test]
    fn test_black_blob_near_ear() {
        let mut image = RgbImage::from_pixel(320, 240, SKIN);
        fill(&mut image, 250, 110, 8, 8, Rgb([10, 10, 10]));
        let ears = vec![(60.0, 120.0), (260.0, 120.0)];
        assert!(detect_ear_accessory(&image, &ears, &ThresholdConfig::default()));
    }

    #[test]
    fn test_blob_far_from_ears() {
        let mut image = RgbImage::from_pixel(320, 240, SKIN);
        fill(&mut image, 150, 10, 10, 10, Rgb([250, 250, 250]));
        let ears = vec![(20.0, 200.0), (300.0, 200.0)];
        assert!(!detect_ear_accessory(&image, &ears, &ThresholdConfig::default()));
    }

    #[test]
    fn test_blob_area_bounds_are_exclusive() {
        let ears = vec![(100.0, 100.0)];
        let config = ThresholdConfig::default();

        // exactly 50 px²
        let mut small = RgbImage::from_pixel(200, 200, SKIN);
        fill(&mut small, 95, 95, 10, 5, Rgb([255, 255, 255]));
        assert!(!detect_ear_accessory(&small, &ears, &config));

        // exactly 500 px²
        let mut large = RgbImage::from_pixel(200, 200, SKIN);
        fill(&mut large, 90, 90, 25, 20, Rgb([255, 255, 255]));
        assert!(!detect_ear_accessory(&large, &ears, &config));

        // 51 px² (17x3)
        let mut ok = RgbImage::from_pixel(200, 200, SKIN);
        fill(&mut ok, 92, 99, 17, 3, Rgb([255, 255, 255]));
        assert!(detect_ear_accessory(&ok, &ears, &config));
    }

    #[test]
    fn test_no_ears_no_detection() {
        let mut image = RgbImage::from_pixel(100, 100, SKIN);
        fill(&mut image, 40, 40, 10, 10, Rgb([255, 255, 255]));
        assert!(!detect_ear_accessory(&image, &[], &ThresholdConfig::default()));
    }

    #[test]
    fn test_ear_positions_in_pixels() {
        let mut points = vec![Point::new(0.0, 0.0); MESH_POINTS];
        points[FIRST_EAR] = Point::new(0.25, 0.5);
        points[SECOND_EAR] = Point::new(0.75, 0.5);
        let ears = ear_positions(&LandmarkSet::new(points), 400, 200);
        assert_eq!(ears, vec![(100.0, 100.0), (300.0, 100.0)]);
    }
}
