//! Pixel-level primitives: intensity conversion, normalized cross-correlation,
//! HSV masks and connected regions.

use image::imageops::FilterType;
use image::{GrayImage, RgbImage};

const EPS: f64 = 1e-9;

/// Longest side, in pixels, of the rasters fed to [`appearance_correlation`].
pub const WORKING_SIZE: u32 = 128;

/// Convert an RGB raster to single-channel intensity.
pub fn to_intensity(image: &RgbImage) -> GrayImage {
    image::imageops::grayscale(image)
}

/// [`max_normalized_correlation`] on copies of both rasters scaled down by a
/// shared factor so the largest side is at most [`WORKING_SIZE`].
///
/// Keeps the exhaustive search, quadratic in pixel count, bounded for
/// full-resolution frames.
pub fn appearance_correlation(image: &GrayImage, template: &GrayImage) -> f64 {
    let longest = image
        .width()
        .max(image.height())
        .max(template.width())
        .max(template.height());
    if longest <= WORKING_SIZE {
        return max_normalized_correlation(image, template);
    }

    let scale = WORKING_SIZE as f64 / longest as f64;
    let shrink = |raster: &GrayImage| {
        let w = ((raster.width() as f64 * scale).round() as u32).max(1);
        let h = ((raster.height() as f64 * scale).round() as u32).max(1);
        image::imageops::resize(raster, w, h, FilterType::Triangle)
    };
    max_normalized_correlation(&shrink(image), &shrink(template))
}

/// Maximum mean-subtracted normalized cross-correlation of `template` over
/// every alignment inside `image`.
///
/// Scores are in [-1, 1]. Returns 0.0 when the template does not fit inside
/// the image, or when the template or every window has zero variance.
pub fn max_normalized_correlation(image: &GrayImage, template: &GrayImage) -> f64 {
    let (iw, ih) = (image.width() as usize, image.height() as usize);
    let (tw, th) = (template.width() as usize, template.height() as usize);
    if tw == 0 || th == 0 || tw > iw || th > ih {
        return 0.0;
    }

    let n = (tw * th) as f64;
    let t_raw = template.as_raw();
    let t_mean = t_raw.iter().map(|&v| v as f64).sum::<f64>() / n;
    let t_centered: Vec<f64> = t_raw.iter().map(|&v| v as f64 - t_mean).collect();
    let t_norm_sq: f64 = t_centered.iter().map(|v| v * v).sum();
    if t_norm_sq <= EPS {
        return 0.0;
    }

    let pixels = image.as_raw();
    let (sum, sum_sq) = integral_images(pixels, iw, ih);
    let stride = iw + 1;
    let window = |table: &[f64], x: usize, y: usize| {
        table[(y + th) * stride + x + tw] - table[y * stride + x + tw]
            - table[(y + th) * stride + x]
            + table[y * stride + x]
    };

    let mut best: Option<f64> = None;
    for y in 0..=(ih - th) {
        for x in 0..=(iw - tw) {
            let w_sum = window(&sum, x, y);
            let w_var = window(&sum_sq, x, y) - w_sum * w_sum / n;
            if w_var <= EPS {
                continue;
            }

            // sum(T' * I) == sum(T' * I') because T' is zero-mean.
            let mut numerator = 0.0;
            for ty in 0..th {
                let row = (y + ty) * iw + x;
                let t_row = &t_centered[ty * tw..(ty + 1) * tw];
                for (tx, t) in t_row.iter().enumerate() {
                    numerator += t * pixels[row + tx] as f64;
                }
            }

            let score = (numerator / (t_norm_sq * w_var).sqrt()).clamp(-1.0, 1.0);
            best = Some(best.map_or(score, |b: f64| b.max(score)));
        }
    }

    best.unwrap_or(0.0)
}

/// Summed-area tables of values and squared values, (w+1) x (h+1).
fn integral_images(pixels: &[u8], w: usize, h: usize) -> (Vec<f64>, Vec<f64>) {
    let stride = w + 1;
    let mut sum = vec![0.0; stride * (h + 1)];
    let mut sum_sq = vec![0.0; stride * (h + 1)];
    for y in 0..h {
        let mut row_sum = 0.0;
        let mut row_sq = 0.0;
        for x in 0..w {
            let v = pixels[y * w + x] as f64;
            row_sum += v;
            row_sq += v * v;
            sum[(y + 1) * stride + x + 1] = sum[y * stride + x + 1] + row_sum;
            sum_sq[(y + 1) * stride + x + 1] = sum_sq[y * stride + x + 1] + row_sq;
        }
    }
    (sum, sum_sq)
}

/// HSV triple on 8-bit scales: hue in [0, 180), saturation and value in [0, 255].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

/// Convert one RGB pixel to 8-bit HSV.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = (max - min) as f64;

    let s = if max == 0 {
        0.0
    } else {
        delta * 255.0 / max as f64
    };

    let h = if delta == 0.0 {
        0.0
    } else {
        let (r, g, b) = (r as f64, g as f64, b as f64);
        let degrees = if max as f64 == r {
            60.0 * (g - b) / delta
        } else if max as f64 == g {
            120.0 + 60.0 * (b - r) / delta
        } else {
            240.0 + 60.0 * (r - g) / delta
        };
        let degrees = if degrees < 0.0 { degrees + 360.0 } else { degrees };
        degrees / 2.0
    };

    Hsv {
        h: (h.round() as u32 % 180) as u8,
        s: s.round() as u8,
        v: max,
    }
}

/// Binary mask over a raster.
#[derive(Debug, Clone)]
pub struct Mask {
    pub width: usize,
    pub height: usize,
    data: Vec<bool>,
}

impl Mask {
    /// Build a mask from a per-pixel HSV predicate.
    pub fn from_hsv(image: &RgbImage, predicate: impl Fn(Hsv) -> bool) -> Self {
        let data = image
            .pixels()
            .map(|p| predicate(rgb_to_hsv(p[0], p[1], p[2])))
            .collect();
        Self {
            width: image.width() as usize,
            height: image.height() as usize,
            data,
        }
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }
}

/// A connected set of mask pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Pixel count
    pub area: usize,
    /// Centroid in pixel coordinates
    pub centroid: (f64, f64),
}

/// Extract 8-connected regions from a mask.
pub fn connected_regions(mask: &Mask) -> Vec<Region> {
    let (w, h) = (mask.width, mask.height);
    let mut visited = vec![false; w * h];
    let mut regions = Vec::new();
    let mut stack = Vec::new();

    for start in 0..w * h {
        if visited[start] || !mask.data[start] {
            continue;
        }

        visited[start] = true;
        stack.push(start);
        let (mut area, mut sx, mut sy) = (0usize, 0.0f64, 0.0f64);

        while let Some(idx) = stack.pop() {
            let (x, y) = (idx % w, idx / w);
            area += 1;
            sx += x as f64;
            sy += y as f64;

            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let (nx, ny) = (x as i64 + dx, y as i64 + dy);
                    if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                        continue;
                    }
                    let n = ny as usize * w + nx as usize;
                    if !visited[n] && mask.data[n] {
                        visited[n] = true;
                        stack.push(n);
                    }
                }
            }
        }

        regions.push(Region {
            area,
            centroid: (sx / area as f64, sy / area as f64),
        });
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    fn textured(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| Luma([((x * 37 + y * 91 + x * y * 7) % 251) as u8]))
    }

    #[test]
    fn test_ncc_identical_is_one() {
        let img = textured(32, 24);
        let score = max_normalized_correlation(&img, &img);
        assert!((score - 1.0).abs() < 1e-9, "score = {score}");
    }

    #[test]
    fn test_ncc_finds_embedded_patch() {
        let img = textured(40, 30);
        let patch = image::imageops::crop_imm(&img, 11, 7, 12, 9).to_image();
        let score = max_normalized_correlation(&img, &patch);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_ncc_inverted_is_negative() {
        let img = textured(16, 16);
        let inverted = GrayImage::from_fn(16, 16, |x, y| Luma([255 - img.get_pixel(x, y)[0]]));
        let score = max_normalized_correlation(&img, &inverted);
        assert!((score + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_ncc_template_larger_than_image() {
        let small = textured(8, 8);
        let big = textured(16, 16);
        assert_eq!(max_normalized_correlation(&small, &big), 0.0);
    }

    #[test]
    fn test_ncc_constant_images() {
        let flat = GrayImage::from_pixel(8, 8, Luma([128]));
        assert_eq!(max_normalized_correlation(&flat, &flat), 0.0);
    }

    fn smooth(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| {
            let v = 128.0 + 60.0 * (x as f64 / 23.0).sin() + 60.0 * (y as f64 / 17.0).cos();
            Luma([v.clamp(0.0, 255.0) as u8])
        })
    }

    #[test]
    fn test_appearance_correlation_on_mismatched_frames_is_bounded() {
        let current = smooth(640, 480);
        let reference = image::imageops::crop_imm(&current, 160, 120, 320, 240).to_image();

        let started = std::time::Instant::now();
        let score = appearance_correlation(&current, &reference);
        let elapsed = started.elapsed();

        assert!(score > 0.95, "score = {score}");
        assert!(elapsed < std::time::Duration::from_secs(5), "took {elapsed:?}");
    }

    #[test]
    fn test_appearance_correlation_small_frames_are_exact() {
        let img = textured(32, 24);
        assert!((appearance_correlation(&img, &img) - 1.0).abs() < 1e-9);

        let inverted = GrayImage::from_fn(32, 24, |x, y| Luma([255 - img.get_pixel(x, y)[0]]));
        assert!(appearance_correlation(&img, &inverted) < -0.99);
    }

    #[test]
    fn test_rgb_to_hsv() {
        assert_eq!(rgb_to_hsv(255, 255, 255), Hsv { h: 0, s: 0, v: 255 });
        assert_eq!(rgb_to_hsv(0, 0, 0), Hsv { h: 0, s: 0, v: 0 });
        assert_eq!(rgb_to_hsv(255, 0, 0), Hsv { h: 0, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv(0, 255, 0), Hsv { h: 60, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv(0, 0, 255), Hsv { h: 120, s: 255, v: 255 });
    }

    #[test]
    fn test_connected_regions() {
        let mut img = RgbImage::from_pixel(20, 20, Rgb([0, 0, 0]));
        // 3x3 white square
        for y in 2..5 {
            for x in 2..5 {
                img.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        // diagonal pair, joined by 8-connectivity
        img.put_pixel(10, 10, Rgb([255, 255, 255]));
        img.put_pixel(11, 11, Rgb([255, 255, 255]));

        let mask = Mask::from_hsv(&img, |hsv| hsv.v >= 200);
        assert_eq!(mask.count(), 11);

        let regions = connected_regions(&mask);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].area, 9);
        assert_eq!(regions[0].centroid, (3.0, 3.0));
        assert_eq!(regions[1].area, 2);
        assert_eq!(regions[1].centroid, (10.5, 10.5));
    }
}
