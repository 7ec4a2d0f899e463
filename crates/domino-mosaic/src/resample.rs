//! Area-averaging resampler.
//!
//! Each output cell covers a (generally fractional) rectangle of source
//! pixels; its colour is the coverage-weighted mean over that rectangle. This
//! is a box filter when downsizing and nearest-pixel when upsizing, so no
//! source detail aliases into the domino grid.

use domino_types::{DominoError, Rgb};
use image::DynamicImage;
use rayon::prelude::*;

/// Resample `image` to exactly `width × height` cells, row-major.
///
/// # Errors
///
/// [`DominoError::InvalidImage`] when the image is empty, has fewer than
/// three colour channels, or the requested size is zero.
pub fn resample(image: &DynamicImage, width: usize, height: usize) -> Result<Vec<Rgb>, DominoError> {
    let (src_w, src_h) = (image.width() as usize, image.height() as usize);
    if src_w == 0 || src_h == 0 {
        return Err(DominoError::InvalidImage(format!(
            "source image is {src_w}x{src_h}"
        )));
    }
    let channels = image.color().channel_count();
    if channels < 3 {
        return Err(DominoError::InvalidImage(format!(
            "expected at least 3 colour channels, image has {channels}"
        )));
    }
    if width == 0 || height == 0 {
        return Err(DominoError::InvalidImage(format!(
            "cannot resample to {width}x{height}"
        )));
    }

    let src = image.to_rgb32f();
    let col_spans = spans(src_w, width);
    let row_spans = spans(src_h, height);

    let mut out = vec![Rgb::default(); width * height];
    out.par_chunks_mut(width)
        .zip(row_spans.par_iter())
        .for_each(|(row, ys)| {
            for (cell, xs) in row.iter_mut().zip(&col_spans) {
                let (mut r, mut g, mut b, mut total) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
                for &(py, wy) in ys {
                    for &(px, wx) in xs {
                        let w = wx * wy;
                        let p = src.get_pixel(px as u32, py as u32);
                        r += w * p[0] as f64;
                        g += w * p[1] as f64;
                        b += w * p[2] as f64;
                        total += w;
                    }
                }
                if total > 0.0 {
                    *cell = Rgb::new((r / total) as f32, (g / total) as f32, (b / total) as f32);
                }
            }
        });
    Ok(out)
}

/// For each of `dst` output cells along one axis, the source pixels it
/// overlaps and the overlap length of each.
fn spans(src: usize, dst: usize) -> Vec<Vec<(usize, f64)>> {
    let scale = src as f64 / dst as f64;
    (0..dst)
        .map(|i| {
            let start = i as f64 * scale;
            let end = (i + 1) as f64 * scale;
            let first = start.floor() as usize;
            let last = (end.ceil() as usize).min(src);
            (first..last)
                .filter_map(|p| {
                    let w = end.min((p + 1) as f64) - start.max(p as f64);
                    (w > 1e-12).then_some((p, w))
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use image::{GrayImage, RgbImage};

    fn solid(w: u32, h: u32, rgb: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, image::Rgb(rgb)))
    }

    #[test]
    fn output_has_requested_dimensions_for_any_source_size() {
        for (w, h) in [(1, 1), (7, 3), (200, 200), (333, 120)] {
            let cells = resample(&solid(w, h, [10, 20, 30]), 20, 10).unwrap();
            assert_eq!(cells.len(), 200);
        }
    }

    #[test]
    fn uniform_image_stays_uniform() {
        let cells = resample(&solid(123, 77, [255, 0, 0]), 10, 10).unwrap();
        for c in cells {
            assert_abs_diff_eq!(c.r, 1.0, epsilon = 1e-6);
            assert_abs_diff_eq!(c.g, 0.0, epsilon = 1e-6);
            assert_abs_diff_eq!(c.b, 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn box_filter_averages_a_checkerboard() {
        let mut img = RgbImage::new(2, 2);
        img.put_pixel(0, 0, image::Rgb([255, 255, 255]));
        img.put_pixel(1, 1, image::Rgb([255, 255, 255]));
        let cells = resample(&DynamicImage::ImageRgb8(img), 1, 1).unwrap();
        assert_abs_diff_eq!(cells[0].r, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(cells[0].g, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn fractional_coverage_is_weighted() {
        // Red channel 0, 255, 0 across three pixels, reduced to two cells of
        // 1.5 pixels each: both see one third red.
        let mut img = RgbImage::new(3, 1);
        img.put_pixel(1, 0, image::Rgb([255, 0, 0]));
        let cells = resample(&DynamicImage::ImageRgb8(img), 2, 1).unwrap();
        assert_abs_diff_eq!(cells[0].r, 1.0 / 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(cells[1].r, 1.0 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn upsampling_replicates_pixels() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(1, 0, image::Rgb([0, 0, 255]));
        let cells = resample(&DynamicImage::ImageRgb8(img), 4, 2).unwrap();
        assert_abs_diff_eq!(cells[0].b, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(cells[1].b, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(cells[2].b, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(cells[7].b, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn rgba_input_is_accepted() {
        let img = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 255, 0, 128])));
        let cells = resample(&img, 2, 2).unwrap();
        assert_abs_diff_eq!(cells[3].g, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn rejects_invalid_inputs() {
        assert!(matches!(
            resample(&solid(0, 5, [0, 0, 0]), 2, 2),
            Err(DominoError::InvalidImage(_))
        ));
        let gray = DynamicImage::ImageLuma8(GrayImage::new(4, 4));
        assert!(matches!(resample(&gray, 2, 2), Err(DominoError::InvalidImage(_))));
        assert!(matches!(
            resample(&solid(4, 4, [0, 0, 0]), 0, 2),
            Err(DominoError::InvalidImage(_))
        ));
    }
}
