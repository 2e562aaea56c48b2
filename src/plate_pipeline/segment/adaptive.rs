use image::{GrayImage, Luma};
use imageproc::definitions::Image;
use imageproc::integral_image::integral_image;
use tracing::debug;

use crate::plate_pipeline::raster::{BACKGROUND, FOREGROUND};
use crate::plate_pipeline::segment::types::AdaptiveParams;

/// Local-mean thresholding over an integral image.
///
/// The window is clipped at the image edges, so border pixels average over
/// fewer samples rather than over padding.
pub fn threshold_adaptive(gray: &GrayImage, params: &AdaptiveParams) -> GrayImage {
    let (width, height) = gray.dimensions();
    // (width + 1) x (height + 1); row and column 0 are zero.
    let integral: Image<Luma<u64>> = integral_image::<_, u64>(gray);
    let half = (params.box_size.max(1) / 2) as i64;
    let scale = 1.0 - params.t_percent;

    let mut foreground = 0u64;
    let binary = GrayImage::from_fn(width, height, |x, y| {
        let left = (x as i64 - half).max(0) as u32;
        let top = (y as i64 - half).max(0) as u32;
        let right = (x as i64 + half).min(width as i64 - 1) as u32;
        let bottom = (y as i64 + half).min(height as i64 - 1) as u32;

        let sum = integral.get_pixel(right + 1, bottom + 1)[0] + integral.get_pixel(left, top)[0]
            - integral.get_pixel(left, bottom + 1)[0]
            - integral.get_pixel(right + 1, top)[0];
        let count = ((right - left + 1) * (bottom - top + 1)) as f64;
        let mean = sum as f64 / count;

        let p = gray.get_pixel(x, y)[0];
        if (p as f64) < mean * scale && p < params.gray_ceiling {
            foreground += 1;
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    });
    debug!(
        box_size = params.box_size,
        t_percent = params.t_percent,
        foreground,
        "adaptive threshold"
    );
    binary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dark_blob_on_uniform_background() {
        let mut gray = GrayImage::from_pixel(40, 40, Luma([200]));
        for y in 18..23 {
            for x in 18..23 {
                gray.put_pixel(x, y, Luma([50]));
            }
        }
        let params = AdaptiveParams {
            box_size: 15,
            t_percent: 0.3,
            gray_ceiling: 160,
        };
        let binary = threshold_adaptive(&gray, &params);
        for y in 0..40 {
            for x in 0..40 {
                let in_blob = (18..23).contains(&x) && (18..23).contains(&y);
                let expected = if in_blob { FOREGROUND } else { BACKGROUND };
                assert_eq!(binary.get_pixel(x, y)[0], expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn gray_ceiling_suppresses_bright_local_minima() {
        // Locally dark relative to a white surround but brighter than the ceiling.
        let mut gray = GrayImage::from_pixel(30, 30, Luma([255]));
        for y in 13..17 {
            for x in 13..17 {
                gray.put_pixel(x, y, Luma([170]));
            }
        }
        let params = AdaptiveParams {
            box_size: 15,
            t_percent: 0.2,
            gray_ceiling: 160,
        };
        let binary = threshold_adaptive(&gray, &params);
        assert!(binary.pixels().all(|p| p[0] == BACKGROUND));
    }
}
