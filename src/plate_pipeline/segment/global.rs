//! Histogram-mode global threshold.
//!
//! Plates are bright with dark worms. The mode of the non-saturated
//! histogram picks between two empirically tuned cutoffs; these constants
//! are preserved as-is and still await validation by a domain expert.

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{dilate, erode};
use tracing::debug;

use crate::plate_pipeline::raster::{BACKGROUND, FOREGROUND};

/// Background mode that selects [`HARDWIRED_THRESHOLD`].
pub const HARDWIRED_TRIGGER_MODE: u8 = 254;
pub const HARDWIRED_THRESHOLD: u8 = 220;
pub const STANDARD_THRESHOLD: u8 = 200;

pub fn histogram(gray: &GrayImage) -> [u32; 256] {
    let mut hist = [0u32; 256];
    for p in gray.pixels() {
        hist[p[0] as usize] += 1;
    }
    hist
}

/// Most frequent value below 255. Ties go to the darker value.
pub fn background_mode(hist: &[u32; 256]) -> u8 {
    let mut mode = 0usize;
    for v in 1..255 {
        if hist[v] > hist[mode] {
            mode = v;
        }
    }
    mode as u8
}

pub fn global_threshold(mode: u8) -> u8 {
    if mode == HARDWIRED_TRIGGER_MODE {
        HARDWIRED_THRESHOLD
    } else {
        STANDARD_THRESHOLD
    }
}

/// Pixels darker than the cutoff become foreground, then one dilate and one
/// erode pass (3×3) remove speckle and close hairline gaps.
pub fn threshold_global(gray: &GrayImage) -> GrayImage {
    let mode = background_mode(&histogram(gray));
    let cutoff = global_threshold(mode);
    debug!(mode, cutoff, "global threshold");

    let binary = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] < cutoff {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    });
    let dilated = dilate(&binary, Norm::LInf, 1);
    erode(&dilated, Norm::LInf, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plate_pipeline::raster::set_count;

    #[test]
    fn mode_ignores_saturated_white() {
        let mut hist = [0u32; 256];
        hist[255] = 1000;
        hist[180] = 40;
        hist[30] = 10;
        assert_eq!(background_mode(&hist), 180);
    }

    #[test]
    fn boundary_mode_uses_hardwired_cutoff() {
        assert_eq!(global_threshold(254), 220);
        assert_eq!(global_threshold(253), 200);
        assert_eq!(global_threshold(0), 200);
    }

    #[test]
    fn hardwired_branch_changes_segmentation() {
        // Background at 254 selects 220, so a 210 blob counts as foreground.
        let mut gray = GrayImage::from_pixel(20, 20, Luma([254]));
        for y in 8..12 {
            for x in 8..12 {
                gray.put_pixel(x, y, Luma([210]));
            }
        }
        assert_eq!(set_count(&threshold_global(&gray)), 16);

        // The same blob on a 230 background stays below the 200 cutoff test.
        let mut gray = GrayImage::from_pixel(20, 20, Luma([230]));
        for y in 8..12 {
            for x in 8..12 {
                gray.put_pixel(x, y, Luma([210]));
            }
        }
        assert_eq!(set_count(&threshold_global(&gray)), 0);
    }

    #[test]
    fn closing_preserves_solid_square() {
        let mut gray = GrayImage::from_pixel(15, 15, Luma([200]));
        for y in 5..10 {
            for x in 5..10 {
                gray.put_pixel(x, y, Luma([40]));
            }
        }
        let binary = threshold_global(&gray);
        assert_eq!(set_count(&binary), 25);
        assert_eq!(binary.get_pixel(7, 7)[0], FOREGROUND);
        assert_eq!(binary.get_pixel(4, 7)[0], BACKGROUND);
    }
}
