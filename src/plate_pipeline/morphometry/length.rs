use image::GrayImage;

use crate::plate_pipeline::common::PixelPos;
use crate::plate_pipeline::morphometry::path::trace_path;
use crate::plate_pipeline::morphometry::topology::end_points;
use crate::plate_pipeline::raster::set_count;
use crate::plate_pipeline::tiles::ScannerCalibration;

/// Number of skeleton pixels.
pub fn pixel_length(skeleton: &GrayImage) -> u32 {
    set_count(skeleton)
}

/// Calibrated length of an ordered pixel path.
pub fn path_length(path: &[PixelPos], calibration: &ScannerCalibration) -> f64 {
    path.windows(2)
        .map(|pair| {
            let dx = pair[1].0 as f64 - pair[0].0 as f64;
            let dy = pair[1].1 as f64 - pair[0].1 as f64;
            calibration.distance(dx, dy)
        })
        .sum()
}

/// Micrometers along the skeleton, walked from its first end point (or from
/// any pixel of a closed loop).
pub fn true_length(skeleton: &GrayImage, calibration: &ScannerCalibration) -> f64 {
    let start = end_points(skeleton).first().copied().or_else(|| {
        skeleton
            .enumerate_pixels()
            .find(|(_, _, p)| p[0] != 0)
            .map(|(x, y, _)| (x, y))
    });
    match start {
        Some(start) => path_length(&trace_path(skeleton, start, None), calibration),
        None => 0.0,
    }
}
