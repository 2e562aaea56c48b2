use image::GrayImage;
use thiserror::Error;

use crate::plate_pipeline::common::PixelPos;

#[derive(Debug, Clone, PartialEq)]
pub struct MorphometryParams {
    /// Border added around each blob before closing.
    pub padding: u32,
    /// Disk radius of the morphological closing.
    pub close_radius: u8,
    /// Longest side branch removed by pruning, in pixels.
    pub spur_length: u32,
    /// Chain length used to aim tail extensions.
    pub extension_window: u32,
    /// Minimum gray standard deviation inside the bounding box.
    pub noise_floor: f64,
    pub min_fatness: f64,
    pub max_fatness: f64,
    /// Micrometers.
    pub min_true_length: f64,
    pub max_true_length: f64,
    /// Applied to `max_true_length` when the skeleton branches.
    pub branched_length_factor: f64,
    /// Extract blobs on the rayon pool.
    pub parallel: bool,
}

impl Default for MorphometryParams {
    fn default() -> Self {
        Self {
            padding: 4,
            close_radius: 2,
            spur_length: 8,
            extension_window: 6,
            noise_floor: 5.0,
            min_fatness: 2.0,
            max_fatness: 40.0,
            min_true_length: 100.0,
            max_true_length: 2000.0,
            branched_length_factor: 5.0,
            parallel: true,
        }
    }
}

/// Shape measurements of one blob.
///
/// `closed` and `skeleton` are padded sub-images whose top-left corner sits
/// at `origin` in plate coordinates. Point lists are in sub-image
/// coordinates.
#[derive(Debug, Clone)]
pub struct Morphometrics {
    pub origin: (i64, i64),
    pub closed: GrayImage,
    pub skeleton: GrayImage,
    pub perimeter: u32,
    pub outline: Vec<PixelPos>,
    pub end_points: Vec<PixelPos>,
    pub branch_points: Vec<PixelPos>,
    pub pixel_length: u32,
    pub true_length: f64,
    pub fatness: f64,
    pub suspicious: bool,
}

impl Morphometrics {
    /// Maps a sub-image point to plate coordinates, `None` when it falls
    /// into the padding beyond the plate's top or left edge.
    pub fn to_plate(&self, (x, y): PixelPos) -> Option<PixelPos> {
        let px = self.origin.0 + x as i64;
        let py = self.origin.1 + y as i64;
        (px >= 0 && py >= 0).then_some((px as u32, py as u32))
    }

    pub fn has_branches(&self) -> bool {
        !self.branch_points.is_empty()
    }
}

/// Why a blob was dropped from measurement. Not an error: the pipeline
/// counts these and carries on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("gray std-dev {std_dev:.2} below noise floor {floor:.2}")]
    LowContrast { std_dev: f64, floor: f64 },

    #[error("fatness {0:.2} out of range")]
    Fatness(f64),

    #[error("true length {0:.1} µm out of range")]
    TrueLength(f64),

    #[error("skeleton is empty")]
    EmptySkeleton,
}
