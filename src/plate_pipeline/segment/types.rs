use image::GrayImage;
use imageproc::region_labelling::Connectivity;
use tracing::{debug, instrument};

use crate::plate_pipeline::raster;
use crate::plate_pipeline::segment::{clear_border, threshold_adaptive, threshold_global};

/// Local mean thresholding parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveParams {
    /// Side of the square averaging window, in pixels.
    pub box_size: u32,
    /// A pixel is foreground below `mean * (1 - t_percent)`.
    pub t_percent: f64,
    /// Pixels at or above this gray value are never foreground.
    pub gray_ceiling: u8,
}

impl Default for AdaptiveParams {
    fn default() -> Self {
        Self {
            box_size: 15,
            t_percent: 0.3,
            gray_ceiling: 160,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SegmentationMethod {
    /// Histogram-mode driven fixed cutoff followed by a dilate/erode pass.
    #[default]
    Global,
    Adaptive(AdaptiveParams),
}

/// Binarizes a gray plate: dark worms become [`raster::FOREGROUND`].
#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    pub method: SegmentationMethod,
    pub connectivity: Connectivity,
    pub clear_border: bool,
}

impl Segmenter {
    pub fn new(method: SegmentationMethod, connectivity: Connectivity, clear_border: bool) -> Self {
        Self {
            method,
            connectivity,
            clear_border,
        }
    }

    #[instrument(skip(self, gray), fields(width = gray.width(), height = gray.height()))]
    pub fn segment(&self, gray: &GrayImage) -> GrayImage {
        let mut binary = match self.method {
            SegmentationMethod::Global => threshold_global(gray),
            SegmentationMethod::Adaptive(params) => threshold_adaptive(gray, &params),
        };
        if self.clear_border {
            let removed = clear_border(&mut binary, self.connectivity);
            debug!(removed, "cleared border components");
        }
        debug!(foreground = raster::set_count(&binary), "segmented");
        binary
    }
}
