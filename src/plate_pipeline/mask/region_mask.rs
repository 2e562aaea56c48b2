use std::path::Path;

use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;
use imageproc::definitions::Image;
use imageproc::region_labelling::Connectivity;
use tracing::{debug, info};

use crate::plate_pipeline::common::error::{AnalysisError, Result};
use crate::plate_pipeline::labeling::{trace_components, label_map};
use crate::plate_pipeline::raster::{BACKGROUND, FOREGROUND};

/// Reference mask partitioned into labelled regions. Label 0 is outside
/// every region.
#[derive(Debug, Clone)]
pub struct RegionMask {
    labels: Image<Luma<u32>>,
    names: Vec<String>,
}

impl RegionMask {
    /// A single region covering the whole plate.
    pub fn whole_plate(width: u32, height: u32) -> Self {
        Self {
            labels: Image::from_pixel(width, height, Luma([1])),
            names: vec!["plate".to_string()],
        }
    }

    /// Auto-thresholds `gray` (Otsu) and flood-labels the foreground side
    /// into regions `region_1..region_n`.
    pub fn from_gray(gray: &GrayImage, foreground_dark: bool) -> Self {
        let level = otsu_level(gray);
        let binary = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            let v = gray.get_pixel(x, y)[0];
            let fg = if foreground_dark { v <= level } else { v > level };
            Luma([if fg { FOREGROUND } else { BACKGROUND }])
        });
        let components = trace_components(binary, Connectivity::Eight);
        let names = components
            .iter()
            .map(|c| format!("region_{}", c.label))
            .collect();
        debug!(level, regions = components.len(), "labelled mask");
        Self {
            labels: label_map(&components, gray.width(), gray.height()),
            names,
        }
    }

    pub fn open(path: &Path, foreground_dark: bool) -> Result<Self> {
        if !path.is_file() {
            return Err(AnalysisError::MissingInput(format!(
                "mask {}",
                path.display()
            )));
        }
        let gray = image::open(path)
            .map_err(|e| AnalysisError::DecodeError(format!("{}: {}", path.display(), e)))?
            .to_luma8();
        let mask = Self::from_gray(&gray, foreground_dark);
        info!(path = %path.display(), regions = mask.region_count(), "loaded mask");
        Ok(mask)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.labels.dimensions()
    }

    pub fn region_count(&self) -> usize {
        self.names.len()
    }

    /// `None` outside the mask, `Some(0)` on mask background.
    pub fn label_at(&self, x: u32, y: u32) -> Option<u32> {
        let (w, h) = self.labels.dimensions();
        (x < w && y < h).then(|| self.labels.get_pixel(x, y)[0])
    }

    pub fn region_name(&self, label: u32) -> Option<&str> {
        let index = label.checked_sub(1)? as usize;
        self.names.get(index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bright_regions_become_labels() {
        let mut gray = GrayImage::from_pixel(20, 10, Luma([10]));
        for y in 1..9 {
            for x in 1..8 {
                gray.put_pixel(x, y, Luma([240]));
            }
            for x in 12..19 {
                gray.put_pixel(x, y, Luma([240]));
            }
        }
        let mask = RegionMask::from_gray(&gray, false);
        assert_eq!(mask.region_count(), 2);
        assert_eq!(mask.label_at(3, 3), Some(1));
        assert_eq!(mask.label_at(15, 3), Some(2));
        assert_eq!(mask.label_at(10, 3), Some(0));
        assert_eq!(mask.label_at(25, 3), None);
        assert_eq!(mask.region_name(2), Some("region_2"));
        assert_eq!(mask.region_name(0), None);
    }

    #[test]
    fn dark_side_option_flips_foreground() {
        let mut gray = GrayImage::from_pixel(10, 10, Luma([230]));
        for y in 3..6 {
            for x in 3..6 {
                gray.put_pixel(x, y, Luma([20]));
            }
        }
        let mask = RegionMask::from_gray(&gray, true);
        assert_eq!(mask.region_count(), 1);
        assert_eq!(mask.label_at(4, 4), Some(1));
        assert_eq!(mask.label_at(0, 0), Some(0));
    }
}
