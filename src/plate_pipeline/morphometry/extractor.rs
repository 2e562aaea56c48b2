use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology::close;
use rayon::prelude::*;
use tracing::{debug, instrument, trace};

use crate::plate_pipeline::labeling::Component;
use crate::plate_pipeline::morphometry::length::{pixel_length, true_length};
use crate::plate_pipeline::morphometry::topology::{branch_points, end_points};
use crate::plate_pipeline::morphometry::types::{Morphometrics, MorphometryParams, Rejection};
use crate::plate_pipeline::morphometry::{extend_tails, prune_spurs, thin};
use crate::plate_pipeline::raster::{BACKGROUND, blob_mask, gray_std_dev, outline};
use crate::plate_pipeline::tiles::ScannerCalibration;

pub struct MorphometricExtractor {
    params: MorphometryParams,
    calibration: ScannerCalibration,
}

impl MorphometricExtractor {
    pub fn new(params: MorphometryParams, calibration: ScannerCalibration) -> Self {
        Self {
            params,
            calibration,
        }
    }

    pub fn params(&self) -> &MorphometryParams {
        &self.params
    }

    pub fn calibration(&self) -> &ScannerCalibration {
        &self.calibration
    }

    /// Measures one blob. `gray` is the assembled plate the blob came from.
    pub fn extract(
        &self,
        component: &Component,
        gray: &GrayImage,
    ) -> Result<Morphometrics, Rejection> {
        let p = &self.params;

        let std_dev = gray_std_dev(gray, &component.bbox);
        if std_dev < p.noise_floor {
            return Err(Rejection::LowContrast {
                std_dev,
                floor: p.noise_floor,
            });
        }

        let (mask, origin) = blob_mask(&component.pixels, &component.bbox, p.padding);
        let closed = close(&mask, Norm::L2, p.close_radius);

        let border = outline(&closed);
        let outline: Vec<_> = border
            .enumerate_pixels()
            .filter(|(_, _, v)| v[0] != BACKGROUND)
            .map(|(x, y, _)| (x, y))
            .collect();

        let mut skeleton = prune_spurs(&thin(&closed), p.spur_length);
        let extended = extend_tails(&mut skeleton, &closed, p.extension_window);

        let pixel_length = pixel_length(&skeleton);
        if pixel_length == 0 {
            return Err(Rejection::EmptySkeleton);
        }
        let ends = end_points(&skeleton);
        let branches = branch_points(&skeleton);
        let true_length = true_length(&skeleton, &self.calibration);
        let fatness = component.area as f64 / pixel_length as f64;
        trace!(
            label = component.label,
            pixel_length,
            extended,
            true_length,
            fatness,
            "measured blob"
        );

        if !(p.min_fatness..=p.max_fatness).contains(&fatness) {
            return Err(Rejection::Fatness(fatness));
        }
        let suspicious = !branches.is_empty();
        let max_length = if suspicious {
            p.max_true_length * p.branched_length_factor
        } else {
            p.max_true_length
        };
        if !(p.min_true_length..=max_length).contains(&true_length) {
            return Err(Rejection::TrueLength(true_length));
        }

        Ok(Morphometrics {
            origin,
            perimeter: outline.len() as u32,
            outline,
            closed,
            skeleton,
            end_points: ends,
            branch_points: branches,
            pixel_length,
            true_length,
            fatness,
            suspicious,
        })
    }

    /// Measures every component, in input order.
    #[instrument(skip_all, fields(blobs = components.len(), parallel = self.params.parallel))]
    pub fn extract_all(
        &self,
        components: &[&Component],
        gray: &GrayImage,
    ) -> Vec<Result<Morphometrics, Rejection>> {
        let results: Vec<_> = if self.params.parallel {
            components
                .par_iter()
                .map(|c| self.extract(c, gray))
                .collect()
        } else {
            components.iter().map(|c| self.extract(c, gray)).collect()
        };
        let rejected = results.iter().filter(|r| r.is_err()).count();
        debug!(measured = results.len() - rejected, rejected, "morphometry done");
        results
    }
}
