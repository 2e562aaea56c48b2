use image::GrayImage;
use tracing::trace;

use crate::plate_pipeline::common::PixelPos;
use crate::plate_pipeline::common::error::{AnalysisError, Result};
use crate::plate_pipeline::diameter::types::{DiameterParams, DiameterProfile};
use crate::plate_pipeline::morphometry::Morphometrics;
use crate::plate_pipeline::morphometry::path::trace_path;
use crate::plate_pipeline::raster::is_set;
use crate::plate_pipeline::tiles::ScannerCalibration;

pub struct DiameterProfiler {
    params: DiameterParams,
    calibration: ScannerCalibration,
}

impl DiameterProfiler {
    pub fn new(params: DiameterParams, calibration: ScannerCalibration) -> Self {
        Self {
            params,
            calibration,
        }
    }

    /// Profiles a blob starting from its first end point.
    pub fn profile(&self, blob: &Morphometrics) -> Result<DiameterProfile> {
        let start = *blob
            .end_points
            .first()
            .ok_or_else(|| ambiguity("skeleton has no end point"))?;
        self.profile_from(blob, start)
    }

    /// Profiles a blob starting from end point `start`. The result does not
    /// depend on which of the two end points is given.
    pub fn profile_from(&self, blob: &Morphometrics, start: PixelPos) -> Result<DiameterProfile> {
        if blob.end_points.len() != 2 || !blob.branch_points.is_empty() {
            return Err(ambiguity(format!(
                "{} end points and {} branch points",
                blob.end_points.len(),
                blob.branch_points.len()
            )));
        }
        if !blob.end_points.contains(&start) {
            return Err(ambiguity(format!("{start:?} is not an end point")));
        }

        let path = self.ordered_curve(&blob.skeleton, start, &blob.end_points)?;
        let cumulative = self.cumulative_length(&path);
        let total = cumulative.last().copied().unwrap_or(0.0);
        if total <= 0.0 {
            return Err(ambiguity("curve has zero length"));
        }

        let d = self.params.checkpoint.distance(total);
        let last = path.len() - 1;
        let k1 = cumulative.iter().position(|&c| c >= d).unwrap_or(last);
        let k2 = cumulative
            .iter()
            .rposition(|&c| total - c >= d)
            .unwrap_or(0);
        let mid = cumulative
            .iter()
            .position(|&c| c >= total / 2.0)
            .unwrap_or(last / 2);
        if k1 >= k2 {
            return Err(ambiguity(format!(
                "checkpoints cross ({k1} >= {k2}) on a {total:.1} µm curve"
            )));
        }
        let window = self.params.trace_window as usize;
        if k1 > window || last - k2 > window {
            return Err(ambiguity(format!(
                "checkpoint beyond trace window of {window} px"
            )));
        }

        let d1 = self.chord(&blob.closed, &path, k1)?;
        let d2 = self.chord(&blob.closed, &path, k2)?;
        let d_mid = self.chord(&blob.closed, &path, mid)?;
        if d_mid <= 0.0 {
            return Err(ambiguity("zero reference width"));
        }
        trace!(k1, k2, mid, d1, d2, d_mid, "diameter chords");
        Ok(DiameterProfile::from_chords(d1, d2, d_mid))
    }

    /// Skeleton pixels from end to end, starting at the end point that comes
    /// first in raster order.
    fn ordered_curve(
        &self,
        skeleton: &GrayImage,
        start: PixelPos,
        ends: &[PixelPos],
    ) -> Result<Vec<PixelPos>> {
        let mut path = trace_path(skeleton, start, None);
        let other = if ends[0] == start { ends[1] } else { ends[0] };
        if path.last() != Some(&other) {
            return Err(ambiguity("walk from one end does not reach the other"));
        }
        let raster_key = |&(x, y): &PixelPos| (y, x);
        if raster_key(&path[0]) > raster_key(&other) {
            path.reverse();
        }
        Ok(path)
    }

    fn cumulative_length(&self, path: &[PixelPos]) -> Vec<f64> {
        let mut acc = 0.0;
        let mut out = Vec::with_capacity(path.len());
        out.push(0.0);
        for pair in path.windows(2) {
            let dx = pair[1].0 as f64 - pair[0].0 as f64;
            let dy = pair[1].1 as f64 - pair[0].1 as f64;
            acc += self.calibration.distance(dx, dy);
            out.push(acc);
        }
        out
    }

    /// Width of `mask` across the curve at `path[k]`, in micrometers.
    fn chord(&self, mask: &GrayImage, path: &[PixelPos], k: usize) -> Result<f64> {
        let w = self.params.tangent_half_window as usize;
        let a = path[k.saturating_sub(w)];
        let b = path[(k + w).min(path.len() - 1)];
        let tx = b.0 as f64 - a.0 as f64;
        let ty = b.1 as f64 - a.1 as f64;
        let norm = tx.hypot(ty);
        if norm == 0.0 {
            return Err(ambiguity(format!("no tangent at curve index {k}")));
        }
        let normal = (-ty / norm, tx / norm);

        let center = path[k];
        let reach_plus = self.reach(mask, center, normal);
        let reach_minus = self.reach(mask, center, (-normal.0, -normal.1));
        let span = reach_plus + reach_minus + self.params.step;
        Ok(self.calibration.distance(normal.0 * span, normal.1 * span))
    }

    /// Farthest sampled distance from `center` along `dir` still inside `mask`.
    fn reach(&self, mask: &GrayImage, center: PixelPos, dir: (f64, f64)) -> f64 {
        let step = self.params.step;
        let limit = (mask.width() + mask.height()) as f64;
        let mut inside = 0.0;
        let mut s = step;
        while s <= limit {
            let x = (center.0 as f64 + dir.0 * s).round() as i64;
            let y = (center.1 as f64 + dir.1 * s).round() as i64;
            if !is_set(mask, x, y) {
                break;
            }
            inside = s;
            s += step;
        }
        inside
    }
}

fn ambiguity(reason: impl Into<String>) -> AnalysisError {
    AnalysisError::GeometricAmbiguity(reason.into())
}
