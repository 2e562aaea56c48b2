//! Worm multiplicity for the count-only variant.
//!
//! A blob's worm count is its area divided by the plate's typical single
//! worm area, rounded, and never less than one.

use tracing::debug;

use crate::plate_pipeline::mask::{MatchedBlob, ScreenVerdict};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WormCountEstimator {
    single_worm_area: f64,
}

impl WormCountEstimator {
    pub fn new(single_worm_area: f64) -> Self {
        Self { single_worm_area }
    }

    /// Calibrates on a plate's blobs: the median area of single-sized blobs,
    /// or of all blobs when there are none.
    pub fn from_blobs(blobs: &[MatchedBlob]) -> Self {
        let singles: Vec<u32> = blobs
            .iter()
            .filter(|b| b.verdict == ScreenVerdict::Single)
            .map(|b| b.component.area)
            .collect();
        let areas = if singles.is_empty() {
            blobs.iter().map(|b| b.component.area).collect()
        } else {
            singles
        };
        let single_worm_area = median(areas);
        debug!(single_worm_area, blobs = blobs.len(), "single worm area");
        Self::new(single_worm_area)
    }

    pub fn single_worm_area(&self) -> f64 {
        self.single_worm_area
    }

    pub fn estimate(&self, area: u32) -> u32 {
        if self.single_worm_area <= 0.0 {
            return 1;
        }
        ((area as f64 / self.single_worm_area).round() as u32).max(1)
    }
}

/// Median of `values`; the mean of the two middle values for even counts,
/// 0 when empty.
pub fn median(mut values: Vec<u32>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_unstable();
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2] as f64
    } else {
        (values[n / 2 - 1] as f64 + values[n / 2] as f64) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plate_pipeline::common::BoundingBox;
    use crate::plate_pipeline::labeling::Component;

    fn blob(area: u32, verdict: ScreenVerdict) -> MatchedBlob {
        MatchedBlob {
            component: Component {
                label: 1,
                bbox: BoundingBox::new(0, 0, 10, 10),
                area,
                pixels: Vec::new(),
            },
            region: 1,
            verdict,
        }
    }

    #[test]
    fn median_of_singles_drives_estimate() {
        let blobs = [
            blob(400, ScreenVerdict::Single),
            blob(500, ScreenVerdict::Single),
            blob(600, ScreenVerdict::Single),
            blob(9000, ScreenVerdict::Cluster),
        ];
        let est = WormCountEstimator::from_blobs(&blobs);
        assert_eq!(est.single_worm_area(), 500.0);
        assert_eq!(est.estimate(9000), 18);
        assert_eq!(est.estimate(740), 1);
        assert_eq!(est.estimate(760), 2);
        assert_eq!(est.estimate(10), 1);
    }

    #[test]
    fn clusters_only_fall_back_to_all_blobs() {
        let blobs = [blob(7000, ScreenVerdict::Cluster), blob(9000, ScreenVerdict::Cluster)];
        let est = WormCountEstimator::from_blobs(&blobs);
        assert_eq!(est.single_worm_area(), 8000.0);
        assert_eq!(est.estimate(7000), 1);
    }

    #[test]
    fn empty_plate_counts_each_blob_once() {
        let est = WormCountEstimator::from_blobs(&[]);
        assert_eq!(est.single_worm_area(), 0.0);
        assert_eq!(est.estimate(1234), 1);
    }
}
