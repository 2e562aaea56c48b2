use tracing::debug;

use crate::plate_pipeline::labeling::Component;
use crate::plate_pipeline::mask::region_mask::RegionMask;
use crate::plate_pipeline::mask::screening::{ScreenVerdict, ScreeningParams, screen};

/// A component that survived screening and lies inside a mask region.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedBlob {
    pub component: Component,
    pub region: u32,
    pub verdict: ScreenVerdict,
}

impl MatchedBlob {
    pub fn is_cluster(&self) -> bool {
        self.verdict == ScreenVerdict::Cluster
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScreeningStats {
    pub noise: usize,
    pub edge_artifacts: usize,
    pub outside_mask: usize,
    pub clusters: usize,
    pub accepted: usize,
}

pub struct MaskMatcher<'a> {
    mask: &'a RegionMask,
    params: ScreeningParams,
}

impl<'a> MaskMatcher<'a> {
    pub fn new(mask: &'a RegionMask, params: ScreeningParams) -> Self {
        Self { mask, params }
    }

    /// Region label for a blob, or `None` when any of its pixels falls on
    /// mask background or outside the mask.
    pub fn region_of(&self, component: &Component) -> Option<u32> {
        let all_inside = component
            .pixels
            .iter()
            .all(|&(x, y)| matches!(self.mask.label_at(x, y), Some(l) if l != 0));
        if !all_inside {
            return None;
        }
        let (x, y) = component.representative();
        self.mask.label_at(x, y)
    }

    /// Screens by size first, then matches against the mask.
    pub fn match_components(
        &self,
        components: Vec<Component>,
        plate_width: u32,
        plate_height: u32,
    ) -> (Vec<MatchedBlob>, ScreeningStats) {
        let mut stats = ScreeningStats::default();
        let mut kept = Vec::new();
        for component in components {
            let verdict = screen(&component, plate_width, plate_height, &self.params);
            match verdict {
                ScreenVerdict::Noise => {
                    stats.noise += 1;
                    continue;
                }
                ScreenVerdict::EdgeArtifact => {
                    stats.edge_artifacts += 1;
                    continue;
                }
                ScreenVerdict::Single | ScreenVerdict::Cluster => {}
            }
            let Some(region) = self.region_of(&component) else {
                stats.outside_mask += 1;
                continue;
            };
            if verdict == ScreenVerdict::Cluster {
                stats.clusters += 1;
            }
            stats.accepted += 1;
            kept.push(MatchedBlob {
                component,
                region,
                verdict,
            });
        }
        debug!(?stats, "screened components");
        (kept, stats)
    }
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, Luma};

    use super::*;
    use crate::plate_pipeline::common::BoundingBox;

    fn square(label: u32, x0: u32, y0: u32, side: u32) -> Component {
        let pixels: Vec<_> = (y0..y0 + side)
            .flat_map(|y| (x0..x0 + side).map(move |x| (x, y)))
            .collect();
        Component {
            label,
            bbox: BoundingBox::new(x0, y0, side, side),
            area: side * side,
            pixels,
        }
    }

    fn two_region_mask() -> RegionMask {
        let mut gray = GrayImage::from_pixel(100, 100, Luma([0]));
        for y in 0..100 {
            for x in 0..45 {
                gray.put_pixel(x, y, Luma([255]));
            }
            for x in 55..100 {
                gray.put_pixel(x, y, Luma([255]));
            }
        }
        RegionMask::from_gray(&gray, false)
    }

    #[test]
    fn blobs_inherit_region_or_are_discarded() {
        let mask = two_region_mask();
        let params = ScreeningParams {
            min_worm_size: 10,
            max_worm_size: 1000,
            edge_radius_fraction: 0.75,
        };
        let matcher = MaskMatcher::new(&mask, params);
        let components = vec![
            square(1, 10, 10, 8),  // left region
            square(2, 60, 10, 8),  // right region
            square(3, 40, 50, 8),  // straddles the gap
            square(4, 20, 80, 2),  // noise
        ];
        let (kept, stats) = matcher.match_components(components, 100, 100);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].region, 1);
        assert_eq!(kept[1].region, 2);
        assert_eq!(stats.outside_mask, 1);
        assert_eq!(stats.noise, 1);
        assert_eq!(stats.accepted, 2);
    }

    #[test]
    fn whole_plate_mask_accepts_everything_in_bounds() {
        let mask = RegionMask::whole_plate(50, 50);
        let matcher = MaskMatcher::new(&mask, ScreeningParams::default());
        assert_eq!(matcher.region_of(&square(1, 10, 10, 10)), Some(1));
        assert_eq!(matcher.region_of(&square(1, 45, 45, 10)), None);
    }
}
