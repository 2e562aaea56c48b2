use crate::plate_pipeline::labeling::Component;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreeningParams {
    /// Smaller blobs are noise (pixel area).
    pub min_worm_size: u32,
    /// Larger blobs are clusters or artifacts (pixel area).
    pub max_worm_size: u32,
    /// Oversized blobs farther than this fraction of the half plate height
    /// from the plate center are edge artifacts.
    pub edge_radius_fraction: f64,
}

impl Default for ScreeningParams {
    fn default() -> Self {
        Self {
            min_worm_size: 50,
            max_worm_size: 6000,
            edge_radius_fraction: 0.75,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenVerdict {
    /// Within the single-worm size range.
    Single,
    /// Oversized but central: most likely a knot of worms.
    Cluster,
    Noise,
    EdgeArtifact,
}

impl ScreenVerdict {
    pub fn is_kept(self) -> bool {
        matches!(self, ScreenVerdict::Single | ScreenVerdict::Cluster)
    }
}

pub fn screen(
    component: &Component,
    plate_width: u32,
    plate_height: u32,
    params: &ScreeningParams,
) -> ScreenVerdict {
    if component.area < params.min_worm_size {
        return ScreenVerdict::Noise;
    }
    if component.area <= params.max_worm_size {
        return ScreenVerdict::Single;
    }
    let (cx, cy) = component.bbox.center();
    let radius = (cx - plate_width as f64 / 2.0).hypot(cy - plate_height as f64 / 2.0);
    let limit = params.edge_radius_fraction * (plate_height as f64 / 2.0);
    if radius > limit {
        ScreenVerdict::EdgeArtifact
    } else {
        ScreenVerdict::Cluster
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plate_pipeline::common::BoundingBox;

    fn blob(area: u32, bbox: BoundingBox) -> Component {
        Component {
            label: 1,
            bbox,
            area,
            pixels: vec![(bbox.x, bbox.y)],
        }
    }

    #[test]
    fn size_bands() {
        let params = ScreeningParams::default();
        let center = BoundingBox::new(490, 490, 20, 20);
        assert_eq!(screen(&blob(49, center), 1000, 1000, &params), ScreenVerdict::Noise);
        assert_eq!(screen(&blob(50, center), 1000, 1000, &params), ScreenVerdict::Single);
        assert_eq!(screen(&blob(6000, center), 1000, 1000, &params), ScreenVerdict::Single);
        assert_eq!(screen(&blob(6001, center), 1000, 1000, &params), ScreenVerdict::Cluster);
    }

    #[test]
    fn oversized_blob_near_rim_is_artifact() {
        let params = ScreeningParams::default();
        // limit = 0.75 * 500 = 375; this center sits 400 px left of the middle.
        let rim = BoundingBox::new(90, 490, 20, 20);
        assert_eq!(screen(&blob(7000, rim), 1000, 1000, &params), ScreenVerdict::EdgeArtifact);
        let inside = BoundingBox::new(140, 490, 20, 20);
        assert_eq!(screen(&blob(7000, inside), 1000, 1000, &params), ScreenVerdict::Cluster);
        assert!(!ScreenVerdict::EdgeArtifact.is_kept());
        assert!(ScreenVerdict::Cluster.is_kept());
    }
}
