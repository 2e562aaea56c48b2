use image::{GrayImage, Luma};
use imageproc::definitions::Image;
use imageproc::region_labelling::Connectivity;
use tracing::{debug, instrument};

use crate::plate_pipeline::common::{BoundingBox, PixelPos};
use crate::plate_pipeline::labeling::{scan_components, trace_components};

/// One connected foreground region.
///
/// `pixels` are in raster order, so `pixels[0]` is the component's first
/// pixel and doubles as its representative point.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub label: u32,
    pub bbox: BoundingBox,
    pub area: u32,
    pub pixels: Vec<PixelPos>,
}

impl Component {
    pub(crate) fn from_pixels(label: u32, mut pixels: Vec<PixelPos>) -> Option<Self> {
        pixels.sort_unstable_by_key(|&(x, y)| (y, x));
        let bbox = BoundingBox::enclosing(&pixels)?;
        Some(Self {
            label,
            bbox,
            area: pixels.len() as u32,
            pixels,
        })
    }

    pub fn representative(&self) -> PixelPos {
        self.pixels[0]
    }

    pub fn centroid(&self) -> (f64, f64) {
        let n = self.pixels.len().max(1) as f64;
        let (sx, sy) = self
            .pixels
            .iter()
            .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x as f64, sy + y as f64));
        (sx / n, sy / n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelingStrategy {
    /// Seed a flood fill at every unvisited foreground pixel and paint the
    /// region away once collected. Yields each object as soon as found.
    #[default]
    FloodTrace,
    /// Dense two-pass label map, then per-label statistics.
    RasterScan,
}

#[derive(Debug, Clone, Copy)]
pub struct ComponentLabeler {
    pub strategy: LabelingStrategy,
    pub connectivity: Connectivity,
}

impl ComponentLabeler {
    pub fn new(strategy: LabelingStrategy, connectivity: Connectivity) -> Self {
        Self {
            strategy,
            connectivity,
        }
    }

    /// Labels `binary`. Labels run 1..=n in order of each component's first
    /// pixel, whichever strategy is used.
    #[instrument(skip(self, binary), fields(strategy = ?self.strategy))]
    pub fn label(&self, binary: &GrayImage) -> Vec<Component> {
        let components = match self.strategy {
            LabelingStrategy::FloodTrace => trace_components(binary.clone(), self.connectivity),
            LabelingStrategy::RasterScan => scan_components(binary, self.connectivity),
        };
        debug!(count = components.len(), "labeled components");
        components
    }
}

/// Dense label raster (0 = background) for `components`.
pub fn label_map<'a>(
    components: impl IntoIterator<Item = &'a Component>,
    width: u32,
    height: u32,
) -> Image<Luma<u32>> {
    let mut map = Image::<Luma<u32>>::new(width, height);
    for c in components {
        for &(x, y) in &c.pixels {
            map.put_pixel(x, y, Luma([c.label]));
        }
    }
    map
}

/// Dense label raster where the `n`-th component (in iteration order) is
/// painted `n`, starting at 1. Ids then follow the row order of a results
/// file rather than the labeler's numbering.
pub fn ordinal_label_map<'a>(
    components: impl IntoIterator<Item = &'a Component>,
    width: u32,
    height: u32,
) -> Image<Luma<u32>> {
    let mut map = Image::<Luma<u32>>::new(width, height);
    for (id, c) in (1u32..).zip(components) {
        for &(x, y) in &c.pixels {
            map.put_pixel(x, y, Luma([id]));
        }
    }
    map
}
