use image::GrayImage;
use imageproc::region_labelling::Connectivity;

use crate::plate_pipeline::labeling::types::Component;
use crate::plate_pipeline::raster::{BACKGROUND, flood_fill};

/// Consumes `binary`: each region is painted background as soon as it has
/// been collected, so no pixel can be counted twice.
pub fn trace_components(mut binary: GrayImage, conn: Connectivity) -> Vec<Component> {
    let (width, height) = binary.dimensions();
    let mut components = Vec::new();
    for y in 0..height {
        for x in 0..width {
            if binary.get_pixel(x, y)[0] == BACKGROUND {
                continue;
            }
            let pixels = flood_fill(&mut binary, (x, y), conn, BACKGROUND);
            let label = components.len() as u32 + 1;
            if let Some(component) = Component::from_pixels(label, pixels) {
                components.push(component);
            }
        }
    }
    components
}
