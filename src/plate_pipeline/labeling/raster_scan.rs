use std::collections::HashMap;

use image::{GrayImage, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};

use crate::plate_pipeline::labeling::types::Component;
use crate::plate_pipeline::raster::BACKGROUND;

/// Two-pass union-find labeling via `imageproc`, relabelled by first
/// appearance in raster order.
pub fn scan_components(binary: &GrayImage, conn: Connectivity) -> Vec<Component> {
    let labels = connected_components(binary, conn, Luma([BACKGROUND]));

    let mut order: HashMap<u32, usize> = HashMap::new();
    let mut groups: Vec<Vec<(u32, u32)>> = Vec::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let raw = label[0];
        if raw == 0 {
            continue;
        }
        let slot = *order.entry(raw).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push((x, y));
    }

    groups
        .into_iter()
        .enumerate()
        .filter_map(|(i, pixels)| Component::from_pixels(i as u32 + 1, pixels))
        .collect()
}
