use std::path::Path;

use image::GrayImage;

use crate::plate_pipeline::common::error::Result;

/// Source of 8-bit gray tiles. The default implementation decodes files
/// from disk; tests substitute in-memory tiles.
pub trait TileReader {
    fn read_tile(&self, path: &Path) -> Result<GrayImage>;

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}
