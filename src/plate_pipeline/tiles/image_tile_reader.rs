//! Tile reader backed by the `image` crate.
//!
//! Any format `image` can decode is accepted; color tiles are reduced to
//! luma on load.

use std::path::Path;

use tracing::debug;

use crate::plate_pipeline::common::error::{AnalysisError, Result};
use crate::plate_pipeline::tiles::reader::TileReader;

pub struct ImageTileReader;

impl TileReader for ImageTileReader {
    fn read_tile(&self, path: &Path) -> Result<image::GrayImage> {
        if !path.is_file() {
            return Err(AnalysisError::MissingInput(path.display().to_string()));
        }
        let decoded = image::open(path)
            .map_err(|e| AnalysisError::DecodeError(format!("{}: {}", path.display(), e)))?;
        debug!(
            path = %path.display(),
            width = decoded.width(),
            height = decoded.height(),
            "decoded tile"
        );
        Ok(decoded.to_luma8())
    }
}
