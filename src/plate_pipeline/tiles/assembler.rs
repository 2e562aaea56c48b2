use std::path::{Path, PathBuf};

use image::GrayImage;
use tracing::{debug, info, instrument, warn};

use crate::plate_pipeline::common::error::{AnalysisError, Result};
use crate::plate_pipeline::tiles::calibration::TileGrid;
use crate::plate_pipeline::tiles::reader::TileReader;

/// Fixed tile geometry and file naming of a scanner.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayout {
    pub tile_width: u32,
    pub tile_height: u32,
    /// Extension of `piece_<n>` tiles and of the `assembled` cache.
    pub extension: String,
    /// Write the assembled mosaic next to the tiles and reuse it next time.
    pub cache_assembled: bool,
}

impl Default for TileLayout {
    fn default() -> Self {
        Self {
            tile_width: 640,
            tile_height: 480,
            extension: "jpeg".to_string(),
            cache_assembled: true,
        }
    }
}

impl TileLayout {
    /// Pixel size of the assembled plate. Overflow is `InvalidDimensions`.
    pub fn mosaic_size(&self, grid: &TileGrid) -> Result<(u32, u32)> {
        match (
            self.tile_width.checked_mul(grid.columns),
            self.tile_height.checked_mul(grid.rows),
        ) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Ok((w, h)),
            _ => Err(AnalysisError::InvalidDimensions(grid.columns, grid.rows)),
        }
    }

    pub fn assembled_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("assembled.{}", self.extension))
    }
}

/// `piece_<index>.<ext>` inside `dir`.
pub fn tile_path(dir: &Path, index: u32, extension: &str) -> PathBuf {
    dir.join(format!("piece_{index}.{extension}"))
}

pub struct TileAssembler<'a, R: TileReader> {
    reader: &'a R,
    layout: &'a TileLayout,
}

impl<'a, R: TileReader> TileAssembler<'a, R> {
    pub fn new(reader: &'a R, layout: &'a TileLayout) -> Self {
        Self { reader, layout }
    }

    /// Loads the cached mosaic when present, otherwise builds it from the
    /// tiles (and caches it when the layout asks for it).
    #[instrument(skip(self, dir), fields(dir = %dir.display()))]
    pub fn assemble(&self, dir: &Path, grid: &TileGrid) -> Result<GrayImage> {
        grid.validate()?;
        let cache = self.layout.assembled_path(dir);
        let expected = self.layout.mosaic_size(grid)?;

        if self.reader.exists(&cache) {
            let cached = self.reader.read_tile(&cache)?;
            if cached.dimensions() == expected {
                info!(path = %cache.display(), "using cached mosaic");
                return Ok(cached);
            }
            warn!(
                path = %cache.display(),
                found = ?cached.dimensions(),
                ?expected,
                "cached mosaic has the wrong size, rebuilding"
            );
        }

        let mosaic = self.build(dir, grid)?;

        if self.layout.cache_assembled {
            mosaic
                .save(&cache)
                .map_err(|e| AnalysisError::EncodeError(format!("{}: {}", cache.display(), e)))?;
            debug!(path = %cache.display(), "cached mosaic");
        }
        Ok(mosaic)
    }

    /// Copies every tile into place. Any missing tile rejects the whole
    /// plate; a partially filled mosaic is never returned.
    pub fn build(&self, dir: &Path, grid: &TileGrid) -> Result<GrayImage> {
        grid.validate()?;
        let (width, height) = self.layout.mosaic_size(grid)?;

        // Check the full set first so a missing tile costs no decoding.
        let missing: Vec<PathBuf> = (1..=grid.tile_count())
            .map(|index| tile_path(dir, index, &self.layout.extension))
            .filter(|path| !self.reader.exists(path))
            .collect();
        if !missing.is_empty() {
            return Err(AnalysisError::MissingInput(format!(
                "{} of {} tiles missing, first: {}",
                missing.len(),
                grid.tile_count(),
                missing[0].display()
            )));
        }

        let mut mosaic = GrayImage::new(width, height);
        for j in 1..=grid.rows {
            for i in 1..=grid.columns {
                let index = i + grid.columns * (j - 1);
                let path = tile_path(dir, index, &self.layout.extension);
                let tile = self.reader.read_tile(&path)?;
                if tile.dimensions() != (self.layout.tile_width, self.layout.tile_height) {
                    return Err(AnalysisError::InvalidDimensions(tile.width(), tile.height()));
                }
                let x = self.layout.tile_width * (i - 1);
                let y = self.layout.tile_height * (j - 1);
                image::imageops::replace(&mut mosaic, &tile, x as i64, y as i64);
            }
        }
        debug!(width, height, tiles = grid.tile_count(), "assembled mosaic");
        Ok(mosaic)
    }
}
