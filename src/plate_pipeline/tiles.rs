//! Tile loading, plate log parsing and mosaic assembly.

mod assembler;
pub mod calibration;
mod image_tile_reader;
mod reader;

pub use assembler::{TileAssembler, TileLayout, tile_path};
pub use calibration::{LOG_FILE_NAME, MAX_TILES, PlateLog, ScannerCalibration, TileGrid};
pub use image_tile_reader::ImageTileReader;
pub use reader::TileReader;
