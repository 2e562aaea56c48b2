//! Raster helpers layered over `image`/`imageproc`.
//!
//! Binary rasters are `GrayImage`s holding only [`FOREGROUND`] and
//! [`BACKGROUND`]; everything else in the crate relies on that convention.

pub mod ops;

pub use ops::{
    BACKGROUND, FOREGROUND, blob_mask, flood_fill, gray_std_dev, invert, is_set, neighbors,
    outline, set_count,
};
