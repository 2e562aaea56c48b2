//! Per-blob shape measurements: closing, outline, skeleton, spur pruning,
//! tail extension, end/branch points, pixel and calibrated length, fatness.

mod extension;
mod extractor;
mod length;
pub mod path;
mod pruning;
mod skeleton;
pub mod topology;
pub mod types;

pub use extension::extend_tails;
pub use extractor::MorphometricExtractor;
pub use length::{path_length, pixel_length, true_length};
pub use pruning::prune_spurs;
pub use skeleton::thin;
pub use types::{Morphometrics, MorphometryParams, Rejection};
