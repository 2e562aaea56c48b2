//! Foreground/background segmentation of the assembled plate.

mod adaptive;
mod border;
mod global;
pub mod types;

pub use adaptive::threshold_adaptive;
pub use border::clear_border;
pub use global::{
    HARDWIRED_THRESHOLD, HARDWIRED_TRIGGER_MODE, STANDARD_THRESHOLD, background_mode,
    global_threshold, histogram, threshold_global,
};
pub use types::{AdaptiveParams, SegmentationMethod, Segmenter};
