//! Connected-component labeling of binary plates.

mod flood_trace;
mod raster_scan;
pub mod types;

pub use flood_trace::trace_components;
pub use raster_scan::scan_components;
pub use types::{Component, ComponentLabeler, LabelingStrategy, label_map, ordinal_label_map};
