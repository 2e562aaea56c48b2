//! Cross-section widths along a worm's medial curve.
//!
//! Two chords are cut perpendicular to the skeleton at checkpoints measured
//! from each end, plus a reference chord at mid-length. Their ratios to the
//! reference width, smaller first, are the shape features the classifier
//! sees. Male tails are slimmer than hermaphrodite tails, which is what the
//! ratio pair picks up.

mod profiler;
mod types;

pub use profiler::DiameterProfiler;
pub use types::{Checkpoint, DiameterParams, DiameterProfile};
