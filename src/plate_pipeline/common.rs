//! Common utilities module
//!
//! Error type, stage timing and the small geometry types shared by every stage.

pub mod error;
pub mod geometry;
pub mod timing;

pub use error::{AnalysisError, Result};
pub use geometry::{BoundingBox, PixelPos};
pub use timing::{PipelineTimings, StepTiming, Timer};
