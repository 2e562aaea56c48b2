//! Plate-level orchestration: one directory in, results files out, and a
//! batch fold over many directories.

mod batch;
mod plate;
mod types;


pub use batch::{BatchReport, CancelToken, PlateDirs, PlateFailure, run_batch};
pub use plate::PlatePipeline;
pub use types::{Blob, PlateDetection, PlateReport, Variant};
