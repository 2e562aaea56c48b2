//! Worm counting and sex classification for tiled nematode plate scans.
//!
//! The [`plate_pipeline`] module holds the analysis stages: tile assembly,
//! segmentation, component labeling, mask matching, morphometrics, diameter
//! profiling, Mahalanobis classification, worm-count estimation and the
//! results text store.

pub mod logger;
pub mod plate_pipeline;
