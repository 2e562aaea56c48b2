//! Plate analysis pipeline
//!
//! Stages, leaf first: tile assembly, segmentation, component labeling,
//! mask matching, morphometry, diameter profiling, classification or worm
//! counting, and the results store. [`PlatePipeline`] strings them together
//! for one plate directory; [`run_batch`] folds it over many.

pub mod classify;
pub mod common;
pub mod config;
pub mod counting;
pub mod diameter;
pub mod labeling;
pub mod mask;
pub mod morphometry;
pub mod output;
pub mod pipeline;
pub mod raster;
pub mod results;
pub mod segment;
pub mod tiles;

pub use common::{AnalysisError, BoundingBox, PipelineTimings, PixelPos, Result};

pub use config::{AnalysisConfig, AnalysisConfigBuilder, MaskSource, OutputParams};

pub use tiles::{ImageTileReader, PlateLog, ScannerCalibration, TileLayout, TileReader};

pub use segment::{AdaptiveParams, SegmentationMethod, Segmenter};

pub use labeling::{Component, ComponentLabeler, LabelingStrategy};

pub use mask::{MaskMatcher, MatchedBlob, RegionMask, ScreenVerdict, ScreeningParams};

pub use morphometry::{MorphometricExtractor, Morphometrics, MorphometryParams, Rejection};

pub use diameter::{Checkpoint, DiameterParams, DiameterProfile, DiameterProfiler};

pub use classify::{
    ClassifierModel, FeatureSet, FeatureVector, Measurements, TrainingExemplar, TrainingSet,
    WormClass, classify, train,
};

pub use counting::WormCountEstimator;

pub use results::{
    CountRecord, CountResults, GenderRecord, GenderResults, InspectionStatus, ResultsFile,
    ViewStatus, fuse,
};

pub use output::{Annotator, LabelMapWriter, TiffCompression, TiffLabelMapWriter};

pub use pipeline::{
    BatchReport, CancelToken, PlateDirs, PlateFailure, PlateReport, PlatePipeline, Variant,
    run_batch,
};
