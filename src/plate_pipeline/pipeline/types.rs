use std::fmt;
use std::path::PathBuf;

use image::GrayImage;

use crate::plate_pipeline::classify::WormClass;
use crate::plate_pipeline::common::PipelineTimings;
use crate::plate_pipeline::diameter::DiameterProfile;
use crate::plate_pipeline::mask::{MatchedBlob, ScreeningStats};
use crate::plate_pipeline::morphometry::Morphometrics;
use crate::plate_pipeline::tiles::ScannerCalibration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Count,
    Gender,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Variant::Count => "count",
            Variant::Gender => "gender",
        })
    }
}

/// A plate after assembly, segmentation, labelling and screening.
#[derive(Debug, Clone)]
pub struct PlateDetection {
    pub dir: PathBuf,
    pub calibration: ScannerCalibration,
    pub plate: GrayImage,
    /// Components found before screening.
    pub components: usize,
    pub blobs: Vec<MatchedBlob>,
    pub stats: ScreeningStats,
}

/// Working state of one blob through the gender variant.
#[derive(Debug, Clone)]
pub struct Blob {
    pub matched: MatchedBlob,
    pub morphometrics: Option<Morphometrics>,
    pub diameters: Option<DiameterProfile>,
    pub class: Option<WormClass>,
    pub suspicious: bool,
}

/// Summary of one processed plate.
#[derive(Debug, Clone)]
pub struct PlateReport {
    pub dir: PathBuf,
    pub variant: Variant,
    /// Rows written to the results file.
    pub records: usize,
    /// Worms for the count variant, classified worms for the gender variant.
    pub worms: u64,
    pub males: u64,
    pub herms: u64,
    pub suspicious: usize,
    /// Blobs dropped during measurement.
    pub rejected: usize,
    pub stats: ScreeningStats,
    pub results_path: PathBuf,
    pub timings: PipelineTimings,
}
