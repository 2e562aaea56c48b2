use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Local, Timelike};
use tracing::{debug, info};

use crate::plate_pipeline::common::BoundingBox;
use crate::plate_pipeline::common::error::{AnalysisError, Result};
use crate::plate_pipeline::results::rotation::rotate;

/// Serialization shared by both results variants.
pub trait ResultsFile: Sized {
    /// Default file name inside a plate directory.
    const FILE_NAME: &'static str;

    fn to_text(&self) -> String;

    /// Parses and validates a results file body. `origin` names the source
    /// in error messages.
    fn parse(text: &str, origin: &str) -> Result<Self>;

    /// Writes to `path`, first rotating any existing file there. Returns
    /// where the previous file went.
    fn save(&self, path: &Path) -> Result<Option<PathBuf>> {
        let rotated = rotate(path)?;
        fs::write(path, self.to_text())?;
        info!(path = %path.display(), rotated = ?rotated, "saved results");
        Ok(rotated)
    }

    fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(AnalysisError::MissingInput(format!(
                "results file {}",
                path.display()
            )));
        }
        let text = fs::read_to_string(path)?;
        let parsed = Self::parse(&text, &path.display().to_string())?;
        debug!(path = %path.display(), "loaded results");
        Ok(parsed)
    }
}

/// One blob of the count variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountRecord {
    pub bbox: BoundingBox,
    pub n_worms: u32,
    pub area: u32,
    /// Mask region the blob lies in.
    pub label: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountResults {
    pub single_worm_area: f64,
    pub records: Vec<CountRecord>,
}

impl CountResults {
    pub fn particle_count(&self) -> u64 {
        self.records.iter().map(|r| r.n_worms as u64).sum()
    }

    pub fn component_count(&self) -> u64 {
        self.records.len() as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InspectionStatus {
    Inspected,
    #[default]
    NotInspected,
}

impl fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InspectionStatus::Inspected => "Inspected",
            InspectionStatus::NotInspected => "Not Inspected",
        })
    }
}

impl FromStr for InspectionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "Inspected" => Ok(InspectionStatus::Inspected),
            "Not Inspected" => Ok(InspectionStatus::NotInspected),
            other => Err(format!("unknown status {other:?}")),
        }
    }
}

/// One blob of the gender variant.
#[derive(Debug, Clone, PartialEq)]
pub struct GenderRecord {
    pub bbox: BoundingBox,
    pub n_herm: u32,
    pub n_male: u32,
    /// Micrometers.
    pub true_length: f64,
    pub fatness: f64,
    pub e1: f64,
    pub e2: f64,
    pub mask_image_id: u32,
    pub suspicious: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenderResults {
    pub last_update: DateTime<FixedOffset>,
    pub status: InspectionStatus,
    pub records: Vec<GenderRecord>,
}

impl GenderResults {
    /// Results stamped with the current local time, to the second.
    pub fn new(records: Vec<GenderRecord>, status: InspectionStatus) -> Self {
        let now = Local::now().fixed_offset();
        Self {
            last_update: now.with_nanosecond(0).unwrap_or(now),
            status,
            records,
        }
    }

    pub fn herm_count(&self) -> u64 {
        self.records.iter().map(|r| r.n_herm as u64).sum()
    }

    pub fn male_count(&self) -> u64 {
        self.records.iter().map(|r| r.n_male as u64).sum()
    }

    /// Applies a reviewer's overlay, one status per record in order, and
    /// marks the result inspected. Records without a status are kept as is.
    pub fn fused(&self, overlay: &[ViewStatus]) -> GenderResults {
        let records = self
            .records
            .iter()
            .enumerate()
            .filter_map(|(i, r)| fuse(r, overlay.get(i).unwrap_or(&ViewStatus::Nothing)))
            .collect();
        GenderResults::new(records, InspectionStatus::Inspected)
    }
}

/// Reviewer's verdict layered over a [`GenderRecord`] without touching it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus {
    Male,
    Hermaphrodite,
    Larva,
    Deleted,
    Suspicious,
    Multiple { males: u32, herms: u32 },
    /// No verdict; the record stands.
    Nothing,
}

impl ViewStatus {
    /// Status a reviewer starts from for `record`.
    pub fn initial(record: &GenderRecord) -> ViewStatus {
        match (record.suspicious, record.n_male, record.n_herm) {
            (true, _, _) => ViewStatus::Suspicious,
            (false, 0, 0) => ViewStatus::Larva,
            (false, 1, 0) => ViewStatus::Male,
            (false, 0, 1) => ViewStatus::Hermaphrodite,
            (false, males, herms) => ViewStatus::Multiple { males, herms },
        }
    }
}

/// The record as it should be persisted under `status`, or `None` when the
/// reviewer deleted it.
pub fn fuse(record: &GenderRecord, status: &ViewStatus) -> Option<GenderRecord> {
    let with = |n_male: u32, n_herm: u32| GenderRecord {
        n_male,
        n_herm,
        suspicious: false,
        ..record.clone()
    };
    match *status {
        ViewStatus::Male => Some(with(1, 0)),
        ViewStatus::Hermaphrodite => Some(with(0, 1)),
        ViewStatus::Larva => Some(with(0, 0)),
        ViewStatus::Multiple { males, herms } => Some(with(males, herms)),
        ViewStatus::Deleted => None,
        ViewStatus::Suspicious => Some(GenderRecord {
            suspicious: true,
            ..record.clone()
        }),
        ViewStatus::Nothing => Some(record.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n_male: u32, n_herm: u32, suspicious: bool) -> GenderRecord {
        GenderRecord {
            bbox: BoundingBox::new(10, 20, 30, 8),
            n_herm,
            n_male,
            true_length: 950.5,
            fatness: 11.25,
            e1: 0.5,
            e2: 0.75,
            mask_image_id: 2,
            suspicious,
        }
    }

    #[test]
    fn initial_status_fuses_back_to_the_record() {
        for r in [
            record(1, 0, false),
            record(0, 1, false),
            record(0, 0, false),
            record(2, 3, false),
            record(0, 0, true),
        ] {
            assert_eq!(fuse(&r, &ViewStatus::initial(&r)), Some(r.clone()));
        }
    }

    #[test]
    fn overrides_replace_counts_only() {
        let r = record(0, 1, true);
        let m = fuse(&r, &ViewStatus::Male).unwrap();
        assert_eq!((m.n_male, m.n_herm, m.suspicious), (1, 0, false));
        assert_eq!(m.true_length, r.true_length);
        assert_eq!(m.bbox, r.bbox);
        assert_eq!(fuse(&r, &ViewStatus::Deleted), None);
        let multi = fuse(&r, &ViewStatus::Multiple { males: 2, herms: 1 }).unwrap();
        assert_eq!((multi.n_male, multi.n_herm), (2, 1));
    }

    #[test]
    fn fused_results_are_inspected_and_drop_deleted() {
        let results = GenderResults::new(
            vec![record(1, 0, false), record(0, 1, false), record(0, 0, true)],
            InspectionStatus::NotInspected,
        );
        let fused = results.fused(&[ViewStatus::Deleted, ViewStatus::Nothing]);
        assert_eq!(fused.status, InspectionStatus::Inspected);
        assert_eq!(fused.records.len(), 2);
        assert_eq!(fused.herm_count(), 1);
        assert!(fused.records[1].suspicious);
        assert_eq!(results.records.len(), 3);
    }

    #[test]
    fn status_text_round_trips() {
        for s in [InspectionStatus::Inspected, InspectionStatus::NotInspected] {
            assert_eq!(s.to_string().parse::<InspectionStatus>(), Ok(s));
        }
        assert!("done".parse::<InspectionStatus>().is_err());
    }
}
