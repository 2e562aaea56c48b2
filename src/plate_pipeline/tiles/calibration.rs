//! Per-plate scanner log (`thelog.txt`).
//!
//! Header lines start with `#` and carry `key value` pairs (the separator
//! may be `:`, `=`, a tab or spaces). Recognised keys:
//!
//! * `StepsPerPixelsX`, `StepsPerPixelsY`: stage steps per image pixel, required.
//! * `MicronsPerStep`: stage step size, optional.
//! * `Columns`, `Rows`: tile grid, optional.
//!
//! Other lines of the form `piece_<n> <stageX> <stageY>` record where each
//! tile was shot. When the grid is not declared it is the number of distinct
//! stage X and Y positions.

use std::path::Path;

use tracing::{debug, trace};

use crate::plate_pipeline::common::error::{AnalysisError, Result};

pub const LOG_FILE_NAME: &str = "thelog.txt";

/// Stage positions closer than this are the same column/row.
const POSITION_TOLERANCE: f64 = 1e-6;

/// Largest tile grid a plate log may declare.
pub const MAX_TILES: u32 = 4096;

/// Converts pixel steps to physical distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScannerCalibration {
    pub steps_per_pixel_x: f64,
    pub steps_per_pixel_y: f64,
    pub microns_per_step: f64,
}

impl ScannerCalibration {
    pub fn new(steps_per_pixel_x: f64, steps_per_pixel_y: f64, microns_per_step: f64) -> Self {
        Self {
            steps_per_pixel_x,
            steps_per_pixel_y,
            microns_per_step,
        }
    }

    /// One pixel on each axis is one micron.
    pub fn unit() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    pub fn microns_per_pixel_x(&self) -> f64 {
        self.steps_per_pixel_x * self.microns_per_step
    }

    pub fn microns_per_pixel_y(&self) -> f64 {
        self.steps_per_pixel_y * self.microns_per_step
    }

    /// Physical length of a pixel displacement `(dx, dy)`.
    pub fn distance(&self, dx: f64, dy: f64) -> f64 {
        (dx * self.microns_per_pixel_x()).hypot(dy * self.microns_per_pixel_y())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    pub columns: u32,
    pub rows: u32,
}

impl TileGrid {
    /// Number of tiles. Saturates for grids that [`TileGrid::validate`]
    /// would reject.
    pub fn tile_count(&self) -> u32 {
        self.columns.saturating_mul(self.rows)
    }

    /// Rejects empty grids and grids of more than [`MAX_TILES`] tiles.
    pub fn validate(&self) -> Result<u32> {
        match self.columns.checked_mul(self.rows) {
            Some(n) if n > 0 && n <= MAX_TILES => Ok(n),
            _ => Err(AnalysisError::InvalidDimensions(self.columns, self.rows)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlateLog {
    pub calibration: ScannerCalibration,
    pub grid: TileGrid,
}

impl PlateLog {
    pub fn read(path: &Path, default_microns_per_step: f64) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AnalysisError::MissingInput(path.display().to_string())
            } else {
                AnalysisError::IoError(e)
            }
        })?;
        Self::parse(&text, &path.display().to_string(), default_microns_per_step)
    }

    pub fn parse(text: &str, origin: &str, default_microns_per_step: f64) -> Result<Self> {
        let mut spp_x = None;
        let mut spp_y = None;
        let mut mps = None;
        let mut columns = None;
        let mut rows = None;
        let mut positions: Vec<(f64, f64)> = Vec::new();

        for (i, raw) in text.lines().enumerate() {
            let line_no = i + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(header) = line.strip_prefix('#') {
                let Some((key, value)) = split_key_value(header) else {
                    continue;
                };
                let number = || {
                    value.parse::<f64>().map_err(|_| {
                        AnalysisError::format(origin, line_no, raw, format!("'{key}' is not a number"))
                    })
                };
                match key.to_ascii_lowercase().as_str() {
                    "stepsperpixelsx" | "stepsperpixelx" => spp_x = Some(number()?),
                    "stepsperpixelsy" | "stepsperpixely" => spp_y = Some(number()?),
                    "micronsperstep" => mps = Some(number()?),
                    "columns" => columns = Some(parse_count(value, origin, line_no, raw)?),
                    "rows" => rows = Some(parse_count(value, origin, line_no, raw)?),
                    other => trace!(key = other, "ignoring log header"),
                }
                continue;
            }

            let mut fields = line.split_whitespace();
            let (Some(name), Some(sx), Some(sy)) = (fields.next(), fields.next(), fields.next())
            else {
                continue;
            };
            if !name.starts_with("piece_") {
                continue;
            }
            match (sx.parse::<f64>(), sy.parse::<f64>()) {
                (Ok(sx), Ok(sy)) => positions.push((sx, sy)),
                _ => {
                    return Err(AnalysisError::format(
                        origin,
                        line_no,
                        raw,
                        "tile position is not numeric",
                    ));
                }
            }
        }

        let calibration = validate_calibration(origin, spp_x, spp_y, mps, default_microns_per_step)?;

        let grid = match (columns, rows) {
            (Some(columns), Some(rows)) => TileGrid { columns, rows },
            _ if !positions.is_empty() => {
                let grid = TileGrid {
                    columns: columns.unwrap_or_else(|| distinct(positions.iter().map(|p| p.0))),
                    rows: rows.unwrap_or_else(|| distinct(positions.iter().map(|p| p.1))),
                };
                debug!(
                    columns = grid.columns,
                    rows = grid.rows,
                    tiles = positions.len(),
                    "derived tile grid from stage positions"
                );
                grid
            }
            _ => {
                return Err(AnalysisError::MissingInput(format!(
                    "{origin}: no tile grid (need #Columns/#Rows or piece positions)"
                )));
            }
        };
        grid.validate()?;

        Ok(PlateLog { calibration, grid })
    }
}

fn split_key_value(header: &str) -> Option<(&str, &str)> {
    let header = header.trim();
    let split = header.find(|c: char| c == ':' || c == '=' || c.is_whitespace())?;
    let key = header[..split].trim();
    let value = header[split..]
        .trim_start_matches(|c: char| c == ':' || c == '=' || c.is_whitespace())
        .trim();
    (!key.is_empty() && !value.is_empty()).then_some((key, value))
}

fn parse_count(value: &str, origin: &str, line_no: usize, raw: &str) -> Result<u32> {
    value
        .parse::<u32>()
        .map_err(|_| AnalysisError::format(origin, line_no, raw, "grid size is not an integer"))
}

fn validate_calibration(
    origin: &str,
    spp_x: Option<f64>,
    spp_y: Option<f64>,
    mps: Option<f64>,
    default_mps: f64,
) -> Result<ScannerCalibration> {
    let positive = |name: &str, v: Option<f64>| match v {
        None => Err(AnalysisError::CalibrationMissing {
            path: origin.to_string(),
            reason: format!("{name} not declared"),
        }),
        Some(v) if !(v.is_finite() && v > 0.0) => Err(AnalysisError::CalibrationMissing {
            path: origin.to_string(),
            reason: format!("{name} must be positive, got {v}"),
        }),
        Some(v) => Ok(v),
    };
    let x = positive("StepsPerPixelsX", spp_x)?;
    let y = positive("StepsPerPixelsY", spp_y)?;
    let mps = positive("MicronsPerStep", Some(mps.unwrap_or(default_mps)))?;
    Ok(ScannerCalibration::new(x, y, mps))
}

fn distinct(values: impl Iterator<Item = f64>) -> u32 {
    let mut values: Vec<f64> = values.collect();
    values.sort_by(|a, b| a.total_cmp(b));
    values.dedup_by(|a, b| (*a - *b).abs() < POSITION_TOLERANCE);
    values.len() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_grid_and_calibration() {
        let text = "#StepsPerPixelsX: 2.5\n#StepsPerPixelsY=3\n#MicronsPerStep\t0.5\n#Columns 4\n#Rows 3\n";
        let log = PlateLog::parse(text, "thelog.txt", 1.0).unwrap();
        assert_eq!(log.grid, TileGrid { columns: 4, rows: 3 });
        assert_eq!(log.calibration, ScannerCalibration::new(2.5, 3.0, 0.5));
        assert_eq!(log.calibration.microns_per_pixel_x(), 1.25);
    }

    #[test]
    fn grid_from_stage_positions() {
        let text = "#StepsPerPixelsX 1\n#StepsPerPixelsY 1\n\
                    piece_1 0 0\npiece_2 640 0\npiece_3 1280 0\n\
                    piece_4 0 480\npiece_5 640 480\npiece_6 1280 480\n";
        let log = PlateLog::parse(text, "thelog.txt", 1.0).unwrap();
        assert_eq!(log.grid, TileGrid { columns: 3, rows: 2 });
        assert_eq!(log.calibration.microns_per_step, 1.0);
    }

    #[test]
    fn missing_step_value_rejects_plate() {
        let text = "#StepsPerPixelsX 1\n#Columns 1\n#Rows 1\n";
        let err = PlateLog::parse(text, "thelog.txt", 1.0).unwrap_err();
        assert!(matches!(err, AnalysisError::CalibrationMissing { .. }));
    }

    #[test]
    fn zero_step_value_rejects_plate() {
        let text = "#StepsPerPixelsX 0\n#StepsPerPixelsY 1\n#Columns 1\n#Rows 1\n";
        let err = PlateLog::parse(text, "thelog.txt", 1.0).unwrap_err();
        assert!(matches!(err, AnalysisError::CalibrationMissing { .. }));
    }

    #[test]
    fn oversized_grid_rejects_plate() {
        let text = "#StepsPerPixelsX 1\n#StepsPerPixelsY 1\n#Columns 100000\n#Rows 100000\n";
        let err = PlateLog::parse(text, "thelog.txt", 1.0).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidDimensions(100000, 100000)));

        let text = "#StepsPerPixelsX 1\n#StepsPerPixelsY 1\n#Columns 65\n#Rows 64\n";
        assert!(PlateLog::parse(text, "thelog.txt", 1.0).is_err());
        let text = "#StepsPerPixelsX 1\n#StepsPerPixelsY 1\n#Columns 64\n#Rows 64\n";
        assert_eq!(PlateLog::parse(text, "thelog.txt", 1.0).unwrap().grid.tile_count(), MAX_TILES);
    }

    #[test]
    fn zero_rows_rejects_plate() {
        let text = "#StepsPerPixelsX 1\n#StepsPerPixelsY 1\n#Columns 3\n#Rows 0\n";
        let err = PlateLog::parse(text, "thelog.txt", 1.0).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidDimensions(3, 0)));
    }

    #[test]
    fn bad_number_reports_line() {
        let text = "#StepsPerPixelsX 1\n#StepsPerPixelsY abc\n";
        match PlateLog::parse(text, "thelog.txt", 1.0).unwrap_err() {
            AnalysisError::Format { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn no_grid_is_missing_input() {
        let text = "#StepsPerPixelsX 1\n#StepsPerPixelsY 1\n";
        let err = PlateLog::parse(text, "thelog.txt", 1.0).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingInput(_)));
    }

    #[test]
    fn diagonal_distance_uses_both_axes() {
        let cal = ScannerCalibration::new(3.0, 4.0, 1.0);
        assert!((cal.distance(1.0, 1.0) - 5.0).abs() < 1e-12);
    }
}
