use std::path::Path;

use tracing::{info, warn};

use crate::plate_pipeline::classify::types::{Measurements, TrainingExemplar, WormClass};
use crate::plate_pipeline::common::error::{AnalysisError, Result};

/// Labelled exemplars read from a tab-separated file: a header line, then
/// `path  trueLen  e1  e2  fatness` rows. The class comes from the path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSet {
    pub exemplars: Vec<TrainingExemplar>,
}

impl TrainingSet {
    pub fn read(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(AnalysisError::MissingInput(format!(
                "training set {}",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path)?;
        let set = Self::parse(&text, &path.display().to_string())?;
        info!(
            path = %path.display(),
            male = set.count(WormClass::Male),
            herm = set.count(WormClass::Hermaphrodite),
            larva = set.count(WormClass::Larva),
            "loaded training set"
        );
        Ok(set)
    }

    pub fn parse(text: &str, origin: &str) -> Result<Self> {
        let mut exemplars = Vec::new();
        for (i, line) in text.lines().enumerate().skip(1) {
            let line_no = i + 1;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
            if fields.len() < 5 {
                return Err(AnalysisError::format(
                    origin,
                    line_no,
                    line,
                    format!("expected 5 columns, found {}", fields.len()),
                ));
            }
            let Some(class) = WormClass::from_path(fields[0]) else {
                warn!(line = line_no, source = fields[0], "no class marker in path, row skipped");
                continue;
            };
            let number = |col: usize, name: &str| -> Result<f64> {
                fields[col].parse::<f64>().map_err(|e| {
                    AnalysisError::format(origin, line_no, line, format!("{name}: {e}"))
                })
            };
            exemplars.push(TrainingExemplar {
                source: fields[0].to_string(),
                measurements: Measurements {
                    true_length: number(1, "trueLen")?,
                    e1: number(2, "e1")?,
                    e2: number(3, "e2")?,
                    fatness: number(4, "fatness")?,
                },
                class,
            });
        }
        Ok(Self { exemplars })
    }

    pub fn count(&self, class: WormClass) -> usize {
        self.exemplars.iter().filter(|e| e.class == class).count()
    }

    pub fn len(&self) -> usize {
        self.exemplars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exemplars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "path\ttrueLen\te1\te2\tfatness\n\
        /set/male/a.png\t800\t0.40\t0.70\t10\n\
        /set/herm/b.png\t1100\t0.60\t0.90\t14\n\
        \n\
        /set/unknown/c.png\t1\t1\t1\t1\n\
        /set/l3l4/d.png\t400\t0.55\t0.80\t8\n";

    #[test]
    fn rows_are_classified_by_path() {
        let set = TrainingSet::parse(SAMPLE, "train.txt").unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.count(WormClass::Male), 1);
        assert_eq!(set.count(WormClass::Larva), 1);
        let herm = &set.exemplars[1];
        assert_eq!(herm.class, WormClass::Hermaphrodite);
        assert_eq!(herm.measurements.true_length, 1100.0);
        assert_eq!(herm.measurements.fatness, 14.0);
    }

    #[test]
    fn bad_number_reports_line() {
        let text = "header\n/set/male/a.png\t800\t0.4\tabc\t10\n";
        match TrainingSet::parse(text, "train.txt") {
            Err(AnalysisError::Format { line, content, .. }) => {
                assert_eq!(line, 2);
                assert!(content.contains("abc"));
            }
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn short_row_is_a_format_error() {
        let text = "header\n/set/male/a.png\t800\n";
        assert!(matches!(
            TrainingSet::parse(text, "t"),
            Err(AnalysisError::Format { line: 2, .. })
        ));
    }

    #[test]
    fn missing_file_is_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            TrainingSet::read(&dir.path().join("none.txt")),
            Err(AnalysisError::MissingInput(_))
        ));
    }
}
