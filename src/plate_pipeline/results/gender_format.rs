use std::fmt::Write;

use chrono::{DateTime, FixedOffset, SecondsFormat};

use crate::plate_pipeline::common::BoundingBox;
use crate::plate_pipeline::common::error::Result;
use crate::plate_pipeline::results::text::{Row, Sections};
use crate::plate_pipeline::results::types::{
    GenderRecord, GenderResults, InspectionStatus, ResultsFile,
};

const LAST_UPDATE: &str = "Last update";
const HERM_COUNT: &str = "Herm count";
const MALE_COUNT: &str = "Male count";
const STATUS: &str = "Status";
const COLUMNS: [&str; 12] = [
    "pX",
    "pY",
    "width",
    "height",
    "nHerm",
    "nMale",
    "trueLen",
    "fatness",
    "e1",
    "e2",
    "maskImageId",
    "suspiciousFlag",
];

impl ResultsFile for GenderResults {
    const FILE_NAME: &'static str = "worm_gender.txt";

    fn to_text(&self) -> String {
        let mut out = String::new();
        let stamp = self.last_update.to_rfc3339_opts(SecondsFormat::Secs, false);
        let _ = writeln!(out, "# {LAST_UPDATE}: {stamp}");
        let _ = writeln!(out, "# {HERM_COUNT}: {}", self.herm_count());
        let _ = writeln!(out, "# {MALE_COUNT}: {}", self.male_count());
        let _ = writeln!(out, "# {STATUS}: {}", self.status);
        let _ = writeln!(out, "# {}", COLUMNS.join("\t"));
        for r in &self.records {
            let _ = writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                r.bbox.x,
                r.bbox.y,
                r.bbox.width,
                r.bbox.height,
                r.n_herm,
                r.n_male,
                r.true_length,
                r.fatness,
                r.e1,
                r.e2,
                r.mask_image_id,
                u8::from(r.suspicious)
            );
        }
        out
    }

    fn parse(text: &str, origin: &str) -> Result<Self> {
        let sections = Sections::split(text, origin);
        let last_update: DateTime<FixedOffset> = sections.header(LAST_UPDATE)?;
        let herms: u64 = sections.header(HERM_COUNT)?;
        let males: u64 = sections.header(MALE_COUNT)?;
        let status: InspectionStatus = sections.header(STATUS)?;

        let mut records = Vec::with_capacity(sections.rows.len());
        for &(line_no, line) in &sections.rows {
            let row = Row::new(origin, line_no, line, COLUMNS.len())?;
            records.push(GenderRecord {
                bbox: BoundingBox::new(
                    row.get(0, "pX")?,
                    row.get(1, "pY")?,
                    row.get(2, "width")?,
                    row.get(3, "height")?,
                ),
                n_herm: row.get(4, "nHerm")?,
                n_male: row.get(5, "nMale")?,
                true_length: row.get(6, "trueLen")?,
                fatness: row.get(7, "fatness")?,
                e1: row.get(8, "e1")?,
                e2: row.get(9, "e2")?,
                mask_image_id: row.get(10, "maskImageId")?,
                suspicious: row.flag(11, "suspiciousFlag")?,
            });
        }
        let results = GenderResults {
            last_update,
            status,
            records,
        };
        sections.check_count(HERM_COUNT, herms, results.herm_count())?;
        sections.check_count(MALE_COUNT, males, results.male_count())?;
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plate_pipeline::common::error::AnalysisError;

    fn sample() -> GenderResults {
        let rec = |x, n_herm, n_male, suspicious| GenderRecord {
            bbox: BoundingBox::new(x, 40, 25, 9),
            n_herm,
            n_male,
            true_length: 1023.7,
            fatness: 12.125,
            e1: 0.4142,
            e2: 0.8,
            mask_image_id: 1,
            suspicious,
        };
        GenderResults::new(
            vec![rec(5, 1, 0, false), rec(90, 0, 1, false), rec(180, 0, 0, true), rec(260, 2, 1, false)],
            InspectionStatus::NotInspected,
        )
    }

    #[test]
    fn header_totals_match_rows() {
        let results = sample();
        let text = results.to_text();
        assert!(text.contains("# Herm count: 3\n"));
        assert!(text.contains("# Male count: 2\n"));
        assert!(text.contains("# Status: Not Inspected\n"));
        assert!(text.contains("\t1023.7\t12.125\t0.4142\t0.8\t1\t1\n"));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(GenderResults::FILE_NAME);
        let results = sample();
        results.save(&path).unwrap();
        assert_eq!(GenderResults::load(&path).unwrap(), results);
    }

    #[test]
    fn inspected_status_survives_reload() {
        let mut results = sample();
        results.status = InspectionStatus::Inspected;
        let parsed = GenderResults::parse(&results.to_text(), "x").unwrap();
        assert_eq!(parsed.status, InspectionStatus::Inspected);
    }

    #[test]
    fn male_mismatch_loads_nothing() {
        let text = sample()
            .to_text()
            .replace("# Male count: 2", "# Male count: 3");
        assert!(matches!(
            GenderResults::parse(&text, "x"),
            Err(AnalysisError::CountMismatch {
                field: "Male count",
                ..
            })
        ));
    }

    #[test]
    fn bad_flag_is_a_format_error() {
        let text = sample().to_text().replacen("\t1\t1\n", "\t1\tmaybe\n", 1);
        assert!(matches!(
            GenderResults::parse(&text, "x"),
            Err(AnalysisError::Format { .. })
        ));
    }
}
