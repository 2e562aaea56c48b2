use std::fmt::Write;

use crate::plate_pipeline::common::BoundingBox;
use crate::plate_pipeline::common::error::Result;
use crate::plate_pipeline::results::text::{Row, Sections};
use crate::plate_pipeline::results::types::{CountRecord, CountResults, ResultsFile};

const PARTICLE_COUNT: &str = "Particle Count";
const SINGLE_WORM_AREA: &str = "Single Worm Area";
const COMPONENT_COUNT: &str = "Component Count";
const COLUMNS: [&str; 7] = ["pX", "pY", "width", "height", "nWorm", "area", "label"];

impl ResultsFile for CountResults {
    const FILE_NAME: &'static str = "worm_count.txt";

    fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# {PARTICLE_COUNT}: {}", self.particle_count());
        let _ = writeln!(out, "# {SINGLE_WORM_AREA}: {}", self.single_worm_area);
        let _ = writeln!(out, "# {COMPONENT_COUNT}: {}", self.component_count());
        let _ = writeln!(out, "# {}", COLUMNS.join("\t"));
        for r in &self.records {
            let _ = writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                r.bbox.x, r.bbox.y, r.bbox.width, r.bbox.height, r.n_worms, r.area, r.label
            );
        }
        out
    }

    fn parse(text: &str, origin: &str) -> Result<Self> {
        let sections = Sections::split(text, origin);
        let particles: u64 = sections.header(PARTICLE_COUNT)?;
        let components: u64 = sections.header(COMPONENT_COUNT)?;
        let single_worm_area: f64 = sections.header(SINGLE_WORM_AREA)?;

        let mut records = Vec::with_capacity(sections.rows.len());
        for &(line_no, line) in &sections.rows {
            let row = Row::new(origin, line_no, line, COLUMNS.len())?;
            records.push(CountRecord {
                bbox: BoundingBox::new(
                    row.get(0, "pX")?,
                    row.get(1, "pY")?,
                    row.get(2, "width")?,
                    row.get(3, "height")?,
                ),
                n_worms: row.get(4, "nWorm")?,
                area: row.get(5, "area")?,
                label: row.get(6, "label")?,
            });
        }
        let results = CountResults {
            single_worm_area,
            records,
        };
        sections.check_count(COMPONENT_COUNT, components, results.component_count())?;
        sections.check_count(PARTICLE_COUNT, particles, results.particle_count())?;
        Ok(results)
    }
}
