//! Tab-delimited per-plate results files.
//!
//! Both variants carry `#` header lines with aggregate counts followed by
//! one row per blob. Loading checks the aggregates against the rows and
//! refuses the whole file on any mismatch. Saving first moves an existing
//! file aside to `historical.<n>.<name>`.

mod count_format;
mod gender_format;
mod rotation;
mod text;
mod types;

pub use rotation::{historical_path, rotate};
pub use types::{
    CountRecord, CountResults, GenderRecord, GenderResults, InspectionStatus, ResultsFile,
    ViewStatus, fuse,
};
