//! Size screening and reference-mask region assignment.

mod matcher;
mod region_mask;
mod screening;

pub use matcher::{MaskMatcher, MatchedBlob, ScreeningStats};
pub use region_mask::RegionMask;
pub use screening::{ScreenVerdict, ScreeningParams, screen};
