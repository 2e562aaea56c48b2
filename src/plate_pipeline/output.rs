//! Everything written next to the results text: the annotated plate image
//! and the optional 16-bit label map.

mod annotate;
mod colors;
mod label_map;

pub use annotate::{Annotation, Annotator, ANNOTATED_FILE_NAME};
pub use colors::{class_color, contrasting_colors};
pub use label_map::{LABEL_MAP_FILE_NAME, LabelMapWriter, TiffCompression, TiffLabelMapWriter};
